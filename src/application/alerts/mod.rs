pub mod alert_engine;

pub use alert_engine::{AlertEngine, AlertEngineConfig, PairAlertStatus};
