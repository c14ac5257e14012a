pub mod monitor_loop;
pub mod price_board;
pub mod price_monitor;
pub mod scheduler;
pub mod session;

pub use monitor_loop::{MonitoringLoop, TickReport};
pub use price_board::{PriceBoard, PriceSnapshot, SnapshotEntry};
pub use price_monitor::{PollSettings, PriceMonitor, PriceSummary};
pub use scheduler::{PeriodicTask, TickHandler};
pub use session::{MonitoringSession, SessionStatus, TickStamp};
