pub mod history;
pub mod kinds;
pub mod message;
pub mod state;

pub use history::PriceHistoryWindow;
pub use kinds::{AlertKind, FiredAlert, MoveDirection};
pub use message::{NotificationMessage, NotificationPriority, NotificationSettings};
pub use state::AlertState;
