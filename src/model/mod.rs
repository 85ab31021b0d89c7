pub mod config;
pub mod heading;
pub mod planning;
pub mod recurring;
pub mod waiting;

pub use config::{Config, KeywordSet};
pub use heading::Heading;
pub use planning::{AnchorMode, Planning, PlanningDate, RepeatUnit, Repeater};
pub use recurring::RecurringRecord;
pub use waiting::{Priority, WaitingRecord};
