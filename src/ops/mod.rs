pub mod mutate;
pub mod recurring;
pub mod refile;
pub mod waiting;

pub use mutate::{set_planning, set_state, set_tags, MutateError, PlanningEdit};
pub use refile::{refile, RefileError};

use crate::parse::StructureError;

/// Faults raised by the metadata codecs. A property value that would
/// change a date, priority, or recurrence semantic if guessed at is
/// surfaced, never defaulted.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("property {key} holds {value:?}, expected an ISO date (YYYY-MM-DD)")]
    BadDate { key: String, value: String },
    #[error("property {key} holds {value:?}, expected low, normal, high, or urgent")]
    BadPriority { key: String, value: String },
    #[error("property {key} holds {value:?}, expected day, week, month, or year")]
    BadUnit { key: String, value: String },
    #[error("property {key} holds {value:?}, expected scheduled, completion, or deadline")]
    BadAnchor { key: String, value: String },
    #[error("property {key} holds {value:?}, expected a weekday name")]
    BadWeekday { key: String, value: String },
    #[error("property {key} holds {value:?}, expected a positive integer")]
    BadInterval { key: String, value: String },
    #[error(transparent)]
    Structure(#[from] StructureError),
    #[error(transparent)]
    Mutate(#[from] MutateError),
}
