use chrono::Weekday;
use serde::Serialize;

use crate::model::planning::{AnchorMode, RepeatUnit, Repeater};

/// How a recurring heading repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecurringRecord {
    pub unit: RepeatUnit,
    pub interval: u32,
    pub anchor: AnchorMode,
    /// Preferred weekday for the next occurrence, if any.
    ///
    /// Weekday values stay inside `chrono::Weekday`; no numeric weekday
    /// index crosses an API boundary. Where arithmetic is needed it uses
    /// `num_days_from_monday` (Monday = 0) and nothing else.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekday: Option<Weekday>,
}

impl RecurringRecord {
    /// The repeater token this record stamps onto its planning date.
    pub fn repeater(&self) -> Repeater {
        Repeater {
            anchor: self.anchor,
            interval: self.interval,
            unit: self.unit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeater_carries_all_fields() {
        let record = RecurringRecord {
            unit: RepeatUnit::Week,
            interval: 2,
            anchor: AnchorMode::Completion,
            weekday: Some(Weekday::Fri),
        };
        let repeater = record.repeater();
        assert_eq!(repeater.unit, RepeatUnit::Week);
        assert_eq!(repeater.interval, 2);
        assert_eq!(repeater.anchor, AnchorMode::Completion);
    }
}
