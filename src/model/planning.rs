use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Scheduled/deadline annotations attached to a heading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Planning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<PlanningDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<PlanningDate>,
}

/// A calendar date with an optional recurrence repeater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanningDate {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeater: Option<Repeater>,
}

impl PlanningDate {
    pub fn bare(date: NaiveDate) -> Self {
        PlanningDate {
            date,
            repeater: None,
        }
    }
}

/// A recurrence descriptor: every `interval` `unit`s, recomputed from the
/// date named by `anchor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Repeater {
    pub anchor: AnchorMode,
    pub interval: u32,
    pub unit: RepeatUnit,
}

/// Calendar unit of a repeater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatUnit {
    Day,
    Week,
    Month,
    Year,
}

impl RepeatUnit {
    /// The single-letter code used in repeater tokens.
    pub fn code(self) -> char {
        match self {
            RepeatUnit::Day => 'd',
            RepeatUnit::Week => 'w',
            RepeatUnit::Month => 'm',
            RepeatUnit::Year => 'y',
        }
    }

    pub fn from_code(c: char) -> Option<RepeatUnit> {
        match c {
            'd' => Some(RepeatUnit::Day),
            'w' => Some(RepeatUnit::Week),
            'm' => Some(RepeatUnit::Month),
            'y' => Some(RepeatUnit::Year),
            _ => None,
        }
    }

    /// The full unit name used in property values.
    pub fn name(self) -> &'static str {
        match self {
            RepeatUnit::Day => "day",
            RepeatUnit::Week => "week",
            RepeatUnit::Month => "month",
            RepeatUnit::Year => "year",
        }
    }

    pub fn parse_name(s: &str) -> Option<RepeatUnit> {
        match s {
            "day" => Some(RepeatUnit::Day),
            "week" => Some(RepeatUnit::Week),
            "month" => Some(RepeatUnit::Month),
            "year" => Some(RepeatUnit::Year),
            _ => None,
        }
    }
}

/// Which reference date a repeater recomputes from.
///
/// The three modes are deliberately not interchangeable: `Scheduled` keeps
/// the original cadence even when occurrences are missed, `Completion`
/// restarts the interval from whenever the task actually finished, and
/// `Deadline` advances repeatedly until the date lands in the future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorMode {
    Scheduled,
    Completion,
    Deadline,
}

impl AnchorMode {
    /// The prefix used in repeater tokens.
    pub fn prefix(self) -> &'static str {
        match self {
            AnchorMode::Scheduled => "+",
            AnchorMode::Completion => ".+",
            AnchorMode::Deadline => "++",
        }
    }

    pub fn from_prefix(s: &str) -> Option<AnchorMode> {
        match s {
            "+" => Some(AnchorMode::Scheduled),
            ".+" => Some(AnchorMode::Completion),
            "++" => Some(AnchorMode::Deadline),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AnchorMode::Scheduled => "scheduled",
            AnchorMode::Completion => "completion",
            AnchorMode::Deadline => "deadline",
        }
    }

    pub fn parse_name(s: &str) -> Option<AnchorMode> {
        match s {
            "scheduled" => Some(AnchorMode::Scheduled),
            "completion" => Some(AnchorMode::Completion),
            "deadline" => Some(AnchorMode::Deadline),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_codes_round_trip() {
        for unit in [
            RepeatUnit::Day,
            RepeatUnit::Week,
            RepeatUnit::Month,
            RepeatUnit::Year,
        ] {
            assert_eq!(RepeatUnit::from_code(unit.code()), Some(unit));
            assert_eq!(RepeatUnit::parse_name(unit.name()), Some(unit));
        }
        assert_eq!(RepeatUnit::from_code('x'), None);
    }

    #[test]
    fn test_anchor_prefixes_round_trip() {
        for anchor in [
            AnchorMode::Scheduled,
            AnchorMode::Completion,
            AnchorMode::Deadline,
        ] {
            assert_eq!(AnchorMode::from_prefix(anchor.prefix()), Some(anchor));
            assert_eq!(AnchorMode::parse_name(anchor.name()), Some(anchor));
        }
        assert_eq!(AnchorMode::from_prefix("+++"), None);
    }
}
