use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

/// Everything recorded about a delegated or blocked item.
///
/// Every field is optional; an absent field and an empty string are
/// different values and both survive an encode/decode round trip. Workflows
/// branch on absence (e.g. no follow-up date set yet means "ask for one").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WaitingRecord {
    /// Who is being waited on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub who: Option<String>,
    /// The expected deliverable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub what: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_on: Option<NaiveDate>,
    /// How the request was made (email, chat, in person, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WaitingRecord {
    pub fn is_empty(&self) -> bool {
        self.who.is_none()
            && self.what.is_none()
            && self.requested_on.is_none()
            && self.follow_up_on.is_none()
            && self.channel.is_none()
            && self.priority.is_none()
            && self.notes.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_round_trip() {
        for p in [
            Priority::Low,
            Priority::Normal,
            Priority::High,
            Priority::Urgent,
        ] {
            assert_eq!(p.as_str().parse::<Priority>(), Ok(p));
        }
        assert!("critical".parse::<Priority>().is_err());
    }

    #[test]
    fn test_empty_record() {
        assert!(WaitingRecord::default().is_empty());
        let record = WaitingRecord {
            who: Some(String::new()),
            ..Default::default()
        };
        // An empty string is a value, not absence
        assert!(!record.is_empty());
    }
}
