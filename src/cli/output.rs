use serde::Serialize;

use crate::model::heading::Heading;
use crate::model::waiting::WaitingRecord;
use crate::parse::planning::format_timestamp;

/// One heading as presented to the user, in text or JSON.
#[derive(Debug, Serialize)]
pub struct HeadingRow {
    /// 1-based, matching editor line numbers.
    pub line: usize,
    pub level: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

impl HeadingRow {
    pub fn new(heading: &Heading, id: Option<String>) -> Self {
        HeadingRow {
            line: heading.line + 1,
            level: heading.level,
            state: heading.state.clone(),
            title: heading.title.clone(),
            tags: heading.tags.clone(),
            id,
            scheduled: heading.planning.scheduled.as_ref().map(format_timestamp),
            deadline: heading.planning.deadline.as_ref().map(format_timestamp),
        }
    }

    pub fn text(&self) -> String {
        let mut out = format!("{:>4}  {}", self.line, "*".repeat(self.level));
        if let Some(state) = &self.state {
            out.push(' ');
            out.push_str(state);
        }
        out.push(' ');
        out.push_str(&self.title);
        if !self.tags.is_empty() {
            out.push_str(&format!(" :{}:", self.tags.join(":")));
        }
        if let Some(scheduled) = &self.scheduled {
            out.push_str(&format!("  SCHEDULED: {}", scheduled));
        }
        if let Some(deadline) = &self.deadline {
            out.push_str(&format!("  DEADLINE: {}", deadline));
        }
        out
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Field-per-line rendering of a waiting record for the plain-text path.
pub fn waiting_text(record: &WaitingRecord) -> String {
    if record.is_empty() {
        return "no waiting record".to_string();
    }
    let mut out = Vec::new();
    if let Some(who) = &record.who {
        out.push(format!("who: {}", who));
    }
    if let Some(what) = &record.what {
        out.push(format!("what: {}", what));
    }
    if let Some(requested) = record.requested_on {
        out.push(format!("requested: {}", requested.format("%Y-%m-%d")));
    }
    if let Some(follow_up) = record.follow_up_on {
        out.push(format!("follow up: {}", follow_up.format("%Y-%m-%d")));
    }
    if let Some(channel) = &record.channel {
        out.push(format!("channel: {}", channel));
    }
    if let Some(priority) = record.priority {
        out.push(format!("priority: {}", priority));
    }
    if let Some(notes) = &record.notes {
        out.push(format!("notes: {}", notes));
    }
    out.join("\n")
}
