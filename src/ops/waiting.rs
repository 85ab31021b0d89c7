use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::model::waiting::{Priority, WaitingRecord};
use crate::ops::CodecError;
use crate::parse::headline::heading_level;
use crate::parse::index::subtree_end;
use crate::parse::planning::is_planning_line;
use crate::parse::{body_indent, properties, StructureError};

const KEY_WHO: &str = "WAITING_ON";
const KEY_WHAT: &str = "WAITING_FOR";
const KEY_REQUESTED: &str = "REQUESTED_ON";
const KEY_FOLLOW_UP: &str = "FOLLOW_UP_ON";
const KEY_CHANNEL: &str = "WAITING_CHANNEL";
const KEY_PRIORITY: &str = "WAITING_PRIORITY";
const KEY_NOTES: &str = "WAITING_NOTES";

/// Leading phrase of the generated body summary. Regeneration finds the
/// old summary by this marker and replaces it, never duplicating it.
const SUMMARY_MARKER: &str = "Waiting on";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Write the record onto the heading: one property key per field, plus a
/// regenerated summary line in the body. Absent fields delete their keys,
/// so encode followed by decode returns exactly the input record.
///
/// Returns the signed line-count delta.
pub fn encode(
    lines: &mut Vec<String>,
    heading_line: usize,
    record: &WaitingRecord,
) -> Result<isize, CodecError> {
    let mut delta = 0isize;

    let requested = record.requested_on.map(|d| d.format(DATE_FORMAT).to_string());
    let follow_up = record.follow_up_on.map(|d| d.format(DATE_FORMAT).to_string());
    let priority = record.priority.map(|p| p.as_str().to_string());

    let fields: [(&str, Option<&str>); 7] = [
        (KEY_WHO, record.who.as_deref()),
        (KEY_WHAT, record.what.as_deref()),
        (KEY_REQUESTED, requested.as_deref()),
        (KEY_FOLLOW_UP, follow_up.as_deref()),
        (KEY_CHANNEL, record.channel.as_deref()),
        (KEY_PRIORITY, priority.as_deref()),
        (KEY_NOTES, record.notes.as_deref()),
    ];
    for (key, value) in fields {
        delta += match value {
            Some(v) => properties::set(lines, heading_line, key, v)?,
            None => properties::delete(lines, heading_line, key)?,
        };
    }

    delta += write_summary(lines, heading_line, record)?;
    Ok(delta)
}

/// Read the record back from the heading's properties. A missing key
/// decodes to `None`, an empty value to `Some("")`; the two are different
/// answers and workflows branch on the difference.
pub fn decode(lines: &[String], heading_line: usize) -> Result<WaitingRecord, CodecError> {
    let props = properties::read_all(lines, heading_line)?;
    Ok(WaitingRecord {
        who: props.get(KEY_WHO).cloned(),
        what: props.get(KEY_WHAT).cloned(),
        requested_on: date_prop(&props, KEY_REQUESTED)?,
        follow_up_on: date_prop(&props, KEY_FOLLOW_UP)?,
        channel: props.get(KEY_CHANNEL).cloned(),
        priority: priority_prop(&props)?,
        notes: props.get(KEY_NOTES).cloned(),
    })
}

fn date_prop(
    props: &IndexMap<String, String>,
    key: &str,
) -> Result<Option<NaiveDate>, CodecError> {
    match props.get(key) {
        None => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map(Some)
            .map_err(|_| CodecError::BadDate {
                key: key.to_string(),
                value: value.clone(),
            }),
    }
}

fn priority_prop(props: &IndexMap<String, String>) -> Result<Option<Priority>, CodecError> {
    match props.get(KEY_PRIORITY) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| CodecError::BadPriority {
            key: KEY_PRIORITY.to_string(),
            value: value.clone(),
        }),
    }
}

/// Compose the human-readable summary, or `None` for an all-absent record.
fn summary_text(record: &WaitingRecord) -> Option<String> {
    if record.is_empty() {
        return None;
    }
    let who = record
        .who
        .as_deref()
        .filter(|w| !w.is_empty())
        .unwrap_or("someone");
    let mut text = format!("{} {}", SUMMARY_MARKER, who);
    if let Some(what) = record.what.as_deref().filter(|w| !w.is_empty()) {
        text.push_str(&format!(" for {}", what));
    }
    let mut details = Vec::new();
    if let Some(requested) = record.requested_on {
        details.push(format!("requested {}", requested.format(DATE_FORMAT)));
    }
    if let Some(channel) = record.channel.as_deref().filter(|c| !c.is_empty()) {
        details.push(format!("via {}", channel));
    }
    if let Some(follow_up) = record.follow_up_on {
        details.push(format!("follow up {}", follow_up.format(DATE_FORMAT)));
    }
    if let Some(priority) = record.priority {
        details.push(format!("priority {}", priority));
    }
    if !details.is_empty() {
        text.push_str(&format!(" ({})", details.join("; ")));
    }
    text.push('.');
    Some(text)
}

/// Replace, insert, or remove the summary line. Returns the line delta.
fn write_summary(
    lines: &mut Vec<String>,
    heading_line: usize,
    record: &WaitingRecord,
) -> Result<isize, CodecError> {
    let level = lines
        .get(heading_line)
        .and_then(|l| heading_level(l))
        .ok_or(StructureError::NotAHeading {
            line: heading_line + 1,
        })?;
    let end = subtree_end(lines, heading_line, level);
    let props = properties::find_block(lines, heading_line, end)?;

    // Search only the heading's own body, not a child's
    let own_end = (heading_line + 1..end)
        .find(|&i| heading_level(&lines[i]).is_some())
        .unwrap_or(end);
    let existing = (heading_line + 1..own_end)
        .filter(|&i| props.as_ref().map_or(true, |p| !p.contains(&i)))
        .find(|&i| lines[i].trim_start().starts_with(SUMMARY_MARKER));

    let summary = summary_text(record).map(|t| format!("{}{}", body_indent(level), t));
    match (existing, summary) {
        (Some(at), Some(text)) => {
            lines[at] = text;
            Ok(0)
        }
        (Some(at), None) => {
            lines.remove(at);
            Ok(-1)
        }
        (None, Some(text)) => {
            let at = match props {
                Some(block) => block.end,
                None => {
                    let mut idx = heading_line + 1;
                    while idx < end && is_planning_line(&lines[idx]) {
                        idx += 1;
                    }
                    idx
                }
            };
            lines.insert(at, text);
            Ok(1)
        }
        (None, None) => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(s: &str) -> Vec<String> {
        s.lines().map(|l| l.to_string()).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_record() -> WaitingRecord {
        WaitingRecord {
            who: Some("Alice".to_string()),
            what: Some("the Q3 report".to_string()),
            requested_on: Some(date(2025, 1, 10)),
            follow_up_on: Some(date(2025, 1, 17)),
            channel: Some("email".to_string()),
            priority: Some(Priority::High),
            notes: Some("second ask".to_string()),
        }
    }

    #[test]
    fn test_round_trip_full_record() {
        let mut doc = lines("* WAITING Q3 report");
        encode(&mut doc, 0, &sample_record()).unwrap();
        assert_eq!(decode(&doc, 0).unwrap(), sample_record());
    }

    #[test]
    fn test_round_trip_all_absent() {
        let mut doc = lines("* WAITING Q3 report");
        let empty = WaitingRecord::default();
        let delta = encode(&mut doc, 0, &empty).unwrap();
        assert_eq!(delta, 0);
        assert_eq!(decode(&doc, 0).unwrap(), empty);
        assert_eq!(doc, lines("* WAITING Q3 report"));
    }

    #[test]
    fn test_absent_and_empty_are_distinct() {
        let record = WaitingRecord {
            who: Some(String::new()),
            ..Default::default()
        };
        let mut doc = lines("* WAITING Thing");
        encode(&mut doc, 0, &record).unwrap();
        let decoded = decode(&doc, 0).unwrap();
        assert_eq!(decoded.who.as_deref(), Some(""));
        assert_eq!(decoded.what, None);
    }

    #[test]
    fn test_summary_inserted_after_properties() {
        let mut doc = lines("* WAITING Q3 report\nOlder body text.");
        encode(&mut doc, 0, &sample_record()).unwrap();
        let summary_at = doc
            .iter()
            .position(|l| l.trim_start().starts_with(SUMMARY_MARKER))
            .unwrap();
        let close_at = doc.iter().position(|l| l.trim() == ":END:").unwrap();
        assert_eq!(summary_at, close_at + 1);
        assert!(doc[summary_at].contains("Waiting on Alice for the Q3 report"));
        assert!(doc[summary_at].contains("requested 2025-01-10"));
        assert!(doc[summary_at].contains("via email"));
        assert_eq!(doc.last().unwrap(), "Older body text.");
    }

    #[test]
    fn test_reencode_never_duplicates_summary() {
        let mut doc = lines("* WAITING Q3 report");
        encode(&mut doc, 0, &sample_record()).unwrap();
        let mut updated = sample_record();
        updated.follow_up_on = Some(date(2025, 1, 24));
        let delta = encode(&mut doc, 0, &updated).unwrap();
        assert_eq!(delta, 0);
        let summaries = doc
            .iter()
            .filter(|l| l.trim_start().starts_with(SUMMARY_MARKER))
            .count();
        assert_eq!(summaries, 1);
        assert!(doc.iter().any(|l| l.contains("follow up 2025-01-24")));
    }

    #[test]
    fn test_clearing_record_removes_keys_and_summary() {
        let mut doc = lines("* WAITING Q3 report\nBody.");
        encode(&mut doc, 0, &sample_record()).unwrap();
        encode(&mut doc, 0, &WaitingRecord::default()).unwrap();
        assert_eq!(decode(&doc, 0).unwrap(), WaitingRecord::default());
        assert!(!doc.iter().any(|l| l.trim_start().starts_with(SUMMARY_MARKER)));
        // The emptied properties block remains; the body is untouched
        assert_eq!(doc.last().unwrap(), "Body.");
    }

    #[test]
    fn test_bad_date_surfaces() {
        let doc = lines(
            "* WAITING Thing\n\
             \x20 :PROPERTIES:\n\
             \x20 :REQUESTED_ON: next tuesday\n\
             \x20 :END:",
        );
        assert!(matches!(
            decode(&doc, 0),
            Err(CodecError::BadDate { .. })
        ));
    }

    #[test]
    fn test_child_summary_not_mistaken_for_own() {
        let mut doc = lines(
            "* WAITING Parent\n\
             ** Child\n\
             \x20  Waiting on Bob for something else.",
        );
        let record = WaitingRecord {
            who: Some("Alice".to_string()),
            ..Default::default()
        };
        encode(&mut doc, 0, &record).unwrap();
        // The child's summary is untouched; the parent got its own
        let summaries: Vec<usize> = doc
            .iter()
            .enumerate()
            .filter(|(_, l)| l.trim_start().starts_with(SUMMARY_MARKER))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(summaries.len(), 2);
        assert!(doc[summaries[0]].contains("Alice"));
        assert!(doc[summaries[1]].contains("Bob"));
    }
}
