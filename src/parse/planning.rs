use std::ops::Range;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::model::planning::{AnchorMode, PlanningDate, RepeatUnit, Repeater};
use crate::parse::body_indent;

pub const SCHEDULED_KEYWORD: &str = "SCHEDULED:";
pub const DEADLINE_KEYWORD: &str = "DEADLINE:";

/// Which planning slot a line fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanningKind {
    Scheduled,
    Deadline,
}

impl PlanningKind {
    pub fn keyword(self) -> &'static str {
        match self {
            PlanningKind::Scheduled => SCHEDULED_KEYWORD,
            PlanningKind::Deadline => DEADLINE_KEYWORD,
        }
    }
}

/// `<YYYY-MM-DD Wkd>` with an optional repeater token. The weekday is
/// matched but never read back; it is recomputed from the date.
fn timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^<(\d{4})-(\d{2})-(\d{2})(?: [A-Za-z]{2,3})?(?: ((?:\+\+|\.\+|\+)\d+[dwmy]))?>")
            .unwrap()
    })
}

fn repeater_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\+\+|\.\+|\+)(\d+)([dwmy])$").unwrap())
}

pub fn is_planning_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with(SCHEDULED_KEYWORD) || trimmed.starts_with(DEADLINE_KEYWORD)
}

/// Parse a planning line. Returns the slot and the timestamp, or `None` if
/// the line is not a planning line at all. A planning keyword followed by
/// an unparseable timestamp yields `Some((kind, None))` so the caller can
/// surface it instead of silently dropping a date.
pub fn parse_planning_line(line: &str) -> Option<(PlanningKind, Option<PlanningDate>)> {
    let trimmed = line.trim_start();
    let (kind, rest) = if let Some(rest) = trimmed.strip_prefix(SCHEDULED_KEYWORD) {
        (PlanningKind::Scheduled, rest)
    } else if let Some(rest) = trimmed.strip_prefix(DEADLINE_KEYWORD) {
        (PlanningKind::Deadline, rest)
    } else {
        return None;
    };
    Some((kind, parse_timestamp(rest.trim())))
}

/// Parse a `<YYYY-MM-DD Wkd [rep]>` timestamp.
pub fn parse_timestamp(text: &str) -> Option<PlanningDate> {
    let caps = timestamp_re().captures(text)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let repeater = match caps.get(4) {
        Some(m) => Some(parse_repeater(m.as_str())?),
        None => None,
    };
    Some(PlanningDate { date, repeater })
}

/// Parse a repeater token like `+1w`, `.+3d`, or `++2m`.
pub fn parse_repeater(token: &str) -> Option<Repeater> {
    let caps = repeater_re().captures(token)?;
    let anchor = AnchorMode::from_prefix(&caps[1])?;
    let interval: u32 = caps[2].parse().ok()?;
    let unit = RepeatUnit::from_code(caps[3].chars().next()?)?;
    Some(Repeater {
        anchor,
        interval,
        unit,
    })
}

/// Format a timestamp. The weekday is always derived from the date itself,
/// never taken from input, so a hand-edited date can't keep a stale weekday.
pub fn format_timestamp(planning_date: &PlanningDate) -> String {
    let stamp = planning_date.date.format("%Y-%m-%d %a");
    match planning_date.repeater {
        Some(rep) => format!("<{} {}>", stamp, format_repeater(&rep)),
        None => format!("<{}>", stamp),
    }
}

pub fn format_repeater(repeater: &Repeater) -> String {
    format!(
        "{}{}{}",
        repeater.anchor.prefix(),
        repeater.interval,
        repeater.unit.code()
    )
}

/// Compose a full planning line at the given heading level.
pub fn planning_line(level: usize, kind: PlanningKind, planning_date: &PlanningDate) -> String {
    format!(
        "{}{} {}",
        body_indent(level),
        kind.keyword(),
        format_timestamp(planning_date)
    )
}

/// Positions of planning lines in a heading's head region: the lines
/// between the heading and its first body or child line, with the
/// properties block skipped as a unit. Tolerates the legacy writer that
/// put planning lines after the block.
pub fn planning_positions(
    lines: &[String],
    heading_line: usize,
    subtree_end: usize,
    properties: Option<&Range<usize>>,
) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut idx = heading_line + 1;
    while idx < subtree_end {
        if let Some(props) = properties {
            if idx == props.start {
                idx = props.end;
                continue;
            }
        }
        let line = &lines[idx];
        if line.trim().is_empty() {
            idx += 1;
            continue;
        }
        if is_planning_line(line) {
            positions.push(idx);
            idx += 1;
            continue;
        }
        break;
    }
    positions
}
