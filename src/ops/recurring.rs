use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, Weekday};
use indexmap::IndexMap;

use crate::model::config::KeywordSet;
use crate::model::planning::{AnchorMode, Planning, PlanningDate, RepeatUnit};
use crate::model::recurring::RecurringRecord;
use crate::ops::mutate::{set_planning, set_state, PlanningEdit};
use crate::ops::CodecError;
use crate::parse::index;
use crate::parse::{properties, StructureError};

const KEY_UNIT: &str = "RECUR_UNIT";
const KEY_INTERVAL: &str = "RECUR_INTERVAL";
const KEY_ANCHOR: &str = "RECUR_ANCHOR";
const KEY_WEEKDAY: &str = "RECUR_WEEKDAY";
const KEY_CREATED: &str = "RECUR_CREATED";

/// Write the record's property keys plus a creation timestamp.
/// Returns the signed line-count delta.
pub fn encode(
    lines: &mut Vec<String>,
    heading_line: usize,
    record: &RecurringRecord,
    created: NaiveDateTime,
) -> Result<isize, CodecError> {
    let mut delta = 0isize;
    delta += properties::set(lines, heading_line, KEY_UNIT, record.unit.name())?;
    delta += properties::set(
        lines,
        heading_line,
        KEY_INTERVAL,
        &record.interval.to_string(),
    )?;
    delta += properties::set(lines, heading_line, KEY_ANCHOR, record.anchor.name())?;
    delta += match record.weekday {
        Some(weekday) => properties::set(lines, heading_line, KEY_WEEKDAY, &weekday.to_string())?,
        None => properties::delete(lines, heading_line, KEY_WEEKDAY)?,
    };
    delta += properties::set(
        lines,
        heading_line,
        KEY_CREATED,
        &created.format("%Y-%m-%d %H:%M").to_string(),
    )?;
    Ok(delta)
}

/// Read the record back. A heading without the unit key is simply not
/// recurring (`None`). A missing anchor or interval falls back to the
/// plain defaults (`scheduled`, 1); a present-but-garbled value surfaces.
pub fn decode(
    lines: &[String],
    heading_line: usize,
) -> Result<Option<RecurringRecord>, CodecError> {
    let props = properties::read_all(lines, heading_line)?;
    let unit = match props.get(KEY_UNIT) {
        None => return Ok(None),
        Some(value) => RepeatUnit::parse_name(value).ok_or_else(|| CodecError::BadUnit {
            key: KEY_UNIT.to_string(),
            value: value.clone(),
        })?,
    };
    let interval = interval_prop(&props)?;
    let anchor = match props.get(KEY_ANCHOR) {
        None => AnchorMode::Scheduled,
        Some(value) => AnchorMode::parse_name(value).ok_or_else(|| CodecError::BadAnchor {
            key: KEY_ANCHOR.to_string(),
            value: value.clone(),
        })?,
    };
    let weekday = match props.get(KEY_WEEKDAY) {
        None => None,
        Some(value) => Some(value.parse::<Weekday>().map_err(|_| CodecError::BadWeekday {
            key: KEY_WEEKDAY.to_string(),
            value: value.clone(),
        })?),
    };
    Ok(Some(RecurringRecord {
        unit,
        interval,
        anchor,
        weekday,
    }))
}

fn interval_prop(props: &IndexMap<String, String>) -> Result<u32, CodecError> {
    match props.get(KEY_INTERVAL) {
        None => Ok(1),
        Some(value) => match value.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(CodecError::BadInterval {
                key: KEY_INTERVAL.to_string(),
                value: value.clone(),
            }),
        },
    }
}

/// The next date matching the preferred weekday: `today` when it already
/// matches, otherwise the next match, always within the coming seven days.
/// With no preference this is just `today`.
pub fn next_occurrence(today: NaiveDate, weekday: Option<Weekday>) -> NaiveDate {
    align_to_weekday(today, weekday)
}

fn align_to_weekday(date: NaiveDate, weekday: Option<Weekday>) -> NaiveDate {
    match weekday {
        None => date,
        Some(target) => {
            // Monday = 0 throughout; the only weekday arithmetic in the crate
            let ahead = (target.num_days_from_monday() + 7
                - date.weekday().num_days_from_monday())
                % 7;
            date + Days::new(ahead as u64)
        }
    }
}

/// Advance a date by the record's interval in its unit. Month and year
/// steps clamp to the last day of a short month.
pub fn advance(record: &RecurringRecord, from: NaiveDate) -> NaiveDate {
    match record.unit {
        RepeatUnit::Day => from + Days::new(record.interval as u64),
        RepeatUnit::Week => from + Days::new(7 * record.interval as u64),
        RepeatUnit::Month => from + Months::new(record.interval),
        RepeatUnit::Year => from + Months::new(record.interval.saturating_mul(12)),
    }
}

/// The next scheduled date once the task is completed, honoring the anchor
/// mode exactly as recorded:
///
/// - `Scheduled` steps once from the previously scheduled date, even if
///   that lands in the past (the cadence slips, it never skips).
/// - `Completion` steps from the completion date, then aligns to the
///   preferred weekday if one is set.
/// - `Deadline` steps from the deadline repeatedly until the result lies
///   in the future, catching up when overdue.
pub fn next_after_done(
    record: &RecurringRecord,
    planning: &Planning,
    completed_on: NaiveDate,
) -> NaiveDate {
    match record.anchor {
        AnchorMode::Completion => {
            align_to_weekday(advance(record, completed_on), record.weekday)
        }
        AnchorMode::Scheduled => {
            let base = planning.scheduled.map(|p| p.date).unwrap_or(completed_on);
            advance(record, base)
        }
        AnchorMode::Deadline => {
            let base = planning
                .deadline
                .or(planning.scheduled)
                .map(|p| p.date)
                .unwrap_or(completed_on);
            let mut next = advance(record, base);
            while next <= completed_on {
                next = advance(record, next);
            }
            next
        }
    }
}

/// Encode the record and schedule its first occurrence, stamping the
/// repeater onto the planning date. Returns the signed line-count delta.
pub fn schedule_first(
    lines: &mut Vec<String>,
    heading_line: usize,
    record: &RecurringRecord,
    today: NaiveDate,
    created: NaiveDateTime,
) -> Result<isize, CodecError> {
    let mut delta = encode(lines, heading_line, record, created)?;
    let first = PlanningDate {
        date: next_occurrence(today, record.weekday),
        repeater: Some(record.repeater()),
    };
    delta += set_planning(lines, heading_line, PlanningEdit::Set(first), PlanningEdit::Keep)?;
    Ok(delta)
}

/// The repeat-on-done path: if the heading carries a recurring record,
/// reschedule it instead of leaving it finished. The state keyword resets
/// to the first open keyword. Returns `None` for non-recurring headings
/// (the caller then applies the done keyword normally).
pub fn reschedule_done(
    lines: &mut Vec<String>,
    heading_line: usize,
    completed_on: NaiveDate,
    keywords: &KeywordSet,
) -> Result<Option<isize>, CodecError> {
    let record = match decode(lines, heading_line)? {
        Some(record) => record,
        None => return Ok(None),
    };
    let planning = index::index(lines, keywords)?
        .into_iter()
        .find(|h| h.line == heading_line)
        .map(|h| h.planning)
        .ok_or(StructureError::NotAHeading {
            line: heading_line + 1,
        })?;
    let next = PlanningDate {
        date: next_after_done(&record, &planning, completed_on),
        repeater: Some(record.repeater()),
    };
    let delta = set_planning(lines, heading_line, PlanningEdit::Set(next), PlanningEdit::Keep)?;
    set_state(lines, heading_line, Some(keywords.first_open()), keywords)?;
    Ok(Some(delta))
}

/// Largest accepted interval. Keeps the month arithmetic in [`advance`]
/// far from `u32` range even for year units.
pub const MAX_INTERVAL: u32 = 1000;

/// Parse a CLI interval spec like `1w`, `3d`, or `2m`.
pub fn parse_every(spec: &str) -> Option<(u32, RepeatUnit)> {
    let code = spec.chars().last()?;
    let unit = RepeatUnit::from_code(code)?;
    let number = spec.strip_suffix(code)?;
    let interval: u32 = number.parse().ok()?;
    if interval == 0 || interval > MAX_INTERVAL {
        return None;
    }
    Some((interval, unit))
}
