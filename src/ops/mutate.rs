use crate::model::config::KeywordSet;
use crate::model::planning::PlanningDate;
use crate::parse::headline::{compose_headline, heading_level, parse_headline};
use crate::parse::index::subtree_end;
use crate::parse::planning::{
    parse_planning_line, planning_line, planning_positions, PlanningKind,
};
use crate::parse::{properties, StructureError};

#[derive(Debug, thiserror::Error)]
pub enum MutateError {
    #[error("unknown state keyword: {0}")]
    UnknownKeyword(String),
    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// Edit sentinel for one planning slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanningEdit {
    /// Leave the slot as it is.
    Keep,
    /// Remove the slot's line entirely.
    Clear,
    /// Replace the slot's line, or insert one.
    Set(PlanningDate),
}

/// Rewrite the heading line's state token. `None` clears it. Title and
/// tags pass through untouched; the line count never changes.
pub fn set_state(
    lines: &mut [String],
    heading_line: usize,
    new_state: Option<&str>,
    keywords: &KeywordSet,
) -> Result<(), MutateError> {
    if let Some(state) = new_state {
        if !keywords.contains(state) {
            return Err(MutateError::UnknownKeyword(state.to_string()));
        }
    }
    let level = require_heading(lines, heading_line)?;
    let (_, title, tags) = parse_headline(&lines[heading_line], level, keywords);
    lines[heading_line] = compose_headline(level, new_state, &title, &tags);
    Ok(())
}

/// Replace the heading's tag block. An empty slice removes it.
pub fn set_tags(
    lines: &mut [String],
    heading_line: usize,
    tags: &[String],
    keywords: &KeywordSet,
) -> Result<(), MutateError> {
    let level = require_heading(lines, heading_line)?;
    let (state, title, _) = parse_headline(&lines[heading_line], level, keywords);
    lines[heading_line] = compose_headline(level, state.as_deref(), &title, tags);
    Ok(())
}

/// Edit the heading's planning lines. Each slot is edited independently;
/// clearing one never touches the other. New lines are inserted directly
/// after the heading, before the properties block, keeping the
/// planning-before-properties ordering intact.
///
/// Returns the signed line-count delta.
pub fn set_planning(
    lines: &mut Vec<String>,
    heading_line: usize,
    scheduled: PlanningEdit,
    deadline: PlanningEdit,
) -> Result<isize, MutateError> {
    let level = require_heading(lines, heading_line)?;
    let end = subtree_end(lines, heading_line, level);
    let props = properties::find_block(lines, heading_line, end)?;

    let mut scheduled_at = None;
    let mut deadline_at = None;
    for pos in planning_positions(lines, heading_line, end, props.as_ref()) {
        match parse_planning_line(&lines[pos]) {
            Some((PlanningKind::Scheduled, _)) if scheduled_at.is_none() => {
                scheduled_at = Some(pos)
            }
            Some((PlanningKind::Deadline, _)) if deadline_at.is_none() => deadline_at = Some(pos),
            _ => {}
        }
    }

    let mut delta = 0isize;

    match scheduled {
        PlanningEdit::Keep => {}
        PlanningEdit::Clear => {
            if let Some(pos) = scheduled_at.take() {
                lines.remove(pos);
                delta -= 1;
                deadline_at = deadline_at.map(|d| if d > pos { d - 1 } else { d });
            }
        }
        PlanningEdit::Set(date) => {
            let text = planning_line(level, PlanningKind::Scheduled, &date);
            match scheduled_at {
                Some(pos) => lines[pos] = text,
                None => {
                    let at = heading_line + 1;
                    lines.insert(at, text);
                    delta += 1;
                    scheduled_at = Some(at);
                    deadline_at = deadline_at.map(|d| if d >= at { d + 1 } else { d });
                }
            }
        }
    }

    match deadline {
        PlanningEdit::Keep => {}
        PlanningEdit::Clear => {
            if let Some(pos) = deadline_at {
                lines.remove(pos);
                delta -= 1;
            }
        }
        PlanningEdit::Set(date) => {
            let text = planning_line(level, PlanningKind::Deadline, &date);
            match deadline_at {
                Some(pos) => lines[pos] = text,
                None => {
                    let at = scheduled_at.map(|p| p + 1).unwrap_or(heading_line + 1);
                    lines.insert(at, text);
                    delta += 1;
                }
            }
        }
    }

    Ok(delta)
}

fn require_heading(lines: &[String], heading_line: usize) -> Result<usize, StructureError> {
    lines
        .get(heading_line)
        .and_then(|l| heading_level(l))
        .ok_or(StructureError::NotAHeading {
            line: heading_line + 1,
        })
}
