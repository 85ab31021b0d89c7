use std::ops::Range;

use crate::model::config::KeywordSet;
use crate::model::heading::Heading;
use crate::model::planning::Planning;
use crate::parse::headline::{heading_level, parse_headline};
use crate::parse::planning::{parse_planning_line, planning_positions, PlanningKind};
use crate::parse::properties::{self, ID_KEY};
use crate::parse::StructureError;

/// Scan a document into its ordered heading index.
///
/// Every caller that needs heading or subtree positions goes through this
/// one scan; nothing else in the crate re-derives ranges locally. A
/// document with no headings yields an empty index, not an error.
pub fn index(lines: &[String], keywords: &KeywordSet) -> Result<Vec<Heading>, StructureError> {
    check_preamble(lines)?;

    let mut headings = Vec::new();
    for (line_idx, line) in lines.iter().enumerate() {
        let level = match heading_level(line) {
            Some(level) => level,
            None => continue,
        };
        let end = subtree_end(lines, line_idx, level);
        let (state, title, tags) = parse_headline(line, level, keywords);
        let props = properties::find_block(lines, line_idx, end)?;
        let planning = collect_planning(lines, line_idx, end, props.as_ref())?;
        headings.push(Heading {
            level,
            state,
            title,
            tags,
            line: line_idx,
            subtree: line_idx..end,
            properties: props,
            planning,
        });
    }
    Ok(headings)
}

/// End of the subtree rooted at `start` (exclusive): the next line holding
/// a heading at the same or shallower level, or end of input. A heading
/// with no nested content still owns its trailing non-heading lines.
pub fn subtree_end(lines: &[String], start: usize, level: usize) -> usize {
    let mut idx = start + 1;
    while idx < lines.len() {
        if let Some(next_level) = heading_level(&lines[idx]) {
            if next_level <= level {
                break;
            }
        }
        idx += 1;
    }
    idx
}

/// Find the first heading whose properties block carries `id` under the
/// identifier key. First match wins; duplicate identifiers are a
/// precondition violation handled by the identity registry, not here.
pub fn find_by_id(
    lines: &[String],
    keywords: &KeywordSet,
    id: &str,
) -> Result<Option<Heading>, StructureError> {
    for heading in index(lines, keywords)? {
        if properties::get(lines, heading.line, ID_KEY)?.as_deref() == Some(id) {
            return Ok(Some(heading));
        }
    }
    Ok(None)
}

/// A planning line in the preamble (before any heading) has nothing to
/// attach to. Surface it rather than guessing an owner.
fn check_preamble(lines: &[String]) -> Result<(), StructureError> {
    for (idx, line) in lines.iter().enumerate() {
        if heading_level(line).is_some() {
            break;
        }
        if crate::parse::planning::is_planning_line(line) {
            return Err(StructureError::OrphanPlanning { line: idx + 1 });
        }
    }
    Ok(())
}

fn collect_planning(
    lines: &[String],
    heading_line: usize,
    end: usize,
    props: Option<&Range<usize>>,
) -> Result<Planning, StructureError> {
    let mut planning = Planning::default();
    for pos in planning_positions(lines, heading_line, end, props) {
        let (kind, date) = match parse_planning_line(&lines[pos]) {
            Some(parsed) => parsed,
            None => continue,
        };
        let date = date.ok_or(StructureError::BadTimestamp { line: pos + 1 })?;
        match kind {
            PlanningKind::Scheduled => {
                if planning.scheduled.is_none() {
                    planning.scheduled = Some(date);
                }
            }
            PlanningKind::Deadline => {
                if planning.deadline.is_none() {
                    planning.deadline = Some(date);
                }
            }
        }
    }
    Ok(planning)
}
