use std::ops::Range;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::parse::headline::heading_level;
use crate::parse::index::subtree_end;
use crate::parse::planning::is_planning_line;
use crate::parse::{body_indent, StructureError};

pub const BLOCK_OPEN: &str = ":PROPERTIES:";
pub const BLOCK_CLOSE: &str = ":END:";

/// The property key carrying a heading's corpus-wide identifier.
pub const ID_KEY: &str = "ID";

/// A `:KEY: value` line. The value may be absent entirely (`:KEY:`), which
/// reads as the empty string.
fn entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*:([A-Za-z0-9_\-]+):(?:\s+(.*))?$").unwrap())
}

/// Parse one key-value line from a block body.
pub fn parse_entry(line: &str) -> Option<(String, String)> {
    let caps = entry_re().captures(line)?;
    let key = caps[1].to_string();
    let value = caps
        .get(2)
        .map(|m| m.as_str().trim_end().to_string())
        .unwrap_or_default();
    Some((key, value))
}

/// Locate the properties block attached to the heading at `heading_line`.
///
/// Scans from just after the heading, skipping blank and planning lines.
/// The first other line must be the open marker or the block is absent. An
/// open marker with no close marker before the next heading (or end of
/// subtree) is a structural fault, not a block.
pub fn find_block(
    lines: &[String],
    heading_line: usize,
    subtree_end: usize,
) -> Result<Option<Range<usize>>, StructureError> {
    let mut idx = heading_line + 1;
    while idx < subtree_end {
        let line = &lines[idx];
        if line.trim().is_empty() || is_planning_line(line) {
            idx += 1;
            continue;
        }
        if line.trim().eq_ignore_ascii_case(BLOCK_OPEN) {
            let mut close = idx + 1;
            while close < subtree_end {
                if lines[close].trim().eq_ignore_ascii_case(BLOCK_CLOSE) {
                    return Ok(Some(idx..close + 1));
                }
                if heading_level(&lines[close]).is_some() {
                    break;
                }
                close += 1;
            }
            return Err(StructureError::UnterminatedProperties { line: idx + 1 });
        }
        return Ok(None);
    }
    Ok(None)
}

/// Read one property value. Keys compare case-insensitively. Absence is a
/// routine outcome, not an error.
pub fn get(
    lines: &[String],
    heading_line: usize,
    key: &str,
) -> Result<Option<String>, StructureError> {
    let (_, end) = heading_context(lines, heading_line)?;
    let block = match find_block(lines, heading_line, end)? {
        Some(block) => block,
        None => return Ok(None),
    };
    for line in &lines[block.start + 1..block.end - 1] {
        if let Some((k, v)) = parse_entry(line) {
            if k.eq_ignore_ascii_case(key) {
                return Ok(Some(v));
            }
        }
    }
    Ok(None)
}

/// Read the whole block as an ordered map with uppercased keys. An absent
/// block reads as an empty map.
pub fn read_all(
    lines: &[String],
    heading_line: usize,
) -> Result<IndexMap<String, String>, StructureError> {
    let (_, end) = heading_context(lines, heading_line)?;
    let mut map = IndexMap::new();
    if let Some(block) = find_block(lines, heading_line, end)? {
        for line in &lines[block.start + 1..block.end - 1] {
            if let Some((k, v)) = parse_entry(line) {
                map.entry(k.to_ascii_uppercase()).or_insert(v);
            }
        }
    }
    Ok(map)
}

/// Upsert one property. Creates the block (after the heading and its
/// planning lines) if absent; replaces the key's line in place if the key
/// exists; otherwise appends a new line just before the close marker,
/// preserving existing key order.
///
/// Returns the signed line-count delta. Callers holding ranges computed
/// before this call must shift them by the delta or re-index; reusing a
/// stale range is how phantom-line corruption starts.
pub fn set(
    lines: &mut Vec<String>,
    heading_line: usize,
    key: &str,
    value: &str,
) -> Result<isize, StructureError> {
    let (level, end) = heading_context(lines, heading_line)?;
    match find_block(lines, heading_line, end)? {
        Some(block) => {
            for idx in block.start + 1..block.end - 1 {
                if let Some((k, _)) = parse_entry(&lines[idx]) {
                    if k.eq_ignore_ascii_case(key) {
                        lines[idx] = entry_line(level, key, value);
                        return Ok(0);
                    }
                }
            }
            lines.insert(block.end - 1, entry_line(level, key, value));
            Ok(1)
        }
        None => {
            let at = block_insert_point(lines, heading_line, end);
            let indent = body_indent(level);
            lines.insert(at, format!("{}{}", indent, BLOCK_OPEN));
            lines.insert(at + 1, entry_line(level, key, value));
            lines.insert(at + 2, format!("{}{}", indent, BLOCK_CLOSE));
            Ok(3)
        }
    }
}

/// Remove one property line. The block itself stays even when it ends up
/// empty. Returns the signed line-count delta (0 when the key was absent).
pub fn delete(
    lines: &mut Vec<String>,
    heading_line: usize,
    key: &str,
) -> Result<isize, StructureError> {
    let (_, end) = heading_context(lines, heading_line)?;
    let block = match find_block(lines, heading_line, end)? {
        Some(block) => block,
        None => return Ok(0),
    };
    for idx in block.start + 1..block.end - 1 {
        if let Some((k, _)) = parse_entry(&lines[idx]) {
            if k.eq_ignore_ascii_case(key) {
                lines.remove(idx);
                return Ok(-1);
            }
        }
    }
    Ok(0)
}

/// Where a freshly created block goes: right after the heading's planning
/// lines. Planning lines always precede the block; every writer here
/// maintains that ordering.
fn block_insert_point(lines: &[String], heading_line: usize, subtree_end: usize) -> usize {
    let mut idx = heading_line + 1;
    while idx < subtree_end && is_planning_line(&lines[idx]) {
        idx += 1;
    }
    idx
}

fn entry_line(level: usize, key: &str, value: &str) -> String {
    let key = key.to_ascii_uppercase();
    if value.is_empty() {
        format!("{}:{}:", body_indent(level), key)
    } else {
        format!("{}:{}: {}", body_indent(level), key, value)
    }
}

fn heading_context(
    lines: &[String],
    heading_line: usize,
) -> Result<(usize, usize), StructureError> {
    let level = lines
        .get(heading_line)
        .and_then(|l| heading_level(l))
        .ok_or(StructureError::NotAHeading {
            line: heading_line + 1,
        })?;
    Ok((level, subtree_end(lines, heading_line, level)))
}
