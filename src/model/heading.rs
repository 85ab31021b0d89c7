use std::ops::Range;

use serde::Serialize;

use crate::model::planning::Planning;

/// One outline heading with its computed source ranges.
///
/// Ranges are 0-indexed with exclusive ends and are only valid against the
/// line sequence they were computed from. Any mutation that changes the line
/// count invalidates them; either re-index or apply the mutation's reported
/// delta via [`Heading::shift`] before reuse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    /// Nesting depth: the number of leading stars.
    pub level: usize,
    /// State keyword, if the heading carries one. Absence means "no status".
    pub state: Option<String>,
    /// Heading text with state keyword and tag block stripped.
    pub title: String,
    /// Tags from the trailing `:tag1:tag2:` block, in order.
    pub tags: Vec<String>,
    /// Line holding the heading itself.
    pub line: usize,
    /// The heading line through the line before the next heading at the
    /// same or shallower level (or end of document).
    #[serde(skip)]
    pub subtree: Range<usize>,
    /// The properties block including both marker lines, if present.
    #[serde(skip)]
    pub properties: Option<Range<usize>>,
    pub planning: Planning,
}

impl Heading {
    /// Shift every recorded position by a signed line delta, after a
    /// mutation strictly above this heading.
    pub fn shift(&mut self, delta: isize) {
        self.line = shift_index(self.line, delta);
        self.subtree = shift_index(self.subtree.start, delta)..shift_index(self.subtree.end, delta);
        if let Some(props) = self.properties.take() {
            self.properties =
                Some(shift_index(props.start, delta)..shift_index(props.end, delta));
        }
    }
}

fn shift_index(index: usize, delta: isize) -> usize {
    let shifted = index as isize + delta;
    debug_assert!(shifted >= 0, "range shifted below zero");
    shifted.max(0) as usize
}
