pub mod headline;
pub mod index;
pub mod planning;
pub mod properties;

pub use headline::{compose_headline, heading_level, parse_headline};
pub use index::{find_by_id, index, subtree_end};

/// Indentation for generated lines in a heading's head region (planning
/// lines and the properties block): the text column right after the stars.
pub(crate) fn body_indent(level: usize) -> String {
    " ".repeat(level + 1)
}

/// Structural faults in a document. These are surfaced to the caller and
/// never silently repaired; rewriting structurally broken text risks
/// destroying user content.
///
/// Line numbers are 1-based for display.
#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    #[error("line {line}: planning line appears before any heading")]
    OrphanPlanning { line: usize },
    #[error("line {line}: properties block is never closed")]
    UnterminatedProperties { line: usize },
    #[error("line {line}: malformed planning timestamp")]
    BadTimestamp { line: usize },
    #[error("line {line}: expected a heading line")]
    NotAHeading { line: usize },
}
