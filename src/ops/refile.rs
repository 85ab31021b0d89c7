use crate::model::config::KeywordSet;
use crate::parse::index::find_by_id;
use crate::parse::StructureError;

#[derive(Debug, thiserror::Error)]
pub enum RefileError {
    #[error("no heading with id {0} in the source document")]
    NotFound(String),
    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// Move the subtree identified by `id` from `source` to the end of
/// `target`, byte for byte. Returns the number of lines moved.
///
/// The copy is appended to the target before anything is removed from the
/// source; a failure while building the target mutation can therefore
/// never lose the source data. First identifier match wins: a duplicated
/// identifier is a precondition violation owned by the identity registry.
pub fn refile(
    source: &mut Vec<String>,
    target: &mut Vec<String>,
    id: &str,
    keywords: &KeywordSet,
) -> Result<usize, RefileError> {
    let heading = find_by_id(source, keywords, id)?
        .ok_or_else(|| RefileError::NotFound(id.to_string()))?;
    let range = heading.subtree;
    let moved = range.len();

    target.extend_from_slice(&source[range.clone()]);
    source.drain(range);
    Ok(moved)
}
