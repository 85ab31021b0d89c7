use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local, Utc};

use crate::io::doc_io::{corpus_files, read_lines, DocError};
use crate::model::config::KeywordSet;
use crate::parse::index::index;
use crate::parse::properties::{self, ID_KEY};
use crate::parse::StructureError;

/// Bound on identifier regeneration before giving up. Hitting it means
/// something far stranger than bad luck and is treated as fatal.
pub const MAX_ATTEMPTS: usize = 64;

/// Error type for identity operations
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("could not find a free identifier after {0} attempts")]
    Exhausted(usize),
    #[error("{path}: {source}")]
    Scan {
        path: PathBuf,
        source: StructureError,
    },
    #[error(transparent)]
    Doc(#[from] DocError),
}

/// Where an identifier lives: which document, which heading line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdLocation {
    pub file: PathBuf,
    pub line: usize,
}

/// The corpus-wide identifier index, with an explicit staleness window.
///
/// This is a plain value handed around by callers, never hidden global
/// state; tests inject one with a fixed content. It records when it was
/// built and reports itself stale after the TTL; a stale index is rebuilt
/// on next use by whoever holds it, not proactively.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    entries: HashMap<String, IdLocation>,
    built_at: Option<DateTime<Utc>>,
    ttl: Duration,
}

impl CorpusIndex {
    pub fn new(ttl_secs: u64) -> Self {
        CorpusIndex {
            entries: HashMap::new(),
            built_at: None,
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Never built, or built longer than the TTL ago.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.built_at {
            None => true,
            Some(built) => now - built > self.ttl,
        }
    }

    pub fn get(&self, id: &str) -> Option<&IdLocation> {
        self.entries.get(id)
    }

    /// Record an identifier the caller has just persisted. The registry
    /// never mutates documents itself; whoever writes the document also
    /// updates the index.
    pub fn insert(&mut self, id: String, location: IdLocation) {
        self.entries.insert(id, location);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full corpus scan: walk every document under `root`, collect every
    /// identifier and its owner. First owner wins; later holders of the
    /// same identifier are returned as duplicates for the caller to fix.
    pub fn rebuild(
        &mut self,
        root: &Path,
        extension: &str,
        keywords: &KeywordSet,
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, IdLocation)>, IdError> {
        self.entries.clear();
        let mut duplicates = Vec::new();
        for file in corpus_files(root, extension) {
            let lines = read_lines(&file)?;
            let headings = index(&lines, keywords).map_err(|e| IdError::Scan {
                path: file.clone(),
                source: e,
            })?;
            for heading in headings {
                let id = properties::get(&lines, heading.line, ID_KEY).map_err(|e| {
                    IdError::Scan {
                        path: file.clone(),
                        source: e,
                    }
                })?;
                if let Some(id) = id {
                    let location = IdLocation {
                        file: file.clone(),
                        line: heading.line,
                    };
                    if self.entries.contains_key(&id) {
                        duplicates.push((id, location));
                    } else {
                        self.entries.insert(id, location);
                    }
                }
            }
        }
        self.built_at = Some(now);
        Ok(duplicates)
    }
}

/// Generate a fresh identifier: sortable local timestamp plus a 16-bit
/// random suffix, e.g. `20250827T091530-4fa1`. The suffix alone is small
/// enough to collide under rapid automated creation; uniqueness comes
/// from [`ensure_unique`]'s retry loop, never from this function.
pub fn generate_id(now: DateTime<Local>) -> String {
    format!("{}-{:04x}", now.format("%Y%m%dT%H%M%S"), rand::random::<u16>())
}

/// Validate a candidate identifier against the corpus index.
///
/// The candidate survives when nobody owns it, or when its recorded owner
/// is the very location being updated. Otherwise fresh identifiers are
/// generated until one misses the index, reported with `changed = true`.
/// Persisting the new value and updating the index is the caller's job.
pub fn ensure_unique(
    candidate: &str,
    owner: &IdLocation,
    corpus: &CorpusIndex,
    now: DateTime<Local>,
) -> Result<(String, bool), IdError> {
    match corpus.get(candidate) {
        None => return Ok((candidate.to_string(), false)),
        Some(location) if location == owner => return Ok((candidate.to_string(), false)),
        Some(_) => {}
    }
    for _ in 0..MAX_ATTEMPTS {
        let fresh = generate_id(now);
        if corpus.get(&fresh).is_none() {
            return Ok((fresh, true));
        }
    }
    Err(IdError::Exhausted(MAX_ATTEMPTS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn loc(file: &str, line: usize) -> IdLocation {
        IdLocation {
            file: PathBuf::from(file),
            line,
        }
    }

    #[test]
    fn test_generate_id_shape() {
        let now = Local::now();
        let id = generate_id(now);
        // 15-char timestamp, dash, 4 hex digits
        assert_eq!(id.len(), 20);
        assert_eq!(id.as_bytes()[8], b'T');
        assert_eq!(id.as_bytes()[15], b'-');
    }

    #[test]
    fn test_candidate_unowned_passes_through() {
        let corpus = CorpusIndex::new(300);
        let (id, changed) =
            ensure_unique("X", &loc("a.org", 0), &corpus, Local::now()).unwrap();
        assert_eq!(id, "X");
        assert!(!changed);
    }

    #[test]
    fn test_candidate_owned_by_self_passes_through() {
        let mut corpus = CorpusIndex::new(300);
        corpus.insert("X".to_string(), loc("a.org", 4));
        let (id, changed) =
            ensure_unique("X", &loc("a.org", 4), &corpus, Local::now()).unwrap();
        assert_eq!(id, "X");
        assert!(!changed);
    }

    #[test]
    fn test_collision_regenerates() {
        let mut corpus = CorpusIndex::new(300);
        corpus.insert("X".to_string(), loc("a.org", 0));
        let (id, changed) =
            ensure_unique("X", &loc("b.org", 0), &corpus, Local::now()).unwrap();
        assert_ne!(id, "X");
        assert!(changed);
        assert!(corpus.get(&id).is_none());
    }

    #[test]
    fn test_staleness_window() {
        let mut corpus = CorpusIndex::new(300);
        let t0 = Utc::now();
        assert!(corpus.is_stale(t0));

        let dir = TempDir::new().unwrap();
        corpus
            .rebuild(dir.path(), "org", &KeywordSet::default(), t0)
            .unwrap();
        assert!(!corpus.is_stale(t0 + Duration::seconds(299)));
        assert!(corpus.is_stale(t0 + Duration::seconds(301)));
    }

    #[test]
    fn test_rebuild_collects_ids_and_duplicates() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.org"),
            "* One\n  :PROPERTIES:\n  :ID: X\n  :END:\n* Two\n  :PROPERTIES:\n  :ID: Y\n  :END:\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("b.org"),
            "* Three\n  :PROPERTIES:\n  :ID: X\n  :END:\n",
        )
        .unwrap();

        let mut corpus = CorpusIndex::new(300);
        let duplicates = corpus
            .rebuild(dir.path(), "org", &KeywordSet::default(), Utc::now())
            .unwrap();

        assert_eq!(corpus.len(), 2);
        // a.org sorts before b.org, so a.org owns X
        assert_eq!(corpus.get("X").unwrap().file, dir.path().join("a.org"));
        assert_eq!(corpus.get("Y").unwrap().line, 4);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].0, "X");
        assert_eq!(duplicates[0].1.file, dir.path().join("b.org"));
    }
}
