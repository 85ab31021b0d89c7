use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Error type for document I/O
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read a document into its line sequence.
pub fn read_lines(path: &Path) -> Result<Vec<String>, DocError> {
    let text = fs::read_to_string(path).map_err(|e| DocError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(text.lines().map(|l| l.to_string()).collect())
}

/// Write a complete line sequence back, atomically: the new content is
/// staged in a temp file in the same directory and renamed over the
/// original, so a crash mid-write never leaves a truncated document.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<(), DocError> {
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    atomic_write(path, content.as_bytes()).map_err(|e| DocError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// All corpus documents under `root` with the given extension, sorted for
/// deterministic scan order. Hidden directories are skipped.
pub fn corpus_files(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            // The root itself may be a dot-directory; only prune below it
            entry.depth() == 0
                || !entry
                    .file_name()
                    .to_str()
                    .map(|name| name.starts_with('.'))
                    .unwrap_or(false)
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e == extension)
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_write_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.org");
        let lines = vec!["* Heading".to_string(), "Body".to_string()];
        write_lines(&path, &lines).unwrap();
        assert_eq!(read_lines(&path).unwrap(), lines);
        assert_eq!(fs::read_to_string(&path).unwrap(), "* Heading\nBody\n");
    }

    #[test]
    fn test_write_empty_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.org");
        write_lines(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert!(read_lines(&path).unwrap().is_empty());
    }

    #[test]
    fn test_read_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_lines(&dir.path().join("absent.org")),
            Err(DocError::Read { .. })
        ));
    }

    #[test]
    fn test_corpus_files_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::create_dir(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join("b.org"), "* B\n").unwrap();
        fs::write(dir.path().join("a.org"), "* A\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a document\n").unwrap();
        fs::write(dir.path().join("sub/c.org"), "* C\n").unwrap();
        fs::write(dir.path().join(".hidden/d.org"), "* D\n").unwrap();

        let files = corpus_files(dir.path(), "org");
        let names: Vec<String> = files
            .iter()
            .map(|p| {
                p.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["a.org", "b.org", "sub/c.org"]);
    }
}
