use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const LOCK_FILE: &str = ".grove.lock";
const POLL_INTERVAL: Duration = Duration::from_millis(10);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Advisory lock serializing write commands against one corpus.
///
/// The engine itself is lock-free: every operation is a synchronous
/// transformation of an in-memory line sequence. Two CLI invocations
/// racing on the same corpus would still lose updates through the
/// read-modify-write cycle, so writers hold this flock for the duration
/// of one command.
pub struct CorpusLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not lock {path}: {source}")]
    Acquire {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not acquire lock on {path}: another gv process may be writing")]
    Timeout { path: PathBuf },
}

impl CorpusLock {
    /// Acquire the corpus lock, waiting up to the default timeout.
    pub fn acquire(corpus_dir: &Path) -> Result<Self, LockError> {
        Self::acquire_timeout(corpus_dir, DEFAULT_TIMEOUT)
    }

    pub fn acquire_timeout(corpus_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = corpus_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| LockError::Create {
                path: path.clone(),
                source: e,
            })?;

        let deadline = Instant::now() + timeout;
        loop {
            let held = try_lock(&file).map_err(|e| LockError::Acquire {
                path: path.clone(),
                source: e,
            })?;
            if held {
                return Ok(CorpusLock { _file: file, path });
            }
            if Instant::now() >= deadline {
                return Err(LockError::Timeout { path });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for CorpusLock {
    fn drop(&mut self) {
        // flock releases with the file descriptor; the file itself is litter
        let _ = fs::remove_file(&self.path);
    }
}

/// One non-blocking flock attempt. `Ok(false)` means another process
/// holds the lock; anything else going wrong is a real error, not a
/// reason to keep polling.
#[cfg(unix)]
fn try_lock(file: &File) -> std::io::Result<bool> {
    use std::os::unix::io::AsRawFd;
    if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) } == 0 {
        return Ok(true);
    }
    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(code) if code == libc::EWOULDBLOCK => Ok(false),
        _ => Err(err),
    }
}

// No flock outside unix; single-writer discipline is on the user there
#[cfg(not(unix))]
fn try_lock(_file: &File) -> std::io::Result<bool> {
    Ok(true)
}
