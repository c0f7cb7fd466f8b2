use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Deletes regular files in `dir` whose modification age is at least
/// `max_age`. Returns how many were removed.
pub fn sweep_older_than(dir: &Path, max_age: Duration) -> io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        // future mtimes count as fresh
        let age = now
            .duration_since(metadata.modified()?)
            .unwrap_or(Duration::ZERO);
        if age >= max_age {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Fire-and-forget sweep on the blocking pool; failures are only logged.
pub fn spawn_sweep(dir: PathBuf, max_age: Duration) {
    tokio::task::spawn_blocking(move || match sweep_older_than(&dir, max_age) {
        Ok(0) => {}
        Ok(n) => log::info!("cleanup removed {} old files from {}", n, dir.display()),
        Err(e) => log::error!("Cleanup error: {}", e),
    });
}
