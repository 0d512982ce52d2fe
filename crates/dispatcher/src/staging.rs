//! Temp-then-rename file writes.
//!
//! A file only ever appears under its final name fully written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Sibling temporary path, `dir/.<name>.tmp`
pub fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Write `bytes` to `path` through a temporary sibling
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = temp_path(path);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

/// Files written under temporary names, renamed together on [`commit`].
///
/// Anything not committed is removed on drop.
///
/// [`commit`]: StagedFiles::commit
#[derive(Debug, Default)]
pub struct StagedFiles {
    pending: Vec<(PathBuf, PathBuf)>,
}

impl StagedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `bytes` next to `path` without exposing it yet
    pub fn stage(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let tmp = temp_path(path);
        fs::write(&tmp, bytes)?;
        self.pending.push((tmp, path.to_path_buf()));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Move every staged file to its final name, in staging order
    pub fn commit(mut self) -> io::Result<Vec<PathBuf>> {
        let mut committed = Vec::with_capacity(self.pending.len());
        while !self.pending.is_empty() {
            let (tmp, dest) = self.pending.remove(0);
            fs::rename(&tmp, &dest)?;
            committed.push(dest);
        }
        Ok(committed)
    }
}

impl Drop for StagedFiles {
    fn drop(&mut self) {
        for (tmp, _) in self.pending.drain(..) {
            if let Err(e) = fs::remove_file(&tmp) {
                warn!(path = %tmp.display(), error = %e, "failed to remove staged file");
            }
        }
    }
}
