//! Saved capture output directory.
//!
//! Captured traces are saved one per file, in a directory chosen by the
//! user, under a unique timestamped name. The files are plain text and can be
//! fed back to the `analyze` command.

use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use time::{macros::format_description, OffsetDateTime};

const TRACE_EXTENSION: &str = "trace";

fn timestamp() -> Result<String> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let date_format = format_description!("[year]-[month]-[day]-[hour][minute][second]");

    Ok(now.format(&date_format)?)
}

fn make_unique_trace_path(dir: &Path, stamp: &str) -> Option<PathBuf> {
    let p = dir.join(format!("rtstat-{}.{}", stamp, TRACE_EXTENSION));

    if !p.exists() {
        return Some(p);
    }

    for c in 'a'..='z' {
        let p = dir.join(format!("rtstat-{}-{}.{}", stamp, c, TRACE_EXTENSION));

        if !p.exists() {
            return Some(p);
        }
    }

    None
}

/// Directory receiving captured traces.
#[derive(Debug, Clone)]
pub struct CaptureDirectory {
    path: PathBuf,
}

impl CaptureDirectory {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create the directory if it does not already exist.
    pub fn create_dir(&self) -> Result<()> {
        if !self.path.exists() {
            std::fs::create_dir_all(&self.path)
                .with_context(|| format!("cannot create {}", self.path.display()))?;
        }

        Ok(())
    }

    /// Create a new trace file with a unique name.
    /// Never overwrites an existing file.
    pub fn create_trace_file(&self) -> Result<(PathBuf, File)> {
        let stamp = timestamp()?;

        let Some(path) = make_unique_trace_path(&self.path, &stamp) else {
            bail!(
                "could not find a free trace file name in {}",
                self.path.display()
            );
        };

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("cannot create {}", path.display()))?;

        Ok((path, file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::{make_unique_trace_path, CaptureDirectory};

    #[test]
    fn test_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let stamp = "2026-10-14-101500";

        let first = make_unique_trace_path(dir.path(), stamp).unwrap();
        assert_eq!(first, dir.path().join("rtstat-2026-10-14-101500.trace"));

        std::fs::write(&first, "").unwrap();
        let second = make_unique_trace_path(dir.path(), stamp).unwrap();
        assert_eq!(second, dir.path().join("rtstat-2026-10-14-101500-a.trace"));
    }

    #[test]
    fn test_create_trace_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = CaptureDirectory::new(dir.path().join("captures"));

        out.create_dir().unwrap();
        let (a, _) = out.create_trace_file().unwrap();
        let (b, _) = out.create_trace_file().unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with(out.path()));
        assert!(b.exists());
    }
}
