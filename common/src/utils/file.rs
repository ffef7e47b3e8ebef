//! Filesystem helpers. These touch the disk and are not pure.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::{AppError, AppResult};

/// Deletes a file, treating "not found" as success.
///
/// # Errors
/// Returns `AppError::Io` for any other failure.
pub fn remove_file(path: impl AsRef<Path>) -> AppResult<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Deletes every path with [`remove_file`], stopping at the first real error.
///
/// # Errors
/// Returns the first `AppError::Io` encountered.
pub fn remove_files<I, P>(paths: I) -> AppResult<()>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths.into_iter().try_for_each(remove_file)
}

/// Concatenates every file matching `pattern`, in sorted path order, into `dst`.
///
/// Each source is deleted once it has been copied. `dst` is truncated first and
/// is not created when nothing matches.
///
/// # Returns
/// The number of files merged.
///
/// # Errors
/// Returns `AppError::InvalidValue` for a malformed pattern and `AppError::Io`
/// if reading, writing or deleting fails.
pub fn merge_files(dst: impl AsRef<Path>, pattern: &str) -> AppResult<usize> {
    let dst = dst.as_ref();
    let mut sources: Vec<PathBuf> = glob::glob(pattern)
        .map_err(|e| AppError::InvalidValue(format!("invalid glob pattern `{pattern}`: {e}")))?
        .collect::<Result<_, _>>()
        .map_err(|e| AppError::Io(e.into()))?;
    sources.retain(|p| p != dst && p.is_file());
    sources.sort();

    if sources.is_empty() {
        return Ok(0);
    }

    let mut writer = BufWriter::new(File::create(dst)?);
    for source in &sources {
        let mut reader = File::open(source)?;
        io::copy(&mut reader, &mut writer)?;
        fs::remove_file(source)?;
    }
    writer.flush()?;

    tracing::debug!(dst = %dst.display(), files = sources.len(), "merged files");
    Ok(sources.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_file(dir.path().join("nonexistent.jpg")).is_ok());
    }

    #[test]
    fn test_remove_files_deletes_each() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();

        remove_files([&a, &b, &dir.path().join("missing")]).unwrap();
        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn test_merge_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("part-2.csv"), "3,c\n").unwrap();
        fs::write(dir.path().join("part-1.csv"), "1,a\n2,b\n").unwrap();
        let dst = dir.path().join("merged.csv");
        let pattern = format!("{}/part-*.csv", dir.path().display());

        assert_eq!(merge_files(&dst, &pattern).unwrap(), 2);
        assert_eq!(fs::read_to_string(&dst).unwrap(), "1,a\n2,b\n3,c\n");
        assert!(!dir.path().join("part-1.csv").exists());
    }

    #[test]
    fn test_merge_without_matches_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("merged.csv");
        let pattern = format!("{}/none-*.csv", dir.path().display());
        assert_eq!(merge_files(&dst, &pattern).unwrap(), 0);
        assert!(!dst.exists());
    }

    #[test]
    fn test_bad_pattern() {
        assert_eq!(merge_files("out", "[").unwrap_err().code(), "INVALID_VALUE");
    }
}
