//! Filesystem helpers shared by the file mutator, config and manifest writers.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};

/// Read `path` as UTF-8, returning `None` when it does not exist.
///
/// Every other failure (permission denied, a directory in the way, invalid
/// UTF-8) is an error.
pub fn read_text_if_exists(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("read {}", path.display())),
    }
}

/// Write `contents` to `path`, creating missing parent directories.
pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

/// Atomically replace `path` (temp file + rename).
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let mut tmp_name = path
        .file_name()
        .with_context(|| format!("path missing file name {}", path.display()))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = parent.join(tmp_name);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let read = read_text_if_exists(&temp.path().join("missing.txt")).expect("read");
        assert_eq!(read, None);
    }

    #[test]
    fn existing_empty_file_reads_as_empty_string() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("empty.txt");
        fs::write(&path, "").expect("seed");
        assert_eq!(read_text_if_exists(&path).expect("read"), Some(String::new()));
    }

    #[test]
    fn directory_in_place_of_file_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(read_text_if_exists(temp.path()).is_err());
    }

    #[test]
    fn write_text_creates_parents() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("a/b/c.txt");
        write_text(&path, "x").expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read back"), "x");
    }

    #[test]
    fn write_atomic_leaves_no_temp_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("out/manifest.json");
        write_atomic(&path, "{}\n").expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read back"), "{}\n");
        assert!(!temp.path().join("out/manifest.json.tmp").exists());
    }
}
