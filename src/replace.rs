//! In-place conversion through a sibling temporary file
//!
//! The converted text is written to `<path>.utf8.tmp` and then renamed over
//! the original. Where a plain rename cannot replace an existing file, the
//! default [`ReplaceStrategy::RemoveAndRetry`] deletes the original and
//! renames again. If that second rename fails too, **no file is left at the
//! target path**; the error reports this through `original_removed`.
//!
//! Concurrent in-place conversions of the same path race on the temporary
//! file name and must be serialized by the caller.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use crate::convert::convert;
use crate::{Encoding, Error, Result};

/// The filesystem primitives in-place conversion is built on
pub trait FileSystem {
    /// Read a whole file.
    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>>;
    /// Create or truncate a file and write `bytes` to it.
    fn write_all(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
    /// Move `from` onto `to`.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    /// Delete a file.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write_all(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        std::fs::write(path, bytes)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

/// What to do when renaming the temporary file over the original fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplaceStrategy {
    /// Delete the original and rename once more. A second failure leaves no
    /// file at the target path.
    #[default]
    RemoveAndRetry,
    /// Never delete the original; a failed rename leaves it untouched.
    RenameOnly,
}

/// Path of the temporary file used while converting `path` in place.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".utf8.tmp");
    PathBuf::from(name)
}

/// Convert the file at `path` to UTF-8 in place and return its source encoding.
pub fn replace_in_place_with<F: FileSystem>(
    fs: &F,
    path: &Path,
    strategy: ReplaceStrategy,
) -> Result<Encoding> {
    let input = fs.read_all(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let conversion = convert(&input);
    let tmp = temp_path(path);

    if let Err(source) = fs.write_all(&tmp, &conversion.bytes) {
        discard(fs, &tmp);
        return Err(Error::Write { path: tmp, source });
    }

    let Err(first) = fs.rename(&tmp, path) else {
        tracing::debug!(path = %path.display(), encoding = %conversion.encoding, "converted in place");
        return Ok(conversion.encoding);
    };

    let (original_removed, source) = match strategy {
        ReplaceStrategy::RenameOnly => (false, first),
        ReplaceStrategy::RemoveAndRetry => {
            tracing::warn!(
                path = %path.display(),
                error = %first,
                "rename failed, removing original and retrying"
            );
            let original_removed = fs.remove(path).is_ok();
            match fs.rename(&tmp, path) {
                Ok(()) => return Ok(conversion.encoding),
                Err(source) => (original_removed, source),
            }
        }
    };

    discard(fs, &tmp);
    Err(Error::Replace {
        path: path.to_path_buf(),
        original_removed,
        source,
    })
}

fn discard<F: FileSystem>(fs: &F, tmp: &Path) {
    if let Err(err) = fs.remove(tmp) {
        tracing::warn!(path = %tmp.display(), error = %err, "failed to remove temporary file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// In-memory filesystem whose first `failing_renames` renames fail
    #[derive(Default)]
    struct MemoryFs {
        files: RefCell<HashMap<PathBuf, Vec<u8>>>,
        failing_renames: Cell<usize>,
        fail_writes: bool,
    }

    impl MemoryFs {
        fn with_file(path: &str, bytes: &[u8]) -> Self {
            let fs = MemoryFs::default();
            fs.files
                .borrow_mut()
                .insert(PathBuf::from(path), bytes.to_vec());
            fs
        }

        fn get(&self, path: &str) -> Option<Vec<u8>> {
            self.files.borrow().get(Path::new(path)).cloned()
        }
    }

    impl FileSystem for MemoryFs {
        fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.files
                .borrow()
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        fn write_all(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
            // a failed write still leaves a partial file behind
            let partial = if self.fail_writes { &bytes[..0] } else { bytes };
            self.files
                .borrow_mut()
                .insert(path.to_path_buf(), partial.to_vec());
            if self.fail_writes {
                return Err(io::Error::from(io::ErrorKind::StorageFull));
            }
            Ok(())
        }

        fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            if self.failing_renames.get() > 0 {
                self.failing_renames.set(self.failing_renames.get() - 1);
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            let mut files = self.files.borrow_mut();
            let bytes = files
                .remove(from)
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
            files.insert(to.to_path_buf(), bytes);
            Ok(())
        }

        fn remove(&self, path: &Path) -> io::Result<()> {
            self.files
                .borrow_mut()
                .remove(path)
                .map(|_| ())
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }
    }

    const CP1251_PRIVET: &[u8] = &[0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2];

    #[test]
    fn test_temp_path_is_sibling() {
        assert_eq!(
            temp_path(Path::new("/data/notes.txt")),
            PathBuf::from("/data/notes.txt.utf8.tmp")
        );
    }

    #[test]
    fn test_first_rename_succeeds() {
        let fs = MemoryFs::with_file("a.txt", CP1251_PRIVET);
        let encoding =
            replace_in_place_with(&fs, Path::new("a.txt"), ReplaceStrategy::default()).unwrap();

        assert_eq!(encoding, Encoding::WINDOWS_1251);
        assert_eq!(fs.get("a.txt").unwrap(), "Привет".as_bytes());
        assert_eq!(fs.get("a.txt.utf8.tmp"), None);
    }

    #[test]
    fn test_retry_after_removing_original() {
        let fs = MemoryFs::with_file("a.txt", CP1251_PRIVET);
        fs.failing_renames.set(1);

        let encoding =
            replace_in_place_with(&fs, Path::new("a.txt"), ReplaceStrategy::RemoveAndRetry)
                .unwrap();

        assert_eq!(encoding, Encoding::WINDOWS_1251);
        assert_eq!(fs.get("a.txt").unwrap(), "Привет".as_bytes());
        assert_eq!(fs.get("a.txt.utf8.tmp"), None);
    }

    #[test]
    fn test_failed_retry_leaves_no_file() {
        let fs = MemoryFs::with_file("a.txt", CP1251_PRIVET);
        fs.failing_renames.set(2);

        let err = replace_in_place_with(&fs, Path::new("a.txt"), ReplaceStrategy::RemoveAndRetry)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Replace {
                original_removed: true,
                ..
            }
        ));
        assert_eq!(fs.get("a.txt"), None);
        assert_eq!(fs.get("a.txt.utf8.tmp"), None);
    }

    #[test]
    fn test_rename_only_keeps_original() {
        let fs = MemoryFs::with_file("a.txt", CP1251_PRIVET);
        fs.failing_renames.set(1);

        let err = replace_in_place_with(&fs, Path::new("a.txt"), ReplaceStrategy::RenameOnly)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Replace {
                original_removed: false,
                ..
            }
        ));
        assert_eq!(fs.get("a.txt").unwrap(), CP1251_PRIVET);
        assert_eq!(fs.get("a.txt.utf8.tmp"), None);
    }

    #[test]
    fn test_failed_write_cleans_up() {
        let fs = MemoryFs {
            fail_writes: true,
            ..MemoryFs::with_file("a.txt", CP1251_PRIVET)
        };

        let err = replace_in_place_with(&fs, Path::new("a.txt"), ReplaceStrategy::default())
            .unwrap_err();

        assert!(matches!(err, Error::Write { .. }));
        assert_eq!(fs.get("a.txt").unwrap(), CP1251_PRIVET);
        assert_eq!(fs.get("a.txt.utf8.tmp"), None);
    }

    #[test]
    fn test_missing_input() {
        let fs = MemoryFs::default();
        let err = replace_in_place_with(&fs, Path::new("nope.txt"), ReplaceStrategy::default())
            .unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }

    #[test]
    fn test_std_file_system() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("privet.txt");
        std::fs::write(&path, CP1251_PRIVET).unwrap();

        let encoding =
            replace_in_place_with(&StdFileSystem, &path, ReplaceStrategy::RenameOnly).unwrap();

        assert_eq!(encoding, Encoding::WINDOWS_1251);
        assert_eq!(std::fs::read(&path).unwrap(), "Привет".as_bytes());
        assert!(!temp_path(&path).exists());
    }
}
