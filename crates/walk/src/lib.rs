//! Expands a file or directory into ordered transfer entries (component
//! C10).

mod error;

use std::path::{Path, PathBuf};

pub use error::WalkError;

/// One file to send: its location on disk, the POSIX-style relative path
/// it will be sent under, and its size as of the walk.
///
/// Immutable once built; a batch is built once and then consumed entry by
/// entry by the sender engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEntry {
    pub absolute_source_path: PathBuf,
    pub relative_path: String,
    pub size_bytes: u64,
}

/// Expands `path` into the ordered list of files it represents.
///
/// A regular file yields one entry named by its own file name. A
/// directory is walked recursively; entries are sorted by relative path,
/// and a directory containing no files anywhere beneath it is rejected
/// rather than silently producing an empty batch.
pub fn build_transfer_entries(path: &Path) -> Result<Vec<TransferEntry>, WalkError> {
    let metadata = std::fs::symlink_metadata(path).map_err(|source| WalkError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut entries = if metadata.is_file() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        vec![TransferEntry {
            absolute_source_path: path.to_path_buf(),
            relative_path: name,
            size_bytes: metadata.len(),
        }]
    } else if metadata.is_dir() {
        let mut entries = Vec::new();
        walk_dir(path, path, &mut entries)?;
        entries
    } else {
        return Err(WalkError::NotRegularOrDirectory(path.to_path_buf()));
    };

    if entries.is_empty() {
        return Err(WalkError::EmptyDirectory(path.to_path_buf()));
    }

    entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(entries)
}

fn walk_dir(root: &Path, dir: &Path, entries: &mut Vec<TransferEntry>) -> Result<(), WalkError> {
    let read_dir = std::fs::read_dir(dir).map_err(|source| WalkError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for item in read_dir {
        let item = item.map_err(|source| WalkError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let child_path = item.path();
        let metadata = std::fs::symlink_metadata(&child_path).map_err(|source| WalkError::Io {
            path: child_path.clone(),
            source,
        })?;

        if metadata.is_dir() {
            walk_dir(root, &child_path, entries)?;
        } else if metadata.is_file() {
            let relative = relative_posix_path(root, &child_path);
            entries.push(TransferEntry {
                absolute_source_path: child_path,
                relative_path: relative,
                size_bytes: metadata.len(),
            });
        }
        // Symlinks and other non-regular entries are skipped.
    }
    Ok(())
}

fn relative_posix_path(root: &Path, child: &Path) -> String {
    let relative = child.strip_prefix(root).unwrap_or(child);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn single_file_yields_one_entry_named_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"alpha").unwrap();

        let entries = build_transfer_entries(&file).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].relative_path, "a.txt");
        assert_eq!(entries[0].size_bytes, 5);
    }

    #[test]
    fn directory_is_walked_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), b"bravo").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("a.txt"), b"alpha").unwrap();

        let entries = build_transfer_entries(dir.path()).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.relative_path.clone()).collect();
        assert_eq!(paths, vec!["b.txt", "sub/a.txt"]);
    }

    #[test]
    fn empty_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_transfer_entries(dir.path()).unwrap_err();
        assert!(matches!(err, WalkError::EmptyDirectory(_)));
    }

    #[test]
    fn directory_with_only_empty_subdirectories_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        let err = build_transfer_entries(dir.path()).unwrap_err();
        assert!(matches!(err, WalkError::EmptyDirectory(_)));
    }
}
