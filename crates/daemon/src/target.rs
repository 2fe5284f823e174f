use std::path::{Path, PathBuf};

use pathsafe::PathError;

/// Result of duplicate-aware target selection: where the finished file
/// will live, where its in-progress temp file lives, and whether an
/// existing temp file was found (a true resume) rather than started
/// fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub final_path: PathBuf,
    pub temp_path: PathBuf,
    pub reused_temp: bool,
    /// Duplicate-suffix index this selection was found at, and the base
    /// (unsuffixed) file name, so promotion can advance past a race with
    /// another session without re-walking from index zero.
    pub index: u32,
    pub base_file_name: String,
}

/// Chooses where an inbound file should land, scanning `stem(i).ext`
/// suffixes until it finds either a matching in-progress temp file (to
/// resume) or a final path that does not yet exist (to start fresh).
///
/// The temp file alongside candidate index `i` is named
/// `<final-name>.<digest-prefix-16>.local-sent.part`.
pub fn select_target(
    output_dir: &Path,
    relative_path: &str,
    sha256_hex: &str,
) -> Result<Selection, PathError> {
    let final_path = pathsafe::resolve(output_dir, relative_path)?;
    let parent = final_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| output_dir.to_path_buf());
    let file_name = final_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or(PathError::EmptyPath)?;
    let digest_prefix = &sha256_hex[..16.min(sha256_hex.len())];

    for index in 0..pathsafe::MAX_DUPLICATE_ATTEMPTS {
        let candidate_name = pathsafe::duplicate_candidate(file_name, index);
        let candidate_final = parent.join(&candidate_name);
        let temp_path = parent.join(format!("{candidate_name}.{digest_prefix}.local-sent.part"));

        if temp_path.exists() {
            return Ok(Selection {
                final_path: candidate_final,
                temp_path,
                reused_temp: true,
                index,
                base_file_name: file_name.to_string(),
            });
        }
        if !candidate_final.exists() {
            return Ok(Selection {
                final_path: candidate_final,
                temp_path,
                reused_temp: false,
                index,
                base_file_name: file_name.to_string(),
            });
        }
    }

    Err(PathError::NoFreeName {
        attempts: pathsafe::MAX_DUPLICATE_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const DIGEST: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcd";

    #[test]
    fn fresh_target_has_no_existing_temp() {
        let dir = tempfile::tempdir().unwrap();
        let selection = select_target(dir.path(), "a.txt", DIGEST).unwrap();
        assert_eq!(selection.final_path, dir.path().join("a.txt"));
        assert!(!selection.reused_temp);
        assert!(selection.temp_path.to_string_lossy().contains("0123456789abcdef"));
    }

    #[test]
    fn matching_temp_file_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let temp_name = format!("a.txt.{}.local-sent.part", &DIGEST[..16]);
        fs::write(dir.path().join(&temp_name), b"partial").unwrap();

        let selection = select_target(dir.path(), "a.txt", DIGEST).unwrap();
        assert!(selection.reused_temp);
        assert_eq!(selection.final_path, dir.path().join("a.txt"));
    }

    #[test]
    fn existing_final_without_matching_temp_advances_to_next_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"already here").unwrap();

        let selection = select_target(dir.path(), "a.txt", DIGEST).unwrap();
        assert!(!selection.reused_temp);
        assert_eq!(selection.final_path, dir.path().join("a(1).txt"));
    }
}
