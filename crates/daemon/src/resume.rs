use std::path::Path;

use checksums::StreamingHasher;

/// Where payload reception should resume from, and the hasher state it
/// should continue from.
pub struct Resume {
    pub offset: u64,
    pub hasher: StreamingHasher,
    /// `true` when the existing temp file already matched the declared
    /// digest end to end, so there is nothing left to receive.
    pub already_complete: bool,
}

/// Computes the resume point for an inbound transfer from whatever temp
/// file (if any) already exists at `temp_path`.
pub fn compute_resume(
    temp_path: &Path,
    file_size: u64,
    sha256_hex: &str,
) -> std::io::Result<Resume> {
    let existing_len = match std::fs::metadata(temp_path) {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
        Err(e) => return Err(e),
    };

    if existing_len == 0 {
        return Ok(Resume {
            offset: 0,
            hasher: StreamingHasher::new(),
            already_complete: false,
        });
    }

    if existing_len > file_size {
        return Ok(Resume {
            offset: 0,
            hasher: StreamingHasher::new(),
            already_complete: false,
        });
    }

    if existing_len == file_size {
        let digest = checksums::hash_file_hex(temp_path)?;
        if digest == sha256_hex {
            let hasher = StreamingHasher::seeded_from_prefix(temp_path, existing_len)?;
            return Ok(Resume {
                offset: file_size,
                hasher,
                already_complete: true,
            });
        }
        return Ok(Resume {
            offset: 0,
            hasher: StreamingHasher::new(),
            already_complete: false,
        });
    }

    let hasher = StreamingHasher::seeded_from_prefix(temp_path, existing_len)?;
    Ok(Resume {
        offset: existing_len,
        hasher,
        already_complete: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_temp_starts_from_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let resume = compute_resume(&dir.path().join("missing"), 100, &"a".repeat(64)).unwrap();
        assert_eq!(resume.offset, 0);
        assert!(!resume.already_complete);
    }

    #[test]
    fn oversized_temp_restarts_from_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        std::fs::write(&path, vec![0_u8; 200]).unwrap();
        let resume = compute_resume(&path, 100, &"a".repeat(64)).unwrap();
        assert_eq!(resume.offset, 0);
    }

    #[test]
    fn matching_full_length_temp_is_treated_as_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        let data = b"hello world";
        std::fs::write(&path, data).unwrap();
        let digest = checksums::hash_file_hex(&path).unwrap();

        let resume = compute_resume(&path, data.len() as u64, &digest).unwrap();
        assert!(resume.already_complete);
        assert_eq!(resume.offset, data.len() as u64);
    }

    #[test]
    fn mismatched_full_length_temp_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        std::fs::write(&path, b"hello world").unwrap();

        let resume = compute_resume(&path, 11, &"0".repeat(64)).unwrap();
        assert_eq!(resume.offset, 0);
        assert!(!resume.already_complete);
    }

    #[test]
    fn partial_temp_seeds_hasher_and_resumes_from_its_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"hello ").unwrap();
        drop(file);

        let resume = compute_resume(&path, 11, &"0".repeat(64)).unwrap();
        assert_eq!(resume.offset, 6);
        assert!(!resume.already_complete);
    }
}
