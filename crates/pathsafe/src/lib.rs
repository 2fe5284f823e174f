//! Path normalization and traversal rejection for inbound transfer paths.
//!
//! Every path a receiver writes to disk starts as a string supplied by the
//! remote peer over the wire. This crate is the only place that string is
//! allowed to become a filesystem path: [`normalize`] rejects anything that
//! could escape the output directory, and [`resolve`] re-checks the joined
//! result before handing it back, so a bug in one function does not silently
//! disable the other.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Errors raised while normalizing or resolving an inbound relative path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The supplied path was empty, `.`, `..`, or otherwise had no usable
    /// normalized form.
    #[error("relative path is empty or has no usable segments")]
    EmptyPath,
    /// The supplied path contained a `..` segment anywhere.
    #[error("relative path contains a parent-directory segment")]
    Traversal,
    /// The supplied path had an absolute prefix (leading separator or drive).
    #[error("relative path must not be absolute")]
    Absolute,
    /// After joining to the output root, the resolved path was not a
    /// descendant of that root.
    #[error("path escapes output directory")]
    Escapes,
    /// Duplicate-aware naming could not find a free slot within the bound.
    #[error("no free filename found after {attempts} attempts")]
    NoFreeName {
        /// Number of candidate suffixes tried before giving up.
        attempts: u32,
    },
}

/// Upper bound on the duplicate-suffix search in [`next_free_path`] and the
/// promotion retry loop, matching the wire protocol's documented behavior.
pub const MAX_DUPLICATE_ATTEMPTS: u32 = 10_000;

/// Normalizes an inbound relative path: backslashes become forward slashes,
/// `.` segments and repeated slashes collapse, and the result is rejected if
/// it is empty, `.`, `..`, or contains a `..` segment anywhere.
///
/// Returns a `/`-joined string (not a [`PathBuf`]) so callers can log or wire
/// the value before handing it to [`resolve`].
pub fn normalize(input: &str) -> Result<String, PathError> {
    let slash_form = input.replace('\\', "/");
    let trimmed = slash_form.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let mut segments: Vec<&str> = Vec::new();
    for raw in trimmed.split('/') {
        match raw {
            "" | "." => continue,
            ".." => return Err(PathError::Traversal),
            seg => segments.push(seg),
        }
    }

    if segments.is_empty() {
        return Err(PathError::EmptyPath);
    }

    // A leading slash was already stripped by the split-and-skip above, but
    // an absolute Windows-style prefix like `C:/` would have survived as a
    // normal segment; reject it explicitly.
    if segments[0].len() >= 2 && segments[0].as_bytes()[1] == b':' {
        return Err(PathError::Absolute);
    }

    Ok(segments.join("/"))
}

/// Joins a normalized relative path onto `output_root`, using the local path
/// separator, and verifies the resolved path is a descendant of the root.
pub fn resolve(output_root: &Path, relative: &str) -> Result<PathBuf, PathError> {
    let normalized = normalize(relative)?;

    let mut joined = output_root.to_path_buf();
    for segment in normalized.split('/') {
        joined.push(segment);
    }

    let root_components: Vec<Component<'_>> = output_root.components().collect();
    let joined_components: Vec<Component<'_>> = joined.components().collect();
    if joined_components.len() <= root_components.len()
        || joined_components[..root_components.len()] != root_components[..]
    {
        return Err(PathError::Escapes);
    }

    Ok(joined)
}

/// Splits a file name into `(stem, extension)`, where `extension` includes
/// the leading dot (or is empty when the name has none). A leading dot on an
/// otherwise-bare dotfile (`.gitignore`) is treated as part of the stem.
#[must_use]
pub fn split_stem_ext(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(0) => (file_name, ""),
        Some(idx) => file_name.split_at(idx),
        None => (file_name, ""),
    }
}

/// Builds the `stem(i).ext` candidate name for duplicate-aware selection.
/// `i == 0` returns the name unchanged.
#[must_use]
pub fn duplicate_candidate(file_name: &str, index: u32) -> String {
    if index == 0 {
        return file_name.to_string();
    }
    let (stem, ext) = split_stem_ext(file_name);
    format!("{stem}({index}){ext}")
}

/// Finds the first index `i` in `0..MAX_DUPLICATE_ATTEMPTS` for which
/// `exists(candidate)` reports `false`, returning the resolved candidate
/// path alongside its index.
pub fn next_free_path(
    final_path: &Path,
    mut exists: impl FnMut(&Path) -> bool,
) -> Result<(PathBuf, u32), PathError> {
    let parent = final_path.parent().unwrap_or_else(|| Path::new(""));
    let file_name = final_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or(PathError::EmptyPath)?;

    for index in 0..MAX_DUPLICATE_ATTEMPTS {
        let candidate_name = duplicate_candidate(file_name, index);
        let candidate = parent.join(candidate_name);
        if !exists(&candidate) {
            return Ok((candidate, index));
        }
    }

    Err(PathError::NoFreeName {
        attempts: MAX_DUPLICATE_ATTEMPTS,
    })
}
