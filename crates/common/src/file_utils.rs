use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Error type for resolving a filename inside the storage directory
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Filename cannot be empty")]
    Empty,
    #[error("Filename cannot contain null bytes")]
    ContainsNullByte,
    #[error("Illegal file path: resolves outside the storage directory")]
    OutsideRoot,
    #[error("Illegal file path: does not name a file inside the storage directory")]
    IsRoot,
}

impl PathError {
    /// Whether the error is a path-safety violation rather than malformed input
    pub fn is_traversal(&self) -> bool {
        matches!(self, PathError::OutsideRoot | PathError::IsRoot)
    }
}

/// Sanitize a client-supplied upload filename.
///
/// Surrounding whitespace is trimmed, then every `/` and `\` is removed.
/// Returns `None` when nothing is left.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '/' && *c != '\\')
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Join `filename` onto `root` and normalize the result without touching the filesystem.
///
/// `.` segments are dropped, `..` pops one component and root/prefix
/// components inside `filename` are ignored, so `//etc/passwd` cannot
/// replace the root. The normalized path must be strictly inside `root`
/// (component-wise, so `/data2` is not inside `/data`).
pub fn resolve_within(root: &Path, filename: &str) -> Result<PathBuf, PathError> {
    if filename.is_empty() {
        return Err(PathError::Empty);
    }

    if filename.contains('\0') {
        return Err(PathError::ContainsNullByte);
    }

    let mut resolved = root.to_path_buf();
    for component in Path::new(filename).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::ParentDir => {
                resolved.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if !resolved.starts_with(root) {
        return Err(PathError::OutsideRoot);
    }

    if resolved == root {
        return Err(PathError::IsRoot);
    }

    Ok(resolved)
}
