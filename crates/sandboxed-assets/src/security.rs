//! Security utilities for path validation and sandboxing.

use crate::error::{Result, SandboxError};
use std::path::{Component, Path, PathBuf};

/// Validates a single caller supplied path segment.
///
/// The segment is rejected outright, never repaired: empty values, `.` and `..`,
/// anything containing `..`, path separators, NUL bytes, control characters or
/// a drive/absolute prefix.
pub fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(SandboxError::rejected(segment, "Segment cannot be empty"));
    }

    if segment.contains('\0') {
        return Err(SandboxError::rejected(segment, "Segment contains null bytes"));
    }

    if segment.chars().any(char::is_control) {
        return Err(SandboxError::rejected(
            segment,
            "Segment contains control characters",
        ));
    }

    if segment.contains('/') || segment.contains('\\') {
        return Err(SandboxError::rejected(
            segment,
            "Segment contains a path separator",
        ));
    }

    if segment == "." || segment.contains("..") {
        return Err(SandboxError::rejected(
            segment,
            "Segment contains a parent or current directory reference",
        ));
    }

    // Catches drive prefixes such as `C:` on Windows
    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(SandboxError::rejected(
            segment,
            "Segment is not a single relative path component",
        )),
    }
}

/// Resolves `.` and `..` components without touching the filesystem.
///
/// Returns `None` when a `..` would climb above the first component of the path.
pub fn normalize_lexically(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                normalized.pop();
                depth -= 1;
            }
            Component::Normal(part) => {
                normalized.push(part);
                depth += 1;
            }
        }
    }

    Some(normalized)
}

/// Verifies lexically that `candidate` stays inside `base` once both are normalized.
pub fn ensure_lexically_within(candidate: &Path, base: &Path) -> Result<PathBuf> {
    let normalized_base = normalize_lexically(base).ok_or_else(|| SandboxError::PathValidation {
        path: base.to_path_buf(),
        reason: "Sandbox base cannot be normalized".to_string(),
    })?;

    let normalized = normalize_lexically(candidate).ok_or_else(|| SandboxError::PathValidation {
        path: candidate.to_path_buf(),
        reason: "Path climbs above its root".to_string(),
    })?;

    if normalized == normalized_base || !normalized.starts_with(&normalized_base) {
        return Err(SandboxError::PathValidation {
            path: candidate.to_path_buf(),
            reason: format!(
                "Path escapes sandbox: resolves to '{}' (outside '{}')",
                normalized.display(),
                normalized_base.display()
            ),
        });
    }

    Ok(normalized)
}

/// Validates that an existing path is within the specified sandbox directory once
/// symlinks are resolved by the OS.
pub fn validate_path_within_sandbox(resolved_path: &Path, sandbox_base: &Path) -> Result<()> {
    let canonical_base =
        sandbox_base
            .canonicalize()
            .map_err(|e| SandboxError::PathValidation {
                path: sandbox_base.to_path_buf(),
                reason: format!("Failed to resolve sandbox base: {e}"),
            })?;

    let canonical_path = match resolved_path.canonicalize() {
        Ok(path) => path,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SandboxError::NotFound {
                path: resolved_path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(SandboxError::PathValidation {
                path: resolved_path.to_path_buf(),
                reason: format!("Failed to resolve path: {e}"),
            });
        }
    };

    if !canonical_path.starts_with(&canonical_base) {
        return Err(SandboxError::PathValidation {
            path: resolved_path.to_path_buf(),
            reason: format!(
                "Path escapes sandbox: resolves to '{}' (outside '{}')",
                canonical_path.display(),
                canonical_base.display()
            ),
        });
    }

    Ok(())
}
