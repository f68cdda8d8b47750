//! Sandbox root: resolves caller supplied segments to paths beneath a base
//! directory and performs the few file operations the service needs there.

use crate::{
    error::{Result, SandboxError},
    security::{ensure_lexically_within, validate_path_within_sandbox, validate_segment},
};

use std::path::{Path, PathBuf};
use tokio::fs;

/// A base directory that every resolved path must stay inside.
#[derive(Clone, Debug)]
pub struct SandboxedRoot {
    base_dir: PathBuf,
}

impl SandboxedRoot {
    /// Create a new builder for configuring the root.
    #[must_use]
    pub fn builder() -> SandboxedRootBuilder {
        SandboxedRootBuilder::new()
    }

    /// The absolute base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Joins `segments` under the base directory.
    ///
    /// Every segment is validated on its own before the join, then the joined path
    /// is checked lexically against the base.
    ///
    /// # Errors
    /// Returns [`SandboxError::SegmentRejected`] or [`SandboxError::PathValidation`].
    pub fn resolve<'a, I>(&self, segments: I) -> Result<PathBuf>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut path = self.base_dir.clone();
        let mut joined = 0usize;
        for segment in segments {
            validate_segment(segment)?;
            path.push(segment);
            joined += 1;
        }

        if joined == 0 {
            return Err(SandboxError::PathValidation {
                path,
                reason: "No path segments supplied".to_string(),
            });
        }

        ensure_lexically_within(&path, &self.base_dir)
    }

    /// Resolves `<dirs...>/<stem>.<extension>` under the base directory.
    ///
    /// The stem is validated before the extension is appended, so a stem such as
    /// `""` or `"."` cannot hide behind the extension.
    ///
    /// # Errors
    /// Returns [`SandboxError::SegmentRejected`] or [`SandboxError::PathValidation`].
    pub fn resolve_file(&self, dirs: &[&str], stem: &str, extension: &str) -> Result<PathBuf> {
        validate_segment(stem)?;
        validate_segment(extension)?;
        let file_name = format!("{stem}.{extension}");
        self.resolve(dirs.iter().copied().chain(std::iter::once(file_name.as_str())))
    }

    /// Sandboxed version of `tokio::fs::File::open`.
    ///
    /// The path must have come from [`SandboxedRoot::resolve`]; it is checked again
    /// after symlink resolution.
    ///
    /// # Errors
    /// Returns [`SandboxError::NotFound`] when the file does not exist.
    pub async fn open(&self, path: &Path) -> Result<fs::File> {
        ensure_lexically_within(path, &self.base_dir)?;
        validate_path_within_sandbox(path, &self.base_dir)?;

        fs::File::open(path).await.map_err(|e| not_found_or_io(path, e))
    }

    /// Sandboxed version of `tokio::fs::remove_file`.
    ///
    /// # Errors
    /// Returns [`SandboxError::NotFound`] when the file does not exist.
    pub async fn remove_file(&self, path: &Path) -> Result<()> {
        ensure_lexically_within(path, &self.base_dir)?;
        validate_path_within_sandbox(path, &self.base_dir)?;

        fs::remove_file(path)
            .await
            .map_err(|e| not_found_or_io(path, e))?;
        tracing::debug!("Removed sandboxed file {:?}", path);
        Ok(())
    }

    /// Sandboxed version of `tokio::fs::write`, creating parent directories.
    ///
    /// # Errors
    /// Returns an error if the path escapes the sandbox or the write fails.
    pub async fn write<C: AsRef<[u8]>>(&self, path: &Path, contents: C) -> Result<()> {
        ensure_lexically_within(path, &self.base_dir)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SandboxError::DirectoryCreation {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        fs::write(path, contents.as_ref()).await?;
        Ok(())
    }
}

fn not_found_or_io(path: &Path, error: std::io::Error) -> SandboxError {
    if error.kind() == std::io::ErrorKind::NotFound {
        SandboxError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        SandboxError::Io(error)
    }
}

/// Builder for [`SandboxedRoot`].
#[derive(Debug, Default)]
pub struct SandboxedRootBuilder {
    base_directory: Option<PathBuf>,
    create_missing: bool,
}

impl SandboxedRootBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Set the base directory for asset storage.
    #[must_use]
    pub fn base_directory<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.base_directory = Some(path.into());
        self
    }

    /// Create the base directory when it does not exist yet.
    #[must_use]
    pub fn create_missing(mut self, create: bool) -> Self {
        self.create_missing = create;
        self
    }

    /// Build the `SandboxedRoot`.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Base directory is not set
    /// - Base directory cannot be made absolute or created
    pub async fn build(self) -> Result<SandboxedRoot> {
        let base_dir = self
            .base_directory
            .ok_or_else(|| SandboxError::Configuration {
                message: "Base directory is required".to_string(),
            })?;

        let base_dir = std::path::absolute(&base_dir)?;
        let base_dir = crate::security::normalize_lexically(&base_dir).ok_or_else(|| {
            SandboxError::Configuration {
                message: format!("Base directory {base_dir:?} cannot be normalized"),
            }
        })?;

        if self.create_missing {
            fs::create_dir_all(&base_dir)
                .await
                .map_err(|e| SandboxError::DirectoryCreation {
                    path: base_dir.clone(),
                    source: e,
                })?;
        }

        tracing::info!("SandboxedRoot initialized - base_dir: {:?}", base_dir);

        Ok(SandboxedRoot { base_dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    async fn root_in(dir: &Path) -> SandboxedRoot {
        SandboxedRoot::builder()
            .base_directory(dir)
            .create_missing(true)
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_resolve_stays_inside_base() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = root_in(temp_dir.path()).await;

        let path = root
            .resolve_file(&["sheets", "thumbnails"], "nocturne", "png")
            .unwrap();
        assert!(path.starts_with(root.base_dir()));
        assert!(path.ends_with("sheets/thumbnails/nocturne.png"));
    }

    #[tokio::test]
    async fn test_resolve_rejects_traversal_segments() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = root_in(temp_dir.path()).await;

        for stem in ["..", ".", "", "../../etc/passwd", "nocturne/../../x"] {
            let err = root
                .resolve_file(&["sheets", "thumbnails"], stem, "png")
                .unwrap_err();
            assert!(err.is_path_violation(), "{stem:?} gave {err}");
        }

        assert!(root.resolve(std::iter::empty()).is_err());
    }

    #[tokio::test]
    async fn test_write_open_remove_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = root_in(temp_dir.path()).await;

        let path = root
            .resolve_file(&["sheets", "uploaded-sheets", "chopin"], "etude", "pdf")
            .unwrap();
        root.write(&path, b"%PDF-1.7").await.unwrap();

        let mut file = root.open(&path).await.unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await.unwrap();
        assert_eq!(contents, b"%PDF-1.7");

        root.remove_file(&path).await.unwrap();
        assert!(matches!(
            root.remove_file(&path).await,
            Err(SandboxError::NotFound { .. })
        ));
        assert!(matches!(
            root.open(&path).await,
            Err(SandboxError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_open_rejects_paths_outside_base() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = root_in(temp_dir.path()).await;

        let outside = temp_dir.path().join("..").join("elsewhere.pdf");
        assert!(root.open(&outside).await.unwrap_err().is_path_violation());
    }

    #[tokio::test]
    async fn test_builder_requires_base_directory() {
        assert!(matches!(
            SandboxedRoot::builder().build().await,
            Err(SandboxError::Configuration { .. })
        ));
    }

    proptest::proptest! {
        #[test]
        fn resolved_paths_never_escape(stem in "\\PC{0,24}", dir in "[./a-z]{0,8}") {
            let root = SandboxedRoot { base_dir: PathBuf::from("/srv/assets") };
            if let Ok(path) = root.resolve_file(&[dir.as_str()], &stem, "pdf") {
                proptest::prop_assert!(path.starts_with("/srv/assets"));
                proptest::prop_assert!(path != PathBuf::from("/srv/assets"));
            }
        }
    }
}
