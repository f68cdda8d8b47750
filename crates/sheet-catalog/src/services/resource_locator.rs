//! Maps safe names to asset paths under the configured root
//!
//! Layout:
//! - `<root>/sheets/uploaded-sheets/<composer>/<title>.pdf`
//! - `<root>/sheets/thumbnails/<name>.png`
//!
//! Segments are rejected, never repaired. A rejected segment never reaches
//! the filesystem.

use std::path::{Path, PathBuf};

use sandboxed_assets::{SandboxError, SandboxedRoot};
use tracing::warn;

use crate::errors::{AppError, AppResult};

pub const SHEETS_DIR: &str = "sheets";
pub const UPLOADED_SHEETS_DIR: &str = "uploaded-sheets";
pub const THUMBNAILS_DIR: &str = "thumbnails";
pub const PDF_EXTENSION: &str = "pdf";
pub const THUMBNAIL_EXTENSION: &str = "png";

#[derive(Clone, Debug)]
pub struct ResourceLocator {
    root: SandboxedRoot,
}

impl ResourceLocator {
    pub fn new(root: SandboxedRoot) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &SandboxedRoot {
        &self.root
    }

    /// Path of the score PDF for a composer/title pair
    pub fn locate_pdf(&self, composer_safe: &str, title_safe: &str) -> AppResult<PathBuf> {
        self.root
            .resolve_file(
                &[SHEETS_DIR, UPLOADED_SHEETS_DIR, composer_safe],
                title_safe,
                PDF_EXTENSION,
            )
            .map_err(|e| rejected("pdf", &format!("{composer_safe}/{title_safe}"), e))
    }

    /// Path of the thumbnail image for a sheet
    pub fn locate_thumbnail(&self, safe_name: &str) -> AppResult<PathBuf> {
        self.root
            .resolve_file(&[SHEETS_DIR, THUMBNAILS_DIR], safe_name, THUMBNAIL_EXTENSION)
            .map_err(|e| rejected("thumbnail", safe_name, e))
    }

    /// Open a located asset for streaming
    ///
    /// # Errors
    /// `NotFound` when the file is absent, `InvalidPath` when it resolves
    /// outside the root (for example through a symlink).
    pub async fn open(&self, path: &Path) -> AppResult<tokio::fs::File> {
        match self.root.open(path).await {
            Ok(file) => Ok(file),
            Err(SandboxError::NotFound { .. }) => {
                Err(AppError::not_found("file", self.display_relative(path)))
            }
            Err(e) if e.is_path_violation() => {
                Err(rejected("asset", &self.display_relative(path), e))
            }
            Err(e) => Err(AppError::internal(format!(
                "Failed to open {}: {e}",
                self.display_relative(path)
            ))),
        }
    }

    /// Remove a located asset
    pub async fn remove(&self, path: &Path) -> Result<(), SandboxError> {
        self.root.remove_file(path).await
    }

    /// Path relative to the root, for messages that reach clients
    pub fn display_relative(&self, path: &Path) -> String {
        path.strip_prefix(self.root.base_dir())
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

fn rejected(kind: &str, requested: &str, error: SandboxError) -> AppError {
    warn!(
        security_event = "path_rejected",
        asset_kind = kind,
        requested = %requested.escape_debug(),
        reason = %error,
        "Rejected asset path"
    );
    AppError::invalid_path(format!("Invalid {kind} name"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tokio::io::AsyncReadExt;
    use tracing_test::traced_test;

    async fn locator(dir: &Path) -> ResourceLocator {
        let root = SandboxedRoot::builder()
            .base_directory(dir)
            .create_missing(true)
            .build()
            .await
            .unwrap();
        ResourceLocator::new(root)
    }

    #[tokio::test]
    async fn test_layout() {
        let temp_dir = tempfile::tempdir().unwrap();
        let locator = locator(temp_dir.path()).await;

        let pdf = locator.locate_pdf("frederic-chopin", "etude").unwrap();
        assert_eq!(
            locator.display_relative(&pdf),
            "sheets/uploaded-sheets/frederic-chopin/etude.pdf"
        );

        let png = locator.locate_thumbnail("etude").unwrap();
        assert_eq!(locator.display_relative(&png), "sheets/thumbnails/etude.png");
    }

    #[rstest]
    #[case("..")]
    #[case(".")]
    #[case("")]
    #[case("../../etc/passwd")]
    #[case("etude/../../../etc/passwd")]
    #[case("etude\\..\\secret")]
    #[case("etude\0")]
    #[case("/etc/passwd")]
    #[tokio::test]
    async fn test_traversal_is_rejected(#[case] segment: &str) {
        let temp_dir = tempfile::tempdir().unwrap();
        let locator = locator(temp_dir.path()).await;

        assert!(matches!(
            locator.locate_thumbnail(segment),
            Err(AppError::InvalidPath { .. })
        ));
        assert!(matches!(
            locator.locate_pdf(segment, "etude"),
            Err(AppError::InvalidPath { .. })
        ));
        assert!(matches!(
            locator.locate_pdf("chopin", segment),
            Err(AppError::InvalidPath { .. })
        ));
    }

    #[tokio::test]
    async fn test_traversal_appended_to_valid_name_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let locator = locator(temp_dir.path()).await;

        for suffix in ["/..", "/../..", "/../../../etc/passwd", "\\..", "/."] {
            let name = format!("etude{suffix}");
            assert!(locator.locate_thumbnail(&name).is_err(), "{name}");
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_rejection_is_logged_as_security_event() {
        let temp_dir = tempfile::tempdir().unwrap();
        let locator = locator(temp_dir.path()).await;

        assert!(locator.locate_thumbnail("../secret").is_err());
        assert!(logs_contain("Rejected asset path"));
        assert!(logs_contain("path_rejected"));
    }

    #[tokio::test]
    async fn test_open_missing_is_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let locator = locator(temp_dir.path()).await;

        let path = locator.locate_thumbnail("absent").unwrap();
        let err = locator.open(&path).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_open_reads_asset() {
        let temp_dir = tempfile::tempdir().unwrap();
        let locator = locator(temp_dir.path()).await;

        let path = locator.locate_pdf("chopin", "ballade").unwrap();
        locator.root().write(&path, b"%PDF-1.4").await.unwrap();

        let mut contents = Vec::new();
        locator
            .open(&path)
            .await
            .unwrap()
            .read_to_end(&mut contents)
            .await
            .unwrap();
        assert_eq!(contents, b"%PDF-1.4");
    }
}
