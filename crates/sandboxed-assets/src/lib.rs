//! # Sandboxed Assets
//!
//! Traversal-free path resolution beneath a configured asset root.
//!
//! Paths are built from caller supplied segments (often taken straight from a
//! request URL), so every segment is validated on its own and the joined path is
//! checked lexically against the base directory before it is returned. File
//! operations re-check the path after the OS resolves symlinks.
//!
//! ## Basic Usage
//!
//! ```rust
//! use sandboxed_assets::SandboxedRoot;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let root = SandboxedRoot::builder()
//!     .base_directory("/var/lib/sheets")
//!     .build()
//!     .await?;
//!
//! let pdf = root.resolve_file(
//!     &["sheets", "uploaded-sheets", "frederic-chopin"],
//!     "etude-op-10",
//!     "pdf",
//! )?;
//! assert!(pdf.starts_with(root.base_dir()));
//!
//! // Rejected, never sanitized
//! assert!(root.resolve_file(&["sheets", "thumbnails"], "../../etc/passwd", "png").is_err());
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Features
//!
//! - **Segment validation**: empty, `.`, `..`, separators, NUL and control
//!   characters are refused
//! - **Lexical containment**: the joined path must normalize to a location
//!   strictly inside the base
//! - **Symlink safety**: `open`/`remove_file` canonicalize and re-check

pub mod error;
pub mod root;
pub mod security;

pub use error::{Result, SandboxError};
pub use root::{SandboxedRoot, SandboxedRootBuilder};
