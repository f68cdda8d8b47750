//! Repository pattern implementation for data access
//!
//! Business logic depends on the traits here, never on SeaORM directly. The
//! SeaORM implementations live in [`crate::database::repositories`].
//!
//! # Usage
//!
//! ```rust
//! use sheet_catalog::repositories::SheetRepository;
//!
//! async fn example(repo: &dyn SheetRepository) -> Result<(), Box<dyn std::error::Error>> {
//!     if let Some(sheet) = repo.find_by_safe_name("etude-op-10-no-3").await? {
//!         println!("{} by {}", sheet.title, sheet.composer);
//!     }
//!     Ok(())
//! }
//! ```

pub mod traits;

pub use traits::*;
