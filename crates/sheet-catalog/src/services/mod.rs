//! Service layer for business logic
//!
//! Services sit between the web handlers and the repository. They depend on
//! the [`SheetRepository`](crate::repositories::SheetRepository) trait, never
//! on a concrete store, and own all request validation.

pub mod pagination;
pub mod resource_locator;
pub mod safe_name;
pub mod sheet_deletion;

pub use pagination::{PaginationEngine, RawListParams};
pub use resource_locator::ResourceLocator;
pub use safe_name::{SafeNameResolver, derive_safe_name};
pub use sheet_deletion::{DeletionOutcome, SheetDeletionService};
