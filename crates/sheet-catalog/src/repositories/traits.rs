//! Repository trait definitions

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::RepositoryResult;
use crate::models::{Sheet, SheetCreateRequest, SheetListQuery};

#[cfg(test)]
use mockall::automock;

/// Storage contract for sheets
///
/// Absence is never an error: lookups return `Ok(None)` and deletes report
/// the number of affected rows.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SheetRepository: Send + Sync {
    /// Record a new sheet, deriving both safe names
    ///
    /// A title whose safe name is already used gets the next free `-N`
    /// suffix, so a safe sheet name identifies one record.
    async fn create(&self, request: SheetCreateRequest) -> RepositoryResult<Sheet>;

    /// Find the sheet whose `safe_sheet_name` equals `safe_name` exactly
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Sheet))` - Sheet found
    /// * `Ok(None)` - No sheet has this safe name
    /// * `Err(RepositoryError)` - Database error
    async fn find_by_safe_name(&self, safe_name: &str) -> RepositoryResult<Option<Sheet>>;

    /// Run one paged query
    ///
    /// # Returns
    ///
    /// * `Ok((items, total))` - The page, and the number of rows matching the
    ///   filter across all pages
    async fn list_paged(&self, query: &SheetListQuery) -> RepositoryResult<(Vec<Sheet>, u64)>;

    /// Delete the sheet with this safe name, provided it is still record `id`
    ///
    /// Pinning the id keeps a delete from reaching a newer sheet that took
    /// over the name after the caller resolved it.
    ///
    /// # Returns
    ///
    /// * `Ok(n)` - Rows removed; `0` when another request deleted it first
    async fn delete_by_safe_name(&self, safe_name: &str, id: Uuid) -> RepositoryResult<u64>;
}
