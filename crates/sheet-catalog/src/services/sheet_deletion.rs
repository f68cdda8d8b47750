//! Authenticated removal of a sheet and its assets
//!
//! The record is deleted first and committed; asset removal follows and is
//! best-effort. Any exit before `RecordDeleted` leaves the filesystem alone.

use std::path::PathBuf;
use std::sync::Arc;

use sandboxed_assets::SandboxError;
use serde::Serialize;
use strum::Display;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::auth::TokenVerifier;
use crate::errors::{AppError, AppResult};
use crate::models::Sheet;
use crate::repositories::SheetRepository;
use crate::services::resource_locator::ResourceLocator;
use crate::services::safe_name::SafeNameResolver;

pub const DELETION_SUCCESS_MESSAGE: &str = "Sheet was successfully deleted";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DeletionState {
    Requested,
    Authorized,
    RecordFound,
    RecordDeleted,
    AssetsDeleted,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Pdf,
    Thumbnail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssetOutcome {
    Removed,
    /// Nothing to remove; not a failure
    Missing,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssetCleanup {
    pub kind: AssetKind,
    /// Relative to the asset root
    pub path: String,
    pub outcome: AssetOutcome,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeletionOutcome {
    pub message: String,
    pub sheet: Sheet,
    pub assets: Vec<AssetCleanup>,
}

#[derive(Clone)]
pub struct SheetDeletionService {
    resolver: SafeNameResolver,
    repository: Arc<dyn SheetRepository>,
    locator: ResourceLocator,
    verifier: Arc<dyn TokenVerifier>,
}

impl SheetDeletionService {
    pub fn new(
        repository: Arc<dyn SheetRepository>,
        locator: ResourceLocator,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            resolver: SafeNameResolver::new(repository.clone()),
            repository,
            locator,
            verifier,
        }
    }

    /// Delete the sheet named `safe_name` on behalf of the bearer of `token`
    ///
    /// # Errors
    /// - `Unauthorized` when the token is missing or fails verification
    /// - `MissingParameter` when `safe_name` is blank
    /// - `NotFound` when no record exists, or another request deleted it first
    /// - `DeletionFailed` when the repository refuses the delete
    pub async fn delete(&self, token: Option<&str>, safe_name: &str) -> AppResult<DeletionOutcome> {
        let mut state = DeletionState::Requested;

        let token = token.ok_or_else(|| {
            warn!(safe_name = %safe_name, "Sheet deletion without bearer token");
            AppError::unauthorized("Missing bearer token")
        })?;
        let identity = self.verifier.verify(token).map_err(|e| {
            warn!(safe_name = %safe_name, error = %e, "Sheet deletion with rejected token");
            AppError::unauthorized(e.to_string())
        })?;
        advance(&mut state, DeletionState::Authorized, safe_name);

        if safe_name.trim().is_empty() {
            return Err(AppError::missing_parameter("sheet_name"));
        }
        let sheet = self
            .resolver
            .resolve(safe_name)
            .await?
            .ok_or_else(|| AppError::not_found("sheet", safe_name))?;
        advance(&mut state, DeletionState::RecordFound, safe_name);

        let affected = self
            .repository
            .delete_by_safe_name(&sheet.safe_sheet_name, sheet.id)
            .await
            .map_err(|e| {
                error!(safe_name = %safe_name, error = %e, "Failed to delete sheet record");
                AppError::DeletionFailed {
                    message: format!("Failed to delete sheet '{safe_name}'"),
                }
            })?;
        if affected == 0 {
            info!(safe_name = %safe_name, "Sheet was deleted concurrently");
            return Err(AppError::not_found("sheet", safe_name));
        }
        advance(&mut state, DeletionState::RecordDeleted, safe_name);

        let assets = vec![
            self.remove_asset(
                AssetKind::Pdf,
                self.locator
                    .locate_pdf(&sheet.safe_composer_name, &sheet.safe_sheet_name),
            )
            .await,
            self.remove_asset(
                AssetKind::Thumbnail,
                self.locator.locate_thumbnail(&sheet.safe_sheet_name),
            )
            .await,
        ];
        advance(&mut state, DeletionState::AssetsDeleted, safe_name);

        info!(
            safe_name = %safe_name,
            subject = %identity.subject,
            "Deleted sheet"
        );
        advance(&mut state, DeletionState::Done, safe_name);

        Ok(DeletionOutcome {
            message: DELETION_SUCCESS_MESSAGE.to_string(),
            sheet,
            assets,
        })
    }

    async fn remove_asset(&self, kind: AssetKind, located: AppResult<PathBuf>) -> AssetCleanup {
        let path = match located {
            Ok(path) => path,
            Err(e) => {
                warn!(?kind, error = %e, "Cannot locate asset of deleted sheet");
                return AssetCleanup {
                    kind,
                    path: String::new(),
                    outcome: AssetOutcome::Failed {
                        reason: e.to_string(),
                    },
                };
            }
        };

        let relative = self.locator.display_relative(&path);
        let outcome = match self.locator.remove(&path).await {
            Ok(()) => AssetOutcome::Removed,
            Err(SandboxError::NotFound { .. }) => {
                info!(?kind, path = %relative, "Asset of deleted sheet was already absent");
                AssetOutcome::Missing
            }
            Err(e) => {
                warn!(
                    ?kind,
                    path = %relative,
                    error = %e,
                    "Failed to remove asset of deleted sheet"
                );
                AssetOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        AssetCleanup {
            kind,
            path: relative,
            outcome,
        }
    }
}

fn advance(state: &mut DeletionState, next: DeletionState, safe_name: &str) {
    debug!(safe_name = %safe_name, from = %state, to = %next, "Deletion state");
    *state = next;
}
