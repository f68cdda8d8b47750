use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod pagination;

pub use pagination::{PageResult, PaginationSpec, SheetListQuery, SortDirection, SortField};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(description = "A catalogued score document with its derived safe names")]
pub struct Sheet {
    pub id: Uuid,
    #[schema(example = "Étude Op. 10 No. 3")]
    pub title: String,
    #[schema(example = "Frédéric Chopin")]
    pub composer: String,
    /// Safe name of the title, unique across the catalog
    #[schema(example = "etude-op-10-no-3")]
    pub safe_sheet_name: String,
    #[schema(example = "frederic-chopin")]
    pub safe_composer_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a sheet; safe names are derived by the repository
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SheetCreateRequest {
    pub title: String,
    pub composer: String,
}

impl SheetCreateRequest {
    pub fn new<T: Into<String>, C: Into<String>>(title: T, composer: C) -> Self {
        Self {
            title: title.into(),
            composer: composer.into(),
        }
    }
}
