//! Listing types shared by the pagination engine and the repository

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use super::Sheet;

/// Closed set of sortable attributes
///
/// Parsing accepts the public names case-insensitively; `sheet_name` is kept
/// as an alias of `title` for existing clients.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, Serialize, Deserialize, ToSchema,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[strum(to_string = "title", serialize = "sheet_name")]
    Title,
    #[strum(to_string = "composer")]
    Composer,
    #[strum(to_string = "created_at")]
    CreatedAt,
    #[strum(to_string = "updated_at")]
    UpdatedAt,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, Serialize, Deserialize, ToSchema,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[strum(to_string = "asc")]
    Asc,
    #[strum(to_string = "desc")]
    Desc,
}

/// A validated listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationSpec {
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    /// Always at least 1 and never above the configured maximum
    pub page_size: u64,
    /// 1-based
    pub page_number: u64,
    /// Raw composer filter as supplied by the client
    pub composer_filter: Option<String>,
}

/// What the repository needs to run one paged query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetListQuery {
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub offset: u64,
    pub limit: u64,
    /// Already derived safe composer name
    pub safe_composer: Option<String>,
}

/// One page of sheets
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageResult {
    #[serde(rename = "sheets")]
    pub items: Vec<Sheet>,
    pub page_current: u64,
    pub page_max: u64,
    pub total: u64,
}

impl PageResult {
    /// `page_max` is `ceil(total / page_size)` but never below 1
    pub fn page_max_for(total: u64, page_size: u64) -> u64 {
        if page_size == 0 {
            return 1;
        }
        total.div_ceil(page_size).max(1)
    }
}
