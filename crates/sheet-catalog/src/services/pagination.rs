//! Pagination engine: turns raw listing parameters into one bounded page
//!
//! All parsing happens before the repository is called, so a bad `sort_by`,
//! `limit` or `page` never produces a storage query.

use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::config::{PaginationConfig, defaults::DEFAULT_SORT_CLAUSE};
use crate::errors::{AppError, AppResult};
use crate::models::{PageResult, PaginationSpec, SheetListQuery, SortDirection, SortField};
use crate::repositories::SheetRepository;
use crate::services::safe_name::derive_safe_name;

/// Listing parameters exactly as the client sent them
#[derive(Debug, Clone, Default)]
pub struct RawListParams {
    pub sort_by: Option<String>,
    pub limit: Option<String>,
    pub page: Option<String>,
    pub composer: Option<String>,
}

#[derive(Clone)]
pub struct PaginationEngine {
    repository: Arc<dyn SheetRepository>,
    config: PaginationConfig,
}

impl PaginationEngine {
    pub fn new(repository: Arc<dyn SheetRepository>, config: PaginationConfig) -> Self {
        Self { repository, config }
    }

    /// Validate raw parameters into a [`PaginationSpec`]
    pub fn parse(&self, raw: &RawListParams) -> AppResult<PaginationSpec> {
        let (sort_field, sort_direction) = parse_sort_clause(raw.sort_by.as_deref())?;

        let requested_limit =
            parse_positive("limit", raw.limit.as_deref(), self.config.default_limit)?;
        let page_size = requested_limit.min(self.config.max_limit);
        if page_size < requested_limit {
            debug!(
                requested = requested_limit,
                max = self.config.max_limit,
                "Clamped page size"
            );
        }

        let page_number = parse_positive("page", raw.page.as_deref(), 1)?;

        let composer_filter = raw
            .composer
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(PaginationSpec {
            sort_field,
            sort_direction,
            page_size,
            page_number,
            composer_filter,
        })
    }

    /// Fetch the page described by `spec`
    ///
    /// A page beyond the last one is not an error: it comes back empty with
    /// the real `page_max`.
    pub async fn list(&self, spec: &PaginationSpec) -> AppResult<PageResult> {
        let offset = spec
            .page_number
            .checked_sub(1)
            .and_then(|p| p.checked_mul(spec.page_size))
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or_else(|| {
                AppError::validation(format!("page {} is out of range", spec.page_number))
            })?;

        let query = SheetListQuery {
            sort_field: spec.sort_field,
            sort_direction: spec.sort_direction,
            offset,
            limit: spec.page_size,
            safe_composer: spec.composer_filter.as_deref().map(derive_safe_name),
        };

        let (items, total) = self.repository.list_paged(&query).await?;
        let page_max = PageResult::page_max_for(total, spec.page_size);

        Ok(PageResult {
            items,
            page_current: spec.page_number,
            page_max,
            total,
        })
    }

    /// [`Self::parse`] followed by [`Self::list`]
    pub async fn list_raw(&self, raw: &RawListParams) -> AppResult<PageResult> {
        let spec = self.parse(raw)?;
        self.list(&spec).await
    }
}

/// Parse `<field> [asc|desc]`; absent or blank means `updated_at desc`.
pub fn parse_sort_clause(clause: Option<&str>) -> AppResult<(SortField, SortDirection)> {
    let clause = match clause.map(str::trim) {
        Some(c) if !c.is_empty() => c,
        _ => DEFAULT_SORT_CLAUSE,
    };

    let mut tokens = clause.split_whitespace();
    let field_token = tokens.next().unwrap_or_default();
    let direction_token = tokens.next();
    if tokens.next().is_some() {
        return Err(AppError::validation(format!(
            "Invalid sort clause '{clause}': expected '<field> [asc|desc]'"
        )));
    }

    let field = SortField::from_str(field_token).map_err(|_| {
        AppError::validation(format!(
            "Unsupported sort field '{field_token}': expected one of title, composer, created_at, updated_at"
        ))
    })?;

    let direction = match direction_token {
        None => SortDirection::Asc,
        Some(token) => SortDirection::from_str(token).map_err(|_| {
            AppError::validation(format!(
                "Unsupported sort direction '{token}': expected asc or desc"
            ))
        })?,
    };

    Ok((field, direction))
}

fn parse_positive(name: &str, raw: Option<&str>, default: u64) -> AppResult<u64> {
    let raw = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(default),
    };

    let value: u64 = raw.parse().map_err(|_| {
        AppError::validation(format!("{name} must be a positive integer, got '{raw}'"))
    })?;
    if value == 0 {
        return Err(AppError::validation(format!("{name} must be at least 1")));
    }
    Ok(value)
}
