//! SeaORM-based Sheet repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::entities::{prelude::Sheets, sheets};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{Sheet, SheetCreateRequest, SheetListQuery, SortDirection, SortField};
use crate::repositories::SheetRepository;
use crate::services::safe_name::{derive_safe_name, next_available};

/// SeaORM-based repository for Sheet operations
#[derive(Clone)]
pub struct SheetSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl SheetSeaOrmRepository {
    /// Create a new repository instance
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Same as [`SheetRepository::create`] with explicit timestamps, for imports
    ///
    /// The free name is picked by a read before the insert, so a concurrent
    /// create can claim it first. The unique index on `safe_sheet_name` turns
    /// that into a constraint violation, and the pick is retried.
    pub async fn create_at(
        &self,
        request: SheetCreateRequest,
        timestamp: DateTime<Utc>,
    ) -> RepositoryResult<Sheet> {
        let safe_composer_name = derive_safe_name(&request.composer);
        let base = derive_safe_name(&request.title);

        let mut attempt = 1;
        loop {
            let taken = self.taken_names(&base).await?;
            let safe_sheet_name = next_available(&base, |candidate| taken.contains(candidate));

            let active_model = sheets::ActiveModel {
                id: Set(Uuid::new_v4()),
                title: Set(request.title.clone()),
                composer: Set(request.composer.clone()),
                safe_sheet_name: Set(safe_sheet_name.clone()),
                safe_composer_name: Set(safe_composer_name.clone()),
                created_at: Set(timestamp),
                updated_at: Set(timestamp),
            };

            match active_model.insert(&*self.connection).await {
                Ok(model) => {
                    info!(
                        safe_sheet_name = %model.safe_sheet_name,
                        safe_composer_name = %model.safe_composer_name,
                        "Created sheet"
                    );
                    return Ok(Self::model_to_domain(model));
                }
                Err(e) if is_unique_violation(&e) && attempt < MAX_CREATE_ATTEMPTS => {
                    debug!(
                        safe_sheet_name = %safe_sheet_name,
                        attempt,
                        "Safe name claimed concurrently, picking again"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(map_insert_error(e)),
            }
        }
    }

    /// Stored safe names that could collide with suffixed forms of `base`
    async fn taken_names(&self, base: &str) -> RepositoryResult<HashSet<String>> {
        let names = Sheets::find()
            .select_only()
            .column(sheets::Column::SafeSheetName)
            .filter(sheets::Column::SafeSheetName.starts_with(base))
            .into_tuple::<String>()
            .all(&*self.connection)
            .await?;

        Ok(names.into_iter().collect())
    }

    fn model_to_domain(model: sheets::Model) -> Sheet {
        Sheet {
            id: model.id,
            title: model.title,
            composer: model.composer,
            safe_sheet_name: model.safe_sheet_name,
            safe_composer_name: model.safe_composer_name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    /// Storage column behind each sortable field
    fn sort_column(field: SortField) -> sheets::Column {
        match field {
            SortField::Title => sheets::Column::Title,
            SortField::Composer => sheets::Column::Composer,
            SortField::CreatedAt => sheets::Column::CreatedAt,
            SortField::UpdatedAt => sheets::Column::UpdatedAt,
        }
    }

    fn sort_order(direction: SortDirection) -> Order {
        match direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

const MAX_CREATE_ATTEMPTS: u32 = 8;

fn is_unique_violation(error: &DbErr) -> bool {
    matches!(error.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn map_insert_error(error: DbErr) -> RepositoryError {
    match error.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => RepositoryError::ConstraintViolation {
            constraint: "idx_sheets_safe_sheet_name".to_string(),
            message,
        },
        _ => RepositoryError::Database(error),
    }
}

#[async_trait]
impl SheetRepository for SheetSeaOrmRepository {
    async fn create(&self, request: SheetCreateRequest) -> RepositoryResult<Sheet> {
        self.create_at(request, Utc::now()).await
    }

    async fn find_by_safe_name(&self, safe_name: &str) -> RepositoryResult<Option<Sheet>> {
        let model = Sheets::find()
            .filter(sheets::Column::SafeSheetName.eq(safe_name))
            .order_by_asc(sheets::Column::CreatedAt)
            .order_by_asc(sheets::Column::Id)
            .one(&*self.connection)
            .await?;

        Ok(model.map(Self::model_to_domain))
    }

    async fn list_paged(&self, query: &SheetListQuery) -> RepositoryResult<(Vec<Sheet>, u64)> {
        let mut select = Sheets::find();
        if let Some(safe_composer) = &query.safe_composer {
            select = select.filter(sheets::Column::SafeComposerName.eq(safe_composer.as_str()));
        }

        let total = select.clone().count(&*self.connection).await?;

        let models = select
            .order_by(
                Self::sort_column(query.sort_field),
                Self::sort_order(query.sort_direction),
            )
            .order_by_asc(sheets::Column::Id)
            .offset(query.offset)
            .limit(query.limit)
            .all(&*self.connection)
            .await?;

        debug!(
            sort_field = %query.sort_field,
            sort_direction = %query.sort_direction,
            offset = query.offset,
            limit = query.limit,
            total,
            returned = models.len(),
            "Listed sheets"
        );

        Ok((models.into_iter().map(Self::model_to_domain).collect(), total))
    }

    async fn delete_by_safe_name(&self, safe_name: &str, id: Uuid) -> RepositoryResult<u64> {
        let result = Sheets::delete_many()
            .filter(sheets::Column::Id.eq(id))
            .filter(sheets::Column::SafeSheetName.eq(safe_name))
            .exec(&*self.connection)
            .await?;

        Ok(result.rows_affected)
    }
}
