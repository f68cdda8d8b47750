use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_sheets_table(manager).await?;
        self.create_indexes(manager).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sheets::Table).to_owned())
            .await?;

        Ok(())
    }
}

impl Migration {
    // Helper functions for database-specific types
    fn create_id_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.uuid().not_null(),
            _ => col.string().not_null(),
        };
        col
    }

    fn create_timestamp_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.timestamp_with_time_zone().not_null(),
            _ => col.string().not_null(),
        };
        col
    }

    async fn create_sheets_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sheets::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, Sheets::Id).primary_key())
                    .col(ColumnDef::new(Sheets::Title).string().not_null())
                    .col(ColumnDef::new(Sheets::Composer).string().not_null())
                    .col(ColumnDef::new(Sheets::SafeSheetName).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Sheets::SafeComposerName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(self.create_timestamp_column(manager, Sheets::CreatedAt))
                    .col(self.create_timestamp_column(manager, Sheets::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn create_indexes(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        // Lookups and deletes address a sheet by this name alone
        manager
            .create_index(
                Index::create()
                    .name("idx_sheets_safe_sheet_name")
                    .table(Sheets::Table)
                    .col(Sheets::SafeSheetName)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_sheets_safe_composer_safe_sheet")
                    .table(Sheets::Table)
                    .col(Sheets::SafeComposerName)
                    .col(Sheets::SafeSheetName)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_sheets_updated_at")
                    .table(Sheets::Table)
                    .col(Sheets::UpdatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Sheets {
    Table,
    Id,
    Title,
    Composer,
    SafeSheetName,
    SafeComposerName,
    CreatedAt,
    UpdatedAt,
}
