//! SeaORM migrations for multi-database support
//!
//! Migrations work across SQLite, PostgreSQL and MySQL. Column types that differ
//! between backends are chosen inside the migration helpers.

use sea_orm_migration::prelude::*;

pub mod m20261019_000001_create_sheets;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20261019_000001_create_sheets::Migration)]
    }
}
