//! SeaORM repository implementations
//!
//! These work across SQLite, PostgreSQL and MySQL and implement the traits in
//! [`crate::repositories`].

pub mod sheet;

// Re-export for convenience
pub use sheet::SheetSeaOrmRepository;
