pub use super::sheets::Entity as Sheets;
