pub mod database;
pub mod error;
pub mod repositories;
pub mod row_helpers;
pub mod schema;

pub use database::Database;
pub use error::StoreError;
pub use repositories::{RepositoryRepo, RepositoryRow};
