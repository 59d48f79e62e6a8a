mod catalog_repo;
mod repo_error;

pub use catalog_repo::*;
pub use repo_error::RepositoryError;
