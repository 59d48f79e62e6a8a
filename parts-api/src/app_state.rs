use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{domain::search::SearchService, repositories::CatalogRepositoryImpl};

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    pub catalog: Arc<CatalogRepositoryImpl>,
    /// Whether a language model provider is configured.
    pub llm_configured: bool,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, search: SearchService, llm_configured: bool) -> Self {
        Self {
            catalog: Arc::new(CatalogRepositoryImpl::new(db_pool)),
            search: Arc::new(search),
            llm_configured,
        }
    }
}
