// Application wiring: picks a store from the configuration, seeds it and builds the router.

use crate::adapters::http::router;
use crate::adapters::memory::MemoryStore;
use crate::adapters::seed::import_csv_file;
use crate::adapters::sqlite::SqliteStore;
use crate::core::service::TriviaService;
use crate::domain::ports::{ConfigProvider, QuestionStore};
use crate::utils::error::Result;
use axum::Router;
use std::path::Path;

pub async fn build_router(config: &dyn ConfigProvider) -> Result<Router> {
    match config.database_path() {
        Some(path) => {
            tracing::info!("📦 Using SQLite database at {}", path);
            let store = SqliteStore::open(path)?;
            assemble(store, config).await
        }
        None => {
            tracing::info!("📦 Using in-memory question store");
            assemble(MemoryStore::new(), config).await
        }
    }
}

async fn assemble<S: QuestionStore + 'static>(store: S, config: &dyn ConfigProvider) -> Result<Router> {
    if let Some(seed) = config.seed_file() {
        seed_if_empty(&store, Path::new(seed)).await?;
    }

    let service = TriviaService::with_page_size(store, config.questions_per_page());
    Ok(router(service))
}

/// 已有題目時跳過匯入，避免重啟後重複
pub async fn seed_if_empty<S: QuestionStore>(store: &S, path: &Path) -> Result<usize> {
    if !store.questions().await?.is_empty() {
        tracing::info!(
            "Store already has questions, skipping seed file {}",
            path.display()
        );
        return Ok(0);
    }
    import_csv_file(store, path).await
}
