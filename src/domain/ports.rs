use crate::domain::model::{LoadAction, ProductRecord, RunSummary, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

pub trait Storage: Send + Sync {
    fn ensure_dir(&self) -> impl std::future::Future<Output = Result<PathBuf>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<PathBuf>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn target_url(&self) -> &str;
    fn min_items(&self) -> usize;
}

/// A rendered listing page the loader and extractor can work against.
#[async_trait]
pub trait CatalogPage: Send + Sync {
    async fn card_count(&self) -> Result<usize>;
    /// Asks the page for more cards, by clicking "load more" or scrolling.
    async fn load_more(&self) -> Result<LoadAction>;
    async fn html(&self) -> Result<String>;
    async fn current_url(&self) -> Result<Option<String>>;
    async fn goto_listing_page(&self, index: usize) -> Result<()>;
}

#[async_trait]
pub trait Renderer: Send + Sync {
    type Page: CatalogPage;

    /// Navigates to `url` and waits until product cards are visible.
    async fn render(&self, url: &str) -> Result<Self::Page>;
    async fn shutdown(&self) -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<ProductRecord>>;
    async fn transform(&self, data: Vec<ProductRecord>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<RunSummary>;
}
