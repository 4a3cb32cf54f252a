use crate::domain::model::RunSummary;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct ScrapeEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ScrapeEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        tracing::info!("Starting scrape");

        // Extract
        let raw_records = self.pipeline.extract().await?;
        tracing::info!("Fetched {} product cards", raw_records.len());

        // Transform
        let transformed = self.pipeline.transform(raw_records).await?;
        if transformed.truncated > 0 {
            tracing::debug!("Dropped {} records beyond min_items", transformed.truncated);
        }

        // Load
        let summary = self.pipeline.load(transformed).await?;
        tracing::info!(
            "Scrape finished: {} products, {} files in {:?}",
            summary.records,
            summary.written.len(),
            started.elapsed()
        );
        if summary.is_partial() {
            tracing::warn!(
                "Partial collection: {} of {} requested products (retries exhausted: {})",
                summary.records,
                summary.requested,
                summary.retries_exhausted
            );
        }

        Ok(summary)
    }
}
