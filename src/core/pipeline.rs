use crate::config::profile::ScrapeProfile;
use crate::config::OutputConfig;
use crate::core::collector::RecordSet;
use crate::core::exporter::Exporter;
use crate::core::extractor::CardExtractor;
use crate::core::loader::LoaderLoop;
use crate::domain::model::{
    CardExtraction, LoadOutcome, ProductRecord, RunSummary, TransformResult,
};
use crate::domain::ports::{CatalogPage, ConfigProvider, Pipeline, Renderer, Storage};
use crate::utils::error::{Result, ScrapeError};
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

/// Renders a catalog listing, loads cards up to `min_items`, and exports them.
pub struct CatalogPipeline<R: Renderer, S: Storage, C: ConfigProvider> {
    renderer: R,
    exporter: Exporter<S>,
    config: C,
    extractor: CardExtractor,
    loader: LoaderLoop,
    retries_exhausted: AtomicBool,
}

impl<R: Renderer, S: Storage, C: ConfigProvider> CatalogPipeline<R, S, C> {
    pub fn new(
        renderer: R,
        storage: S,
        config: C,
        output: OutputConfig,
        profile: &ScrapeProfile,
    ) -> Result<Self> {
        Ok(Self {
            renderer,
            exporter: Exporter::new(storage, output),
            config,
            extractor: CardExtractor::from_profile(profile)?,
            loader: LoaderLoop::from_config(&profile.loader),
            retries_exhausted: AtomicBool::new(false),
        })
    }

    async fn base_url(&self, page: &R::Page) -> Result<Url> {
        let current = match page.current_url().await {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Falling back to target URL as base: {}", e);
                None
            }
        };
        let raw = current.unwrap_or_else(|| self.config.target_url().to_string());

        Url::parse(&raw).map_err(|e| ScrapeError::InvalidConfigValueError {
            field: "url".to_string(),
            value: raw.clone(),
            reason: format!("Invalid URL format: {}", e),
        })
    }

    async fn extract_current(&self, page: &R::Page) -> Result<Vec<CardExtraction>> {
        let html = page.html().await?;
        let base_url = self.base_url(page).await?;
        Ok(self.extractor.extract(&html, &base_url))
    }

    /// Loads the current listing page and admits its cards into `progress`.
    ///
    /// Duplicate or nameless cards can leave the accepted count short of
    /// `min_items` even though the card target was reached. In that case the
    /// loader runs again with a higher target, and the page is re-extracted
    /// from the same starting point, until enough records are accepted, the
    /// page cannot show more cards, or the round budget is spent.
    /// Returns the number of cards seen on the page.
    async fn scrape_page(
        &self,
        page: &R::Page,
        capacity: Option<usize>,
        progress: &mut RecordSet,
        raw: &mut Vec<ProductRecord>,
    ) -> Result<usize> {
        let min_items = self.config.min_items();
        let base = progress.clone();
        let base_raw = raw.len();
        let cap = |target: usize| capacity.map_or(target, |c| target.min(c));

        let mut target = cap(min_items.saturating_sub(progress.len()));
        let mut rounds_used = 0;

        loop {
            let report = self.loader.run(page, target).await;
            rounds_used += report.rounds;
            let exhausted = report.outcome == LoadOutcome::RetryExhausted;
            if exhausted {
                self.retries_exhausted.store(true, Ordering::Relaxed);
            }

            let extractions = self.extract_current(page).await?;
            let cards = extractions.len();

            *progress = base.clone();
            raw.truncate(base_raw);
            for extraction in extractions {
                if !extraction.is_complete() {
                    let missing: Vec<String> =
                        extraction.missing.iter().map(|f| f.to_string()).collect();
                    tracing::debug!(
                        "Card {:?} is missing fields: {}",
                        extraction.record.name,
                        missing.join(", ")
                    );
                }
                raw.push(extraction.record.clone());
                progress.admit(extraction.record);
                if progress.len() >= min_items {
                    break;
                }
            }

            let remaining = min_items.saturating_sub(progress.len());
            if remaining == 0 || exhausted {
                return Ok(cards);
            }

            let next_target = cap(report.final_count + remaining);
            if next_target <= report.final_count {
                return Ok(cards);
            }
            if rounds_used >= self.loader.max_rounds() {
                tracing::warn!(
                    "Load round budget ({}) spent with {} of {} records accepted",
                    self.loader.max_rounds(),
                    progress.len(),
                    min_items
                );
                self.retries_exhausted.store(true, Ordering::Relaxed);
                return Ok(cards);
            }

            tracing::info!(
                "{} of {} cards skipped as duplicate or nameless; loading toward {} cards",
                cards - (progress.len() - base.len()),
                cards,
                next_target
            );
            target = next_target;
        }
    }

    async fn collect(&self, page: &R::Page) -> Result<Vec<ProductRecord>> {
        let min_items = self.config.min_items();
        tracing::info!(
            "Page navigation complete; beginning product discovery (min_items={})",
            min_items
        );

        let meta = self.extractor.listing_meta(&page.html().await?);
        let last_page = meta.last_page();
        tracing::info!(
            "Pagination metadata total={:?} page_size={} last_page={}",
            meta.total_count,
            meta.page_size,
            last_page
        );

        // a paginated listing never shows more than one page of cards
        let capacity = (last_page > 1).then_some(meta.page_size);
        let mut progress = RecordSet::new();
        let mut raw = Vec::new();

        for index in 1..=last_page {
            let cards = if index == 1 {
                self.scrape_page(page, capacity, &mut progress, &mut raw)
                    .await?
            } else {
                let scraped = match page.goto_listing_page(index).await {
                    Ok(()) => {
                        self.scrape_page(page, capacity, &mut progress, &mut raw)
                            .await
                    }
                    Err(e) => Err(e),
                };
                match scraped {
                    Ok(cards) => cards,
                    Err(e) => {
                        tracing::warn!("Failed to navigate to page {}: {}", index, e);
                        break;
                    }
                }
            };

            tracing::info!(
                "Processed page {}/{} with {} product cards ({} records so far)",
                index,
                last_page,
                cards,
                progress.len()
            );

            if progress.len() >= min_items {
                tracing::info!(
                    "Reached min_items threshold ({}) after page {}",
                    min_items,
                    index
                );
                break;
            }
        }

        if progress.len() < min_items {
            tracing::warn!(
                "Collected {} of {} requested products; exporting partial results",
                progress.len(),
                min_items
            );
        }
        Ok(raw)
    }
}

#[async_trait::async_trait]
impl<R: Renderer, S: Storage, C: ConfigProvider> Pipeline for CatalogPipeline<R, S, C> {
    async fn extract(&self) -> Result<Vec<ProductRecord>> {
        let url = self.config.target_url();
        tracing::info!("Navigating to {}", url);
        self.retries_exhausted.store(false, Ordering::Relaxed);

        let page = self.renderer.render(url).await;
        let collected = match page {
            Ok(page) => self.collect(&page).await,
            Err(e) => Err(e),
        };

        if let Err(e) = self.renderer.shutdown().await {
            tracing::warn!("Browser shutdown failed: {}", e);
        }
        collected
    }

    async fn transform(&self, data: Vec<ProductRecord>) -> Result<TransformResult> {
        let min_items = self.config.min_items();
        let mut set = RecordSet::new();
        for record in data {
            set.admit(record);
        }

        let unique_codes = set.unique_codes();
        let duplicates_skipped = set.duplicates_skipped();
        let nameless_skipped = set.nameless_skipped();

        let mut records = set.into_records();
        let truncated = records.len().saturating_sub(min_items);
        records.truncate(min_items);

        tracing::info!(
            "Extraction summary: products={} unique_codes={} duplicates_skipped={} nameless_skipped={}",
            records.len(),
            unique_codes,
            duplicates_skipped,
            nameless_skipped
        );

        Ok(TransformResult {
            records,
            unique_codes,
            duplicates_skipped,
            nameless_skipped,
            truncated,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<RunSummary> {
        let written = self
            .exporter
            .export(&result.records, chrono::Utc::now())
            .await?;

        for path in &written {
            tracing::info!("Wrote {}", path.display());
        }

        Ok(RunSummary {
            records: result.records.len(),
            requested: self.config.min_items(),
            retries_exhausted: self.retries_exhausted.load(Ordering::Relaxed),
            written,
        })
    }
}
