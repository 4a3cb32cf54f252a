#![allow(dead_code)]

use async_trait::async_trait;
use catalog_scraper::domain::model::LoadAction;
use catalog_scraper::domain::ports::{CatalogPage, Renderer};
use catalog_scraper::{Result, ScrapeError, ScrapeProfile};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const BASE_URL: &str = "https://www.gsshop.com/shop/wine/cate.gs?msectid=1548240";
pub const FIXTURE: &str = include_str!("../fixtures/catalog_page.html");

pub fn card_html(code: u32, name: &str, price: u32) -> String {
    format!(
        r#"<li><a class="prd-item" href="/prd/prd.gs?prdid={code}">
  <div class="prd-img"><img src="//image.gsshop.com/image/{code}_L1.jpg"></div>
  <dl><dt class="prd-name">{name}</dt>
  <dd class="price-info"><span class="set-price"><strong>{price}</strong>원</span></dd></dl>
</a></li>"#
    )
}

pub fn listing_html(total: Option<usize>, page_size: Option<usize>, cards: &[String]) -> String {
    let total = total
        .map(|t| format!(r#"<input type="hidden" id="totalCnt" value="{}">"#, t))
        .unwrap_or_default();
    let entry = page_size
        .map(|s| {
            format!(
                r#"<script id="entry-data" type="application/json">{{"param":{{"pageItemSize":{}}}}}</script>"#,
                s
            )
        })
        .unwrap_or_default();
    format!(
        "<html><head>{}</head><body>{}<ul>{}</ul></body></html>",
        entry,
        total,
        cards.join("\n")
    )
}

pub fn quiet_profile() -> ScrapeProfile {
    let mut profile = ScrapeProfile::default();
    profile.loader.settle_delay_ms = 0;
    profile.loader.max_stalled_rounds = 2;
    profile.loader.max_rounds = 50;
    profile
}

/// Either a fixed HTML document or a listing whose cards appear in batches.
#[derive(Clone)]
pub enum Listing {
    Static(String),
    Incremental {
        total: Option<usize>,
        page_size: Option<usize>,
        cards: Vec<String>,
    },
}

struct PageState {
    current: usize,
    revealed: usize,
}

#[derive(Clone)]
pub struct FixturePage {
    listings: Arc<Vec<Listing>>,
    state: Arc<Mutex<PageState>>,
    initial: usize,
    batch: usize,
    fail_goto_from: Option<usize>,
    pub load_calls: Arc<AtomicUsize>,
}

impl FixturePage {
    pub fn static_html(html: &str) -> Self {
        Self::new(vec![Listing::Static(html.to_string())], 0, 0)
    }

    pub fn new(listings: Vec<Listing>, initial: usize, batch: usize) -> Self {
        Self {
            listings: Arc::new(listings),
            state: Arc::new(Mutex::new(PageState {
                current: 0,
                revealed: initial,
            })),
            initial,
            batch,
            fail_goto_from: None,
            load_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_goto_from(mut self, index: usize) -> Self {
        self.fail_goto_from = Some(index);
        self
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    fn render(listing: &Listing, revealed: usize) -> String {
        match listing {
            Listing::Static(html) => html.clone(),
            Listing::Incremental {
                total,
                page_size,
                cards,
            } => {
                let shown = revealed.min(cards.len());
                listing_html(*total, *page_size, &cards[..shown])
            }
        }
    }
}

#[async_trait]
impl CatalogPage for FixturePage {
    async fn card_count(&self) -> Result<usize> {
        let state = self.state.lock().await;
        let count = match &self.listings[state.current] {
            Listing::Static(html) => html.matches(r#"class="prd-item""#).count(),
            Listing::Incremental { cards, .. } => state.revealed.min(cards.len()),
        };
        Ok(count)
    }

    async fn load_more(&self) -> Result<LoadAction> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        state.revealed += self.batch;
        Ok(LoadAction::Scrolled)
    }

    async fn html(&self) -> Result<String> {
        let state = self.state.lock().await;
        Ok(Self::render(&self.listings[state.current], state.revealed))
    }

    async fn current_url(&self) -> Result<Option<String>> {
        Ok(Some(BASE_URL.to_string()))
    }

    async fn goto_listing_page(&self, index: usize) -> Result<()> {
        if self.fail_goto_from.is_some_and(|from| index >= from) || index > self.listings.len() {
            return Err(ScrapeError::PaginationError {
                index,
                reason: "link not found".to_string(),
            });
        }
        let mut state = self.state.lock().await;
        state.current = index - 1;
        state.revealed = self.initial;
        Ok(())
    }
}

pub struct FixtureRenderer {
    page: FixturePage,
    fail_navigation: bool,
    pub shutdowns: Arc<AtomicUsize>,
}

impl FixtureRenderer {
    pub fn new(page: FixturePage) -> Self {
        Self {
            page,
            fail_navigation: false,
            shutdowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(page: FixturePage) -> Self {
        Self {
            fail_navigation: true,
            ..Self::new(page)
        }
    }
}

#[async_trait]
impl Renderer for FixtureRenderer {
    type Page = FixturePage;

    async fn render(&self, url: &str) -> Result<FixturePage> {
        if self.fail_navigation {
            return Err(ScrapeError::NavigationError {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        Ok(self.page.clone())
    }

    async fn shutdown(&self) -> Result<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
