use crate::config::profile::{ScrapeProfile, SelectorConfig};
use crate::domain::model::LoadAction;
use crate::domain::ports::{CatalogPage, Renderer};
use crate::utils::error::{Result, ScrapeError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Polls `probe` (card count, first card signature) until cards are visible
/// and the first one differs from `previous`. `None` on timeout.
async fn wait_for_replacement<F, Fut>(
    previous: Option<&str>,
    mut probe: F,
    timeout: Duration,
    poll_interval: Duration,
) -> Option<usize>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(usize, Option<String>)>>,
{
    let started = Instant::now();
    loop {
        match probe().await {
            Ok((count, first)) if count > 0 && first.as_deref() != previous => {
                tracing::debug!("Card set replaced after {:?}", started.elapsed());
                return Some(count);
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("Card probe failed while waiting: {}", e),
        }

        if started.elapsed() >= timeout {
            return None;
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// Headless (or headed) Chrome driven over CDP.
pub struct ChromeRenderer {
    browser: Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    profile: ScrapeProfile,
}

impl ChromeRenderer {
    pub async fn launch(profile: &ScrapeProfile, headless: bool) -> Result<Self> {
        let settings = &profile.browser;
        let mut builder = BrowserConfig::builder()
            .window_size(settings.window_width, settings.window_height)
            .request_timeout(settings.navigation_timeout());

        if !headless {
            builder = builder.with_head();
        }
        if !settings.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(executable) = &settings.executable {
            builder = builder.chrome_executable(executable);
        }
        if let Some(user_agent) = &settings.user_agent {
            builder = builder.arg(format!("--user-agent={}", user_agent));
        }

        let config = builder
            .build()
            .map_err(|message| ScrapeError::LaunchError { message })?;

        tracing::info!("Launching browser (headless={})", headless);
        let (browser, mut handler) =
            Browser::launch(config)
                .await
                .map_err(|e| ScrapeError::LaunchError {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser event handler stopped: {}", e);
                    break;
                }
            }
        });

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler: Mutex::new(Some(handle)),
            profile: profile.clone(),
        })
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    type Page = ChromePage;

    async fn render(&self, url: &str) -> Result<ChromePage> {
        let timeout = self.profile.browser.navigation_timeout();

        let page = {
            let guard = self.browser.lock().await;
            let browser = guard.as_ref().ok_or_else(|| ScrapeError::NavigationError {
                url: url.to_string(),
                reason: "browser already shut down".to_string(),
            })?;

            match tokio::time::timeout(timeout, browser.new_page(url)).await {
                Ok(Ok(page)) => page,
                Ok(Err(e)) => {
                    return Err(ScrapeError::NavigationError {
                        url: url.to_string(),
                        reason: e.to_string(),
                    })
                }
                Err(_) => {
                    return Err(ScrapeError::NavigationError {
                        url: url.to_string(),
                        reason: format!("no response within {:?}", timeout),
                    })
                }
            }
        };

        let page = ChromePage::new(page, &self.profile);
        match page.current_url().await {
            Ok(Some(final_url)) => {
                tracing::info!("Initial navigation complete with final_url={}", final_url)
            }
            Ok(None) => tracing::warn!("Navigation returned no URL; content may be cached"),
            Err(e) => tracing::warn!("Could not read page URL after navigation: {}", e),
        }

        page.wait_for_cards()
            .await
            .map_err(|e| match e {
                ScrapeError::NavigationError { .. } => e,
                other => ScrapeError::NavigationError {
                    url: url.to_string(),
                    reason: other.to_string(),
                },
            })?;

        Ok(page)
    }

    async fn shutdown(&self) -> Result<()> {
        let mut result = Ok(());

        let browser = self.browser.lock().await.take();
        if let Some(mut browser) = browser {
            tracing::debug!("Closing browser");
            match browser.close().await {
                Ok(_) => {
                    if let Err(e) = browser.wait().await {
                        tracing::debug!("Browser process did not exit cleanly: {}", e);
                    }
                }
                Err(e) => {
                    tracing::warn!("Browser close failed, killing the process: {}", e);
                    if let Some(Err(kill_err)) = browser.kill().await {
                        tracing::debug!("Browser kill failed: {}", kill_err);
                    }
                    result = Err(e.into());
                }
            }
        }

        // the handler must outlive close(), which is sent over CDP
        let handle = self.handler.lock().await.take();
        if let Some(handle) = handle {
            handle.abort();
        }
        result
    }
}

pub struct ChromePage {
    page: Page,
    selectors: SelectorConfig,
    card_wait_timeout: Duration,
    poll_interval: Duration,
    settle_delay: Duration,
}

impl ChromePage {
    fn new(page: Page, profile: &ScrapeProfile) -> Self {
        Self {
            page,
            selectors: profile.selectors.clone(),
            card_wait_timeout: profile.browser.card_wait_timeout(),
            poll_interval: profile.browser.poll_interval(),
            settle_delay: profile.loader.settle_delay(),
        }
    }

    /// Polls until at least one card is rendered.
    async fn wait_for_cards(&self) -> Result<usize> {
        let started = Instant::now();
        loop {
            match self.card_count().await {
                Ok(count) if count > 0 => {
                    tracing::debug!("{} cards visible after {:?}", count, started.elapsed());
                    return Ok(count);
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Card count failed while waiting: {}", e),
            }

            if started.elapsed() >= self.card_wait_timeout {
                let url = self.page.url().await.ok().flatten().unwrap_or_default();
                return Err(ScrapeError::NavigationError {
                    url,
                    reason: format!(
                        "no '{}' cards rendered within {:?}",
                        self.selectors.card, self.card_wait_timeout
                    ),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Card count plus the first card's href (or markup) as a signature.
    async fn first_card(&self) -> Result<(usize, Option<String>)> {
        let count = self.card_count().await?;
        let script = format!(
            "(() => {{ const card = document.querySelector({}); return card ? (card.getAttribute('href') || card.outerHTML) : ''; }})()",
            serde_json::to_string(&self.selectors.card)?
        );
        let first: String = self.page.evaluate(script.as_str()).await?.into_value()?;
        Ok((count, Some(first).filter(|s| !s.is_empty())))
    }

    async fn scroll_to_bottom(&self) -> Result<LoadAction> {
        self.page.evaluate(SCROLL_TO_BOTTOM).await?;
        Ok(LoadAction::Scrolled)
    }
}

#[async_trait]
impl CatalogPage for ChromePage {
    async fn card_count(&self) -> Result<usize> {
        let script = format!(
            "document.querySelectorAll({}).length",
            serde_json::to_string(&self.selectors.card)?
        );
        let count = self.page.evaluate(script.as_str()).await?.into_value::<usize>()?;
        Ok(count)
    }

    async fn load_more(&self) -> Result<LoadAction> {
        let Some(selector) = &self.selectors.load_more else {
            return self.scroll_to_bottom().await;
        };

        match self.page.find_element(selector.as_str()).await {
            Ok(button) => {
                button.scroll_into_view().await?;
                button.click().await?;
                Ok(LoadAction::Clicked)
            }
            Err(e) => {
                tracing::debug!("Load more control '{}' not found ({}), scrolling", selector, e);
                self.scroll_to_bottom().await
            }
        }
    }

    async fn html(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.page.url().await?)
    }

    async fn goto_listing_page(&self, index: usize) -> Result<()> {
        let selector = self.selectors.pagination_link_for(index);
        tracing::info!("Navigating to page {} via selector {}", index, selector);

        let previous = match self.first_card().await {
            Ok((_, first)) => first,
            Err(e) => {
                tracing::debug!("Could not read first card before paging: {}", e);
                None
            }
        };

        let link = self
            .page
            .find_element(selector.as_str())
            .await
            .map_err(|e| ScrapeError::PaginationError {
                index,
                reason: format!("link not found: {}", e),
            })?;
        link.click().await.map_err(|e| ScrapeError::PaginationError {
            index,
            reason: e.to_string(),
        })?;

        // page 1 cards stay in the DOM until the new set is rendered
        let replaced = wait_for_replacement(
            previous.as_deref(),
            || self.first_card(),
            self.card_wait_timeout,
            self.poll_interval,
        )
        .await;
        let Some(count) = replaced else {
            return Err(ScrapeError::PaginationError {
                index,
                reason: format!(
                    "card list did not change within {:?}",
                    self.card_wait_timeout
                ),
            });
        };

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        tracing::debug!("Page {} shows {} cards", index, count);
        Ok(())
    }
}
