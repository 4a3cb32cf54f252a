use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::{
    validate_css_selector, validate_non_empty_string, validate_positive_number, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex")
});

/// Selectors and timings for one catalog layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeProfile {
    pub selectors: SelectorConfig,
    pub loader: LoaderConfig,
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub card: String,
    pub name: String,
    pub price: String,
    pub image: String,
    pub total_count: String,
    pub entry_data: String,
    /// Must contain `{index}`, replaced by the 1-based page number.
    pub pagination_link: String,
    pub load_more: Option<String>,
    pub code_param: String,
    pub metadata_attr: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            card: "a.prd-item".to_string(),
            name: "dt.prd-name".to_string(),
            price: "dd.price-info .set-price strong".to_string(),
            image: "div.prd-img img".to_string(),
            total_count: "#totalCnt".to_string(),
            entry_data: "#entry-data".to_string(),
            pagination_link: r#"nav.paging a[data-index="{index}"]"#.to_string(),
            load_more: None,
            code_param: "prdid".to_string(),
            metadata_attr: "data-info".to_string(),
        }
    }
}

impl SelectorConfig {
    pub fn pagination_link_for(&self, index: usize) -> String {
        self.pagination_link.replace("{index}", &index.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub max_stalled_rounds: usize,
    pub max_rounds: usize,
    pub settle_delay_ms: u64,
    pub fallback_page_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_stalled_rounds: 5,
            max_rounds: 200,
            settle_delay_ms: 1500,
            fallback_page_size: 80,
        }
    }
}

impl LoaderConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub navigation_timeout_secs: u64,
    pub card_wait_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub window_width: u32,
    pub window_height: u32,
    pub executable: Option<String>,
    pub user_agent: Option<String>,
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: 30,
            card_wait_timeout_secs: 30,
            poll_interval_ms: 250,
            window_width: 1366,
            window_height: 900,
            executable: None,
            user_agent: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn card_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.card_wait_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl ScrapeProfile {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScrapeError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| ScrapeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${USER_AGENT})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }
}

impl Validate for ScrapeProfile {
    fn validate(&self) -> Result<()> {
        let s = &self.selectors;
        validate_css_selector("selectors.card", &s.card)?;
        validate_css_selector("selectors.name", &s.name)?;
        validate_css_selector("selectors.price", &s.price)?;
        validate_css_selector("selectors.image", &s.image)?;
        validate_css_selector("selectors.total_count", &s.total_count)?;
        validate_css_selector("selectors.entry_data", &s.entry_data)?;
        if let Some(load_more) = &s.load_more {
            validate_css_selector("selectors.load_more", load_more)?;
        }

        if !s.pagination_link.contains("{index}") {
            return Err(ScrapeError::InvalidConfigValueError {
                field: "selectors.pagination_link".to_string(),
                value: s.pagination_link.clone(),
                reason: "Template must contain an {index} placeholder".to_string(),
            });
        }
        validate_css_selector("selectors.pagination_link", &s.pagination_link_for(1))?;

        validate_non_empty_string("selectors.code_param", &s.code_param)?;
        validate_non_empty_string("selectors.metadata_attr", &s.metadata_attr)?;

        validate_positive_number("loader.max_stalled_rounds", self.loader.max_stalled_rounds, 1)?;
        validate_positive_number("loader.max_rounds", self.loader.max_rounds, 1)?;
        validate_positive_number("loader.fallback_page_size", self.loader.fallback_page_size, 1)?;

        validate_positive_number(
            "browser.card_wait_timeout_secs",
            self.browser.card_wait_timeout_secs as usize,
            1,
        )?;
        validate_positive_number(
            "browser.navigation_timeout_secs",
            self.browser.navigation_timeout_secs as usize,
            1,
        )?;

        Ok(())
    }
}
