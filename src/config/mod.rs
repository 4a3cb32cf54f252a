#[cfg(feature = "cli")]
pub mod cli;
pub mod profile;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use profile::ScrapeProfile;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::{validate_positive_number, validate_url, Validate};
use std::path::PathBuf;

pub const DEFAULT_URL: &str = "https://www.gsshop.com/shop/wine/cate.gs?msectid=1548240";
pub const DEFAULT_PREFIX: &str = "gsshop_whisky";
pub const DEFAULT_MIN_ITEMS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
    pub prefix: String,
    pub emit_json: bool,
    pub emit_csv: bool,
}

impl OutputConfig {
    pub fn new(output_dir: PathBuf, prefix: String, emit_json: bool, emit_csv: bool) -> Result<Self> {
        if !(emit_json || emit_csv) {
            return Err(ScrapeError::ConfigError {
                message: "At least one output format (CSV/JSON) must be enabled".to_string(),
            });
        }
        Ok(Self {
            output_dir,
            prefix,
            emit_json,
            emit_csv,
        })
    }
}

/// Target settings for callers that do not go through the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTarget {
    pub url: String,
    pub min_items: usize,
}

impl ScrapeTarget {
    pub fn new(url: impl Into<String>, min_items: usize) -> Self {
        Self {
            url: url.into(),
            min_items,
        }
    }
}

impl ConfigProvider for ScrapeTarget {
    fn target_url(&self) -> &str {
        &self.url
    }

    fn min_items(&self) -> usize {
        self.min_items
    }
}

impl Validate for ScrapeTarget {
    fn validate(&self) -> Result<()> {
        validate_url("url", &self.url)?;
        validate_positive_number("min_items", self.min_items, 1)
    }
}
