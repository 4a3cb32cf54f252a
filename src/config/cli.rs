use crate::config::profile::ScrapeProfile;
use crate::config::{OutputConfig, DEFAULT_MIN_ITEMS, DEFAULT_PREFIX, DEFAULT_URL};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_url, Validate,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "catalog-scraper")]
#[command(about = "Collect product listings from a dynamic catalog page into JSON/CSV")]
pub struct CliConfig {
    /// Target listing URL
    #[arg(long, default_value = DEFAULT_URL)]
    pub url: String,

    /// Minimum number of product cards to capture before exporting
    #[arg(long, default_value_t = DEFAULT_MIN_ITEMS)]
    pub min_items: usize,

    /// Directory where output files will be written
    #[arg(long, default_value = "data")]
    pub output_dir: PathBuf,

    /// File prefix for generated artifacts
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Emit JSON output. Already the default; --no-json overrides it
    #[arg(long)]
    pub json: bool,

    /// Emit CSV output. Already the default; --no-csv overrides it
    #[arg(long)]
    pub csv: bool,

    /// Disable JSON output
    #[arg(long)]
    pub no_json: bool,

    /// Disable CSV output
    #[arg(long)]
    pub no_csv: bool,

    /// Run the browser headless. Already the default; --no-headless overrides it
    #[arg(long)]
    pub headless: bool,

    /// Show the browser window, useful for debugging selectors
    #[arg(long)]
    pub no_headless: bool,

    #[arg(long, value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// TOML file overriding selectors and timings
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Validate configuration and print the plan without launching a browser
    #[arg(long)]
    pub dry_run: bool,
}

impl CliConfig {
    pub fn headless(&self) -> bool {
        resolve_toggle("headless", self.headless, self.no_headless)
    }

    /// Resolves the format flags; the `--no-*` variants always win.
    pub fn output_config(&self) -> Result<OutputConfig> {
        OutputConfig::new(
            self.output_dir.clone(),
            self.prefix.clone(),
            resolve_toggle("json", self.json, self.no_json),
            resolve_toggle("csv", self.csv, self.no_csv),
        )
    }

    pub fn load_profile(&self) -> Result<ScrapeProfile> {
        match &self.profile {
            Some(path) => {
                tracing::info!("Loading scrape profile from {}", path.display());
                ScrapeProfile::from_file(path)
            }
            None => Ok(ScrapeProfile::default()),
        }
    }
}

/// On/off flag pair for a setting that defaults to on.
fn resolve_toggle(name: &str, on: bool, off: bool) -> bool {
    if on && off {
        tracing::warn!("--{name} and --no-{name} both given; --no-{name} wins");
    }
    !off
}

impl ConfigProvider for CliConfig {
    fn target_url(&self) -> &str {
        &self.url
    }

    fn min_items(&self) -> usize {
        self.min_items
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("url", &self.url)?;
        validate_positive_number("min_items", self.min_items, 1)?;
        validate_path("output_dir", &self.output_dir.to_string_lossy())?;
        validate_non_empty_string("prefix", &self.prefix)?;
        self.output_config().map(|_| ())
    }
}
