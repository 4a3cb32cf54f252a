pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{OutputConfig, ScrapeProfile, ScrapeTarget};

pub use adapters::{ChromeRenderer, LocalStorage};
pub use core::{engine::ScrapeEngine, pipeline::CatalogPipeline};
pub use domain::model::{ProductRecord, RunSummary};
pub use utils::error::{Result, ScrapeError};
