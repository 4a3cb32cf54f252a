pub mod collector;
pub mod engine;
pub mod exporter;
pub mod extractor;
pub mod loader;
pub mod pipeline;

pub use crate::domain::model::{ProductRecord, TransformResult};
pub use crate::domain::ports::{CatalogPage, ConfigProvider, Pipeline, Renderer, Storage};
pub use crate::utils::error::Result;
