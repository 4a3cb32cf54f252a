use crate::config::OutputConfig;
use crate::domain::model::ProductRecord;
use crate::domain::ports::Storage;
use crate::utils::error::{Result, ScrapeError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

pub const CSV_HEADER: [&str; 6] = [
    "name",
    "price",
    "product_code",
    "product_url",
    "image_url",
    "metadata",
];

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

#[derive(Serialize)]
struct CsvRow<'a> {
    name: &'a str,
    price: Option<u64>,
    product_code: Option<&'a str>,
    product_url: &'a str,
    image_url: &'a str,
    metadata: String,
}

pub struct Exporter<S: Storage> {
    storage: S,
    config: OutputConfig,
}

impl<S: Storage> Exporter<S> {
    pub fn new(storage: S, config: OutputConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    pub fn file_stem(&self, at: DateTime<Utc>) -> String {
        format!("{}_{}", self.config.prefix, at.format(TIMESTAMP_FORMAT))
    }

    /// Writes the enabled formats and returns the written paths, JSON first.
    pub async fn export(&self, records: &[ProductRecord], at: DateTime<Utc>) -> Result<Vec<PathBuf>> {
        let dir = self.storage.ensure_dir().await?;
        let stem = self.file_stem(at);
        let mut written = Vec::new();

        tracing::debug!(
            "Exporting {} records to {} (json={}, csv={})",
            records.len(),
            dir.display(),
            self.config.emit_json,
            self.config.emit_csv
        );

        if self.config.emit_json {
            let data = to_json(records)?;
            written.push(
                self.storage
                    .write_file(&format!("{}.json", stem), &data)
                    .await?,
            );
        }

        if self.config.emit_csv {
            let data = to_csv(records)?;
            written.push(
                self.storage
                    .write_file(&format!("{}.csv", stem), &data)
                    .await?,
            );
        }

        Ok(written)
    }
}

pub fn to_json(records: &[ProductRecord]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(records)?)
}

/// CSV with a fixed header; the metadata column holds the map as JSON text.
pub fn to_csv(records: &[ProductRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.serialize(CsvRow {
            name: &record.name,
            price: record.price,
            product_code: record.product_code.as_deref(),
            product_url: &record.product_url,
            image_url: &record.image_url,
            metadata: serde_json::to_string(&record.metadata)?,
        })?;
    }

    writer
        .into_inner()
        .map_err(|e| ScrapeError::IoError(e.into_error()))
}
