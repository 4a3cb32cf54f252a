use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// One product card as rendered in the listing grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    /// Price in KRW.
    pub price: Option<u64>,
    pub product_code: Option<String>,
    pub product_url: String,
    pub image_url: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Fields that may be absent on a card without failing its extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardField {
    Name,
    Price,
    ProductCode,
    ProductUrl,
    ImageUrl,
}

impl fmt::Display for CardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardField::Name => "name",
            CardField::Price => "price",
            CardField::ProductCode => "product_code",
            CardField::ProductUrl => "product_url",
            CardField::ImageUrl => "image_url",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct CardExtraction {
    pub record: ProductRecord,
    pub missing: Vec<CardField>,
}

impl CardExtraction {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadAction {
    Clicked,
    Scrolled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    TargetReached,
    RetryExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub outcome: LoadOutcome,
    pub rounds: usize,
    pub initial_count: usize,
    pub final_count: usize,
}

/// Pagination hints read from the listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingMeta {
    pub total_count: Option<usize>,
    pub page_size: usize,
}

impl ListingMeta {
    pub fn last_page(&self) -> usize {
        match self.total_count {
            Some(total) if total > 0 && self.page_size > 0 => total.div_ceil(self.page_size),
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub records: Vec<ProductRecord>,
    pub unique_codes: usize,
    pub duplicates_skipped: usize,
    pub nameless_skipped: usize,
    pub truncated: usize,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub records: usize,
    pub requested: usize,
    /// Set when a loader run gave up before its card target.
    pub retries_exhausted: bool,
    pub written: Vec<PathBuf>,
}

impl RunSummary {
    pub fn is_partial(&self) -> bool {
        self.records < self.requested
    }
}
