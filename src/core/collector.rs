use crate::domain::model::ProductRecord;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Duplicate,
    Nameless,
}

/// Accepted records in render order, deduplicated by product code.
///
/// A code is remembered even when its card is skipped for having no name,
/// so a later card with the same code counts as a duplicate.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<ProductRecord>,
    seen_codes: HashSet<String>,
    duplicates_skipped: usize,
    nameless_skipped: usize,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&mut self, record: ProductRecord) -> Admission {
        if let Some(code) = &record.product_code {
            if !self.seen_codes.insert(code.clone()) {
                tracing::debug!("Skipping duplicate product_code {}", code);
                self.duplicates_skipped += 1;
                return Admission::Duplicate;
            }
        }

        if record.name.is_empty() {
            tracing::debug!(
                "Card produced empty name (code={:?})",
                record.product_code
            );
            self.nameless_skipped += 1;
            return Admission::Nameless;
        }

        self.records.push(record);
        Admission::Accepted
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn unique_codes(&self) -> usize {
        self.seen_codes.len()
    }

    pub fn duplicates_skipped(&self) -> usize {
        self.duplicates_skipped
    }

    pub fn nameless_skipped(&self) -> usize {
        self.nameless_skipped
    }

    pub fn into_records(self) -> Vec<ProductRecord> {
        self.records
    }
}
