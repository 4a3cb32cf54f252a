use crate::config::profile::{ScrapeProfile, SelectorConfig};
use crate::domain::model::{CardExtraction, CardField, ListingMeta, ProductRecord};
use crate::utils::error::Result;
use crate::utils::validation::parse_selector;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use url::Url;

static PRICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+[\d,]*)").expect("price pattern is a valid regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is a valid regex"));

/// Turns rendered listing HTML into product records.
///
/// Extraction never fails per card: a field that cannot be read is left
/// empty and reported in [`CardExtraction::missing`].
pub struct CardExtractor {
    card: Selector,
    name: Selector,
    price: Selector,
    image: Selector,
    total_count: Selector,
    entry_data: Selector,
    code_param: String,
    metadata_attr: String,
    fallback_page_size: usize,
}

impl CardExtractor {
    pub fn new(selectors: &SelectorConfig, fallback_page_size: usize) -> Result<Self> {
        Ok(Self {
            card: parse_selector(&selectors.card)?,
            name: parse_selector(&selectors.name)?,
            price: parse_selector(&selectors.price)?,
            image: parse_selector(&selectors.image)?,
            total_count: parse_selector(&selectors.total_count)?,
            entry_data: parse_selector(&selectors.entry_data)?,
            code_param: selectors.code_param.clone(),
            metadata_attr: selectors.metadata_attr.clone(),
            fallback_page_size,
        })
    }

    pub fn from_profile(profile: &ScrapeProfile) -> Result<Self> {
        Self::new(&profile.selectors, profile.loader.fallback_page_size)
    }

    /// Extracts every card in render order.
    pub fn extract(&self, html: &str, base_url: &Url) -> Vec<CardExtraction> {
        let document = Html::parse_document(html);
        let extractions: Vec<CardExtraction> = document
            .select(&self.card)
            .map(|card| self.extract_card(card, base_url))
            .collect();

        tracing::debug!("Extracted {} cards from {}", extractions.len(), base_url);
        extractions
    }

    pub fn count_cards(&self, html: &str) -> usize {
        Html::parse_document(html).select(&self.card).count()
    }

    /// Reads the total item count and page size hints.
    pub fn listing_meta(&self, html: &str) -> ListingMeta {
        let document = Html::parse_document(html);

        let total_count = document.select(&self.total_count).next().and_then(|el| {
            let raw = el
                .value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| el.text().collect());
            parse_count(&raw)
        });

        let page_size = document
            .select(&self.entry_data)
            .next()
            .and_then(|el| parse_page_size(&el.text().collect::<String>()))
            .unwrap_or(self.fallback_page_size);

        ListingMeta {
            total_count,
            page_size,
        }
    }

    fn extract_card(&self, card: ElementRef<'_>, base_url: &Url) -> CardExtraction {
        let mut missing = Vec::new();

        let name = card
            .select(&self.name)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .unwrap_or_default();
        if name.is_empty() {
            missing.push(CardField::Name);
        }

        let price = card
            .select(&self.price)
            .next()
            .and_then(|el| parse_price(&el.text().collect::<String>()));
        if price.is_none() {
            missing.push(CardField::Price);
        }

        let resolved = card
            .value()
            .attr("href")
            .filter(|href| !href.trim().is_empty())
            .and_then(|href| base_url.join(href.trim()).ok());
        let product_code = resolved.as_ref().and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == self.code_param.as_str())
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
        });
        let product_url = resolved.map(String::from).unwrap_or_default();
        if product_url.is_empty() {
            missing.push(CardField::ProductUrl);
        }
        if product_code.is_none() {
            missing.push(CardField::ProductCode);
        }

        let image_url = card
            .select(&self.image)
            .next()
            .and_then(image_source)
            .and_then(|src| resolve_image_url(&src, base_url))
            .unwrap_or_default();
        if image_url.is_empty() {
            missing.push(CardField::ImageUrl);
        }

        let mut metadata = BTreeMap::new();
        if let Some(code) = &product_code {
            metadata.insert("product_code".to_string(), code.clone());
        }
        if let Some(raw) = card.value().attr(&self.metadata_attr) {
            merge_metadata(&mut metadata, raw);
        }

        tracing::trace!(
            "Extracted card summary name={:?} code={:?} price={:?} image={}",
            name,
            product_code,
            price,
            image_url
        );

        CardExtraction {
            record: ProductRecord {
                name,
                price,
                product_code,
                product_url,
                image_url,
                metadata,
            },
            missing,
        }
    }
}

pub fn normalize_whitespace(value: &str) -> String {
    WHITESPACE.replace_all(value.trim(), " ").into_owned()
}

/// Parses the first number in a price label such as `69,900원`.
pub fn parse_price(text: &str) -> Option<u64> {
    PRICE_PATTERN
        .captures(text)
        .and_then(|caps| caps[1].replace(',', "").parse().ok())
}

fn parse_count(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return raw.parse().ok();
    }
    PRICE_PATTERN
        .captures(raw)
        .and_then(|caps| caps[1].replace(',', "").parse().ok())
}

fn parse_page_size(raw: &str) -> Option<usize> {
    let data: serde_json::Value = match serde_json::from_str(raw.trim()) {
        Ok(data) => data,
        Err(e) => {
            tracing::debug!("Failed to parse page size from entry data: {}", e);
            return None;
        }
    };

    let size = &data["param"]["pageItemSize"];
    size.as_u64()
        .map(|n| n as usize)
        .or_else(|| size.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|&n| n > 0)
}

fn image_source(img: ElementRef<'_>) -> Option<String> {
    let attrs = img.value();
    ["src", "data-src"]
        .iter()
        .filter_map(|name| attrs.attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| {
            attrs
                .attr("srcset")
                .and_then(|srcset| srcset.split_whitespace().next())
                .map(str::to_string)
        })
}

fn resolve_image_url(src: &str, base_url: &Url) -> Option<String> {
    if let Some(rest) = src.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }
    base_url.join(src).ok().map(String::from)
}

fn merge_metadata(metadata: &mut BTreeMap<String, String>, raw: &str) {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => {
            for (key, value) in map {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                metadata.insert(key, value);
            }
        }
        Ok(_) => tracing::debug!("Card metadata is not a JSON object, ignoring"),
        Err(e) => tracing::debug!("Failed to parse card metadata: {}", e),
    }
}
