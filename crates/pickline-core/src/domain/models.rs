use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One product line from one source order.
///
/// The SKU is rewritten in place during normalization; that happens
/// single-threaded after the parallel fetch phase has joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub sku: String,
    pub quantity: f64,
    /// Channel label the sale came from (e.g. "marketplace", "storefront-home").
    pub origin: String,
}

impl Sale {
    pub fn new(sku: impl Into<String>, quantity: f64, origin: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            quantity,
            origin: origin.into(),
        }
    }
}

/// One order as fetched from a source, used for cart grouping.
///
/// `group_id` is the external pack identifier when the checkout linked
/// several orders together, otherwise the order's own id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceOrder {
    pub order_id: i64,
    pub group_id: i64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    pub items: Vec<Sale>,
}

impl SourceOrder {
    pub fn new(order_id: i64, group_id: Option<i64>, created_at: Option<OffsetDateTime>) -> Self {
        Self {
            order_id,
            group_id: group_id.unwrap_or(order_id),
            created_at,
            items: Vec::new(),
        }
    }

    /// Short sale number shown to pickers: the last five digits of the
    /// grouping id.
    pub fn sale_number(&self) -> String {
        let id = self.group_id.to_string();
        if id.len() > 5 {
            id[id.len() - 5..].to_owned()
        } else {
            id
        }
    }
}

/// One weighted component of a combo SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboComponent {
    pub sku: String,
    pub multiplier: f64,
}

impl ComboComponent {
    pub fn new(sku: impl Into<String>, multiplier: f64) -> Self {
        Self {
            sku: sku.into(),
            multiplier,
        }
    }
}

/// Unique-SKU quantity total. Lines keep first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedLine {
    pub sku: String,
    pub total_quantity: f64,
}

/// Catalog enrichment record for one SKU.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub description: String,
    pub provider: String,
    pub category: String,
    pub unit: String,
    pub stock: f64,
}

/// Final enriched pick-list record. Constructed once, immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickItem {
    pub sku: String,
    pub quantity: f64,
    pub description: String,
    pub provider: String,
    pub unit: String,
    pub available_stock: f64,
    pub sub_category: String,
}

/// One line of a cart group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub sku: String,
    pub quantity: f64,
    pub description: String,
    pub sector: String,
}

/// A lettered grouping of all physical items belonging to one logical sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartGroup {
    pub sale_number: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    pub letter: String,
    pub items: Vec<CartLine>,
}

/// Fetch and data-quality counters reported alongside the output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// (source label, sales fetched) in source-registration order.
    pub fetched: Vec<(String, usize)>,
    pub invalid_sku: usize,
    pub invalid_quantity: usize,
    pub invalid_combo: usize,
    pub catalog_misses: usize,
    pub unique_skus: usize,
}
