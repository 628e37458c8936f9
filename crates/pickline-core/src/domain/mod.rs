//! # Domain Models
//!
//! Canonical domain types for the pickline aggregation core.
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Sale`] | One product line from one source order |
//! | [`SourceOrder`] | One source order with its line items and grouping key |
//! | [`ComboComponent`] | One weighted component of a combo SKU |
//! | [`AggregatedLine`] | Unique-SKU quantity total, first-seen ordered |
//! | [`ProductInfo`] | Catalog enrichment record |
//! | [`PickItem`] | Final enriched, sortable pick-list record |
//! | [`CartLine`] / [`CartGroup`] | Lettered cart view over grouped orders |
//! | [`RunSummary`] | Per-run fetch and data-quality counters |

mod models;

pub use models::{
    AggregatedLine, CartGroup, CartLine, ComboComponent, PickItem, ProductInfo, RunSummary, Sale,
    SourceOrder,
};
