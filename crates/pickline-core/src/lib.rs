//! # Pickline Core
//!
//! Multi-source pick list aggregation for warehouse picking.
//!
//! ## Overview
//!
//! Pickline collects pending-sale line items from several independent
//! order-management APIs, reconciles them into one deduplicated pick list,
//! and groups multi-item sales into lettered cart units:
//!
//! - **Resilient request executor** with per-outcome retry budgets,
//!   rate limiting and auth refresh
//! - **Connector and catalog traits** for source adapters
//! - **SKU normalization** with tagged sentinels for bad data
//! - **Combo expansion**, **quantity aggregation** and **cart grouping**
//! - **Pipeline orchestrator** over a bounded parallel fetch stage
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`aggregate`] | First-seen-ordered SKU totals |
//! | [`auth`] | Token refresh capability and shared holder |
//! | [`cart`] | Cart grouping and letter assignment |
//! | [`catalog`] | Combo/product catalog contract |
//! | [`combo`] | Combo expansion |
//! | [`connector`] | Source connector contract |
//! | [`domain`] | Domain models (Sale, SourceOrder, PickItem, CartGroup) |
//! | [`error`] | Fatal pipeline errors |
//! | [`executor`] | Resilient HTTP request executor |
//! | [`http_client`] | HTTP client abstraction |
//! | [`normalize`] | SKU cleaning and data-quality tagging |
//! | [`pipeline`] | Pipeline orchestrator |
//! | [`source`] | Source identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pickline_core::{Pipeline, StaticCatalog};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = Arc::new(StaticCatalog::new());
//!     let run = Pipeline::new(catalog)
//!         .register_primary(marketplace_connector())
//!         .register(storefront_connector())
//!         .run()
//!         .await?;
//!
//!     for item in &run.items {
//!         println!("{} x{:.0} ({})", item.sku, item.quantity, item.description);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Data-quality problems (blank SKUs, bad quantities, broken combos) are
//! never thrown: they become tagged sentinel SKUs that stay visible in the
//! output and are counted in [`RunSummary`]. Only two conditions abort a
//! run: the primary source failing to initialize, and zero sales across all
//! sources. The request executor likewise never errors on exhaustion: a
//! terminal non-2xx response is returned as data for the caller to judge.

pub mod aggregate;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod combo;
pub mod connector;
pub mod domain;
pub mod error;
pub mod executor;
pub mod http_client;
pub mod normalize;
pub mod pipeline;
pub mod source;

// Re-export commonly used types at crate root for convenience

// Aggregation
pub use aggregate::aggregate;

// Auth
pub use auth::{TokenCell, TokenRefresher};

// Cart grouping
pub use cart::{cart_letter, group_carts};

// Catalog contract
pub use catalog::{Catalog, ComboTable, StaticCatalog};

// Combo expansion
pub use combo::{expand_combos, ExpandStats};

// Connector contract
pub use connector::{FetchPage, SaleSource, SourceError, SourceErrorKind};

// Domain models
pub use domain::{
    AggregatedLine, CartGroup, CartLine, ComboComponent, PickItem, ProductInfo, RunSummary, Sale,
    SourceOrder,
};

// Error types
pub use error::PipelineError;

// Executor
pub use executor::{ExecutorConfig, RequestExecutor};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse,
    NoopHttpClient, ReqwestHttpClient,
};

// Normalization
pub use normalize::{
    clean_sku, is_tagged, normalize_sales, NormalizeStats, INVALID_COMBO_TAG, INVALID_QTY_TAG,
    INVALID_SKU_TAG,
};

// Pipeline
pub use pipeline::{PickRun, Pipeline, DEFAULT_WORKER_LIMIT};

// Source identifiers
pub use source::SourceId;
