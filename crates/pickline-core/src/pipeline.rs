//! Pipeline orchestrator.
//!
//! Runs source connectors concurrently on a bounded pool, then drives the
//! sequential stages: normalize, expand combos, aggregate, enrich, sort and
//! cart-group. The join after the fetch stage is the single synchronization
//! barrier; everything after it is single-threaded.
//!
//! A failing secondary source contributes partial (possibly empty) results
//! and the run continues. Two conditions are fatal: the primary source
//! failing to initialize, and an empty merged sale set.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::aggregate::aggregate;
use crate::cart::group_carts;
use crate::catalog::{Catalog, ComboTable};
use crate::combo::expand_combos;
use crate::connector::SaleSource;
use crate::normalize::{is_tagged, normalize_sales};
use crate::{CartGroup, PickItem, PipelineError, ProductInfo, RunSummary, Sale, SourceOrder};

/// Default bounded worker pool size for the parallel fetch stage.
pub const DEFAULT_WORKER_LIMIT: usize = 4;

struct SourceRegistration {
    source: Arc<dyn SaleSource>,
    primary: bool,
}

/// Completed run output.
#[derive(Debug, Clone, PartialEq)]
pub struct PickRun {
    pub items: Vec<PickItem>,
    pub carts: Vec<CartGroup>,
    pub summary: RunSummary,
}

/// Multi-source aggregation pipeline.
///
/// Sources and the catalog are injected at construction; there is no hidden
/// global credential state. Each connector brings its own request executor
/// with source-specific policy.
pub struct Pipeline {
    sources: Vec<SourceRegistration>,
    catalog: Arc<dyn Catalog>,
    worker_limit: usize,
}

impl Pipeline {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            sources: Vec::new(),
            catalog,
            worker_limit: DEFAULT_WORKER_LIMIT,
        }
    }

    /// Registers the primary source. Its initialization failure aborts the
    /// whole run.
    pub fn register_primary(mut self, source: Arc<dyn SaleSource>) -> Self {
        self.sources.push(SourceRegistration {
            source,
            primary: true,
        });
        self
    }

    /// Registers a secondary source. Its failures are absorbed as warnings.
    pub fn register(mut self, source: Arc<dyn SaleSource>) -> Self {
        self.sources.push(SourceRegistration {
            source,
            primary: false,
        });
        self
    }

    pub fn with_worker_limit(mut self, worker_limit: usize) -> Self {
        self.worker_limit = worker_limit.max(1);
        self
    }

    /// Runs the whole pipeline and returns the ordered pick list, the cart
    /// groups, and the run summary.
    pub async fn run(&self) -> Result<PickRun, PipelineError> {
        // Stage 0: establish identity/credentials per source.
        let mut active: Vec<Arc<dyn SaleSource>> = Vec::new();
        for registration in &self.sources {
            match registration.source.init().await {
                Ok(()) => active.push(Arc::clone(&registration.source)),
                Err(err) if registration.primary => {
                    return Err(PipelineError::PrimarySourceInit {
                        source: registration.source.id(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => {
                    warn!(
                        source = registration.source.label(),
                        error = %err,
                        "secondary source init failed, skipping"
                    );
                }
            }
        }

        // Stage 1: parallel fetch, joined before anything else runs.
        let (mut sales, mut orders, fetched) = self.fetch_all(&active).await;
        info!(
            sales = sales.len(),
            orders = orders.len(),
            "merged source results"
        );
        if sales.is_empty() {
            return Err(PipelineError::NoSales);
        }

        let mut summary = RunSummary {
            fetched,
            ..RunSummary::default()
        };

        // Stage 2: normalize SKUs, on the merged list and on the nested
        // order items so cart output matches the pick list.
        let stats = normalize_sales(&mut sales);
        summary.invalid_sku = stats.invalid_sku;
        summary.invalid_quantity = stats.invalid_quantity;
        for order in &mut orders {
            normalize_sales(&mut order.items);
        }

        // Stage 3: expand combos against the table loaded once per run.
        let combos = self.load_combo_table().await;
        let (sales, expand_stats) = expand_combos(sales, &combos);
        summary.invalid_combo = expand_stats.invalid_combo;

        // Stage 4: reduce to unique-SKU totals, first-seen ordered.
        let lines = aggregate(&sales);
        summary.unique_skus = lines.len();
        info!(unique_skus = lines.len(), "aggregated sales");

        // Stage 5: enrich against the catalog. Misses keep the line.
        let mut products: HashMap<String, ProductInfo> = HashMap::new();
        for line in &lines {
            if is_tagged(&line.sku) {
                continue;
            }
            match self.catalog.product(&line.sku).await {
                Ok(Some(info)) => {
                    products.insert(line.sku.clone(), info);
                }
                Ok(None) => {
                    warn!(sku = %line.sku, "sku not found in catalog");
                    summary.catalog_misses += 1;
                }
                Err(err) => {
                    warn!(sku = %line.sku, error = %err, "catalog lookup failed");
                    summary.catalog_misses += 1;
                }
            }
        }

        let mut items: Vec<PickItem> = lines
            .iter()
            .map(|line| {
                let info = products.get(&line.sku).cloned().unwrap_or_default();
                PickItem {
                    sku: line.sku.clone(),
                    quantity: line.total_quantity,
                    description: info.description,
                    provider: info.provider,
                    unit: info.unit,
                    available_stock: info.stock,
                    sub_category: info.category,
                }
            })
            .collect();

        // Stage 6: stable multi-key sort; empty strings sort first.
        items.sort_by(|a, b| {
            (&a.unit, &a.provider, &a.sub_category, &a.description).cmp(&(
                &b.unit,
                &b.provider,
                &b.sub_category,
                &b.description,
            ))
        });

        // Stage 7: cart grouping over the raw per-order records.
        let carts = group_carts(&orders, &products);
        info!(
            items = items.len(),
            carts = carts.len(),
            "pipeline complete"
        );

        Ok(PickRun {
            items,
            carts,
            summary,
        })
    }

    async fn fetch_all(
        &self,
        active: &[Arc<dyn SaleSource>],
    ) -> (Vec<Sale>, Vec<SourceOrder>, Vec<(String, usize)>) {
        let semaphore = Arc::new(Semaphore::new(self.worker_limit));
        let mut join_set = JoinSet::new();
        for (slot, source) in active.iter().enumerate() {
            let source = Arc::clone(source);
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("fetch semaphore is never closed");
                (slot, drain_source(source.as_ref()).await)
            });
        }

        let mut slots: Vec<(Vec<Sale>, Vec<SourceOrder>)> =
            (0..active.len()).map(|_| Default::default()).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((slot, result)) => slots[slot] = result,
                Err(err) => warn!(error = %err, "source fetch task failed"),
            }
        }

        // Merge in registration order so downstream first-seen ordering is
        // reproducible run to run.
        let mut sales = Vec::new();
        let mut orders = Vec::new();
        let mut fetched = Vec::new();
        for (source, (source_sales, source_orders)) in active.iter().zip(slots) {
            fetched.push((source.label().to_owned(), source_sales.len()));
            sales.extend(source_sales);
            orders.extend(source_orders);
        }
        (sales, orders, fetched)
    }

    async fn load_combo_table(&self) -> ComboTable {
        match self.catalog.combo_table().await {
            Ok(combos) => {
                info!(combos = combos.len(), "combo table loaded");
                combos
            }
            Err(err) => {
                warn!(error = %err, "combo table unavailable, skipping expansion");
                ComboTable::new()
            }
        }
    }
}

async fn drain_source(source: &dyn SaleSource) -> (Vec<Sale>, Vec<SourceOrder>) {
    let mut sales = Vec::new();
    let mut orders = Vec::new();
    let mut cursor = None;

    loop {
        match source.fetch(cursor).await {
            Ok(page) => {
                sales.extend(page.sales);
                orders.extend(page.orders);
                match page.next_cursor {
                    Some(next) => cursor = Some(next),
                    None => break,
                }
            }
            Err(err) => {
                warn!(
                    source = source.label(),
                    error = %err,
                    "fetch failed, keeping partial results"
                );
                break;
            }
        }
    }

    info!(
        source = source.label(),
        sales = sales.len(),
        orders = orders.len(),
        "source fetch complete"
    );
    (sales, orders)
}
