//! Catalog contract: combo definitions and product enrichment.
//!
//! The combo table is loaded once per run and is read-only afterwards.
//! Whether product data comes from a live ERP lookup or a static stock file
//! is an implementation choice behind this trait.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::{ComboComponent, ProductInfo, SourceError};

/// Combo SKU -> ordered component list.
pub type ComboTable = HashMap<String, Vec<ComboComponent>>;

/// Catalog capability consumed by the pipeline.
pub trait Catalog: Send + Sync {
    /// Loads the full combo table. Called once per run.
    fn combo_table<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<ComboTable, SourceError>> + Send + 'a>>;

    /// Looks up enrichment data for one SKU. `Ok(None)` means the catalog
    /// has no record; the pipeline logs it and keeps the line.
    fn product<'a>(
        &'a self,
        sku: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ProductInfo>, SourceError>> + Send + 'a>>;
}

/// In-memory catalog for tests and offline runs.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    combos: ComboTable,
    products: HashMap<String, ProductInfo>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_combo(mut self, sku: impl Into<String>, components: Vec<ComboComponent>) -> Self {
        self.combos.insert(sku.into(), components);
        self
    }

    pub fn with_product(mut self, sku: impl Into<String>, info: ProductInfo) -> Self {
        self.products.insert(sku.into(), info);
        self
    }
}

impl Catalog for StaticCatalog {
    fn combo_table<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<ComboTable, SourceError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.combos.clone()) })
    }

    fn product<'a>(
        &'a self,
        sku: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ProductInfo>, SourceError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.products.get(sku).cloned()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_catalog_round_trips_combos_and_products() {
        let catalog = StaticCatalog::new()
            .with_combo("900", vec![ComboComponent::new("100", 2.0)])
            .with_product(
                "100",
                ProductInfo {
                    description: String::from("widget"),
                    ..ProductInfo::default()
                },
            );

        let table = catalog.combo_table().await.expect("combo table");
        assert_eq!(table["900"].len(), 1);

        let hit = catalog.product("100").await.expect("lookup");
        assert_eq!(hit.expect("present").description, "widget");

        let miss = catalog.product("999").await.expect("lookup");
        assert!(miss.is_none());
    }
}
