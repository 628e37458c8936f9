//! Combo expansion.
//!
//! A combo is a catalog SKU that, when sold, must be picked as fixed-ratio
//! component SKUs. Expansion conserves quantity: a combo sold with quantity
//! Q and components `[(A,2),(B,3)]` becomes `A:2Q` and `B:3Q`.

use tracing::{info, warn};

use crate::catalog::ComboTable;
use crate::normalize::{is_tagged, INVALID_COMBO_TAG};
use crate::Sale;

/// Counters for the expansion stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandStats {
    pub combos_expanded: usize,
    pub invalid_combo: usize,
}

/// Rewrites combo sales into weighted component lines. Non-combo and
/// already-tagged sales pass through unchanged.
pub fn expand_combos(sales: Vec<Sale>, combos: &ComboTable) -> (Vec<Sale>, ExpandStats) {
    let mut expanded = Vec::with_capacity(sales.len());
    let mut stats = ExpandStats::default();

    for sale in sales {
        if is_tagged(&sale.sku) {
            expanded.push(sale);
            continue;
        }

        let Some(components) = combos.get(&sale.sku).filter(|c| !c.is_empty()) else {
            expanded.push(sale);
            continue;
        };

        info!(
            combo = %sale.sku,
            components = components.len(),
            "expanding combo"
        );
        stats.combos_expanded += 1;

        for component in components {
            let quantity = sale.quantity * component.multiplier;
            if quantity <= 0.0 {
                warn!(
                    combo = %sale.sku,
                    component = %component.sku,
                    quantity,
                    "combo component expanded to non-positive quantity"
                );
                stats.invalid_combo += 1;
                expanded.push(Sale::new(
                    format!("{INVALID_COMBO_TAG}{}", component.sku),
                    quantity,
                    sale.origin.clone(),
                ));
            } else {
                expanded.push(Sale::new(
                    component.sku.clone(),
                    quantity,
                    sale.origin.clone(),
                ));
            }
        }
    }

    (expanded, stats)
}
