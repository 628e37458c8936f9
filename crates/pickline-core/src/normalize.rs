//! SKU normalization and data-quality tagging.
//!
//! Data-quality problems are never thrown. A sale that cannot be cleaned is
//! rewritten to a tagged sentinel SKU that flows through expansion,
//! aggregation and output, so it stays visible to the picker instead of
//! silently vanishing.

use tracing::warn;

use crate::Sale;

/// SKU that was blank or non-numeric after cleaning.
pub const INVALID_SKU_TAG: &str = "INVALID_SKU: ";
/// Sale with a zero or negative quantity.
pub const INVALID_QTY_TAG: &str = "INVALID_QTY: ";
/// Combo component whose expanded quantity came out non-positive.
pub const INVALID_COMBO_TAG: &str = "INVALID_COMBO: ";

/// True when a SKU already carries a data-quality tag. Tagged sales skip
/// normalization and combo expansion.
pub fn is_tagged(sku: &str) -> bool {
    sku.starts_with(INVALID_SKU_TAG)
        || sku.starts_with(INVALID_QTY_TAG)
        || sku.starts_with(INVALID_COMBO_TAG)
}

/// Cleans a raw SKU into canonical all-digit form.
///
/// Steps: trim, truncate at the first embedded space, strip leading and
/// trailing non-digit characters. Returns `None` when nothing numeric
/// survives. Idempotent: a canonical SKU passes through unchanged.
pub fn clean_sku(raw: &str) -> Option<String> {
    let mut sku = raw.trim();
    if let Some(space) = sku.find(' ') {
        sku = &sku[..space];
    }
    let sku = sku
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .trim_end_matches(|c: char| !c.is_ascii_digit());

    if !sku.is_empty() && sku.chars().all(|c| c.is_ascii_digit()) {
        Some(sku.to_owned())
    } else {
        None
    }
}

/// Per-stage tag counters, folded into the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub invalid_sku: usize,
    pub invalid_quantity: usize,
}

/// Normalizes every sale in place, tagging the ones that fail validation.
pub fn normalize_sales(sales: &mut [Sale]) -> NormalizeStats {
    let mut stats = NormalizeStats::default();
    for sale in sales {
        normalize_sale(sale, &mut stats);
    }
    stats
}

fn normalize_sale(sale: &mut Sale, stats: &mut NormalizeStats) {
    if is_tagged(&sale.sku) {
        return;
    }

    if sale.quantity <= 0.0 {
        warn!(
            sku = %sale.sku,
            quantity = sale.quantity,
            origin = %sale.origin,
            "sale with non-positive quantity"
        );
        sale.sku = format!("{INVALID_QTY_TAG}{}", sale.sku.trim());
        stats.invalid_quantity += 1;
        return;
    }

    match clean_sku(&sale.sku) {
        Some(clean) => sale.sku = clean,
        None => {
            warn!(sku = %sale.sku, origin = %sale.origin, "sale with unusable sku");
            sale.sku = format!("{INVALID_SKU_TAG}{}", sale.sku.trim());
            stats.invalid_sku += 1;
        }
    }
}
