//! Quantity aggregation with first-seen key ordering.

use std::collections::HashMap;

use crate::{AggregatedLine, Sale};

/// Reduces expanded sales into unique-SKU totals. Totals are commutative
/// over input order; line order is the order each SKU was first seen.
pub fn aggregate(sales: &[Sale]) -> Vec<AggregatedLine> {
    let mut lines: Vec<AggregatedLine> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for sale in sales {
        match index.get(&sale.sku) {
            Some(&slot) => lines[slot].total_quantity += sale.quantity,
            None => {
                index.insert(sale.sku.clone(), lines.len());
                lines.push(AggregatedLine {
                    sku: sale.sku.clone(),
                    total_quantity: sale.quantity,
                });
            }
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_quantities_and_preserves_first_seen_order() {
        let sales = vec![
            Sale::new("X", 1.0, "a"),
            Sale::new("Y", 2.0, "a"),
            Sale::new("X", 3.0, "b"),
        ];

        let lines = aggregate(&sales);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].sku, "X");
        assert_eq!(lines[0].total_quantity, 4.0);
        assert_eq!(lines[1].sku, "Y");
        assert_eq!(lines[1].total_quantity, 2.0);
    }

    #[test]
    fn totals_are_order_independent() {
        let forward = vec![
            Sale::new("X", 1.0, "a"),
            Sale::new("Y", 2.0, "a"),
            Sale::new("X", 3.0, "a"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let a: f64 = aggregate(&forward)
            .into_iter()
            .find(|l| l.sku == "X")
            .map(|l| l.total_quantity)
            .unwrap_or_default();
        let b: f64 = aggregate(&reversed)
            .into_iter()
            .find(|l| l.sku == "X")
            .map(|l| l.total_quantity)
            .unwrap_or_default();

        assert_eq!(a, b);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(aggregate(&[]).is_empty());
    }
}
