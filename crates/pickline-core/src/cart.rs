//! Cart grouping.
//!
//! Orders sharing a logical sale identifier (pack id or order id) are
//! clustered into one cart, lettered A, B, ... Z, AA, AB, ... in assignment
//! order so pickers can stage multi-item sales together. A group touching
//! fewer than two distinct SKUs needs no cart and does not consume a letter.

use std::collections::HashMap;

use crate::{CartGroup, CartLine, ProductInfo, SourceOrder};

/// Spreadsheet-style letter for a zero-based cart index: 0 -> "A",
/// 25 -> "Z", 26 -> "AA".
pub fn cart_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut i = index;
    loop {
        letters.push(b'A' + (i % 26) as u8);
        if i < 26 {
            break;
        }
        i = i / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).expect("letters are ascii")
}

/// Groups source orders into lettered carts.
///
/// Groups are ordered by (earliest order creation time, then order id)
/// ascending; undated groups sort last. `products` is the enrichment cache
/// built during the pick-list stage; SKUs missing from it get empty
/// description/sector.
pub fn group_carts(
    orders: &[SourceOrder],
    products: &HashMap<String, ProductInfo>,
) -> Vec<CartGroup> {
    let mut member_index: HashMap<i64, Vec<&SourceOrder>> = HashMap::new();
    let mut group_order: Vec<i64> = Vec::new();
    for order in orders {
        let members = member_index.entry(order.group_id).or_default();
        if members.is_empty() {
            group_order.push(order.group_id);
        }
        members.push(order);
    }

    let mut keyed: Vec<(bool, Option<time::OffsetDateTime>, i64, i64)> = group_order
        .iter()
        .map(|&group_id| {
            let members = &member_index[&group_id];
            let earliest = members.iter().filter_map(|o| o.created_at).min();
            let first_order = members
                .iter()
                .map(|o| o.order_id)
                .min()
                .unwrap_or(group_id);
            (earliest.is_none(), earliest, first_order, group_id)
        })
        .collect();
    keyed.sort();

    let mut carts = Vec::new();
    let mut letter_index = 0usize;
    for (_, earliest, _, group_id) in keyed {
        let members = &member_index[&group_id];

        let mut distinct: Vec<&str> = members
            .iter()
            .flat_map(|o| o.items.iter().map(|s| s.sku.as_str()))
            .collect();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() < 2 {
            continue;
        }

        let items = members
            .iter()
            .flat_map(|o| o.items.iter())
            .map(|sale| {
                let info = products.get(&sale.sku);
                CartLine {
                    sku: sale.sku.clone(),
                    quantity: sale.quantity,
                    description: info.map(|p| p.description.clone()).unwrap_or_default(),
                    sector: info.map(|p| p.category.clone()).unwrap_or_default(),
                }
            })
            .collect();

        carts.push(CartGroup {
            sale_number: members[0].sale_number(),
            created_at: earliest,
            letter: cart_letter(letter_index),
            items,
        });
        letter_index += 1;
    }

    carts
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::Sale;

    fn order(order_id: i64, group_id: Option<i64>, skus: &[(&str, f64)]) -> SourceOrder {
        let mut order = SourceOrder::new(order_id, group_id, None);
        for (sku, qty) in skus {
            order.items.push(Sale::new(*sku, *qty, "marketplace"));
        }
        order
    }

    #[test]
    fn letters_follow_spreadsheet_columns() {
        assert_eq!(cart_letter(0), "A");
        assert_eq!(cart_letter(1), "B");
        assert_eq!(cart_letter(25), "Z");
        assert_eq!(cart_letter(26), "AA");
        assert_eq!(cart_letter(27), "AB");
        assert_eq!(cart_letter(51), "AZ");
        assert_eq!(cart_letter(52), "BA");
    }

    #[test]
    fn single_sku_group_is_dropped_without_consuming_a_letter() {
        let orders = vec![
            order(1, None, &[("100", 1.0), ("200", 1.0)]),
            order(2, None, &[("300", 5.0)]),
            order(3, None, &[("400", 1.0), ("500", 2.0)]),
        ];

        let carts = group_carts(&orders, &HashMap::new());

        assert_eq!(carts.len(), 2);
        assert_eq!(carts[0].letter, "A");
        assert_eq!(carts[1].letter, "B");
    }

    #[test]
    fn pack_members_merge_into_one_cart() {
        // Two orders from one checkout share a pack id; each alone has one
        // SKU but the cart spans both.
        let orders = vec![
            order(10, Some(7000), &[("100", 1.0)]),
            order(11, Some(7000), &[("200", 2.0)]),
        ];

        let carts = group_carts(&orders, &HashMap::new());

        assert_eq!(carts.len(), 1);
        assert_eq!(carts[0].items.len(), 2);
        assert_eq!(carts[0].sale_number, "7000");
    }

    #[test]
    fn groups_sort_by_creation_time_then_order_id_with_undated_last() {
        let mut late = order(1, None, &[("100", 1.0), ("200", 1.0)]);
        late.created_at = Some(datetime!(2026-03-02 12:00 UTC));
        let mut early = order(2, None, &[("300", 1.0), ("400", 1.0)]);
        early.created_at = Some(datetime!(2026-03-01 09:00 UTC));
        let undated = order(3, None, &[("500", 1.0), ("600", 1.0)]);

        let carts = group_carts(&[late, early, undated], &HashMap::new());

        assert_eq!(carts.len(), 3);
        assert_eq!(carts[0].sale_number, "2");
        assert_eq!(carts[0].letter, "A");
        assert_eq!(carts[1].sale_number, "1");
        assert_eq!(carts[2].sale_number, "3");
    }

    #[test]
    fn cart_lines_pick_up_enrichment_when_available() {
        let mut products = HashMap::new();
        products.insert(
            String::from("100"),
            ProductInfo {
                description: String::from("mate jar"),
                category: String::from("kitchen"),
                ..ProductInfo::default()
            },
        );

        let orders = vec![order(1, None, &[("100", 1.0), ("999", 1.0)])];
        let carts = group_carts(&orders, &products);

        assert_eq!(carts[0].items[0].description, "mate jar");
        assert_eq!(carts[0].items[0].sector, "kitchen");
        assert_eq!(carts[0].items[1].description, "");
    }
}
