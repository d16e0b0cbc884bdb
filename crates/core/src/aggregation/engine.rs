//! The order aggregation engine.

use rust_decimal::Decimal;

use provender_shared::types::ProductId;

use super::types::{
    CategoryTree, ProductRollup, ProductSnapshot, UNCLASSIFIED, UNKNOWN_SUPPLIER,
};
use crate::orders::{Order, OrderStatus};

/// Rolls confirmed orders up into category -> supplier -> product totals.
///
/// Only orders with status `Confirmed` contribute; anything else in the input
/// is skipped. For each line the product is resolved through `product_lookup`
/// to obtain its category, supplier, and current stock. A product that no
/// longer resolves aggregates from the item's captured snapshot, falling back
/// to the [`UNCLASSIFIED`] category and [`UNKNOWN_SUPPLIER`] bucket.
///
/// Bucket totals are exact sums and independent of input order; map iteration
/// order (alphabetical) is a presentation convenience, not a contract.
pub fn aggregate<F>(orders: &[Order], mut product_lookup: F) -> CategoryTree
where
    F: FnMut(ProductId) -> Option<ProductSnapshot>,
{
    let mut tree = CategoryTree::default();

    for order in orders {
        if order.status != OrderStatus::Confirmed {
            continue;
        }

        for item in &order.items {
            let snapshot = product_lookup(item.product_id);

            let (category, supplier, stock_quantity) = match &snapshot {
                Some(snap) => (
                    snap.category
                        .clone()
                        .unwrap_or_else(|| UNCLASSIFIED.to_string()),
                    snap.supplier
                        .clone()
                        .unwrap_or_else(|| UNKNOWN_SUPPLIER.to_string()),
                    Some(snap.stock_quantity),
                ),
                None => (
                    UNCLASSIFIED.to_string(),
                    UNKNOWN_SUPPLIER.to_string(),
                    None,
                ),
            };

            let category_bucket = tree.categories.entry(category).or_default();
            let supplier_bucket = category_bucket.suppliers.entry(supplier).or_default();
            let leaf = supplier_bucket
                .products
                .entry(item.product_id)
                .or_insert_with(|| ProductRollup {
                    product_id: item.product_id,
                    product_name: item.product_name.clone(),
                    specification: item.specification.clone(),
                    total_quantity: 0,
                    total_amount: Decimal::ZERO,
                    stock_quantity,
                });

            leaf.total_quantity += item.quantity;
            leaf.total_amount += item.line_total;
            supplier_bucket.total_quantity += item.quantity;
            supplier_bucket.total_amount += item.line_total;
            category_bucket.total_quantity += item.quantity;
            category_bucket.total_amount += item.line_total;
            tree.total_quantity += item.quantity;
            tree.total_amount += item.line_total;
        }
    }

    tree
}


#[cfg(test)]
#[path = "engine_props.rs"]
mod props;
