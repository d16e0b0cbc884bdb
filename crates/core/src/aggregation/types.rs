//! Aggregation tree types.

use std::collections::BTreeMap;

use provender_shared::types::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category bucket for products whose category is unknown or was deleted.
pub const UNCLASSIFIED: &str = "unclassified";

/// Supplier bucket for items whose product no longer resolves to a supplier.
pub const UNKNOWN_SUPPLIER: &str = "unknown";

/// Point-in-time product attributes joined into the rollup.
///
/// Produced by a snapshot read at aggregation time, not taken from the
/// orders themselves.
#[derive(Debug, Clone)]
pub struct ProductSnapshot {
    /// Category name, if the product is classified.
    pub category: Option<String>,
    /// Supplier name.
    pub supplier: Option<String>,
    /// Current total stock across lots.
    pub stock_quantity: i64,
}

/// Leaf node: demand totals for one product, joined with its stock snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRollup {
    /// The product.
    pub product_id: ProductId,
    /// Name captured from the order items.
    pub product_name: String,
    /// Specification captured from the order items.
    pub specification: Option<String>,
    /// Total confirmed demand.
    pub total_quantity: i64,
    /// Total confirmed amount.
    pub total_amount: Decimal,
    /// Current stock, or `None` when the product no longer exists.
    pub stock_quantity: Option<i64>,
}

impl ProductRollup {
    /// Compares demand against the stock snapshot.
    ///
    /// Returns `None` when the product no longer exists and no snapshot was
    /// available.
    #[must_use]
    pub fn stock_covers_demand(&self) -> Option<bool> {
        self.stock_quantity.map(|s| s >= self.total_quantity)
    }
}

/// Per-supplier totals within a category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplierRollup {
    /// Total quantity across this supplier's products.
    pub total_quantity: i64,
    /// Total amount across this supplier's products.
    pub total_amount: Decimal,
    /// Product leaves, keyed by product ID.
    pub products: BTreeMap<ProductId, ProductRollup>,
}

/// Per-category totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryRollup {
    /// Total quantity across this category.
    pub total_quantity: i64,
    /// Total amount across this category.
    pub total_amount: Decimal,
    /// Supplier buckets, keyed by supplier name.
    pub suppliers: BTreeMap<String, SupplierRollup>,
}

/// The full category -> supplier -> product rollup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryTree {
    /// Category buckets, keyed by category name.
    pub categories: BTreeMap<String, CategoryRollup>,
    /// Grand total quantity.
    pub total_quantity: i64,
    /// Grand total amount; equals the sum of line totals over all included
    /// orders' items.
    pub total_amount: Decimal,
}

impl CategoryTree {
    /// Returns true if nothing was aggregated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
