//! Product catalog and lot inventory persistence.

use std::sync::Arc;

use chrono::NaiveDate;
use provender_core::aggregation::ProductSnapshot;
use provender_core::inventory::{InventoryError, ProductInventory};
use provender_shared::AppError;
use provender_shared::types::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collections;
use crate::engine::{MemoryStore, StoreError};

/// Errors from stock operations.
#[derive(Debug, Error)]
pub enum StockError {
    /// The referenced product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A domain-level inventory violation.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<StockError> for AppError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::ProductNotFound(_) => Self::NotFound(err.to_string()),
            StockError::Inventory(InventoryError::InsufficientStock { .. }) => {
                Self::InsufficientStock(err.to_string())
            }
            StockError::Inventory(_) => Self::Validation(err.to_string()),
            StockError::Store(e) => e.into(),
        }
    }
}

/// A catalog product with its embedded lot inventory.
///
/// The lot list rides inside the product document, so a receipt or
/// consumption commits the lots and the derived stock fields as one write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Packaging or grade specification (e.g. "10kg box").
    pub specification: Option<String>,
    /// Category name, if classified.
    pub category: Option<String>,
    /// Supplier name.
    pub supplier: Option<String>,
    /// Stock level at or below which the product counts as low.
    pub minimum_stock: i64,
    /// Lot inventory.
    pub inventory: ProductInventory,
}

impl Product {
    /// Returns the point-in-time attributes the aggregation engine joins in.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            category: self.category.clone(),
            supplier: self.supplier.clone(),
            stock_quantity: self.inventory.stock_quantity,
        }
    }

    /// Returns true if stock is at or below the configured minimum.
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        self.inventory.stock_quantity <= self.minimum_stock
    }
}

/// Stores products and applies FIFO stock movements atomically.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    store: Arc<MemoryStore>,
}

impl InventoryRepository {
    /// Creates a repository over the given store.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Creates a product with empty inventory.
    ///
    /// # Errors
    ///
    /// Returns a storage error on serialization failure.
    pub async fn create(
        &self,
        name: impl Into<String>,
        specification: Option<String>,
        category: Option<String>,
        supplier: Option<String>,
        minimum_stock: i64,
    ) -> Result<Product, StockError> {
        let product = Product {
            id: ProductId::new(),
            name: name.into(),
            specification,
            category,
            supplier,
            minimum_stock,
            inventory: ProductInventory::default(),
        };
        self.store
            .transact::<_, StockError, _>(|txn| {
                txn.put(collections::PRODUCTS, &product.id.to_string(), &product)?;
                Ok(())
            })
            .await?;
        Ok(product)
    }

    /// Fetches one product.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::ProductNotFound`] for an unknown id.
    pub fn get(&self, id: ProductId) -> Result<Product, StockError> {
        self.store
            .get::<Product>(collections::PRODUCTS, &id.to_string())?
            .ok_or(StockError::ProductNotFound(id))
    }

    /// Records a stock receipt for `id`, merging into the lot dated
    /// `lot_date` if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::ProductNotFound`] for an unknown product, or a
    /// validation error for a non-positive quantity / negative price.
    pub async fn receive(
        &self,
        id: ProductId,
        lot_date: NaiveDate,
        quantity: i64,
        price: Decimal,
    ) -> Result<Product, StockError> {
        self.store
            .transact(|txn| {
                let mut product: Product = txn
                    .get(collections::PRODUCTS, &id.to_string())?
                    .ok_or(StockError::ProductNotFound(id))?;
                product.inventory.receive(lot_date, quantity, price)?;
                txn.put(collections::PRODUCTS, &id.to_string(), &product)?;
                Ok(product)
            })
            .await
    }

    /// Consumes `quantity` units of `id`, oldest lot first.
    ///
    /// All-or-nothing: on insufficient stock nothing is deducted and the
    /// stored document is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::ProductNotFound`] for an unknown product, or
    /// [`InventoryError::InsufficientStock`] when the request exceeds total
    /// stock.
    pub async fn consume(&self, id: ProductId, quantity: i64) -> Result<Product, StockError> {
        self.store
            .transact(|txn| {
                let mut product: Product = txn
                    .get(collections::PRODUCTS, &id.to_string())?
                    .ok_or(StockError::ProductNotFound(id))?;
                product.inventory.consume(quantity)?;
                txn.put(collections::PRODUCTS, &id.to_string(), &product)?;
                Ok(product)
            })
            .await
    }

    /// Returns every product whose stock is at or below its minimum.
    ///
    /// # Errors
    ///
    /// Returns a storage error on serialization failure.
    pub fn low_stock(&self) -> Result<Vec<Product>, StockError> {
        let mut low: Vec<Product> = self
            .store
            .query::<Product>(collections::PRODUCTS)?
            .into_iter()
            .filter(Product::is_low_stock)
            .collect();
        low.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn repo() -> InventoryRepository {
        InventoryRepository::new(Arc::new(MemoryStore::new(200, 64)))
    }

    async fn cabbage(repo: &InventoryRepository) -> Product {
        repo.create(
            "Napa cabbage",
            Some("10kg box".to_string()),
            Some("Vegetables".to_string()),
            Some("Sunrise Farm".to_string()),
            5,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_receive_and_consume_fifo_through_store() {
        let repo = repo();
        let product = cabbage(&repo).await;

        repo.receive(product.id, date(2025, 1, 1), 10, dec!(100))
            .await
            .unwrap();
        repo.receive(product.id, date(2025, 1, 3), 5, dec!(110))
            .await
            .unwrap();

        let after = repo.consume(product.id, 12).await.unwrap();
        assert_eq!(after.inventory.stock_quantity, 3);
        assert_eq!(after.inventory.lots[0].stock, 0);
        assert_eq!(after.inventory.lots[1].stock, 3);

        // The stored document matches what the call returned.
        let stored = repo.get(product.id).unwrap();
        assert_eq!(stored.inventory.stock_quantity, 3);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_document_untouched() {
        let repo = repo();
        let product = cabbage(&repo).await;
        repo.receive(product.id, date(2025, 1, 1), 3, dec!(100))
            .await
            .unwrap();

        let err = repo.consume(product.id, 4).await.unwrap_err();
        assert!(matches!(
            err,
            StockError::Inventory(InventoryError::InsufficientStock {
                requested: 4,
                available: 3
            })
        ));
        let stored = repo.get(product.id).unwrap();
        assert_eq!(stored.inventory.stock_quantity, 3);
        assert_eq!(stored.inventory.lots[0].stock, 3);
    }

    #[tokio::test]
    async fn test_unknown_product_is_reported() {
        let repo = repo();
        let ghost = ProductId::new();
        assert!(matches!(
            repo.consume(ghost, 1).await,
            Err(StockError::ProductNotFound(id)) if id == ghost
        ));
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let repo = repo();
        let a = cabbage(&repo).await;
        let b = repo
            .create("Daikon", None, Some("Vegetables".to_string()), None, 2)
            .await
            .unwrap();

        repo.receive(a.id, date(2025, 1, 1), 4, dec!(100)).await.unwrap();
        repo.receive(b.id, date(2025, 1, 1), 10, dec!(80)).await.unwrap();

        let low = repo.low_stock().unwrap();
        let names: Vec<&str> = low.iter().map(|p| p.name.as_str()).collect();
        // Cabbage (4 <= min 5) is low; daikon (10 > min 2) is not.
        assert_eq!(names, vec!["Napa cabbage"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_consumption_never_oversells() {
        let repo = repo();
        let product = cabbage(&repo).await;
        repo.receive(product.id, date(2025, 1, 1), 10, dec!(100))
            .await
            .unwrap();

        // Twelve concurrent consumers of 1 against stock 10: exactly two fail.
        let tasks = (0..12).map(|_| {
            let repo = repo.clone();
            let id = product.id;
            tokio::spawn(async move { repo.consume(id, 1).await })
        });
        let results = futures::future::join_all(tasks).await;
        let failures = results
            .into_iter()
            .filter(|r| r.as_ref().unwrap().is_err())
            .count();
        assert_eq!(failures, 2);
        assert_eq!(repo.get(product.id).unwrap().inventory.stock_quantity, 0);
    }
}
