//! Live order aggregation and purchase planning.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use provender_core::aggregation::{CategoryTree, ProductSnapshot, aggregate};
use provender_core::cutoff::CutoffCycle;
use provender_core::orders::{Order, OrderStatus};
use provender_core::sequence::SequenceDomain;
use provender_shared::AppError;
use provender_shared::types::ProductId;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::{broadcast, watch};

use super::collections;
use super::inventory::Product;
use super::sequence::SequenceGenerator;
use crate::engine::{ChangeEvent, MemoryStore, StoreError};

/// Errors from purchase planning.
#[derive(Debug, Error)]
pub enum PlanningError {
    /// Purchase orders can only be generated after a cutoff close.
    #[error("Cannot generate purchase orders while the ordering window is still open")]
    CycleStillOpen,

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PlanningError> for AppError {
    fn from(err: PlanningError) -> Self {
        match err {
            PlanningError::CycleStillOpen => Self::BusinessRule(err.to_string()),
            PlanningError::Store(e) => e.into(),
        }
    }
}

/// One product line of a supplier purchase order draft.
#[derive(Debug, Clone)]
pub struct PurchaseOrderLine {
    /// The product to buy.
    pub product_id: ProductId,
    /// Name captured from the ordered items.
    pub product_name: String,
    /// Specification captured from the ordered items.
    pub specification: Option<String>,
    /// Total confirmed demand.
    pub quantity: i64,
    /// Total confirmed amount.
    pub amount: Decimal,
}

/// A numbered per-supplier purchase order draft.
#[derive(Debug, Clone)]
pub struct PurchaseOrderDraft {
    /// Document number, `PO-YYMMDD-NNN`.
    pub number: String,
    /// Supplier the draft is addressed to.
    pub supplier: String,
    /// Product lines, aggregated across categories.
    pub lines: Vec<PurchaseOrderLine>,
    /// Sum of line quantities.
    pub total_quantity: i64,
    /// Sum of line amounts.
    pub total_amount: Decimal,
}

/// Computes the category -> supplier -> product rollup over the store and
/// turns closed-window demand into supplier purchase order drafts.
#[derive(Debug, Clone)]
pub struct AggregationService {
    store: Arc<MemoryStore>,
    sequences: SequenceGenerator,
}

impl AggregationService {
    /// Creates a service over the given store.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>) -> Self {
        let sequences = SequenceGenerator::new(Arc::clone(&store));
        Self { store, sequences }
    }

    /// Computes the rollup over all confirmed orders, joined with current
    /// product snapshots.
    ///
    /// # Errors
    ///
    /// Returns a storage error on serialization failure.
    pub fn rollup(&self) -> Result<CategoryTree, StoreError> {
        let orders: Vec<Order> = self.store.query(collections::ORDERS)?;
        let snapshots = self.product_snapshots()?;
        Ok(aggregate(&orders, |id| snapshots.get(&id).cloned()))
    }

    /// Spawns a background refresher and returns a watch handle on the
    /// rollup.
    ///
    /// The view recomputes whenever an order or product document commits.
    /// If the refresher falls behind the change bus it recomputes from the
    /// full snapshot, so a lagged receiver only costs staleness, never a
    /// wrong tree. The task exits when the store or the last watch handle is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the initial rollup fails.
    pub fn watch(&self) -> Result<watch::Receiver<CategoryTree>, StoreError> {
        let (tx, rx) = watch::channel(self.rollup()?);
        let service = self.clone();
        let mut changes = service.store.subscribe();

        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(ChangeEvent { collection, .. })
                        if collection == collections::ORDERS
                            || collection == collections::PRODUCTS => {}
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "aggregation watcher lagged, recomputing");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
                match service.rollup() {
                    Ok(tree) => {
                        if tx.send(tree).is_err() {
                            break;
                        }
                    }
                    Err(error) => tracing::warn!(%error, "aggregation recompute failed"),
                }
            }
        });

        Ok(rx)
    }

    /// Builds per-supplier purchase order drafts from the demand confirmed
    /// before the current window opened.
    ///
    /// Orders placed in the still-open window are excluded; they belong to
    /// the next close. Supplier buckets merge across categories, and
    /// products without a resolvable supplier land in the
    /// [`provender_core::aggregation::UNKNOWN_SUPPLIER`] bucket for manual
    /// review.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::CycleStillOpen`] if no cutoff close has ever
    /// happened.
    pub async fn purchase_plan(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<PurchaseOrderDraft>, PlanningError> {
        let current: Option<CutoffCycle> = self
            .store
            .get(collections::CYCLES, collections::CURRENT_CYCLE)?;
        let Some(current) = current else {
            return Err(PlanningError::CycleStillOpen);
        };
        let cycles: Vec<CutoffCycle> = self.store.query(collections::CYCLES)?;
        if !cycles.iter().any(CutoffCycle::is_closed) {
            return Err(PlanningError::CycleStillOpen);
        }

        let orders: Vec<Order> = self
            .store
            .query::<Order>(collections::ORDERS)?
            .into_iter()
            .filter(|o| o.status == OrderStatus::Confirmed && o.placed_at < current.opened_at)
            .collect();
        let snapshots = self.product_snapshots()?;
        let tree = aggregate(&orders, |id| snapshots.get(&id).cloned());

        // Merge supplier buckets across categories into one draft each.
        let mut by_supplier: BTreeMap<String, BTreeMap<ProductId, PurchaseOrderLine>> =
            BTreeMap::new();
        for category in tree.categories.values() {
            for (supplier, bucket) in &category.suppliers {
                let lines = by_supplier.entry(supplier.clone()).or_default();
                for (product_id, leaf) in &bucket.products {
                    let line = lines.entry(*product_id).or_insert_with(|| PurchaseOrderLine {
                        product_id: *product_id,
                        product_name: leaf.product_name.clone(),
                        specification: leaf.specification.clone(),
                        quantity: 0,
                        amount: Decimal::ZERO,
                    });
                    line.quantity += leaf.total_quantity;
                    line.amount += leaf.total_amount;
                }
            }
        }

        let mut drafts = Vec::with_capacity(by_supplier.len());
        for (supplier, lines) in by_supplier {
            let number = self
                .sequences
                .next(SequenceDomain::PurchaseOrder, today)
                .await?;
            let lines: Vec<PurchaseOrderLine> = lines.into_values().collect();
            let total_quantity = lines.iter().map(|l| l.quantity).sum();
            let total_amount = lines.iter().map(|l| l.amount).sum();
            drafts.push(PurchaseOrderDraft {
                number,
                supplier,
                lines,
                total_quantity,
                total_amount,
            });
        }
        Ok(drafts)
    }

    fn product_snapshots(&self) -> Result<HashMap<ProductId, ProductSnapshot>, StoreError> {
        Ok(self
            .store
            .query::<Product>(collections::PRODUCTS)?
            .into_iter()
            .map(|p| (p.id, p.snapshot()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::cutoff::CutoffCycleRepository;
    use crate::repositories::inventory::InventoryRepository;
    use crate::repositories::orders::OrderRepository;
    use chrono::{DateTime, TimeZone, Utc};
    use provender_core::orders::{OrderItem, OrderKind};
    use provender_shared::types::PartyId;
    use rust_decimal_macros::dec;

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        service: AggregationService,
        cycles: CutoffCycleRepository,
        orders: OrderRepository,
        inventory: InventoryRepository,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new(200, 64));
        let cycles = CutoffCycleRepository::new(Arc::clone(&store));
        cycles.ensure_open(at(2025, 3, 10, 6)).await.unwrap();
        Fixture {
            service: AggregationService::new(Arc::clone(&store)),
            cycles,
            orders: OrderRepository::new(Arc::clone(&store)),
            inventory: InventoryRepository::new(store),
        }
    }

    async fn confirmed_order(
        fx: &Fixture,
        product: &Product,
        quantity: i64,
        placed_at: DateTime<Utc>,
    ) {
        let item = OrderItem::new(
            product.id,
            product.name.clone(),
            product.specification.clone(),
            quantity,
            dec!(1500),
        )
        .unwrap();
        let order = fx
            .orders
            .place(OrderKind::Sale, PartyId::new(), placed_at, vec![item])
            .await
            .unwrap();
        fx.orders
            .transition(order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
    }

    async fn product(fx: &Fixture, name: &str, category: &str, supplier: &str) -> Product {
        fx.inventory
            .create(
                name,
                None,
                Some(category.to_string()),
                Some(supplier.to_string()),
                0,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_rollup_buckets_by_category_and_supplier() {
        let fx = fixture().await;
        let cabbage = product(&fx, "Napa cabbage", "Vegetables", "Sunrise Farm").await;
        let mackerel = product(&fx, "Mackerel", "Seafood", "Harbor Fishery").await;
        fx.inventory
            .receive(cabbage.id, date(2025, 3, 9), 20, dec!(1000))
            .await
            .unwrap();

        confirmed_order(&fx, &cabbage, 8, at(2025, 3, 10, 9)).await;
        confirmed_order(&fx, &mackerel, 3, at(2025, 3, 10, 10)).await;

        let tree = fx.service.rollup().unwrap();
        assert_eq!(tree.total_quantity, 11);
        let veg = &tree.categories["Vegetables"];
        assert_eq!(veg.total_quantity, 8);
        let leaf = &veg.suppliers["Sunrise Farm"].products[&cabbage.id];
        assert_eq!(leaf.stock_quantity, Some(20));
        assert_eq!(leaf.stock_covers_demand(), Some(true));
    }

    #[tokio::test]
    async fn test_watch_refreshes_on_order_commit() {
        let fx = fixture().await;
        let cabbage = product(&fx, "Napa cabbage", "Vegetables", "Sunrise Farm").await;

        let mut view = fx.service.watch().unwrap();
        assert_eq!(view.borrow().total_quantity, 0);

        confirmed_order(&fx, &cabbage, 5, at(2025, 3, 10, 9)).await;

        // Two relevant commits (place + confirm); wait until the view catches
        // up with the confirmed demand.
        loop {
            view.changed().await.unwrap();
            if view.borrow().total_quantity == 5 {
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_purchase_plan_requires_a_close() {
        let fx = fixture().await;
        let result = fx.service.purchase_plan(date(2025, 3, 10)).await;
        assert!(matches!(result, Err(PlanningError::CycleStillOpen)));
    }

    #[tokio::test]
    async fn test_purchase_plan_covers_closed_window_only() {
        let fx = fixture().await;
        let cabbage = product(&fx, "Napa cabbage", "Vegetables", "Sunrise Farm").await;
        let daikon = product(&fx, "Daikon", "Vegetables", "Sunrise Farm").await;
        let mackerel = product(&fx, "Mackerel", "Seafood", "Harbor Fishery").await;

        confirmed_order(&fx, &cabbage, 8, at(2025, 3, 10, 9)).await;
        confirmed_order(&fx, &daikon, 4, at(2025, 3, 10, 10)).await;
        confirmed_order(&fx, &mackerel, 3, at(2025, 3, 10, 11)).await;

        fx.cycles.close(at(2025, 3, 10, 14)).await.unwrap();

        // Late order in the re-opened window: excluded from this plan.
        confirmed_order(&fx, &cabbage, 99, at(2025, 3, 10, 15)).await;

        let drafts = fx.service.purchase_plan(date(2025, 3, 10)).await.unwrap();
        assert_eq!(drafts.len(), 2);

        let sunrise = drafts
            .iter()
            .find(|d| d.supplier == "Sunrise Farm")
            .unwrap();
        assert_eq!(sunrise.total_quantity, 12);
        assert_eq!(sunrise.lines.len(), 2);
        assert!(sunrise.number.starts_with("PO-250310-"));

        let harbor = drafts
            .iter()
            .find(|d| d.supplier == "Harbor Fishery")
            .unwrap();
        assert_eq!(harbor.total_quantity, 3);

        // Each draft got its own number.
        assert_ne!(drafts[0].number, drafts[1].number);
    }
}
