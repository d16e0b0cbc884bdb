//! Order intake and lifecycle persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use provender_core::cutoff::CutoffCycle;
use provender_core::orders::{Order, OrderError, OrderItem, OrderKind, OrderStatus};
use provender_shared::AppError;
use provender_shared::types::{OrderId, PartyId};
use thiserror::Error;

use super::collections;
use crate::engine::{MemoryStore, StoreError};

/// Errors from order intake and lifecycle operations.
#[derive(Debug, Error)]
pub enum OrderEntryError {
    /// Orders cannot be placed before the first cutoff cycle opens.
    #[error("No cutoff cycle has been opened")]
    CycleNotOpen,

    /// An order needs at least one line.
    #[error("Order has no items")]
    EmptyOrder,

    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A domain-level order violation.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<OrderEntryError> for AppError {
    fn from(err: OrderEntryError) -> Self {
        match err {
            OrderEntryError::CycleNotOpen => Self::BusinessRule(err.to_string()),
            OrderEntryError::EmptyOrder => Self::Validation(err.to_string()),
            OrderEntryError::OrderNotFound(_) => Self::NotFound(err.to_string()),
            OrderEntryError::Order(OrderError::InvalidTransition { .. }) => {
                Self::BusinessRule(err.to_string())
            }
            OrderEntryError::Order(_) => Self::Validation(err.to_string()),
            OrderEntryError::Store(e) => e.into(),
        }
    }
}

/// Open and terminal order counts, for the operator dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderStatusCounts {
    /// Orders awaiting review.
    pub placed: u64,
    /// Confirmed orders feeding aggregation.
    pub confirmed: u64,
    /// Fulfilled orders.
    pub completed: u64,
    /// Rejected orders.
    pub rejected: u64,
    /// Orders on hold.
    pub pended: u64,
}

/// Stores orders and assigns each one its cutoff phase at placement.
///
/// Placement reads the current cycle document inside the same transaction
/// that writes the order, so an order can never commit with a phase from a
/// window that a concurrent close already replaced.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    store: Arc<MemoryStore>,
}

impl OrderRepository {
    /// Creates a repository over the given store.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Places an order, classifying it against the current cutoff cycle.
    ///
    /// # Errors
    ///
    /// Returns [`OrderEntryError::CycleNotOpen`] before the first cycle
    /// opens, or [`OrderEntryError::EmptyOrder`] for an order without lines.
    pub async fn place(
        &self,
        kind: OrderKind,
        counterparty: PartyId,
        placed_at: DateTime<Utc>,
        items: Vec<OrderItem>,
    ) -> Result<Order, OrderEntryError> {
        if items.is_empty() {
            return Err(OrderEntryError::EmptyOrder);
        }

        self.store
            .transact(|txn| {
                let cycle: CutoffCycle = txn
                    .get(collections::CYCLES, collections::CURRENT_CYCLE)?
                    .ok_or(OrderEntryError::CycleNotOpen)?;
                let order = Order::new(
                    kind,
                    counterparty,
                    cycle.classify(placed_at),
                    placed_at,
                    items.clone(),
                );
                txn.put(collections::ORDERS, &order.id.to_string(), &order)?;
                Ok(order)
            })
            .await
    }

    /// Fetches one order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderEntryError::OrderNotFound`] for an unknown id.
    pub fn get(&self, id: OrderId) -> Result<Order, OrderEntryError> {
        self.store
            .get::<Order>(collections::ORDERS, &id.to_string())?
            .ok_or(OrderEntryError::OrderNotFound(id))
    }

    /// Applies a status transition to a stored order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidTransition`] for a move the lifecycle
    /// does not allow, leaving the order untouched.
    pub async fn transition(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, OrderEntryError> {
        self.store
            .transact(|txn| {
                let mut order: Order = txn
                    .get(collections::ORDERS, &id.to_string())?
                    .ok_or(OrderEntryError::OrderNotFound(id))?;
                order.transition(next)?;
                txn.put(collections::ORDERS, &id.to_string(), &order)?;
                Ok(order)
            })
            .await
    }

    /// Returns all confirmed orders.
    ///
    /// # Errors
    ///
    /// Returns a storage error on serialization failure.
    pub fn confirmed(&self) -> Result<Vec<Order>, OrderEntryError> {
        Ok(self
            .store
            .query::<Order>(collections::ORDERS)?
            .into_iter()
            .filter(|o| o.status == OrderStatus::Confirmed)
            .collect())
    }

    /// Counts orders per status.
    ///
    /// # Errors
    ///
    /// Returns a storage error on serialization failure.
    pub fn status_counts(&self) -> Result<OrderStatusCounts, OrderEntryError> {
        let mut counts = OrderStatusCounts::default();
        for order in self.store.query::<Order>(collections::ORDERS)? {
            match order.status {
                OrderStatus::Placed => counts.placed += 1,
                OrderStatus::Confirmed => counts.confirmed += 1,
                OrderStatus::Completed => counts.completed += 1,
                OrderStatus::Rejected => counts.rejected += 1,
                OrderStatus::Pended => counts.pended += 1,
            }
        }
        Ok(counts)
    }
}
