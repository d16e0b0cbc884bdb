//! Order domain types.
//!
//! Orders capture a snapshot of each line at placement time (product name,
//! specification, unit price) so later product edits or deletions never
//! change what was ordered.

use chrono::{DateTime, Utc};
use provender_shared::types::{OrderId, PartyId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::OrderError;

/// Whether an order sells to a customer or buys from a supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Customer sale order.
    Sale,
    /// Supplier purchase order.
    Purchase,
}

/// Order status in the fulfilment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order has been placed and awaits review.
    Placed,
    /// Order is confirmed and feeds purchasing aggregation.
    Confirmed,
    /// Order has been fulfilled (immutable).
    Completed,
    /// Order was rejected (immutable).
    Rejected,
    /// Order is on hold pending a decision.
    Pended,
}

impl OrderStatus {
    /// Returns true if the status may still change.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Placed | Self::Pended)
    }

    /// Returns true if this is a terminal status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Returns true if the transition to `next` is allowed.
    ///
    /// Lifecycle: Placed -> Confirmed -> Completed, with Placed/Pended able to
    /// move to Rejected and Placed able to be put on hold (Pended).
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Placed, Self::Confirmed | Self::Rejected | Self::Pended)
                | (Self::Pended, Self::Confirmed | Self::Rejected)
                | (Self::Confirmed, Self::Completed)
        )
    }

    /// Validates the transition to `next`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidTransition` if the lifecycle does not allow
    /// the move.
    pub fn transition_to(self, next: Self) -> Result<Self, OrderError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(OrderError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

/// Phase of an order relative to the cutoff cycle.
///
/// Orders placed in the regular ordering window are `Regular`; orders placed
/// after the operator triggered a cutoff close are `Additional` until the next
/// close finalizes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPhase {
    /// Placed inside the regular ordering window.
    Regular,
    /// Placed after a cutoff close, as a late addition.
    Additional,
}

/// A single order line with its captured product snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product ordered.
    pub product_id: ProductId,
    /// Product name at placement time.
    pub product_name: String,
    /// Product specification at placement time (e.g. "10kg box").
    pub specification: Option<String>,
    /// Ordered quantity (physical units).
    pub quantity: i64,
    /// Unit price at placement time.
    pub unit_price: Decimal,
    /// `quantity * unit_price`.
    pub line_total: Decimal,
}

impl OrderItem {
    /// Creates an order line, computing the line total.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity is not positive or the unit price is
    /// negative.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        specification: Option<String>,
        quantity: i64,
        unit_price: Decimal,
    ) -> Result<Self, OrderError> {
        if quantity <= 0 {
            return Err(OrderError::NonPositiveQuantity(quantity));
        }
        if unit_price < Decimal::ZERO {
            return Err(OrderError::NegativeUnitPrice);
        }

        Ok(Self {
            product_id,
            product_name: product_name.into(),
            specification,
            quantity,
            unit_price,
            line_total: Decimal::from(quantity) * unit_price,
        })
    }
}

/// A customer sale order or supplier purchase order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier.
    pub id: OrderId,
    /// Sale or purchase.
    pub kind: OrderKind,
    /// The customer or supplier party.
    pub counterparty: PartyId,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Phase relative to the cutoff cycle, assigned at placement.
    pub phase: OrderPhase,
    /// When the order was placed.
    pub placed_at: DateTime<Utc>,
    /// Order lines.
    pub items: Vec<OrderItem>,
    /// Sum of all line totals.
    pub total_amount: Decimal,
}

impl Order {
    /// Creates a new placed order from its lines.
    #[must_use]
    pub fn new(
        kind: OrderKind,
        counterparty: PartyId,
        phase: OrderPhase,
        placed_at: DateTime<Utc>,
        items: Vec<OrderItem>,
    ) -> Self {
        let total_amount = items.iter().map(|i| i.line_total).sum();
        Self {
            id: OrderId::new(),
            kind,
            counterparty,
            status: OrderStatus::Placed,
            phase,
            placed_at,
            items,
            total_amount,
        }
    }

    /// Applies a status transition, validating the lifecycle.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidTransition` for a disallowed move.
    pub fn transition(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        self.status = self.status.transition_to(next)?;
        Ok(())
    }
}
