//! # FIFO Cost Allocation
//!
//! Pure FIFO costing over received-stock batches: consume the oldest
//! unconsumed batch first until the requested quantity is satisfied.
//!
//! ## How It Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Batches (oldest first)          Sale of 15 units                      │
//! │                                                                         │
//! │  #1  10 remaining @ 2.00  ──►  consume 10  (cost 20.00)                │
//! │  #2  10 remaining @ 3.00  ──►  consume  5  (cost 15.00)                │
//! │                                                                         │
//! │  total_cost = 35.00                                                    │
//! │  unit_cost  = 35.00 / 15 = 2.33 (rounded once)                         │
//! │                                                                         │
//! │  The caller persists the consumption plan by decrementing each         │
//! │  batch's remaining_quantity inside the same transaction that checks    │
//! │  sufficiency and inserts the sale rows.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This module is pure: it neither reads nor writes the ledger. The db layer
//! feeds it batches in `created_at` order and applies the returned plan.

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Batch & Allocation Types
// =============================================================================

/// A received-stock batch with unconsumed quantity, as read from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Id of the underlying `received` stock movement.
    pub movement_id: String,
    /// Unconsumed units left in this batch.
    pub remaining_quantity: i64,
    /// Cost per unit for this batch.
    pub unit_cost: Money,
}

/// One batch's contribution to an allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumption {
    pub movement_id: String,
    /// Units taken from this batch; the db layer subtracts this from the
    /// batch's remaining_quantity.
    pub quantity: i64,
    /// Exact cost of the consumed units (quantity × batch unit cost).
    pub cost: Money,
}

/// The result of allocating a requested quantity across batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Per-batch consumption plan, oldest batch first.
    pub consumed: Vec<Consumption>,
    /// Exact total cost across all consumed batches.
    pub total_cost: Money,
    /// Per-unit cost (total_cost / requested), rounded once.
    pub unit_cost: Money,
}

// =============================================================================
// Allocation
// =============================================================================

/// Allocates `requested` units across `batches`, oldest first.
///
/// `batches` must be ordered by ledger insertion time ascending (the db
/// layer queries them that way) and contain only batches with
/// `remaining_quantity > 0`.
///
/// ## Errors
/// Returns [`CoreError::AllocationShortfall`] if the batches cannot cover
/// the request. This indicates a race or corrupted bookkeeping when the
/// sufficiency check already passed; the caller must abort its transaction.
/// The shortfall is never silently converted into a zero unit cost.
pub fn allocate(product: &str, batches: &[Batch], requested: i64) -> Result<Allocation, CoreError> {
    debug_assert!(requested > 0, "allocation quantity must be positive");

    let mut needed = requested;
    let mut consumed = Vec::new();
    let mut total_cost = Money::zero();

    for batch in batches {
        if needed == 0 {
            break;
        }
        let take = batch.remaining_quantity.min(needed);
        if take <= 0 {
            continue;
        }
        let cost = batch.unit_cost.multiply_quantity(take);
        consumed.push(Consumption {
            movement_id: batch.movement_id.clone(),
            quantity: take,
            cost,
        });
        total_cost += cost;
        needed -= take;
    }

    if needed > 0 {
        return Err(CoreError::AllocationShortfall {
            product: product.to_string(),
            requested,
            covered: requested - needed,
        });
    }

    Ok(Allocation {
        consumed,
        total_cost,
        unit_cost: total_cost.div_round(requested),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(id: &str, remaining: i64, unit_cost_cents: i64) -> Batch {
        Batch {
            movement_id: id.to_string(),
            remaining_quantity: remaining,
            unit_cost: Money::from_cents(unit_cost_cents),
        }
    }

    #[test]
    fn test_single_batch_exact() {
        let batches = vec![batch("m1", 20, 500)];
        let alloc = allocate("Tilapia", &batches, 5).unwrap();

        assert_eq!(alloc.consumed.len(), 1);
        assert_eq!(alloc.consumed[0].quantity, 5);
        assert_eq!(alloc.total_cost.cents(), 2500);
        assert_eq!(alloc.unit_cost.cents(), 500);
    }

    #[test]
    fn test_spans_batches_blended_cost() {
        // received(10 @ 2.00) then received(10 @ 3.00); selling 15 blends:
        // (10×2.00 + 5×3.00)/15 = 2.33/unit
        let batches = vec![batch("m1", 10, 200), batch("m2", 10, 300)];
        let alloc = allocate("Tilapia", &batches, 15).unwrap();

        assert_eq!(alloc.consumed.len(), 2);
        assert_eq!(alloc.consumed[0].quantity, 10);
        assert_eq!(alloc.consumed[1].quantity, 5);
        assert_eq!(alloc.total_cost.cents(), 3500);
        assert_eq!(alloc.unit_cost.cents(), 233);
    }

    #[test]
    fn test_second_sale_costs_from_newer_batch() {
        // After the 15-unit sale above, batch 1 is exhausted and batch 2
        // has 5 left; a further 5 units cost exactly 3.00/unit.
        let batches = vec![batch("m2", 5, 300)];
        let alloc = allocate("Tilapia", &batches, 5).unwrap();

        assert_eq!(alloc.total_cost.cents(), 1500);
        assert_eq!(alloc.unit_cost.cents(), 300);
    }

    #[test]
    fn test_shortfall_is_an_error_not_zero_cost() {
        let batches = vec![batch("m1", 4, 200)];
        let err = allocate("Tilapia", &batches, 5).unwrap_err();

        match err {
            CoreError::AllocationShortfall {
                requested, covered, ..
            } => {
                assert_eq!(requested, 5);
                assert_eq!(covered, 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_batches_shortfall() {
        let err = allocate("Tilapia", &[], 1).unwrap_err();
        assert!(matches!(err, CoreError::AllocationShortfall { .. }));
    }

    #[test]
    fn test_skips_drained_batches() {
        let batches = vec![batch("m1", 0, 200), batch("m2", 10, 300)];
        let alloc = allocate("Tilapia", &batches, 5).unwrap();

        assert_eq!(alloc.consumed.len(), 1);
        assert_eq!(alloc.consumed[0].movement_id, "m2");
        assert_eq!(alloc.unit_cost.cents(), 300);
    }
}
