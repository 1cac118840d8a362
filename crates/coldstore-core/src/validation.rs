//! # Validation Module
//!
//! Input validation for ledger and sale operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI / CRUD collaborators)                             │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  └── Movement quantity rules, customer identity, line rules            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── NOT NULL / UNIQUE / foreign key constraints                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::MovementType;
use crate::{MAX_LINE_QUANTITY, MAX_NOTES_LEN, MAX_SALE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Stock Movement Validators
// =============================================================================

/// Validates a movement quantity against the rules for its type.
///
/// ## Rules
/// - `received` / `sold`: positive magnitude only (direction is in the type)
/// - `adjusted`: any nonzero signed delta
///
/// ## Example
/// ```rust
/// use coldstore_core::types::MovementType;
/// use coldstore_core::validation::validate_movement_quantity;
///
/// assert!(validate_movement_quantity(MovementType::Received, 10).is_ok());
/// assert!(validate_movement_quantity(MovementType::Received, -10).is_err());
/// assert!(validate_movement_quantity(MovementType::Adjusted, -3).is_ok());
/// assert!(validate_movement_quantity(MovementType::Adjusted, 0).is_err());
/// ```
pub fn validate_movement_quantity(movement_type: MovementType, qty: i64) -> ValidationResult<()> {
    match movement_type {
        MovementType::Received | MovementType::Sold => {
            if qty <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                });
            }
        }
        MovementType::Adjusted => {
            if qty == 0 {
                return Err(ValidationError::MustBeNonZero {
                    field: "quantity".to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Validates a cost or price in cents.
///
/// Zero is allowed (free or unknown-cost entries); negative is not.
pub fn validate_cost_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "unit_cost".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates an optional free-text notes field.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    if let Some(notes) = notes {
        if notes.len() > MAX_NOTES_LEN {
            return Err(ValidationError::TooLong {
                field: "notes".to_string(),
                max: MAX_NOTES_LEN,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Sale Validators
// =============================================================================

/// Validates that a sale identifies its customer.
///
/// Either a registered `customer_id` or a non-empty free-text
/// `customer_name` must be supplied.
pub fn validate_customer_identity(
    customer_id: Option<&str>,
    customer_name: Option<&str>,
) -> ValidationResult<()> {
    let has_id = customer_id.map(|s| !s.trim().is_empty()).unwrap_or(false);
    let has_name = customer_name.map(|s| !s.trim().is_empty()).unwrap_or(false);

    if !has_id && !has_name {
        return Err(ValidationError::Required {
            field: "customer".to_string(),
        });
    }
    Ok(())
}

/// Validates the number of line items in a sale.
pub fn validate_sale_lines(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }
    if count > MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_ITEMS as i64,
        });
    }
    Ok(())
}

/// Validates a sale line quantity.
pub fn validate_line_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "qty".to_string(),
        });
    }
    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

// =============================================================================
// Credit Collection Validators
// =============================================================================

/// Validates a collection amount against the customer's remaining debt.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed the remaining debt at the time of recording
pub fn validate_collection_amount(
    amount_cents: i64,
    remaining_debt_cents: i64,
) -> ValidationResult<()> {
    if amount_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount_collected".to_string(),
        });
    }
    if amount_cents > remaining_debt_cents {
        return Err(ValidationError::OverCollection {
            requested: amount_cents,
            remaining: remaining_debt_cents,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_quantity_rules() {
        assert!(validate_movement_quantity(MovementType::Received, 1).is_ok());
        assert!(validate_movement_quantity(MovementType::Sold, 5).is_ok());
        assert!(validate_movement_quantity(MovementType::Received, 0).is_err());
        assert!(validate_movement_quantity(MovementType::Sold, -5).is_err());

        // Adjustments carry their own sign but may not be zero
        assert!(validate_movement_quantity(MovementType::Adjusted, 3).is_ok());
        assert!(validate_movement_quantity(MovementType::Adjusted, -3).is_ok());
        assert!(validate_movement_quantity(MovementType::Adjusted, 0).is_err());
    }

    #[test]
    fn test_cost_cents() {
        assert!(validate_cost_cents(0).is_ok());
        assert!(validate_cost_cents(250).is_ok());
        assert!(validate_cost_cents(-1).is_err());
    }

    #[test]
    fn test_notes_length() {
        assert!(validate_notes(None).is_ok());
        assert!(validate_notes(Some("short note")).is_ok());
        let long = "x".repeat(MAX_NOTES_LEN + 1);
        assert!(validate_notes(Some(&long)).is_err());
    }

    #[test]
    fn test_customer_identity() {
        assert!(validate_customer_identity(Some("c-1"), None).is_ok());
        assert!(validate_customer_identity(None, Some("Ama Serwaa")).is_ok());
        assert!(validate_customer_identity(None, None).is_err());
        assert!(validate_customer_identity(Some("  "), Some("")).is_err());
    }

    #[test]
    fn test_sale_lines() {
        assert!(validate_sale_lines(1).is_ok());
        assert!(validate_sale_lines(0).is_err());
        assert!(validate_sale_lines(MAX_SALE_ITEMS + 1).is_err());
    }

    #[test]
    fn test_line_quantity() {
        assert!(validate_line_quantity(1).is_ok());
        assert!(validate_line_quantity(0).is_err());
        assert!(validate_line_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_collection_amount() {
        assert!(validate_collection_amount(5000, 5000).is_ok());
        assert!(validate_collection_amount(4999, 5000).is_ok());
        assert!(validate_collection_amount(0, 5000).is_err());
        // Over-collection is rejected
        assert!(validate_collection_amount(6000, 5000).is_err());
    }
}
