//! # Payment Invariants
//!
//! The amount-paid rule for each payment type, implemented once and reused
//! by the sale builder and by input validators.
//!
//! ```text
//! cash    ⇒ amount_paid == total
//! credit  ⇒ amount_paid == 0
//! partial ⇒ 0 < amount_paid < total
//! ```
//!
//! The original system re-checked these rules with string comparisons at
//! every call site; here the closed enum owns the rule.

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::PaymentType;

impl PaymentType {
    /// Validates `amount_paid` against the sale total for this payment type.
    ///
    /// Returns a field-level error naming the violated rule; the caller
    /// commits nothing on failure.
    pub fn validate_amount(&self, amount_paid: Money, total: Money) -> Result<(), ValidationError> {
        match self {
            PaymentType::Cash => {
                if amount_paid != total {
                    return Err(ValidationError::PaymentAmount {
                        reason: "for cash payments, the amount paid must equal the total"
                            .to_string(),
                    });
                }
            }
            PaymentType::Credit => {
                if !amount_paid.is_zero() {
                    return Err(ValidationError::PaymentAmount {
                        reason: "for credit sales, the amount paid must be 0".to_string(),
                    });
                }
            }
            PaymentType::Partial => {
                if !amount_paid.is_positive() || amount_paid >= total {
                    return Err(ValidationError::PaymentAmount {
                        reason: "for partial payments, the amount paid must be greater than 0 and less than the total"
                            .to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// The portion of the total still owed after the initial payment.
    ///
    /// Zero for cash, the full total for credit, `total − paid` for partial.
    #[inline]
    pub fn amount_owed(&self, amount_paid: Money, total: Money) -> Money {
        total - amount_paid
    }
}
