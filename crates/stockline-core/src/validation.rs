//! # Validation Module
//!
//! Field-level validation rules for incoming rows and CRUD writes.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Format (csv / serde)                                          │
//! │  ├── Shape checks: is this even a row?                                  │
//! │  └── Failure aborts the whole file (ParseError)                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - field rules                                     │
//! │  ├── Required name, length limits, telephone digits                     │
//! │  └── Failure skips the ROW, the batch continues                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL / CHECK constraints                                       │
//! │  └── Foreign key constraints                                            │
//! │                                                                         │
//! │  Defense in depth: each layer catches what the previous one cannot.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::{MAX_PRODUCT_NAME_LEN, TELEPHONE_DIGITS};

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 100 characters
///
/// ## Example
/// ```rust
/// use stockline_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Milk 2L").is_ok());
/// assert!(validate_product_name("").is_err());
/// assert!(validate_product_name(&"A".repeat(150)).is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a branch name.
///
/// ## Rules
/// - Must not be empty after trimming
pub fn validate_branch_name(name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    Ok(())
}

/// Validates a branch telephone number.
///
/// ## Rules
/// - Must be exactly 10 ASCII digits
///
/// Callers treat a blank value as absent before getting here; only a
/// present, non-blank telephone is validated.
pub fn validate_telephone(telephone: &str) -> ValidationResult<()> {
    let telephone = telephone.trim();

    if telephone.len() != TELEPHONE_DIGITS || !telephone.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "telephone".to_string(),
            reason: format!("must be exactly {TELEPHONE_DIGITS} digits"),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (lenient parsing normalizes unparsable input to 0.00)
///
/// ## Example
/// ```rust
/// use stockline_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "suggested_price".to_string(),
            min: 0,
            max: i64::MAX,
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
    fn test_validate_product_name() {
        assert!(validate_product_name("Milk").is_ok());
        assert!(validate_product_name(&"A".repeat(100)).is_ok());

        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_branch_name() {
        assert!(validate_branch_name("CBD").is_ok());
        assert!(validate_branch_name("").is_err());
        assert!(validate_branch_name("  ").is_err());
    }

    #[test]
    fn test_validate_telephone() {
        assert!(validate_telephone("0111234567").is_ok());

        assert!(validate_telephone("011123456").is_err()); // 9 digits
        assert!(validate_telephone("01112345678").is_err()); // 11 digits
        assert!(validate_telephone("011123456a").is_err()); // letter
        assert!(validate_telephone("").is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1550).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }
}
