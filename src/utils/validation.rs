//! Input validation helpers

use bigdecimal::BigDecimal;

use crate::types::*;

/// Validate that an amount is strictly positive
pub fn validate_positive_amount(amount: &BigDecimal) -> EngineResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(EngineError::Validation(
            "Amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate a free-text description
pub fn validate_description(description: &str) -> EngineResult<()> {
    if description.len() > 500 {
        return Err(EngineError::Validation(
            "Description cannot exceed 500 characters".to_string(),
        ));
    }
    Ok(())
}

/// Validate a human-facing reference (voucher or serial number)
pub fn validate_reference(reference: &str) -> EngineResult<()> {
    if reference.trim().is_empty() {
        return Err(EngineError::Validation(
            "Reference cannot be empty".to_string(),
        ));
    }
    if reference.len() > 30 {
        return Err(EngineError::Validation(
            "Reference cannot exceed 30 characters".to_string(),
        ));
    }
    Ok(())
}
