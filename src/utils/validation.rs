//! Header field validation

use crate::types::{TransactionHeader, ValidationErrors};

/// Validate a header ID
pub fn validate_header_id(header_id: &str, errors: &mut ValidationErrors) {
    if header_id.trim().is_empty() {
        errors.push("Transaction ID cannot be empty");
        return;
    }

    if header_id.len() > 50 {
        errors.push("Transaction ID cannot exceed 50 characters");
    }

    // Alphanumeric, dashes and underscores only
    if !header_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        errors.push(
            "Transaction ID can only contain alphanumeric characters, dashes, and underscores",
        );
    }
}

/// Validate a document reference
pub fn validate_reference(reference: &str, errors: &mut ValidationErrors) {
    if reference.trim().is_empty() {
        errors.push("Reference cannot be empty");
        return;
    }

    if reference.len() > 20 {
        errors.push("Reference cannot exceed 20 characters");
    }
}

/// Validate a period token
pub fn validate_period(period: &str, errors: &mut ValidationErrors) {
    if period.trim().is_empty() {
        errors.push("Period cannot be empty");
    }
}

/// Run every field check on a submitted header
pub fn validate_header_fields(header: &TransactionHeader, errors: &mut ValidationErrors) {
    validate_header_id(&header.id, errors);
    validate_reference(&header.reference, errors);
    validate_period(header.period.as_str(), errors);
}
