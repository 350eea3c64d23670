//! Money helpers: 2dp rounding, sign conventions, message formatting

use bigdecimal::{BigDecimal, RoundingMode};

/// Round to exactly 2 decimal places, half away from zero
///
/// A result of negative zero is normalized to positive zero.
pub fn round_2dp(value: &BigDecimal) -> BigDecimal {
    let rounded = value.with_scale_round(2, RoundingMode::HalfUp);
    if rounded == BigDecimal::from(0) {
        BigDecimal::from(0).with_scale(2)
    } else {
        rounded
    }
}

/// Convert between natural (user-entered) sign and ledger sign
///
/// Negative-class transaction types store the negated natural value; the same
/// flip converts back, so the one helper serves both directions.
pub fn apply_sign_convention(value: BigDecimal, negative_class: bool) -> BigDecimal {
    if negative_class {
        -value
    } else {
        value
    }
}

/// Format an amount for a user-facing validation message
///
/// Zero renders as a bare "0"; everything else at 2 decimal places.
pub fn format_amount(value: &BigDecimal) -> String {
    if *value == BigDecimal::from(0) {
        "0".to_string()
    } else {
        round_2dp(value).to_string()
    }
}

/// The closed interval a counterpart's allocation may occupy, as a sorted pair
pub fn sorted_window(a: BigDecimal, b: BigDecimal) -> (BigDecimal, BigDecimal) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
