//! Line-item normalization and validation

use bigdecimal::BigDecimal;

use crate::types::{LineInput, LineItem, ValidationErrors};
use crate::utils::money::round_2dp;

pub(crate) const ZERO_VALUE_LINE: &str = "Goods and Vat cannot both be zero.";

/// Outcome of normalizing a submitted line set
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLines {
    /// Surviving lines, renumbered 1..N in submission order
    pub lines: Vec<LineItem>,
    /// 2dp sum of goods + vat across the surviving lines
    pub total: BigDecimal,
}

impl NormalizedLines {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Drop blank lines, validate the rest, and renumber order-preserving
///
/// Blank lines (every field empty) are removed without validation. Each
/// surviving line must carry goods or vat; violations are collected into
/// `errors` and normalization continues so all offending lines are reported
/// in one pass.
pub fn normalize_lines(inputs: &[LineInput], errors: &mut ValidationErrors) -> NormalizedLines {
    let mut lines = Vec::new();
    let mut total = BigDecimal::from(0);
    let mut line_no = 1u32;
    for input in inputs {
        if input.is_blank() {
            continue;
        }
        let goods = round_2dp(input.goods.as_ref().unwrap_or(&BigDecimal::from(0)));
        let vat = round_2dp(input.vat.as_ref().unwrap_or(&BigDecimal::from(0)));
        if goods == BigDecimal::from(0) && vat == BigDecimal::from(0) {
            errors.push(ZERO_VALUE_LINE);
            continue;
        }
        total += &goods + &vat;
        lines.push(LineItem {
            line_no,
            description: input.description.clone(),
            goods,
            vat,
            nominal_ref: input.nominal_ref.clone(),
            vat_code_ref: input.vat_code_ref.clone(),
        });
        line_no += 1;
    }
    NormalizedLines {
        lines,
        total: round_2dp(&total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn line(description: &str, goods: &str, vat: &str) -> LineInput {
        LineInput {
            description: description.to_string(),
            goods: Some(dec(goods)),
            vat: Some(dec(vat)),
            nominal_ref: None,
            vat_code_ref: None,
        }
    }

    #[test]
    fn test_blank_lines_dropped_and_renumbered() {
        let inputs = vec![
            line("first", "100", "20"),
            LineInput::default(),
            line("second", "50", "10"),
        ];
        let mut errors = ValidationErrors::new();
        let normalized = normalize_lines(&inputs, &mut errors);
        assert!(errors.is_empty());
        assert_eq!(normalized.lines.len(), 2);
        assert_eq!(normalized.lines[0].line_no, 1);
        assert_eq!(normalized.lines[0].description, "first");
        assert_eq!(normalized.lines[1].line_no, 2);
        assert_eq!(normalized.lines[1].description, "second");
        assert_eq!(normalized.total, dec("180.00"));
    }

    #[test]
    fn test_zero_value_line_rejected() {
        let inputs = vec![line("nothing", "0", "0")];
        let mut errors = ValidationErrors::new();
        normalize_lines(&inputs, &mut errors);
        assert!(errors.contains(ZERO_VALUE_LINE));
    }

    #[test]
    fn test_goods_only_and_vat_only_lines_allowed() {
        let inputs = vec![line("goods only", "100", "0"), line("vat only", "0", "20")];
        let mut errors = ValidationErrors::new();
        let normalized = normalize_lines(&inputs, &mut errors);
        assert!(errors.is_empty());
        assert_eq!(normalized.lines.len(), 2);
        assert_eq!(normalized.total, dec("120.00"));
    }

    #[test]
    fn test_empty_input_is_empty() {
        let mut errors = ValidationErrors::new();
        let normalized = normalize_lines(&[], &mut errors);
        assert!(normalized.is_empty());
        assert_eq!(normalized.total, dec("0.00"));
    }
}
