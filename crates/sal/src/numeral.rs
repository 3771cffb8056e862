//! Roman numeral formatting for citation strings.

use crate::error::{Result, SalError};

/// Largest value with a standard subtractive Roman form.
pub const MAX_ROMAN: u32 = 3999;

/// Symbol table in descending value order.
const NUMERALS: &[(u32, &str)] = &[
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Convert `value` to its Roman numeral representation.
///
/// # Example
///
/// ```
/// use sal::numeral::to_roman;
///
/// assert_eq!(to_roman(55).unwrap(), "LV");
/// assert!(to_roman(0).is_err());
/// ```
pub fn to_roman(value: u32) -> Result<String> {
    if value == 0 || value > MAX_ROMAN {
        return Err(SalError::NumeralRange {
            value: u64::from(value),
        });
    }

    let mut remaining = value;
    let mut out = String::new();
    for &(amount, symbol) in NUMERALS {
        while remaining >= amount {
            out.push_str(symbol);
            remaining -= amount;
        }
    }
    Ok(out)
}

/// Parse a canonical Roman numeral back to its value.
///
/// Only the form [`to_roman`] produces is accepted: `IIII` or `IC` are
/// rejected even though some historical texts use them.
pub fn from_roman(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut total = 0u32;
    let mut rest = text.to_ascii_uppercase();
    for &(amount, symbol) in NUMERALS {
        while rest.starts_with(symbol) {
            total += amount;
            rest.drain(..symbol.len());
        }
    }

    if !rest.is_empty() || total == 0 || total > MAX_ROMAN {
        return None;
    }

    // Reject non-canonical spellings such as "IIII" or "VV".
    match to_roman(total) {
        Ok(canonical) if canonical.eq_ignore_ascii_case(text) => Some(total),
        _ => None,
    }
}
