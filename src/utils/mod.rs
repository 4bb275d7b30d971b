//! Formatting helpers for terminal output
//!
//! Quantities are shown with `,` thousands separators and two decimals.

use rust_decimal::{Decimal, RoundingStrategy};

/// Format a quantity right-aligned to `width` (0 for no padding).
///
/// # Examples
/// ```
/// use sales_digest::utils::format_quantity_with_width;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_quantity_with_width(dec!(1234.5), 0), "1,234.50");
/// assert_eq!(format_quantity_with_width(dec!(12), 8), "   12.00");
/// ```
pub fn format_quantity_with_width(value: Decimal, width: usize) -> String {
    let is_negative = value < Decimal::ZERO;
    let rounded = value
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    let formatted = format!("{:.2}", rounded);
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative && !rounded.is_zero() { "-" } else { "" };
    let result = format!("{}{}.{}", sign, with_separators, decimal_part);

    if width > 0 && result.len() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

/// Format a quantity: "1,234.56"
///
/// # Examples
/// ```
/// use sales_digest::utils::format_quantity;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_quantity(dec!(1000000)), "1,000,000.00");
/// ```
pub fn format_quantity(value: Decimal) -> String {
    format_quantity_with_width(value, 0)
}
