//! Formatting and parsing helpers shared by the CLI
//!
//! Values are shown with Brazilian conventions: `.` groups thousands and
//! `,` separates cents.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Format number only (no symbol): "1.234,56"
///
/// # Examples
/// ```
/// use hortifruti::utils::format_decimal_br;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_decimal_br(dec!(1234.5)), "1.234,50");
/// assert_eq!(format_decimal_br(dec!(-0.005)), "-0,01");
/// ```
pub fn format_decimal_br(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let plain = format!("{:.2}", rounded.abs());
    let (integer_part, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(integer_part.len() + integer_part.len() / 3);
    for (i, digit) in integer_part.chars().enumerate() {
        if i > 0 && (integer_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    format!("{}{},{}", sign, grouped, cents)
}

/// Format as Brazilian Real with symbol: "R$ 1.234,56"
///
/// # Examples
/// ```
/// use hortifruti::utils::format_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency(dec!(1915)), "R$ 1.915,00");
/// ```
pub fn format_currency(value: Decimal) -> String {
    format!("R$ {}", format_decimal_br(value))
}

/// Parse a sale date given as `YYYY-MM-DD` or `DD/MM/YYYY`
pub fn parse_sale_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .map_err(|_| anyhow!("Invalid date '{}'. Use YYYY-MM-DD or DD/MM/YYYY", s))
}
