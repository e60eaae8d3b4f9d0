//! Display formatting for dashboard numbers.
//!
//! Fixed-point output goes through `{:.N}`, which rounds the exact binary
//! value to nearest with ties to even. Non-finite inputs render as `NaN`,
//! `Infinity` and `-Infinity`.

use crate::error::QueryDashError;

const BILLION: f64 = 1_000_000_000.0;
const MILLION: f64 = 1_000_000.0;
const THOUSAND: f64 = 1_000.0;

/// Maximum fraction digits kept by grouped rendering.
const GROUPED_FRACTION_DIGITS: usize = 3;

/// Separators used when a number is rendered with digit grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    grouping_separator: String,
    decimal_separator: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            grouping_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
        }
    }
}

impl NumberFormat {
    pub fn new(
        grouping_separator: impl Into<String>,
        decimal_separator: impl Into<String>,
    ) -> Result<Self, QueryDashError> {
        let grouping_separator = grouping_separator.into();
        let decimal_separator = decimal_separator.into();
        if decimal_separator.is_empty() {
            return Err(QueryDashError::Format(
                "decimal separator must not be empty".to_string(),
            ));
        }
        if grouping_separator == decimal_separator {
            return Err(QueryDashError::Format(format!(
                "grouping and decimal separator are both {:?}",
                decimal_separator
            )));
        }
        Ok(Self {
            grouping_separator,
            decimal_separator,
        })
    }

    /// `1.50B`, `2.50M`, or the grouped value below one million.
    pub fn short_number(&self, value: f64) -> String {
        if value >= BILLION {
            format!("{}B", to_fixed(value / BILLION, 2))
        } else if value >= MILLION {
            format!("{}M", to_fixed(value / MILLION, 2))
        } else {
            self.grouped(value)
        }
    }

    /// Renders `value` with thousands grouping and up to three fraction digits.
    pub fn grouped(&self, value: f64) -> String {
        if value.is_nan() {
            return "NaN".to_string();
        }
        if value.is_infinite() {
            let symbol = if value < 0.0 { "-∞" } else { "∞" };
            return symbol.to_string();
        }

        let rendered = format!("{:.*}", GROUPED_FRACTION_DIGITS, value.abs());
        let (int_part, frac_part) = rendered
            .split_once('.')
            .unwrap_or((rendered.as_str(), ""));
        let frac_part = frac_part.trim_end_matches('0');

        let mut out = String::with_capacity(rendered.len() + int_part.len() / 3 + 1);
        if value < 0.0 {
            out.push('-');
        }
        let len = int_part.len();
        for (i, digit) in int_part.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                out.push_str(&self.grouping_separator);
            }
            out.push(digit);
        }
        if !frac_part.is_empty() {
            out.push_str(&self.decimal_separator);
            out.push_str(frac_part);
        }
        out
    }
}

pub fn format_short_number(value: f64) -> String {
    NumberFormat::default().short_number(value)
}

/// `symbol` followed by one space and the scaled amount: one decimal with a
/// `B`/`M`/`K` suffix from one thousand up, two decimals below.
pub fn format_currency(value: f64, symbol: &str) -> String {
    if value >= BILLION {
        format!("{symbol} {}B", to_fixed(value / BILLION, 1))
    } else if value >= MILLION {
        format!("{symbol} {}M", to_fixed(value / MILLION, 1))
    } else if value >= THOUSAND {
        format!("{symbol} {}K", to_fixed(value / THOUSAND, 1))
    } else {
        format!("{symbol} {}", to_fixed(value, 2))
    }
}

fn to_fixed(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let text = if value < 0.0 { "-Infinity" } else { "Infinity" };
        text.to_string()
    } else {
        format!("{:.*}", decimals, value)
    }
}
