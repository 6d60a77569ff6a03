use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use borsh::{BorshDeserialize, BorshSerialize};
use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Deserialize,
    Serialize,
    PartialEq,
    Eq,
    BorshDeserialize,
    BorshSerialize,
    PartialOrd,
    Ord,
    Default,
    Display,
    Hash,
)]
pub struct TimestampMs(pub u128);

impl TimestampMs {
    pub fn now() -> TimestampMs {
        TimestampMs(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
        )
    }
}

/// Renders base units as a decimal string, e.g. `1500000000000000000` with
/// 18 decimals gives `1.5`.
pub fn format_units(amount: u128, decimals: u8) -> String {
    let Some(unit) = 10u128.checked_pow(decimals.into()) else {
        return amount.to_string();
    };
    let whole = amount / unit;
    let fraction = amount % unit;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{:0width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// Parses a decimal string into base units. Rejects more fractional digits
/// than `decimals` and anything that does not fit in a u128.
pub fn parse_units(text: &str, decimals: u8) -> Result<u128> {
    let text = text.trim();
    let unit = 10u128
        .checked_pow(decimals.into())
        .context("Too many decimals")?;

    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        bail!("Empty amount");
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        bail!("Invalid amount '{text}'");
    }
    if fraction.len() > decimals as usize {
        bail!("Amount '{text}' has more than {decimals} decimals");
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().context("Parsing whole part")?
    };
    let fraction: u128 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        padded.parse().context("Parsing fractional part")?
    };

    whole
        .checked_mul(unit)
        .and_then(|w| w.checked_add(fraction))
        .context("Amount overflows")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(0, 18), "0");
        assert_eq!(format_units(1_000_000_000_000_000_000, 18), "1");
        assert_eq!(format_units(1_500_000_000_000_000_000, 18), "1.5");
        assert_eq!(format_units(10, 18), "0.00000000000000001");
        assert_eq!(format_units(1_000_000_000_000_000, 18), "0.001");
        assert_eq!(format_units(42, 0), "42");
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("1", 18).unwrap(), 1_000_000_000_000_000_000);
        assert_eq!(parse_units("0.001", 18).unwrap(), 1_000_000_000_000_000);
        assert_eq!(parse_units(".5", 1).unwrap(), 5);
        assert_eq!(parse_units("250000", 18).unwrap(), 250_000 * 10u128.pow(18));
        assert!(parse_units("", 18).is_err());
        assert!(parse_units("1.2.3", 18).is_err());
        assert!(parse_units("-1", 18).is_err());
        assert!(parse_units("0.123", 2).is_err());
        assert!(parse_units("999999999999999999999999", 18).is_err());
    }

    #[test]
    fn test_parse_then_format() {
        let amount = parse_units("749990.25", 18).unwrap();
        assert_eq!(format_units(amount, 18), "749990.25");
    }
}
