/// Ether unit and pricing helpers for settling catalog purchases

use thiserror::Error;

/// 1 ETH = 10^18 wei
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;
pub const ETHER_DECIMALS: usize = 18;
/// Decimal places used when quoting ETH amounts to buyers
pub const QUOTE_DECIMALS: usize = 6;
/// Fixed USD per ETH rate; there is no live price feed
pub const DEFAULT_ETH_USD_RATE: f64 = 3000.0;
pub const SUBSCRIPTION_SUFFIX: &str = "/month";

#[derive(Debug, Error, PartialEq)]
pub enum UnitError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),
    #[error("Invalid conversion rate: {0}")]
    InvalidRate(f64),
    #[error("Invalid ether amount: {0}")]
    InvalidAmount(String),
    #[error("Ether amount has more than 18 decimal places: {0}")]
    TooPrecise(String),
    #[error("Ether amount out of range: {0}")]
    Overflow(String),
    #[error("Invalid hex quantity: {0}")]
    InvalidQuantity(String),
}

/// Remove the currency sign and the recurring-subscription suffix from a display price
pub fn strip_price(display: &str) -> String {
    display
        .replacen('$', "", 1)
        .replacen(SUBSCRIPTION_SUFFIX, "", 1)
}

pub fn is_subscription(display: &str) -> bool {
    display.trim_end().ends_with(SUBSCRIPTION_SUFFIX)
}

/// Parse a display price such as `$19.99` or `$49.99/month` into dollars.
/// Only plain decimals are accepted: no sign, exponent or `inf`.
pub fn parse_usd(display: &str) -> Result<f64, UnitError> {
    let invalid = || UnitError::InvalidPrice(display.to_string());
    let cleaned = strip_price(display);
    let digits = cleaned.trim();

    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    let plain = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !plain(whole) || !plain(fraction) {
        return Err(invalid());
    }

    let value: f64 = digits.parse().map_err(|_| invalid())?;

    if !value.is_finite() {
        return Err(invalid());
    }

    Ok(value)
}

/// Convert a display price to an ETH amount with exactly six decimals
pub fn usd_to_eth(display: &str, eth_usd_rate: f64) -> Result<String, UnitError> {
    if !eth_usd_rate.is_finite() || eth_usd_rate <= 0.0 {
        return Err(UnitError::InvalidRate(eth_usd_rate));
    }

    let usd = parse_usd(display)?;
    Ok(format!("{:.*}", QUOTE_DECIMALS, usd / eth_usd_rate))
}

/// Parse a decimal ETH amount into wei without going through floating point
pub fn parse_ether(amount: &str) -> Result<u128, UnitError> {
    let trimmed = amount.trim();
    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(UnitError::InvalidAmount(amount.to_string()));
    }

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(UnitError::InvalidAmount(amount.to_string()));
    }

    if fraction.len() > ETHER_DECIMALS {
        return Err(UnitError::TooPrecise(amount.to_string()));
    }

    let whole_wei = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u128>()
            .ok()
            .and_then(|w| w.checked_mul(WEI_PER_ETHER))
            .ok_or_else(|| UnitError::Overflow(amount.to_string()))?
    };

    let fraction_wei = if fraction.is_empty() {
        0
    } else {
        format!("{:0<width$}", fraction, width = ETHER_DECIMALS)
            .parse::<u128>()
            .map_err(|_| UnitError::InvalidAmount(amount.to_string()))?
    };

    whole_wei
        .checked_add(fraction_wei)
        .ok_or_else(|| UnitError::Overflow(amount.to_string()))
}

/// Encode wei as a JSON-RPC hex quantity
pub fn to_quantity(wei: u128) -> String {
    format!("0x{:x}", wei)
}

/// Decode a JSON-RPC hex quantity (`0x1`, `0x0`, ...)
pub fn parse_quantity(quantity: &str) -> Result<u128, UnitError> {
    let digits = quantity
        .strip_prefix("0x")
        .ok_or_else(|| UnitError::InvalidQuantity(quantity.to_string()))?;

    if digits.is_empty() {
        return Ok(0);
    }

    u128::from_str_radix(digits, 16).map_err(|_| UnitError::InvalidQuantity(quantity.to_string()))
}

/// `0x` followed by 40 hex digits
pub fn is_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .map(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

/// Shorten an address for display: `0x1234...abcd`
pub fn format_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }

    match (address.get(..6), address.get(address.len() - 4..)) {
        (Some(head), Some(tail)) => format!("{}...{}", head, tail),
        _ => address.to_string(),
    }
}
