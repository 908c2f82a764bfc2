//! Ether Amounts
//!
//! Prices are entered and displayed in ether but always carried as integer wei. Conversion is
//! exact decimal string arithmetic; no floating point is involved at any step.

use primitive_types::U256;
use thiserror::Error;

/// Number of decimal places between ether and wei.
pub const ETHER_DECIMALS: usize = 18;

/// Errors raised while parsing an ether amount.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// No digits were supplied.
    #[error("amount is empty")]
    Empty,

    /// The amount contains something other than digits and a single decimal point.
    #[error("invalid amount {0:?}; expected a non-negative decimal ether value")]
    InvalidFormat(String),

    /// More fractional digits than wei can represent.
    #[error("amount {0:?} has more than 18 decimal places")]
    TooPrecise(String),

    /// The amount does not fit in 256 bits of wei.
    #[error("amount {0:?} is too large")]
    Overflow(String),
}

/// One ether, in wei.
pub fn wei_per_ether() -> U256 {
    U256::exp10(ETHER_DECIMALS)
}

/// Parse a decimal ether string such as `"0.05"` into wei.
///
/// # Errors
///
/// - [`AmountError::Empty`]: the input is blank.
/// - [`AmountError::InvalidFormat`]: signs, exponents, separators or stray characters.
/// - [`AmountError::TooPrecise`]: more than [`ETHER_DECIMALS`] fractional digits.
/// - [`AmountError::Overflow`]: the wei value exceeds 256 bits.
pub fn parse_ether(input: &str) -> Result<U256, AmountError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

    let all_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());

    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(AmountError::InvalidFormat(trimmed.to_string()));
    }

    if fraction.len() > ETHER_DECIMALS {
        return Err(AmountError::TooPrecise(trimmed.to_string()));
    }

    let digits = format!("{whole}{fraction:0<width$}", width = ETHER_DECIMALS);

    U256::from_dec_str(&digits).map_err(|error| {
        AmountError::Overflow(format!("{trimmed} ({error:?})"))
    })
}

/// Format a wei amount as decimal ether, e.g. `1500000000000000000` as `"1.5"`.
///
/// Whole amounts keep one fractional digit (`"3.0"`).
pub fn format_ether(amount: U256) -> String {
    let unit = wei_per_ether();
    let whole = amount / unit;
    let fraction = (amount % unit).to_string();
    let padded = format!("{fraction:0>width$}", width = ETHER_DECIMALS);
    let trimmed = padded.trim_end_matches('0');

    if trimmed.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{trimmed}")
    }
}
