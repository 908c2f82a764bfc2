//! Equipment & Booking Models

use std::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use jiff::Timestamp;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing an account address.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The address is not 20 bytes of hex, with or without a `0x` prefix.
    #[error("invalid account address: {0}")]
    Invalid(String),
}

/// Account identifier of a signer or participant.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    /// Wrap raw address bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes.
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Shortened form for display, e.g. `0x5d8f...6f28`.
    pub fn short(&self) -> String {
        let [a, b, .., c, d] = self.0;

        format!("0x{a:02x}{b:02x}...{c:02x}{d:02x}")
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let mut bytes = [0_u8; 20];

        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|error| AddressError::Invalid(format!("{value} ({error})")))?;

        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(self, f)
    }
}

/// Registered piece of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    /// Unique equipment identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Owning account.
    pub owner: Address,

    /// Price per whole day, in wei.
    pub price_per_day: U256,

    /// Whether the contract holds a record for this identifier.
    pub exists: bool,
}

/// Booking identifier, assigned by the contract in increasing order from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookingId(u64);

impl BookingId {
    /// Wrap a raw booking number.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw booking number.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for BookingId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for BookingId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    /// Requested and paid, awaiting confirmation.
    Requested,

    /// Confirmed; payment released to the owner.
    Confirmed,
}

/// Unknown on-chain booking status discriminant.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unknown booking status {0}")]
pub struct UnknownBookingStatus(pub u8);

impl TryFrom<u8> for BookingStatus {
    type Error = UnknownBookingStatus;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Requested),
            1 => Ok(Self::Confirmed),
            other => Err(UnknownBookingStatus(other)),
        }
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Requested => f.write_str("Requested"),
            Self::Confirmed => f.write_str("Confirmed"),
        }
    }
}

/// Booking record as held by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking identifier.
    pub id: BookingId,

    /// Booked equipment.
    pub equipment_id: String,

    /// Free-form identifier supplied by the requester.
    pub user_id: String,

    /// Requesting account.
    pub user: Address,

    /// Current status.
    pub status: BookingStatus,

    /// Confirmed by the requesting user.
    pub user_confirmed: bool,

    /// Confirmed by the equipment owner.
    pub owner_confirmed: bool,

    /// When the booking was requested.
    pub created_at: Timestamp,

    /// Start of the booked period.
    pub start: Timestamp,

    /// End of the booked period.
    pub end: Timestamp,
}
