//! Booking Quotes

use primitive_types::U256;
use thiserror::Error;

use crate::{dates::DateRange, models::Equipment, operations::ReadError};

/// Errors that can occur while pricing a booking.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// The contract holds no record for the equipment, or the record could not be read.
    #[error("equipment {equipment_id:?} does not exist{}", lookup_detail(.lookup_error.as_ref()))]
    EquipmentNotFound {
        /// Requested equipment identifier.
        equipment_id: String,

        /// Set when the lookup itself failed rather than returning an empty record.
        lookup_error: Option<ReadError>,
    },

    /// A booking must last at least one whole day.
    #[error("booking must be at least 1 full day")]
    ZeroDays,

    /// `price_per_day * days` does not fit in 256 bits.
    #[error("total for {days} day(s) at {price_per_day} wei/day overflows")]
    AmountOverflow {
        /// Per-day price in wei.
        price_per_day: U256,

        /// Number of days.
        days: u64,
    },
}

/// Amount owed for a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    price_per_day: U256,
    days: u64,
    total: U256,
}

impl Quote {
    /// Price `days` whole days at `price_per_day` wei.
    ///
    /// # Errors
    ///
    /// - [`PricingError::ZeroDays`]: `days` is zero.
    /// - [`PricingError::AmountOverflow`]: the product exceeds 256 bits.
    pub fn new(price_per_day: U256, days: u64) -> Result<Self, PricingError> {
        if days == 0 {
            return Err(PricingError::ZeroDays);
        }

        let total = price_per_day
            .checked_mul(U256::from(days))
            .ok_or(PricingError::AmountOverflow {
                price_per_day,
                days,
            })?;

        Ok(Self {
            price_per_day,
            days,
            total,
        })
    }

    /// Price a booking of `equipment` over `range`.
    ///
    /// # Errors
    ///
    /// - [`PricingError::EquipmentNotFound`]: the equipment record does not exist.
    /// - [`PricingError::AmountOverflow`]: the total exceeds 256 bits.
    pub fn for_booking(equipment: &Equipment, range: &DateRange) -> Result<Self, PricingError> {
        if !equipment.exists {
            return Err(PricingError::EquipmentNotFound {
                equipment_id: equipment.id.clone(),
                lookup_error: None,
            });
        }

        Self::new(equipment.price_per_day, range.days())
    }

    /// Per-day price in wei.
    pub const fn price_per_day(&self) -> U256 {
        self.price_per_day
    }

    /// Number of whole days priced.
    pub const fn days(&self) -> u64 {
        self.days
    }

    /// Total payment in wei, to be attached to the booking request.
    pub const fn total(&self) -> U256 {
        self.total
    }
}

fn lookup_detail(error: Option<&ReadError>) -> String {
    match error {
        Some(error) => format!(" ({error})"),
        None => String::new(),
    }
}
