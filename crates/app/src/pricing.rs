//! Booking price lookup.

use thiserror::Error;
use tracing::{debug, warn};

use sciquip::{
    dates::DateRange,
    operations::{FailureCause, ValidationError},
    pricing::{PricingError, Quote},
};

use crate::gateway::ContractGateway;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriceLookupError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl From<PriceLookupError> for FailureCause {
    fn from(error: PriceLookupError) -> Self {
        match error {
            PriceLookupError::Pricing(error) => Self::Validation(ValidationError::Pricing(error)),
        }
    }
}

/// Prices bookings against the contract's current per-day rates.
#[derive(Clone, Copy)]
pub struct PriceCalculator<'a> {
    gateway: &'a dyn ContractGateway,
}

impl<'a> PriceCalculator<'a> {
    #[must_use]
    pub fn new(gateway: &'a dyn ContractGateway) -> Self {
        Self { gateway }
    }

    /// Quote a booking of `equipment_id` over `range` at the current per-day price.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::EquipmentNotFound`] when the equipment does not exist or the
    /// lookup fails, and [`PricingError::AmountOverflow`] when the total overflows.
    pub async fn quote(
        &self,
        equipment_id: &str,
        range: &DateRange,
    ) -> Result<Quote, PriceLookupError> {
        let equipment = self
            .gateway
            .read_equipment(equipment_id)
            .await
            .map_err(|error| {
                warn!(equipment_id, "equipment lookup failed: {error}");

                PricingError::EquipmentNotFound {
                    equipment_id: equipment_id.to_string(),
                    lookup_error: Some(error),
                }
            })?;
        let quote = Quote::for_booking(&equipment, range)?;

        debug!(
            equipment_id,
            days = quote.days(),
            price_per_day = %quote.price_per_day(),
            total = %quote.total(),
            "priced booking"
        );

        Ok(quote)
    }
}
