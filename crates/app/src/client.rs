//! Booking Client
//!
//! Owns the session and the orchestrator for one user. Session resets discard every piece of
//! local state the orchestrator holds.

use std::sync::Arc;

use jiff::tz::TimeZone;
use primitive_types::U256;
use thiserror::Error;
use tracing::debug;

use sciquip::{
    dates::DateRange,
    models::{Address, Booking, BookingId},
    operations::{FailureCause, ReadError},
    pricing::Quote,
};

use crate::{
    gateway::{ConnectionError, Connector},
    observer::OperationObserver,
    orchestrator::{BookingRequest, Confirmation, NewEquipment, OperationError, Orchestrator},
    session::{EventOutcome, NetworkMismatch, Session, SessionEvent, SessionManager},
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not connected; connect a wallet first")]
    NotConnected,

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Read(#[from] ReadError),
}

impl From<FailureCause> for ClientError {
    fn from(cause: FailureCause) -> Self {
        Self::Operation(OperationError::Failed(cause))
    }
}

/// Snapshot of the connected account and contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractStatus {
    pub account: Address,
    pub chain_id: u64,
    pub network_mismatch: Option<NetworkMismatch>,
    pub booking_counter: u64,
    pub balance: U256,
}

pub struct BookingClient {
    sessions: SessionManager,
    orchestrator: Orchestrator,
}

impl BookingClient {
    #[must_use]
    pub fn new(
        connector: Arc<dyn Connector>,
        expected_chain_id: u64,
        observer: Arc<dyn OperationObserver>,
        time_zone: TimeZone,
    ) -> Self {
        Self {
            sessions: SessionManager::new(connector, expected_chain_id),
            orchestrator: Orchestrator::new(observer, time_zone),
        }
    }

    #[must_use]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Connect, replacing any existing session and its local state.
    ///
    /// # Errors
    ///
    /// Returns an error if the connector fails.
    pub async fn connect(&mut self) -> Result<Arc<Session>, ClientError> {
        self.orchestrator.discard_local_state();

        Ok(self.sessions.connect().await?)
    }

    /// Dispatch a wallet notification, discarding local state when the session resets.
    pub fn handle_event(&mut self, event: &SessionEvent) -> EventOutcome {
        let outcome = self.sessions.handle_event(event);

        if outcome == EventOutcome::Reset {
            self.orchestrator.discard_local_state();
        }

        outcome
    }

    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] before [`BookingClient::connect`] succeeds.
    pub fn session(&self) -> Result<Arc<Session>, ClientError> {
        self.sessions.session().ok_or(ClientError::NotConnected)
    }

    /// # Errors
    ///
    /// Returns an error when not connected or the operation fails.
    pub async fn add_equipment(&self, input: &NewEquipment) -> Result<Confirmation, ClientError> {
        let session = self.session()?;

        Ok(self.orchestrator.add_equipment(&session, input).await?)
    }

    /// # Errors
    ///
    /// Returns an error when not connected or the operation fails.
    pub async fn request_booking(
        &self,
        input: &BookingRequest,
    ) -> Result<Confirmation, ClientError> {
        let session = self.session()?;

        Ok(self.orchestrator.request_booking(&session, input).await?)
    }

    /// # Errors
    ///
    /// Returns an error when not connected or the operation fails.
    pub async fn confirm_booking(&self, booking_id: &str) -> Result<Confirmation, ClientError> {
        let session = self.session()?;

        Ok(self.orchestrator.confirm_booking(&session, booking_id).await?)
    }

    /// Price a booking request without submitting it.
    ///
    /// # Errors
    ///
    /// Returns an error when not connected, or the request is invalid or cannot be priced.
    pub async fn quote(&self, input: &BookingRequest) -> Result<(DateRange, Quote), ClientError> {
        let session = self.session()?;

        Ok(self.orchestrator.quote(&session, input).await?)
    }

    /// Number of bookings ever requested.
    ///
    /// # Errors
    ///
    /// Returns an error when not connected or the read fails.
    pub async fn total_bookings(&self) -> Result<u64, ClientError> {
        let session = self.session()?;
        let counter = session.gateway().read_booking_counter().await?;

        self.orchestrator
            .remember(|model| model.set_booking_counter(counter));

        Ok(counter)
    }

    /// # Errors
    ///
    /// Returns an error when not connected or a read fails.
    pub async fn status(&self) -> Result<ContractStatus, ClientError> {
        let session = self.session()?;
        let booking_counter = self.total_bookings().await?;
        let balance = session.gateway().read_balance(session.account()).await?;

        Ok(ContractStatus {
            account: session.account(),
            chain_id: session.chain_id(),
            network_mismatch: session.network_mismatch(),
            booking_counter,
            balance,
        })
    }

    /// The `limit` most recent bookings, newest first, each with the amount held for it.
    ///
    /// # Errors
    ///
    /// Returns an error when not connected or a read fails.
    pub async fn recent_bookings(&self, limit: u64) -> Result<Vec<(Booking, U256)>, ClientError> {
        let session = self.session()?;
        let gateway = session.gateway();
        let counter = self.total_bookings().await?;
        let oldest = counter.saturating_sub(limit);

        let mut bookings = Vec::new();

        for id in (oldest..counter).rev().map(BookingId::new) {
            let booking = gateway.read_booking(id).await?;
            let payment = gateway.read_payment(id).await?;

            debug!(booking_id = %id, "loaded booking");

            bookings.push((booking, payment));
        }

        self.orchestrator.remember(|model| {
            for (booking, _) in &bookings {
                model.upsert_booking(booking.clone());
            }
        });

        Ok(bookings)
    }
}
