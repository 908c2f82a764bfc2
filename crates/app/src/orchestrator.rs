//! Transaction Orchestrator
//!
//! Runs the three mutating contract operations through validation, submission and inclusion,
//! then refreshes the local read model. Only one operation may be in flight at a time; a
//! second invocation is turned away with [`OperationError::Busy`] instead of being queued.

use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use jiff::tz::TimeZone;
use primitive_types::U256;
use thiserror::Error;
use tracing::{debug, warn};

use sciquip::{
    amounts::parse_ether,
    dates::DateRange,
    failures::classify,
    models::BookingId,
    operations::{
        FailureCause, Inclusion, OperationKind, OperationState, ReadError, SubmissionHandle,
        ValidationError,
    },
    pricing::Quote,
    read_model::ReadModel,
};

use crate::{
    gateway::ContractCall, observer::OperationObserver, pricing::PriceCalculator, session::Session,
};

/// Input for registering equipment. The price is entered in ether.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEquipment {
    pub id: String,
    pub name: String,
    pub price_per_day: String,
}

/// Input for requesting a booking. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub equipment_id: String,
    pub user_id: String,
    pub start: String,
    pub end: String,
}

/// A successfully included operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub kind: OperationKind,
    pub handle: SubmissionHandle,
    pub inclusion: Inclusion,

    /// Amount paid, for booking requests.
    pub quote: Option<Quote>,

    /// Set when the follow-up read-model refresh failed. The operation itself still succeeded.
    pub refresh_error: Option<ReadError>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("another operation is still in progress")]
    Busy,

    #[error(transparent)]
    Failed(#[from] FailureCause),
}

/// What to re-read once an operation is confirmed.
#[derive(Debug, Clone)]
enum Refresh {
    Equipment(String),
    BookingCounter,
    Booking(BookingId),
}

impl Refresh {
    fn after(call: &ContractCall) -> Self {
        match call {
            ContractCall::AddEquipment { equipment_id, .. } => Self::Equipment(equipment_id.clone()),
            ContractCall::RequestBooking { .. } => Self::BookingCounter,
            ContractCall::ConfirmBooking { booking_id } => Self::Booking(*booking_id),
        }
    }
}

/// Releases the in-flight flag when dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Orchestrator {
    in_flight: AtomicBool,
    state: Mutex<OperationState>,
    read_model: Mutex<ReadModel>,
    observer: Arc<dyn OperationObserver>,
    time_zone: TimeZone,
}

impl Orchestrator {
    /// Create an orchestrator that interprets booking dates in `time_zone`.
    #[must_use]
    pub fn new(observer: Arc<dyn OperationObserver>, time_zone: TimeZone) -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            state: Mutex::new(OperationState::Idle),
            read_model: Mutex::new(ReadModel::default()),
            observer,
            time_zone,
        }
    }

    /// State of the most recent operation.
    #[must_use]
    pub fn state(&self) -> OperationState {
        lock(&self.state).clone()
    }

    /// Snapshot of the local read model.
    #[must_use]
    pub fn read_model(&self) -> ReadModel {
        lock(&self.read_model).clone()
    }

    /// Record rows read outside an operation, e.g. when listing bookings.
    pub fn remember(&self, update: impl FnOnce(&mut ReadModel)) {
        update(&mut lock(&self.read_model));
    }

    /// Forget cached contract state and return to `Idle`. Called when the session resets.
    pub fn discard_local_state(&self) {
        lock(&self.read_model).clear();
        *lock(&self.state) = OperationState::Idle;
    }

    /// Whether an operation is currently in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Register a piece of equipment.
    ///
    /// # Errors
    ///
    /// [`OperationError::Busy`] when another operation is in flight, otherwise the cause the
    /// operation failed with.
    pub async fn add_equipment(
        &self,
        session: &Session,
        input: &NewEquipment,
    ) -> Result<Confirmation, OperationError> {
        const KIND: OperationKind = OperationKind::AddEquipment;

        let _in_flight = self.acquire()?;

        self.transition(KIND, OperationState::Validating);

        let call = validate_equipment(input).map_err(|error| self.fail(KIND, error.into()))?;

        self.execute(session, call, None, None).await
    }

    /// Price and request a booking, attaching the quoted total as payment.
    ///
    /// # Errors
    ///
    /// [`OperationError::Busy`] when another operation is in flight, otherwise the cause the
    /// operation failed with.
    pub async fn request_booking(
        &self,
        session: &Session,
        input: &BookingRequest,
    ) -> Result<Confirmation, OperationError> {
        const KIND: OperationKind = OperationKind::RequestBooking;

        let _in_flight = self.acquire()?;

        self.transition(KIND, OperationState::Validating);

        let (range, quote) = self
            .quote(session, input)
            .await
            .map_err(|cause| self.fail(KIND, cause))?;

        let call = ContractCall::RequestBooking {
            equipment_id: input.equipment_id.trim().to_string(),
            user_id: input.user_id.trim().to_string(),
            start_timestamp: range.start_timestamp(),
            end_timestamp: range.end_timestamp(),
        };

        self.execute(session, call, Some(quote.total()), Some(quote))
            .await
    }

    /// Confirm an existing booking.
    ///
    /// # Errors
    ///
    /// [`OperationError::Busy`] when another operation is in flight, otherwise the cause the
    /// operation failed with.
    pub async fn confirm_booking(
        &self,
        session: &Session,
        booking_id: &str,
    ) -> Result<Confirmation, OperationError> {
        const KIND: OperationKind = OperationKind::ConfirmBooking;

        let _in_flight = self.acquire()?;

        self.transition(KIND, OperationState::Validating);

        let booking_id =
            parse_booking_id(booking_id).map_err(|error| self.fail(KIND, error.into()))?;

        self.execute(session, ContractCall::ConfirmBooking { booking_id }, None, None)
            .await
    }

    /// Validate a booking request and price it without submitting anything.
    ///
    /// Does not take the in-flight guard or touch the operation state.
    ///
    /// # Errors
    ///
    /// Returns the validation or read failure that would have ended a real request.
    pub async fn quote(
        &self,
        session: &Session,
        input: &BookingRequest,
    ) -> Result<(DateRange, Quote), FailureCause> {
        let equipment_id = required(&input.equipment_id, "equipment id")?;
        required(&input.user_id, "user id")?;

        let range = DateRange::parse_in(input.start.trim(), input.end.trim(), &self.time_zone)
            .map_err(ValidationError::from)?;

        let quote = PriceCalculator::new(session.gateway())
            .quote(equipment_id, &range)
            .await?;

        Ok((range, quote))
    }

    async fn execute(
        &self,
        session: &Session,
        call: ContractCall,
        value: Option<U256>,
        quote: Option<Quote>,
    ) -> Result<Confirmation, OperationError> {
        let kind = call.kind();
        let refresh = Refresh::after(&call);
        let gateway = session.gateway();

        self.transition(kind, OperationState::Submitting);

        let handle = gateway.submit(call, value).await.map_err(|failure| {
            debug!(?failure, "submission rejected");
            self.fail(kind, FailureCause::Submit(classify(&failure)))
        })?;

        self.transition(kind, OperationState::PendingInclusion(handle.clone()));

        let inclusion = gateway.await_inclusion(&handle).await.map_err(|failure| {
            debug!(?failure, transaction = %handle, "inclusion failed");
            self.fail(kind, FailureCause::Inclusion(classify(&failure)))
        })?;

        self.transition(kind, OperationState::Confirmed(inclusion));

        let refresh_error = self.refresh(session, refresh).await.err();

        if let Some(error) = &refresh_error {
            warn!(operation = %kind, "failed to refresh local state: {error}");
        }

        Ok(Confirmation {
            kind,
            handle,
            inclusion,
            quote,
            refresh_error,
        })
    }

    async fn refresh(&self, session: &Session, refresh: Refresh) -> Result<(), ReadError> {
        let gateway = session.gateway();

        match refresh {
            Refresh::Equipment(equipment_id) => {
                let equipment = gateway.read_equipment(&equipment_id).await?;
                lock(&self.read_model).upsert_equipment(equipment);
            }
            Refresh::BookingCounter => {
                let counter = gateway.read_booking_counter().await?;
                lock(&self.read_model).set_booking_counter(counter);
            }
            Refresh::Booking(booking_id) => {
                let booking = gateway.read_booking(booking_id).await?;
                lock(&self.read_model).upsert_booking(booking);
            }
        }

        Ok(())
    }

    fn acquire(&self) -> Result<InFlight<'_>, OperationError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| OperationError::Busy)?;

        Ok(InFlight(&self.in_flight))
    }

    fn transition(&self, kind: OperationKind, state: OperationState) {
        *lock(&self.state) = state.clone();
        self.observer.on_transition(kind, &state);
    }

    fn fail(&self, kind: OperationKind, cause: FailureCause) -> OperationError {
        self.transition(kind, OperationState::Failed(cause.clone()));

        OperationError::Failed(cause)
    }
}

fn validate_equipment(input: &NewEquipment) -> Result<ContractCall, ValidationError> {
    let equipment_id = required(&input.id, "equipment id")?;
    let name = required(&input.name, "name")?;
    let price_per_day = parse_ether(input.price_per_day.trim())?;

    Ok(ContractCall::AddEquipment {
        equipment_id: equipment_id.to_string(),
        name: name.to_string(),
        price_per_day,
    })
}

fn parse_booking_id(input: &str) -> Result<BookingId, ValidationError> {
    let input = required(input, "booking id")?;

    input
        .parse::<u64>()
        .map(BookingId::new)
        .map_err(|_| ValidationError::InvalidBookingId(input.to_string()))
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }

    Ok(value)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
