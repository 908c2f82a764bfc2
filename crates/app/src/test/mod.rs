//! Test Helpers

use std::{
    collections::BTreeMap,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use jiff::Timestamp;
use primitive_types::U256;
use tokio::sync::Notify;

use sciquip::{
    failures::Failure,
    models::{Address, Booking, BookingId, BookingStatus, Equipment},
    operations::{Inclusion, OperationKind, OperationState, ReadError, SubmissionHandle},
};

use crate::{
    gateway::{ContractCall, ContractGateway},
    observer::OperationObserver,
};

pub(crate) fn address(n: u8) -> Address {
    Address::from_bytes([n; 20])
}

pub(crate) fn equipment(id: &str, price_per_day: U256, exists: bool) -> Equipment {
    Equipment {
        id: id.to_string(),
        name: format!("{id} (test)"),
        owner: address(9),
        price_per_day,
        exists,
    }
}

pub(crate) fn booking(id: u64, equipment_id: &str) -> Booking {
    Booking {
        id: BookingId::new(id),
        equipment_id: equipment_id.to_string(),
        user_id: "researcher-1".to_string(),
        user: address(1),
        status: BookingStatus::Requested,
        user_confirmed: false,
        owner_confirmed: false,
        created_at: Timestamp::UNIX_EPOCH,
        start: Timestamp::UNIX_EPOCH,
        end: Timestamp::UNIX_EPOCH,
    }
}

/// In-memory contract that records submissions and can hold inclusion until released.
#[derive(Default)]
pub(crate) struct FakeGateway {
    equipment: Mutex<BTreeMap<String, Equipment>>,
    bookings: Mutex<BTreeMap<BookingId, Booking>>,
    submissions: Mutex<Vec<(ContractCall, Option<U256>)>>,
    submit_failure: Mutex<Option<Failure>>,
    inclusion_failure: Mutex<Option<Failure>>,
    hold_inclusion: AtomicBool,
    reads_fail: AtomicBool,
    submitted: Notify,
    released: Notify,
}

impl FakeGateway {
    pub(crate) fn with_equipment(self, equipment: Equipment) -> Self {
        lock(&self.equipment).insert(equipment.id.clone(), equipment);
        self
    }

    pub(crate) fn with_booking(self, booking: Booking) -> Self {
        lock(&self.bookings).insert(booking.id, booking);
        self
    }

    pub(crate) fn failing_submission(self, failure: Failure) -> Self {
        *lock(&self.submit_failure) = Some(failure);
        self
    }

    pub(crate) fn failing_inclusion(self, failure: Failure) -> Self {
        *lock(&self.inclusion_failure) = Some(failure);
        self
    }

    /// Park `await_inclusion` until [`FakeGateway::release`] is called.
    pub(crate) fn holding_inclusion(self) -> Self {
        self.hold_inclusion.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn release(&self) {
        self.released.notify_one();
    }

    /// Make every read fail from now on.
    pub(crate) fn fail_reads(&self) {
        self.reads_fail.store(true, Ordering::SeqCst);
    }

    /// Resolves once a call has been submitted.
    pub(crate) async fn submission_seen(&self) {
        self.submitted.notified().await;
    }

    pub(crate) fn submissions(&self) -> Vec<(ContractCall, Option<U256>)> {
        lock(&self.submissions).clone()
    }

    fn check_reads(&self) -> Result<(), ReadError> {
        if self.reads_fail.load(Ordering::SeqCst) {
            return Err(ReadError::Unavailable("node went away".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl ContractGateway for FakeGateway {
    async fn read_equipment(&self, equipment_id: &str) -> Result<Equipment, ReadError> {
        self.check_reads()?;

        Ok(lock(&self.equipment)
            .get(equipment_id)
            .cloned()
            .unwrap_or_else(|| Equipment {
                id: equipment_id.to_string(),
                name: String::new(),
                owner: Address::default(),
                price_per_day: U256::zero(),
                exists: false,
            }))
    }

    async fn read_booking(&self, booking_id: BookingId) -> Result<Booking, ReadError> {
        self.check_reads()?;

        lock(&self.bookings)
            .get(&booking_id)
            .cloned()
            .ok_or_else(|| ReadError::Malformed(format!("no booking {booking_id}")))
    }

    async fn read_booking_counter(&self) -> Result<u64, ReadError> {
        self.check_reads()?;

        Ok(lock(&self.bookings).len() as u64)
    }

    async fn read_payment(&self, _booking_id: BookingId) -> Result<U256, ReadError> {
        self.check_reads()?;

        Ok(U256::zero())
    }

    async fn read_balance(&self, _account: Address) -> Result<U256, ReadError> {
        self.check_reads()?;

        Ok(U256::exp10(18))
    }

    async fn submit(
        &self,
        call: ContractCall,
        value: Option<U256>,
    ) -> Result<SubmissionHandle, Failure> {
        let count = {
            let mut submissions = lock(&self.submissions);
            submissions.push((call, value));
            submissions.len()
        };

        if let Some(failure) = lock(&self.submit_failure).clone() {
            return Err(failure);
        }

        self.submitted.notify_one();

        Ok(SubmissionHandle::new(format!("0x{count:064x}")))
    }

    async fn await_inclusion(&self, _handle: &SubmissionHandle) -> Result<Inclusion, Failure> {
        if self.hold_inclusion.load(Ordering::SeqCst) {
            self.released.notified().await;
        }

        if let Some(failure) = lock(&self.inclusion_failure).clone() {
            return Err(failure);
        }

        Ok(Inclusion {
            block_number: 42,
            gas_used: U256::from(21_000),
        })
    }
}

/// Observer that keeps every transition it sees.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    transitions: Mutex<Vec<(OperationKind, OperationState)>>,
}

impl RecordingObserver {
    /// Drain recorded transitions, rendered for comparison.
    pub(crate) fn take(&self) -> Vec<(OperationKind, String)> {
        std::mem::take(&mut *lock(&self.transitions))
            .into_iter()
            .map(|(kind, state)| (kind, state.to_string()))
            .collect()
    }

    /// Drain recorded transitions, asserting they end in exactly one terminal state.
    pub(crate) fn assert_single_terminal(&self) {
        let transitions = std::mem::take(&mut *lock(&self.transitions));
        let terminal = transitions
            .iter()
            .filter(|(_, state)| state.is_terminal())
            .count();

        assert_eq!(terminal, 1, "expected one terminal state in {transitions:?}");
        assert!(
            transitions
                .last()
                .is_some_and(|(_, state)| state.is_terminal()),
            "last transition must be terminal: {transitions:?}"
        );
    }
}

impl OperationObserver for RecordingObserver {
    fn on_transition(&self, kind: OperationKind, state: &OperationState) {
        lock(&self.transitions).push((kind, state.clone()));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
