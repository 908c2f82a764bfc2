//! Local Read Model
//!
//! Client-side view of contract state, refreshed after confirmed operations. It is a cache, not
//! an authority: every entry may be stale.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::models::{Booking, BookingId, Equipment};

/// Cached contract state for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadModel {
    booking_counter: Option<u64>,
    equipment: FxHashMap<String, Equipment>,
    bookings: BTreeMap<BookingId, Booking>,
}

impl ReadModel {
    /// Last known number of bookings.
    pub const fn booking_counter(&self) -> Option<u64> {
        self.booking_counter
    }

    /// Record the number of bookings.
    pub fn set_booking_counter(&mut self, counter: u64) {
        self.booking_counter = Some(counter);
    }

    /// Cached equipment record.
    pub fn equipment(&self, equipment_id: &str) -> Option<&Equipment> {
        self.equipment.get(equipment_id)
    }

    /// Insert or replace an equipment record.
    pub fn upsert_equipment(&mut self, equipment: Equipment) {
        self.equipment.insert(equipment.id.clone(), equipment);
    }

    /// Cached booking record.
    pub fn booking(&self, id: BookingId) -> Option<&Booking> {
        self.bookings.get(&id)
    }

    /// Insert or replace a booking record.
    pub fn upsert_booking(&mut self, booking: Booking) {
        self.bookings.insert(booking.id, booking);
    }

    /// Cached bookings, ordered by identifier.
    pub fn bookings(&self) -> impl Iterator<Item = &Booking> {
        self.bookings.values()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
