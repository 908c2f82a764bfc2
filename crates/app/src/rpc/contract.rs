//! Booking contract function signatures and return-tuple layouts.

use jiff::Timestamp;

use sciquip::{
    models::{Booking, BookingId, BookingStatus, Equipment},
    operations::ReadError,
};

use crate::gateway::ContractCall;

use super::abi::{Decoder, Token, encode_call};

const ADD_EQUIPMENT: &str = "addEquipment(string,string,uint256)";
const REQUEST_BOOKING: &str = "requestBooking(string,string,uint256,uint256)";
const CONFIRM_BOOKING: &str = "confirmBooking(uint256)";
const BOOKING_COUNTER: &str = "bookingCounter()";
const BOOKINGS: &str = "bookings(uint256)";
const EQUIPMENTS: &str = "equipments(string)";
const PAYMENTS: &str = "payments(uint256)";

pub(crate) fn calldata(call: &ContractCall) -> Vec<u8> {
    match call {
        ContractCall::AddEquipment {
            equipment_id,
            name,
            price_per_day,
        } => encode_call(
            ADD_EQUIPMENT,
            &[
                Token::String(equipment_id.clone()),
                Token::String(name.clone()),
                Token::Uint(*price_per_day),
            ],
        ),
        ContractCall::RequestBooking {
            equipment_id,
            user_id,
            start_timestamp,
            end_timestamp,
        } => encode_call(
            REQUEST_BOOKING,
            &[
                Token::String(equipment_id.clone()),
                Token::String(user_id.clone()),
                Token::Uint((*start_timestamp).into()),
                Token::Uint((*end_timestamp).into()),
            ],
        ),
        ContractCall::ConfirmBooking { booking_id } => {
            encode_call(CONFIRM_BOOKING, &[Token::Uint(booking_id.get().into())])
        }
    }
}

pub(crate) fn booking_counter_call() -> Vec<u8> {
    encode_call(BOOKING_COUNTER, &[])
}

pub(crate) fn booking_call(booking_id: BookingId) -> Vec<u8> {
    encode_call(BOOKINGS, &[Token::Uint(booking_id.get().into())])
}

pub(crate) fn equipment_call(equipment_id: &str) -> Vec<u8> {
    encode_call(EQUIPMENTS, &[Token::String(equipment_id.to_string())])
}

pub(crate) fn payment_call(booking_id: BookingId) -> Vec<u8> {
    encode_call(PAYMENTS, &[Token::Uint(booking_id.get().into())])
}

/// `(string name, address owner, bool exists, uint256 pricePerDay)`
pub(crate) fn decode_equipment(equipment_id: &str, data: &[u8]) -> Result<Equipment, ReadError> {
    let decoder = Decoder::new(data);

    Ok(Equipment {
        id: equipment_id.to_string(),
        name: decoder.string(0)?,
        owner: decoder.address(1)?,
        exists: decoder.bool(2)?,
        price_per_day: decoder.uint(3)?,
    })
}

/// `(uint256 id, string equipmentId, string userId, address user, uint8 status,
/// bool userConfirmed, bool ownerConfirmed, uint256 bookingTimestamp, uint256 startTimestamp,
/// uint256 endTimestamp)`
pub(crate) fn decode_booking(data: &[u8]) -> Result<Booking, ReadError> {
    let decoder = Decoder::new(data);
    let status = BookingStatus::try_from(decoder.u8(4)?)
        .map_err(|error| ReadError::Malformed(error.to_string()))?;

    Ok(Booking {
        id: BookingId::new(decoder.u64(0)?),
        equipment_id: decoder.string(1)?,
        user_id: decoder.string(2)?,
        user: decoder.address(3)?,
        status,
        user_confirmed: decoder.bool(5)?,
        owner_confirmed: decoder.bool(6)?,
        created_at: timestamp(decoder.u64(7)?)?,
        start: timestamp(decoder.u64(8)?)?,
        end: timestamp(decoder.u64(9)?)?,
    })
}

fn timestamp(seconds: u64) -> Result<Timestamp, ReadError> {
    i64::try_from(seconds)
        .ok()
        .and_then(|seconds| Timestamp::from_second(seconds).ok())
        .ok_or_else(|| ReadError::Malformed(format!("timestamp {seconds} out of range")))
}
