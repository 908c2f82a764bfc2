//! Contract collaborator interfaces.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use async_trait::async_trait;
use mockall::automock;
use primitive_types::U256;
use thiserror::Error;

use sciquip::{
    failures::Failure,
    models::{Address, Booking, BookingId, Equipment},
    operations::{Inclusion, OperationKind, ReadError, SubmissionHandle},
};

/// State-changing call against the booking contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    /// `addEquipment(string,string,uint256)`
    AddEquipment {
        equipment_id: String,
        name: String,
        price_per_day: U256,
    },

    /// `requestBooking(string,string,uint256,uint256)`, payable.
    RequestBooking {
        equipment_id: String,
        user_id: String,
        start_timestamp: u64,
        end_timestamp: u64,
    },

    /// `confirmBooking(uint256)`
    ConfirmBooking { booking_id: BookingId },
}

impl ContractCall {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::AddEquipment { .. } => OperationKind::AddEquipment,
            Self::RequestBooking { .. } => OperationKind::RequestBooking,
            Self::ConfirmBooking { .. } => OperationKind::ConfirmBooking,
        }
    }
}

/// Read and write access to the deployed booking contract for one authenticated account.
#[automock]
#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// Look up an equipment record. Unknown identifiers yield a record with `exists == false`.
    async fn read_equipment(&self, equipment_id: &str) -> Result<Equipment, ReadError>;

    /// Look up a booking record.
    async fn read_booking(&self, booking_id: BookingId) -> Result<Booking, ReadError>;

    /// Number of bookings ever requested.
    async fn read_booking_counter(&self) -> Result<u64, ReadError>;

    /// Amount held for a booking.
    async fn read_payment(&self, booking_id: BookingId) -> Result<U256, ReadError>;

    /// Native balance of an account.
    async fn read_balance(&self, account: Address) -> Result<U256, ReadError>;

    /// Hand a call to the signer, attaching `value` wei when given.
    async fn submit(
        &self,
        call: ContractCall,
        value: Option<U256>,
    ) -> Result<SubmissionHandle, Failure>;

    /// Wait until the submitted call is included. No timeout is applied.
    async fn await_inclusion(&self, handle: &SubmissionHandle) -> Result<Inclusion, Failure>;
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("network unreachable: {0}")]
    Unreachable(String),

    #[error("no account available to sign transactions")]
    NoAccount,

    #[error("unexpected response while connecting: {0}")]
    UnexpectedResponse(String),

    #[error("network switch refused: {0}")]
    SwitchRefused(String),
}

/// Authenticated link produced by [`Connector::connect`].
#[derive(Clone)]
pub struct Connection {
    pub account: Address,
    pub chain_id: u64,
    pub gateway: Arc<dyn ContractGateway>,
}

impl Debug for Connection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Connection")
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

/// Wallet or RPC layer able to establish a [`Connection`].
#[automock]
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Connection, ConnectionError>;

    /// Ask the wallet to move to `chain_id`.
    async fn request_network_switch(&self, chain_id: u64) -> Result<(), ConnectionError>;
}
