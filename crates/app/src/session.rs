//! Session lifecycle.
//!
//! `Disconnected -> Connecting -> Connected`. Account or chain changes never patch a live
//! session; they drop it and the caller reconnects from scratch.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use tracing::{info, warn};

use sciquip::models::Address;

use crate::gateway::{Connection, ConnectionError, Connector, ContractGateway};

/// Sepolia test network.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// The wallet is connected to a different chain than the contract lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkMismatch {
    pub expected: u64,
    pub actual: u64,
}

/// Connected account and contract access. Read-only once built.
pub struct Session {
    account: Address,
    chain_id: u64,
    gateway: Arc<dyn ContractGateway>,
    network_mismatch: Option<NetworkMismatch>,
}

impl Session {
    /// Wrap a fresh connection, noting whether it is on `expected_chain_id`.
    #[must_use]
    pub fn from_connection(connection: Connection, expected_chain_id: u64) -> Self {
        let network_mismatch =
            (connection.chain_id != expected_chain_id).then_some(NetworkMismatch {
                expected: expected_chain_id,
                actual: connection.chain_id,
            });

        Self {
            account: connection.account,
            chain_id: connection.chain_id,
            gateway: connection.gateway,
            network_mismatch,
        }
    }

    #[must_use]
    pub fn account(&self) -> Address {
        self.account
    }

    #[must_use]
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    #[must_use]
    pub fn gateway(&self) -> &dyn ContractGateway {
        self.gateway.as_ref()
    }

    /// Set when the connected chain differs from the expected one.
    #[must_use]
    pub fn network_mismatch(&self) -> Option<NetworkMismatch> {
        self.network_mismatch
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Session")
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .field("network_mismatch", &self.network_mismatch)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Connected(Arc<Session>),
}

/// Notifications pushed by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// What handling a [`SessionEvent`] did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Local state was discarded; reconnect before the next operation.
    Reset,

    /// The event did not change the active account or chain.
    Unchanged,
}

pub struct SessionManager {
    connector: Arc<dyn Connector>,
    expected_chain_id: u64,
    state: SessionState,
}

impl SessionManager {
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, expected_chain_id: u64) -> Self {
        Self {
            connector,
            expected_chain_id,
            state: SessionState::Disconnected,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn session(&self) -> Option<Arc<Session>> {
        match &self.state {
            SessionState::Connected(session) => Some(Arc::clone(session)),
            SessionState::Disconnected | SessionState::Connecting => None,
        }
    }

    /// Establish a new session, replacing any existing one.
    ///
    /// A chain mismatch is not an error: it is logged, recorded on the session and a switch is
    /// requested from the wallet.
    ///
    /// # Errors
    ///
    /// Returns an error when the connector cannot produce a connection; the manager is left
    /// `Disconnected`.
    pub async fn connect(&mut self) -> Result<Arc<Session>, ConnectionError> {
        self.state = SessionState::Connecting;

        let connection = match self.connector.connect().await {
            Ok(connection) => connection,
            Err(error) => {
                self.state = SessionState::Disconnected;
                return Err(error);
            }
        };

        info!(
            account = %connection.account,
            chain_id = connection.chain_id,
            "connected"
        );

        let session = Arc::new(Session::from_connection(connection, self.expected_chain_id));

        if let Some(mismatch) = session.network_mismatch() {
            warn!(
                expected = mismatch.expected,
                actual = mismatch.actual,
                "connected to an unexpected network; requesting switch"
            );

            if let Err(error) = self
                .connector
                .request_network_switch(self.expected_chain_id)
                .await
            {
                warn!("failed to switch network: {error}");
            }
        }

        self.state = SessionState::Connected(Arc::clone(&session));

        Ok(session)
    }

    /// Dispatch a wallet notification.
    ///
    /// Any chain change, a disconnected wallet or a different active account resets the session.
    pub fn handle_event(&mut self, event: &SessionEvent) -> EventOutcome {
        let current = self.session().map(|session| session.account());

        match event {
            SessionEvent::AccountsChanged(accounts) if accounts.is_empty() => {
                warn!("wallet disconnected");
            }
            SessionEvent::AccountsChanged(accounts) if accounts.first().copied() == current => {
                return EventOutcome::Unchanged;
            }
            SessionEvent::AccountsChanged(_) => {
                info!("account changed; resetting session");
            }
            SessionEvent::ChainChanged(chain_id) => {
                info!(chain_id, "network changed; resetting session");
            }
        }

        self.reset();

        EventOutcome::Reset
    }

    pub fn reset(&mut self) {
        self.state = SessionState::Disconnected;
    }
}
