//! Client Configuration

use std::time::Duration;

use clap::Args;
use jiff::tz::TimeZone;

use sciquip::models::Address;
use sciquip_app::{rpc::RpcSettings, session::SEPOLIA_CHAIN_ID};

/// Deployed booking contract on Sepolia.
const DEFAULT_CONTRACT_ADDRESS: &str = "0x5D8f9b119C2C72779c059b09e65319B69CF96f28";

/// Node and contract settings.
#[derive(Debug, Args)]
pub(crate) struct ClientConfig {
    /// JSON-RPC endpoint of a node that manages the signing account
    #[arg(long, env = "SEPOLIA_URL", hide_env_values = true)]
    pub rpc_url: String,

    /// Signing account; defaults to the node's first account
    #[arg(long, env = "ACCOUNT_ADDRESS")]
    pub account: Option<Address>,

    /// Booking contract address
    #[arg(long, env = "CONTRACT_ADDRESS", default_value = DEFAULT_CONTRACT_ADDRESS)]
    pub contract_address: Address,

    /// Chain the contract is deployed on
    #[arg(long, env = "EXPECTED_CHAIN_ID", default_value_t = SEPOLIA_CHAIN_ID)]
    pub expected_chain_id: u64,

    /// Block explorer used for transaction links
    #[arg(long, env = "EXPLORER_URL", default_value = "https://sepolia.etherscan.io")]
    pub explorer_url: String,

    /// Delay between receipt polls, in milliseconds
    #[arg(long, env = "RECEIPT_POLL_INTERVAL_MS", default_value_t = 2000)]
    pub poll_interval_ms: u64,

    /// IANA time zone booking dates are interpreted in; defaults to the system zone
    #[arg(long, env = "BOOKING_TIME_ZONE")]
    pub time_zone: Option<String>,
}

impl ClientConfig {
    pub(crate) fn rpc_settings(&self) -> RpcSettings {
        RpcSettings {
            url: self.rpc_url.clone(),
            contract: self.contract_address,
            account: self.account,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub(crate) fn time_zone(&self) -> Result<TimeZone, String> {
        match &self.time_zone {
            Some(name) => {
                TimeZone::get(name).map_err(|error| format!("unknown time zone {name:?}: {error}"))
            }
            None => Ok(TimeZone::system()),
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub(crate) struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}
