use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::warn;

use sciquip_app::{client::BookingClient, rpc::RpcConnector};

use crate::config::{ClientConfig, LoggingConfig};

mod bookings;
mod equipment;
mod output;
mod status;

#[derive(Debug, Parser)]
#[command(name = "sciquip", about = "SciQuip equipment booking client", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub config: ClientConfig,

    #[command(flatten)]
    pub logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Register a piece of equipment
    AddEquipment(equipment::AddEquipmentArgs),

    /// Request and pay for a booking
    RequestBooking(bookings::RequestBookingArgs),

    /// Confirm a booking
    ConfirmBooking(bookings::ConfirmBookingArgs),

    /// Show the number of bookings ever made
    TotalBookings,

    /// Show contract, network and wallet status
    Status,

    /// List the most recent bookings
    RecentBookings(bookings::RecentBookingsArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        let config = self.config;
        let observer = Arc::new(output::ConsoleObserver::new(config.explorer_url.clone()));
        let mut client = BookingClient::new(
            Arc::new(RpcConnector::new(config.rpc_settings())),
            config.expected_chain_id,
            observer,
            config.time_zone()?,
        );

        let session = client
            .connect()
            .await
            .map_err(|error| format!("failed to connect: {error}"))?;

        if let Some(mismatch) = session.network_mismatch() {
            warn!(
                expected = mismatch.expected,
                actual = mismatch.actual,
                "wrong network; switch to the expected network before sending transactions"
            );
        }

        match self.command {
            Commands::AddEquipment(args) => equipment::run(&client, args).await,
            Commands::RequestBooking(args) => bookings::request(&client, args).await,
            Commands::ConfirmBooking(args) => bookings::confirm(&client, args).await,
            Commands::TotalBookings => bookings::total(&client).await,
            Commands::Status => status::run(&client, &config).await,
            Commands::RecentBookings(args) => bookings::recent(&client, args).await,
        }
    }
}
