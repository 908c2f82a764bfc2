//! Terminal rendering.

use jiff::Timestamp;
use primitive_types::U256;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};

use sciquip::{
    amounts::format_ether,
    models::Booking,
    operations::{OperationKind, OperationState},
    pricing::Quote,
};
use sciquip_app::{
    observer::{OperationObserver, TracingObserver},
    orchestrator::Confirmation,
};

/// Prints submission progress and explorer links as operations advance.
#[derive(Debug)]
pub(crate) struct ConsoleObserver {
    explorer_url: String,
}

impl ConsoleObserver {
    pub(crate) fn new(explorer_url: String) -> Self {
        Self { explorer_url }
    }
}

impl OperationObserver for ConsoleObserver {
    fn on_transition(&self, kind: OperationKind, state: &OperationState) {
        TracingObserver.on_transition(kind, state);

        match state {
            OperationState::PendingInclusion(handle) => {
                println!("transaction: {handle}");
                println!(
                    "explorer: {}/tx/{handle}",
                    self.explorer_url.trim_end_matches('/')
                );
                println!("waiting for confirmation...");
            }
            OperationState::Confirmed(inclusion) => {
                println!("confirmed in block {}", inclusion.block_number);
                println!("gas used: {}", inclusion.gas_used);
            }
            _ => {}
        }
    }
}

/// Days, rate and total of a quote, one per line.
pub(crate) fn quote_summary(quote: &Quote) -> String {
    format!(
        "days: {}\nprice_per_day: {} ETH\ntotal: {} ETH\n",
        quote.days(),
        format_ether(quote.price_per_day()),
        format_ether(quote.total())
    )
}

/// Prints what was paid, taken from the quote attached to the submitted call.
pub(crate) fn print_confirmation(confirmation: &Confirmation) {
    if let Some(quote) = &confirmation.quote {
        print!("{}", quote_summary(quote));
    }

    if let Some(error) = &confirmation.refresh_error {
        println!("note: local state was not refreshed: {error}");
    }
}

pub(crate) fn bookings_table(bookings: &[(Booking, U256)]) -> String {
    let mut builder = Builder::default();

    builder.push_record([
        "ID", "Equipment", "User", "Account", "Status", "By User", "By Owner", "Created",
        "Start", "End", "Held (ETH)",
    ]);

    for (booking, payment) in bookings {
        builder.push_record([
            booking.id.to_string(),
            booking.equipment_id.clone(),
            booking.user_id.clone(),
            booking.user.short(),
            booking.status.to_string(),
            yes_no(booking.user_confirmed).to_string(),
            yes_no(booking.owner_confirmed).to_string(),
            date(booking.created_at),
            date(booking.start),
            date(booking.end),
            format_ether(*payment),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(10..11), Alignment::right());

    table.to_string()
}

fn date(timestamp: Timestamp) -> String {
    timestamp.strftime("%Y-%m-%d").to_string()
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
