use clap::Args;

use sciquip_app::{client::BookingClient, orchestrator::BookingRequest};

use super::output::{bookings_table, print_confirmation, quote_summary};

#[derive(Debug, Args)]
pub(crate) struct RequestBookingArgs {
    /// Equipment to book
    #[arg(long)]
    equipment_id: String,

    /// Free-form identifier of the person booking
    #[arg(long)]
    user_id: String,

    /// First day, YYYY-MM-DD
    #[arg(long)]
    start: String,

    /// Day after the last day, YYYY-MM-DD
    #[arg(long)]
    end: String,

    /// Print the quote without sending a transaction
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
pub(crate) struct ConfirmBookingArgs {
    /// Booking to confirm
    #[arg(long)]
    booking_id: String,
}

#[derive(Debug, Args)]
pub(crate) struct RecentBookingsArgs {
    /// Number of bookings to show
    #[arg(long, default_value_t = 5)]
    limit: u64,
}

pub(crate) async fn request(client: &BookingClient, args: RequestBookingArgs) -> Result<(), String> {
    let request = BookingRequest {
        equipment_id: args.equipment_id,
        user_id: args.user_id,
        start: args.start,
        end: args.end,
    };

    if args.dry_run {
        let (range, quote) = client
            .quote(&request)
            .await
            .map_err(|error| format!("failed to price booking: {error}"))?;

        println!("period: {} to {}", range.start(), range.end());
        print!("{}", quote_summary(&quote));

        return Ok(());
    }

    let confirmation = client
        .request_booking(&request)
        .await
        .map_err(|error| format!("failed to request booking: {error}"))?;

    print_confirmation(&confirmation);
    println!("booking requested");

    Ok(())
}

pub(crate) async fn confirm(client: &BookingClient, args: ConfirmBookingArgs) -> Result<(), String> {
    let confirmation = client
        .confirm_booking(&args.booking_id)
        .await
        .map_err(|error| format!("failed to confirm booking: {error}"))?;

    print_confirmation(&confirmation);
    println!("booking {} confirmed", args.booking_id.trim());

    Ok(())
}

pub(crate) async fn total(client: &BookingClient) -> Result<(), String> {
    let total = client
        .total_bookings()
        .await
        .map_err(|error| format!("failed to get total bookings: {error}"))?;

    println!("total_bookings: {total}");

    Ok(())
}

pub(crate) async fn recent(client: &BookingClient, args: RecentBookingsArgs) -> Result<(), String> {
    let bookings = client
        .recent_bookings(args.limit)
        .await
        .map_err(|error| format!("failed to load bookings: {error}"))?;

    if bookings.is_empty() {
        println!("no bookings found");
        return Ok(());
    }

    println!("{}", bookings_table(&bookings));

    Ok(())
}
