use clap::Args;

use sciquip_app::{client::BookingClient, orchestrator::NewEquipment};

use super::output::print_confirmation;

#[derive(Debug, Args)]
pub(crate) struct AddEquipmentArgs {
    /// Unique equipment identifier, e.g. MICROSCOPE-1
    #[arg(long)]
    id: String,

    /// Display name
    #[arg(long)]
    name: String,

    /// Price per day, in ether
    #[arg(long)]
    price: String,
}

pub(crate) async fn run(client: &BookingClient, args: AddEquipmentArgs) -> Result<(), String> {
    let confirmation = client
        .add_equipment(&NewEquipment {
            id: args.id,
            name: args.name,
            price_per_day: args.price,
        })
        .await
        .map_err(|error| format!("failed to add equipment: {error}"))?;

    print_confirmation(&confirmation);
    println!("equipment added");

    Ok(())
}
