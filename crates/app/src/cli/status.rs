use sciquip::amounts::format_ether;
use sciquip_app::client::BookingClient;

use crate::config::ClientConfig;

pub(crate) async fn run(client: &BookingClient, config: &ClientConfig) -> Result<(), String> {
    let status = client
        .status()
        .await
        .map_err(|error| format!("failed to get status: {error}"))?;

    println!("contract: {}", config.contract_address);
    println!("account: {}", status.account);
    println!("chain_id: {}", status.chain_id);

    if let Some(mismatch) = status.network_mismatch {
        println!("warning: expected chain {}", mismatch.expected);
    }

    println!("total_bookings: {}", status.booking_counter);
    println!("balance: {} ETH", format_ether(status.balance));

    if status.balance.is_zero() {
        println!("the account has no ether; fund it from a faucet before sending transactions");
    }

    Ok(())
}
