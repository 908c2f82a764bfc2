//! Booking client: session handling, transaction orchestration and the JSON-RPC collaborator.

pub mod client;
pub mod gateway;
pub mod observer;
pub mod orchestrator;
pub mod pricing;
pub mod rpc;
pub mod session;

#[cfg(test)]
mod test;
