//! Ethereum JSON-RPC implementation of the contract collaborator.

pub mod abi;
pub mod client;
mod contract;
mod errors;
pub mod gateway;

pub use client::{RpcClient, RpcError, RpcTransport};
pub use gateway::{RpcConnector, RpcGateway, RpcSettings};
