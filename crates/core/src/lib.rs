//! SciQuip
//!
//! SciQuip is the domain core of the equipment booking client: date ranges, ether amounts,
//! booking quotes, failure classification and the per-operation transaction state machine.
//!
//! Nothing in this crate performs I/O. The async session and orchestration layer lives in
//! `sciquip-app`.

pub mod amounts;
pub mod dates;
pub mod failures;
pub mod models;
pub mod operations;
pub mod pricing;
pub mod read_model;
