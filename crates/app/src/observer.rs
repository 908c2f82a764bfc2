//! Operation Observer

use tracing::{debug, info, warn};

use sciquip::operations::{OperationKind, OperationState};

/// Receives every state transition an operation goes through.
///
/// Observers are passive: they cannot influence the operation. The terminal client uses one
/// to print the submission hash and explorer link while inclusion is still pending.
pub trait OperationObserver: Send + Sync {
    /// Called after the operation has moved to `state`.
    fn on_transition(&self, kind: OperationKind, state: &OperationState);
}

/// No-op observer for unobserved operations.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl OperationObserver for NoopObserver {
    fn on_transition(&self, _: OperationKind, _: &OperationState) {}
}

/// Logs transitions through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl OperationObserver for TracingObserver {
    fn on_transition(&self, kind: OperationKind, state: &OperationState) {
        match state {
            OperationState::Idle | OperationState::Validating | OperationState::Submitting => {
                debug!(operation = %kind, %state, "operation transition");
            }
            OperationState::PendingInclusion(handle) => {
                info!(operation = %kind, transaction = %handle, "transaction submitted");
            }
            OperationState::Confirmed(inclusion) => {
                info!(
                    operation = %kind,
                    block = inclusion.block_number,
                    gas_used = %inclusion.gas_used,
                    "transaction confirmed"
                );
            }
            OperationState::Failed(cause) => {
                warn!(operation = %kind, "operation failed: {cause}");
            }
        }
    }
}
