//! Replay orchestrator: rebuild state from the operation log.
//!
//! Delegates all domain logic to the kernel.
//! No shortcuts, no cached state logic.

use economy_kernel::config::EconomyConfig;
use economy_kernel::domain::EconomyState;
use economy_kernel::engine::EconomyEngine;
use economy_kernel::events::OperationEnvelope;
use economy_kernel::hashing::canonical_hash;

use crate::error::RuntimeResult;
use crate::proto_bridge::proto_to_kernel;
use crate::proto_types::ProtoOperationEnvelope;

/// Rebuild the economy from a sequence of operations.
///
/// 1. Create a fresh engine over an empty record store
/// 2. Pass each operation sequentially to the kernel
/// 3. Return (final_state, canonical_hash)
pub fn rebuild_state(
    config: &EconomyConfig,
    envelopes: &[OperationEnvelope],
) -> RuntimeResult<(EconomyState, String)> {
    let mut engine = EconomyEngine::new(config.clone());
    let state = engine.replay(envelopes)?.clone();
    let hash = canonical_hash(&state)?;
    tracing::info!(
        target: "economy::replay",
        operations = envelopes.len(),
        hash = %hash,
        "replay.completed"
    );
    Ok((state, hash))
}

/// Rebuild state and return only the canonical hash.
pub fn rebuild_hash(config: &EconomyConfig, envelopes: &[OperationEnvelope]) -> RuntimeResult<String> {
    let (_, hash) = rebuild_state(config, envelopes)?;
    Ok(hash)
}

/// Decode a whole log into kernel envelopes.
pub fn decode_all(protos: &[ProtoOperationEnvelope]) -> RuntimeResult<Vec<OperationEnvelope>> {
    protos
        .iter()
        .map(|p| proto_to_kernel(p).map_err(Into::into))
        .collect()
}
