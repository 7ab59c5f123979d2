/// Economy Kernel v1: Engine
///
/// Top-level orchestrator. Delegates mutation to transitions,
/// validates via invariants, and commits by swapping the state image.
///
/// Strict sequence enforcement, schema-version check.

use crate::config::EconomyConfig;
use crate::domain::{EconomyState, TransitionResult};
use crate::error::{EngineError, EngineResult};
use crate::events::{Operation, OperationEnvelope, SCHEMA_VERSION};
use crate::invariants::validate_invariants;
use crate::state::create_initial_state;
use crate::transitions::apply_operation;

/// Stateful engine wrapping the pure functional transition layer.
#[derive(Debug, Clone)]
pub struct EconomyEngine {
    state: EconomyState,
    config: EconomyConfig,
    last_sequence: u64,
}

impl EconomyEngine {
    /// Create an engine over an empty record store.
    pub fn new(config: EconomyConfig) -> Self {
        Self {
            state: create_initial_state(),
            config,
            last_sequence: 0,
        }
    }

    /// Resume from a restored state. The next envelope must carry
    /// `last_sequence + 1`.
    pub fn with_state(
        config: EconomyConfig,
        state: EconomyState,
        last_sequence: u64,
    ) -> EngineResult<Self> {
        validate_invariants(&state)?;
        Ok(Self {
            state,
            config,
            last_sequence,
        })
    }

    pub fn state(&self) -> &EconomyState {
        &self.state
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Apply a single operation:
    ///   1. Validate schema version
    ///   2. Validate sequence (strictly increasing, no gaps)
    ///   3. Run the transition on a clone
    ///   4. Validate invariants on the clone
    ///   5. Swap it in
    ///
    /// Any failure leaves the committed state and sequence unchanged.
    pub fn apply(&mut self, envelope: &OperationEnvelope) -> EngineResult<TransitionResult> {
        if envelope.schema_version != SCHEMA_VERSION {
            return Err(EngineError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                got: envelope.schema_version,
            });
        }

        let expected = self.last_sequence + 1;
        if envelope.sequence != expected {
            return Err(EngineError::SequenceViolation {
                expected,
                got: envelope.sequence,
            });
        }

        let outcome = apply_operation(&self.state, &self.config, envelope).and_then(
            |(next, result)| {
                validate_invariants(&next)?;
                Ok((next, result))
            },
        );

        match outcome {
            Ok((next, result)) => {
                tracing::debug!(
                    target: "economy::engine",
                    sequence = envelope.sequence,
                    now = envelope.now,
                    caller = %envelope.caller,
                    operation = envelope.operation.name(),
                    delivered = result.delivered,
                    "operation.applied"
                );
                self.state = next;
                self.last_sequence = envelope.sequence;
                Ok(result)
            }
            Err(err) => {
                tracing::debug!(
                    target: "economy::engine",
                    sequence = envelope.sequence,
                    now = envelope.now,
                    caller = %envelope.caller,
                    operation = envelope.operation.name(),
                    error = %err,
                    "operation.rejected"
                );
                Err(err)
            }
        }
    }

    /// Wrap `operation` in the next envelope and apply it.
    /// The envelope is returned so the caller can persist it.
    pub fn execute(
        &mut self,
        now: i64,
        caller: &str,
        operation: Operation,
    ) -> EngineResult<(OperationEnvelope, TransitionResult)> {
        let envelope = OperationEnvelope::new(self.last_sequence + 1, now, caller, operation);
        let result = self.apply(&envelope)?;
        Ok((envelope, result))
    }

    /// Apply an ordered sequence of envelopes. Stops at the first rejection.
    pub fn apply_sequence(&mut self, envelopes: &[OperationEnvelope]) -> EngineResult<&EconomyState> {
        for envelope in envelopes {
            self.apply(envelope)?;
        }
        Ok(&self.state)
    }

    /// Operation-sourced reconstruction: reset and replay.
    pub fn replay(&mut self, envelopes: &[OperationEnvelope]) -> EngineResult<&EconomyState> {
        self.state = create_initial_state();
        self.last_sequence = 0;
        self.apply_sequence(envelopes)
    }
}
