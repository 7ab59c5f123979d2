//! Session manager: isolated sessions with persist-after-apply semantics.
//!
//! Each session gets its own directory with an operation log and snapshots.
//! Concurrency: Mutex for write serialization, no global mutable state.
//!
//! Apply-before-persist order:
//!   1. kernel applies the operation to a copy of the engine
//!   2. operation_log.append(), only if step 1 succeeded
//!   3. the copy replaces the live engine
//!   4. snapshot if interval reached (best effort; a failure is logged)

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use economy_kernel::config::EconomyConfig;
use economy_kernel::domain::{EconomyState, TransitionResult};
use economy_kernel::engine::EconomyEngine;
use economy_kernel::events::{Operation, OperationEnvelope};
use economy_kernel::hashing::canonical_hash;

use crate::error::{RuntimeError, RuntimeResult};
use crate::operation_log::OperationLog;
use crate::proto_bridge::kernel_to_proto;
use crate::replay::{self, decode_all};
use crate::snapshot;

/// An isolated simulation session with its own operation log and state.
pub struct Session {
    session_id: String,
    session_dir: PathBuf,
    engine: EconomyEngine,
    log: OperationLog,
    snapshot_interval: u64,
}

impl Session {
    /// Open (or create) a session in `base_dir`.
    ///
    /// Directory structure:
    ///   <base_dir>/<session_id>/operations.log
    ///   <base_dir>/<session_id>/snapshots/
    ///
    /// Resumes from the latest valid snapshot and replays the log tail.
    /// A snapshot that fails verification is skipped in favour of full replay.
    pub fn open(
        base_dir: &Path,
        session_id: &str,
        config: EconomyConfig,
        snapshot_interval: u64,
    ) -> RuntimeResult<Self> {
        let session_dir = base_dir.join(session_id);
        let log = OperationLog::open(&session_dir.join("operations.log"))?;
        let envelopes = decode_all(&log.load_all()?)?;

        let mut engine = Self::resume_point(&session_dir, &config, log.last_sequence())?
            .unwrap_or_else(|| EconomyEngine::new(config));
        let start = engine.last_sequence();
        for envelope in envelopes.iter().filter(|e| e.sequence > start) {
            engine.apply(envelope)?;
        }

        tracing::info!(
            target: "economy::session",
            session = session_id,
            resumed_from = start,
            sequence = engine.last_sequence(),
            "session.opened"
        );

        Ok(Self {
            session_id: session_id.to_string(),
            session_dir,
            engine,
            log,
            snapshot_interval,
        })
    }

    fn resume_point(
        session_dir: &Path,
        config: &EconomyConfig,
        log_sequence: u64,
    ) -> RuntimeResult<Option<EconomyEngine>> {
        let Some(snap) = snapshot::load_latest_snapshot(&session_dir.join("snapshots"))? else {
            return Ok(None);
        };
        if snap.sequence > log_sequence {
            tracing::warn!(
                target: "economy::session",
                snapshot = snap.sequence,
                log = log_sequence,
                "snapshot.ahead_of_log"
            );
            return Ok(None);
        }
        match snapshot::restore_from(&snap) {
            Ok(state) => Ok(Some(EconomyEngine::with_state(config.clone(), state, snap.sequence)?)),
            Err(err) => {
                tracing::warn!(
                    target: "economy::session",
                    snapshot = snap.sequence,
                    error = %err,
                    "snapshot.rejected"
                );
                Ok(None)
            }
        }
    }

    /// Apply a single operation: validate via kernel, then persist.
    pub fn apply(&mut self, envelope: &OperationEnvelope) -> RuntimeResult<TransitionResult> {
        let mut next = self.engine.clone();
        let result = match next.apply(envelope) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(
                    target: "economy::session",
                    session = %self.session_id,
                    sequence = envelope.sequence,
                    operation = envelope.operation.name(),
                    caller = %envelope.caller,
                    error = %err,
                    "operation.rejected"
                );
                return Err(err.into());
            }
        };

        self.log.append(&kernel_to_proto(envelope))?;
        self.engine = next;

        // Committed once logged; snapshot failures are not surfaced.
        if self.snapshot_interval > 0 && envelope.sequence % self.snapshot_interval == 0 {
            if let Err(err) = snapshot::save_snapshot(
                &self.session_dir.join("snapshots"),
                envelope.sequence,
                self.engine.state(),
            ) {
                tracing::warn!(
                    target: "economy::session",
                    session = %self.session_id,
                    sequence = envelope.sequence,
                    error = %err,
                    "snapshot.failed"
                );
            }
        }

        Ok(result)
    }

    /// Wrap `operation` in the next envelope, apply and persist it.
    pub fn execute(
        &mut self,
        now: i64,
        caller: &str,
        operation: Operation,
    ) -> RuntimeResult<(OperationEnvelope, TransitionResult)> {
        let envelope =
            OperationEnvelope::new(self.engine.last_sequence() + 1, now, caller, operation);
        let result = self.apply(&envelope)?;
        Ok((envelope, result))
    }

    /// Full replay from the operation log. Resets the engine to the result.
    pub fn replay_full(&mut self) -> RuntimeResult<(EconomyState, String)> {
        let envelopes = decode_all(&self.log.load_all()?)?;
        let config = self.engine.config().clone();
        let (state, hash) = replay::rebuild_state(&config, &envelopes)?;
        self.engine = EconomyEngine::with_state(config, state.clone(), self.log.last_sequence())?;
        Ok((state, hash))
    }

    pub fn state(&self) -> &EconomyState {
        self.engine.state()
    }

    pub fn current_hash(&self) -> RuntimeResult<String> {
        Ok(canonical_hash(self.engine.state())?)
    }

    pub fn current_sequence(&self) -> u64 {
        self.engine.last_sequence()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Thread-safe session handle using Mutex.
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Execute an operation under lock; the lock assigns the sequence.
    pub fn execute(
        &self,
        now: i64,
        caller: &str,
        operation: Operation,
    ) -> RuntimeResult<(OperationEnvelope, TransitionResult)> {
        let mut session = self.inner.lock().map_err(|_| RuntimeError::SessionPoisoned)?;
        session.execute(now, caller, operation)
    }

    pub fn current_hash(&self) -> RuntimeResult<String> {
        let session = self.inner.lock().map_err(|_| RuntimeError::SessionPoisoned)?;
        session.current_hash()
    }

    pub fn current_sequence(&self) -> RuntimeResult<u64> {
        let session = self.inner.lock().map_err(|_| RuntimeError::SessionPoisoned)?;
        Ok(session.current_sequence())
    }

    /// Run `f` against a consistent view of the state.
    pub fn with_state<T>(&self, f: impl FnOnce(&EconomyState) -> T) -> RuntimeResult<T> {
        let session = self.inner.lock().map_err(|_| RuntimeError::SessionPoisoned)?;
        Ok(f(session.state()))
    }
}
