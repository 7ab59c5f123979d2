//! Snapshot layer: deterministic state snapshots on disk.
//!
//! A snapshot holds the canonical JSON + hash for verification, and the
//! strict serde encoding used to restore the state. No timestamps in
//! snapshot content.
//!
//! If a snapshot fails verification, callers fall back to full replay.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use economy_kernel::domain::EconomyState;
use economy_kernel::hashing::{canonical_hash, canonical_serialize, hex_digest};
use economy_kernel::KERNEL_VERSION;

use crate::error::{RuntimeError, RuntimeResult};
use crate::snapshot_codec::{encode_snapshot, restore_snapshot, SnapshotError};

/// Snapshot on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// Sequence number of the last operation folded into this snapshot.
    pub sequence: u64,
    /// Canonical JSON of the state (UTF-8).
    pub canonical_json: String,
    /// SHA-256 of the canonical JSON.
    pub hash: String,
    /// Strict serde encoding used for restore.
    pub state_json: String,
    pub kernel_version: u32,
}

fn snapshot_path(dir: &Path, sequence: u64) -> PathBuf {
    dir.join(format!("snapshot_{:06}.json", sequence))
}

/// Save a deterministic snapshot of `state` taken after `sequence`.
pub fn save_snapshot(dir: &Path, sequence: u64, state: &EconomyState) -> RuntimeResult<PathBuf> {
    fs::create_dir_all(dir)?;

    let canonical_json = String::from_utf8(canonical_serialize(state)?)
        .map_err(|e| RuntimeError::CorruptLog(format!("canonical JSON is not UTF-8: {}", e)))?;
    let snap = Snapshot {
        sequence,
        hash: canonical_hash(state)?,
        canonical_json,
        state_json: encode_snapshot(state)?,
        kernel_version: KERNEL_VERSION,
    };

    let path = snapshot_path(dir, sequence);
    let content = serde_json::to_string(&snap)?;
    let mut file = File::create(&path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    tracing::info!(
        target: "economy::snapshot",
        path = %path.display(),
        sequence,
        hash = %snap.hash,
        "snapshot.saved"
    );
    Ok(path)
}

/// Load the snapshot taken at `sequence`, if one exists.
pub fn load_snapshot(dir: &Path, sequence: u64) -> RuntimeResult<Option<Snapshot>> {
    let path = snapshot_path(dir, sequence);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let snap: Snapshot = serde_json::from_str(&content)?;
    Ok(Some(snap))
}

/// Load the latest snapshot in `dir`.
/// Scans for snapshot_NNNNNN.json files and picks the highest sequence.
pub fn load_latest_snapshot(dir: &Path) -> RuntimeResult<Option<Snapshot>> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut best_seq: Option<u64> = None;
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let seq = name
            .to_string_lossy()
            .strip_prefix("snapshot_")
            .and_then(|s| s.strip_suffix(".json"))
            .and_then(|s| s.parse::<u64>().ok());
        if let Some(seq) = seq {
            best_seq = Some(best_seq.map_or(seq, |best| best.max(seq)));
        }
    }

    match best_seq {
        Some(seq) => load_snapshot(dir, seq),
        None => Ok(None),
    }
}

/// Verify a snapshot's internal hash consistency.
pub fn verify_snapshot_hash(snap: &Snapshot) -> bool {
    hex_digest(snap.canonical_json.as_bytes()) == snap.hash
}

/// Restore the state held by a snapshot.
///
/// Checks the stored hash, decodes strictly, validates invariants and
/// confirms the restored state hashes back to the stored value.
pub fn restore_from(snap: &Snapshot) -> Result<EconomyState, SnapshotError> {
    if snap.kernel_version != KERNEL_VERSION {
        return Err(SnapshotError::InvariantViolation(format!(
            "snapshot kernel_version {} does not match {}",
            snap.kernel_version, KERNEL_VERSION
        )));
    }
    let computed = hex_digest(snap.canonical_json.as_bytes());
    if computed != snap.hash {
        return Err(SnapshotError::HashMismatch {
            stored: snap.hash.clone(),
            computed,
        });
    }
    let state = restore_snapshot(&snap.state_json)?;
    let rehashed = canonical_hash(&state).map_err(SnapshotError::Serialization)?;
    if rehashed != snap.hash {
        return Err(SnapshotError::HashMismatch {
            stored: snap.hash.clone(),
            computed: rehashed,
        });
    }
    Ok(state)
}
