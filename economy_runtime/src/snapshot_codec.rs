//! Snapshot Codec: deterministic EconomyState encoder/decoder.
//!
//! Pure codec layer. No side-effects, no timestamps, no envelope.
//!
//! - `encode_snapshot`:  EconomyState → JSON string
//! - `decode_snapshot`:  JSON string → EconomyState (strict, no defaults)
//! - `restore_snapshot`: decode + invariant validation
//! - `export_snapshot_to_file` / `import_snapshot_from_file`: file I/O
//! - `snapshot_hash`:    SHA-256 of the encoded JSON (lowercase hex)

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use economy_kernel::domain::EconomyState;
use economy_kernel::hashing::hex_digest;
use economy_kernel::invariants::validate_invariants;

/// All possible snapshot codec failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// JSON serialization failed.
    #[error("SerializationError: {0}")]
    Serialization(#[source] serde_json::Error),
    /// Malformed JSON, missing fields or unknown fields.
    #[error("DeserializationError: {0}")]
    Deserialization(#[source] serde_json::Error),
    /// Loaded state violates kernel invariants.
    #[error("InvariantViolation: {0}")]
    InvariantViolation(String),
    /// Snapshot file hash does not match its content.
    #[error("HashMismatch: stored {stored}, computed {computed}")]
    HashMismatch { stored: String, computed: String },
    #[error("IoError: {0}")]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Encode an EconomyState to a JSON string.
///
/// BTreeMap keys keep every record map sorted by id, so identical
/// states encode to identical bytes.
pub fn encode_snapshot(state: &EconomyState) -> Result<String, SnapshotError> {
    serde_json::to_string(state).map_err(SnapshotError::Serialization)
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decode a JSON string into an EconomyState.
///
/// Strict: `deny_unknown_fields` on every record type, missing fields
/// fail. No invariant validation; use `restore_snapshot` for that.
pub fn decode_snapshot(json: &str) -> Result<EconomyState, SnapshotError> {
    serde_json::from_str::<EconomyState>(json).map_err(SnapshotError::Deserialization)
}

/// Decode and validate invariants immediately.
///
/// The safe entry point for loading state from untrusted sources.
pub fn restore_snapshot(json: &str) -> Result<EconomyState, SnapshotError> {
    let state = decode_snapshot(json)?;
    validate_invariants(&state).map_err(|e| SnapshotError::InvariantViolation(e.to_string()))?;
    Ok(state)
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

pub fn export_snapshot_to_file(state: &EconomyState, path: &Path) -> Result<(), SnapshotError> {
    let json = encode_snapshot(state)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json.as_bytes())?;
    Ok(())
}

pub fn import_snapshot_from_file(path: &Path) -> Result<EconomyState, SnapshotError> {
    let content = fs::read_to_string(path)?;
    restore_snapshot(&content)
}

// ---------------------------------------------------------------------------
// Hash
// ---------------------------------------------------------------------------

/// SHA-256 of the encoded JSON. Lowercase hex string.
///
/// NOTE: this hashes the serde encoding, NOT the canonical hash from
/// `economy_kernel::hashing` (which binds kernel_version and uses a
/// hand-built field order). It guards snapshot files against tampering.
pub fn snapshot_hash(state: &EconomyState) -> Result<String, SnapshotError> {
    let json = encode_snapshot(state)?;
    Ok(hex_digest(json.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use economy_kernel::catalog::create_resource;
    use economy_kernel::config::EconomyConfig;
    use economy_kernel::domain::Mobility;
    use economy_kernel::geometry::Position;
    use economy_kernel::ledger::create_storage;
    use economy_kernel::registry::create_location;
    use economy_kernel::state::create_initial_state;

    fn make_test_state() -> EconomyState {
        let mut state = create_initial_state();
        let config = EconomyConfig::default();
        let ore = create_resource(&mut state, &config, "ore", &[]).unwrap();
        let pit = create_location(&mut state, &config, "pit", Position::new(2, 3), 4, "rock")
            .unwrap();
        let s = create_storage(&mut state, ore, 10, pit, Mobility::Movable, 2).unwrap();
        state.storages.get_mut(&s).unwrap().amount = 7;
        state
    }

    fn test_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir()
            .join("economy_snapshot_codec_tests")
            .join(name);
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn roundtrip_produces_identical_json() {
        let state = make_test_state();
        let json1 = encode_snapshot(&state).unwrap();
        let decoded = decode_snapshot(&json1).unwrap();
        assert_eq!(decoded, state);
        assert_eq!(json1, encode_snapshot(&decoded).unwrap());
    }

    #[test]
    fn overfull_storage_returns_invariant_violation() {
        let mut state = make_test_state();
        for s in state.storages.values_mut() {
            s.amount = s.capacity + 1;
        }
        let json = encode_snapshot(&state).unwrap();
        match restore_snapshot(&json) {
            Err(SnapshotError::InvariantViolation(msg)) => {
                assert!(msg.contains("storage_bounds"), "got: {}", msg)
            }
            other => panic!("Expected InvariantViolation, got: {:?}", other),
        }
    }

    #[test]
    fn unknown_field_returns_deserialization_error() {
        let json = encode_snapshot(&make_test_state()).unwrap();
        let mut v: serde_json::Value = serde_json::from_str(&json).unwrap();
        v["bonus"] = serde_json::json!(1);
        let result = decode_snapshot(&v.to_string());
        assert!(matches!(result, Err(SnapshotError::Deserialization(_))));
    }

    #[test]
    fn missing_field_returns_deserialization_error() {
        let result = decode_snapshot(r#"{"next_id":1,"resources":{}}"#);
        assert!(matches!(result, Err(SnapshotError::Deserialization(_))));
    }

    #[test]
    fn file_roundtrip_matches() {
        let state = make_test_state();
        let path = test_dir("file_roundtrip").join("state.json");
        export_snapshot_to_file(&state, &path).unwrap();
        assert_eq!(import_snapshot_from_file(&path).unwrap(), state);
    }

    #[test]
    fn corrupted_file_returns_deserialization_error() {
        let dir = test_dir("corrupted");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        fs::write(&path, b"{ not valid json !!!}").unwrap();
        assert!(matches!(
            import_snapshot_from_file(&path),
            Err(SnapshotError::Deserialization(_))
        ));
    }

    #[test]
    fn hash_matches_file_hash() {
        let state = make_test_state();
        let mem_hash = snapshot_hash(&state).unwrap();
        assert_eq!(mem_hash.len(), 64);

        let path = test_dir("hash_parity").join("state.json");
        export_snapshot_to_file(&state, &path).unwrap();
        let file_bytes = fs::read(&path).unwrap();
        assert_eq!(mem_hash, hex_digest(&file_bytes));
    }
}
