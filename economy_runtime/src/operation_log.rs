//! Append-only operation log: binary protobuf frames.
//!
//! Storage format: length-prefixed protobuf frames.
//!   [4-byte LE length][protobuf bytes][4-byte LE length][protobuf bytes]...
//!
//! Rules:
//!   - Strict append only: frames are never rewritten or reordered
//!   - fsync after every write
//!   - Sequence strictly increasing (validated on append and on load)
//!   - Only operations the kernel accepted are appended

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use prost::Message;

use crate::error::{RuntimeError, RuntimeResult};
use crate::proto_types::ProtoOperationEnvelope;

const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Append-only operation log backed by a binary file.
#[derive(Debug)]
pub struct OperationLog {
    path: PathBuf,
    last_sequence: u64,
}

impl OperationLog {
    /// Open or create a log at `path`.
    /// Reads existing frames to determine the last sequence number.
    pub fn open(path: &Path) -> RuntimeResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let last_sequence = if path.exists() {
            let ops = Self::read_all_from_file(path)?;
            ops.last().map(|op| op.sequence).unwrap_or(0)
        } else {
            0
        };

        tracing::debug!(
            target: "economy::log",
            path = %path.display(),
            last_sequence,
            "operation_log.opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            last_sequence,
        })
    }

    /// Append one operation. Writes a length-prefixed frame and fsyncs.
    pub fn append(&mut self, op: &ProtoOperationEnvelope) -> RuntimeResult<()> {
        let expected = self.last_sequence + 1;
        if op.sequence != expected {
            return Err(RuntimeError::SequenceViolation {
                expected,
                got: op.sequence,
            });
        }

        let buf = op.encode_to_vec();
        let len = u32::try_from(buf.len())
            .ok()
            .filter(|&len| len as usize <= MAX_FRAME_LEN)
            .ok_or_else(|| RuntimeError::CorruptLog(format!("frame too large: {} bytes", buf.len())))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        {
            let mut writer = BufWriter::new(&mut file);
            writer.write_all(&len.to_le_bytes())?;
            writer.write_all(&buf)?;
            writer.flush()?;
        }
        file.sync_all()?;

        self.last_sequence = op.sequence;
        Ok(())
    }

    /// Load every operation in sequence order.
    pub fn load_all(&self) -> RuntimeResult<Vec<ProtoOperationEnvelope>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Self::read_all_from_file(&self.path)
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all frames, validating frame integrity and sequence continuity.
    fn read_all_from_file(path: &Path) -> RuntimeResult<Vec<ProtoOperationEnvelope>> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut ops: Vec<ProtoOperationEnvelope> = Vec::new();
        let mut len_buf = [0u8; 4];

        loop {
            match reader.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len == 0 || len > MAX_FRAME_LEN {
                return Err(RuntimeError::CorruptLog(format!("invalid frame length: {}", len)));
            }

            let mut frame = vec![0u8; len];
            reader
                .read_exact(&mut frame)
                .map_err(|e| RuntimeError::CorruptLog(format!("truncated frame: {}", e)))?;

            let op = ProtoOperationEnvelope::decode(frame.as_slice())?;
            let expected = ops.last().map(|prev| prev.sequence + 1).unwrap_or(1);
            if op.sequence != expected {
                return Err(RuntimeError::SequenceViolation {
                    expected,
                    got: op.sequence,
                });
            }
            ops.push(op);
        }

        Ok(ops)
    }
}
