// src/pipeline/checkpoint.rs

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

use crate::aggregate::ConfidenceReport;
use crate::error::CheckpointError;

/// Durable per-structure progress.
///
/// `upsert` is keyed by structure id, idempotent and atomic: a reader
/// sees either the old report or the new one, never a torn write.
pub trait CheckpointStore: Send + Sync {
    fn contains(&self, structure_id: &str) -> Result<bool, CheckpointError>;

    fn load(&self, structure_id: &str) -> Result<Option<ConfidenceReport>, CheckpointError>;

    fn upsert(&self, report: &ConfidenceReport) -> Result<(), CheckpointError>;
}

/// One pretty-printed JSON file per structure
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Opens (creating if needed) a checkpoint directory
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| CheckpointError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, structure_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", encode_id(structure_id)))
    }

    /// Makes the rename of a fresh checkpoint survive a crash
    #[cfg(unix)]
    fn sync_root(&self) -> std::io::Result<()> {
        File::open(&self.root)?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_root(&self) -> std::io::Result<()> {
        Ok(())
    }
}

impl CheckpointStore for DirectoryStore {
    fn contains(&self, structure_id: &str) -> Result<bool, CheckpointError> {
        Ok(self.load(structure_id)?.is_some())
    }

    fn load(&self, structure_id: &str) -> Result<Option<ConfidenceReport>, CheckpointError> {
        let path = self.path_for(structure_id);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CheckpointError::Io { path, source }),
        };
        let report: ConfidenceReport = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| CheckpointError::Corrupt {
                path: path.clone(),
                source,
            })?;

        // Hashed names or a case-insensitive filesystem can map two ids to one file
        if report.structure_id() != structure_id {
            log::warn!(
                "{:?} holds '{}', not '{}'; recomputing",
                path,
                report.structure_id(),
                structure_id
            );
            return Ok(None);
        }
        Ok(Some(report))
    }

    fn upsert(&self, report: &ConfidenceReport) -> Result<(), CheckpointError> {
        let path = self.path_for(report.structure_id());
        let io_err = |source| CheckpointError::Io {
            path: path.clone(),
            source,
        };

        // Same directory so the final rename never crosses filesystems
        let tmp = NamedTempFile::new_in(&self.root).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, report).map_err(|source| {
                CheckpointError::Serialize {
                    id: report.structure_id().to_string(),
                    source,
                }
            })?;
            writer.flush().map_err(io_err)?;
        }
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        self.sync_root().map_err(io_err)?;
        log::debug!("checkpointed {} -> {:?}", report.structure_id(), path);
        Ok(())
    }
}

/// In-process store for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    reports: Mutex<HashMap<String, ConfidenceReport>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CheckpointStore for MemoryStore {
    fn contains(&self, structure_id: &str) -> Result<bool, CheckpointError> {
        let reports = self.reports.lock().map_err(|_| CheckpointError::Poisoned)?;
        Ok(reports.contains_key(structure_id))
    }

    fn load(&self, structure_id: &str) -> Result<Option<ConfidenceReport>, CheckpointError> {
        let reports = self.reports.lock().map_err(|_| CheckpointError::Poisoned)?;
        Ok(reports.get(structure_id).cloned())
    }

    fn upsert(&self, report: &ConfidenceReport) -> Result<(), CheckpointError> {
        let mut reports = self.reports.lock().map_err(|_| CheckpointError::Poisoned)?;
        reports.insert(report.structure_id().to_string(), report.clone());
        Ok(())
    }
}

/// Longest encoded id used verbatim as a file stem; file names cap at 255 bytes
const MAX_STEM_LEN: usize = 200;

/// Kept from an over-long encoded id before the hash suffix
const HASHED_PREFIX_LEN: usize = 160;

/// Structure ids become file names: keep [A-Za-z0-9_.-], percent-encode
/// the rest. Over-long results keep a prefix plus `~` and a hash of the
/// raw id; `~` itself is always encoded, so the two forms never meet.
fn encode_id(id: &str) -> String {
    let mut pieces: Vec<String> = Vec::with_capacity(id.len());
    for byte in id.bytes() {
        let piece = match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' => (byte as char).to_string(),
            // a leading dot would hide the file
            b'.' if !pieces.is_empty() => ".".to_string(),
            _ => format!("%{:02X}", byte),
        };
        pieces.push(piece);
    }

    let encoded_len: usize = pieces.iter().map(String::len).sum();
    if encoded_len <= MAX_STEM_LEN {
        return pieces.concat();
    }

    // Whole escapes only, so the prefix stays decodable
    let mut out = String::with_capacity(HASHED_PREFIX_LEN + 17);
    for piece in &pieces {
        if out.len() + piece.len() > HASHED_PREFIX_LEN {
            break;
        }
        out.push_str(piece);
    }
    out.push_str(&format!("~{:016x}", fnv1a(id.as_bytes())));
    out
}

/// 64-bit FNV-1a; stable across builds, unlike `DefaultHasher`
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}
