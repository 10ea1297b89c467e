//! File-backed equipment registry.
//!
//! Every registration is appended to a journal and synced before it becomes
//! visible, so a restart replays exactly the registrations that callers saw
//! succeed. Suitable for single-node deployments where durability is needed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use equipreg_core::constants::{JOURNAL_MAGIC, JOURNAL_VERSION};
use equipreg_core::error::{EquipmentError, Result};
use equipreg_core::traits::{EquipmentRegistry, EventSink};
use equipreg_core::types::{EquipmentDetails, EquipmentId, Principal, RegistrationEvent};

use crate::MemoryRegistry;

/// File-backed equipment registry.
///
/// Lookups are served from an in-memory index; registrations are serialized
/// by a single writer lock that covers the uniqueness check, the journal
/// append and the in-memory commit.
///
/// # File Format
///
/// ```text
/// EQUIPREG-JOURNAL v1\n
/// {"sequence":1,"id":...}\n     one RegistrationEvent per line, commit order
/// ```
///
/// A torn final line left by a crash mid-append is dropped on open.
pub struct FileRegistry {
    /// Path to the journal file
    path: PathBuf,
    /// In-memory index
    memory: MemoryRegistry,
    /// Append handle, opened on first registration
    journal: Mutex<Journal>,
}

impl FileRegistry {
    /// Opens the registry at the given path without an event sink.
    ///
    /// If the file exists it is replayed. Otherwise the registry starts empty
    /// and the file is created on the first registration.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_inner(path.as_ref(), MemoryRegistry::new()).await
    }

    /// Opens the registry, publishing new registrations to `sink`.
    ///
    /// Replayed registrations are not published again.
    pub async fn open_with_sink(path: impl AsRef<Path>, sink: Arc<dyn EventSink>) -> Result<Self> {
        Self::open_inner(path.as_ref(), MemoryRegistry::with_sink(sink)).await
    }

    async fn open_inner(path: &Path, memory: MemoryRegistry) -> Result<Self> {
        let path = path.to_path_buf();

        if let Some(contents) = read_existing(&path).await? {
            let parsed = parse_journal(&contents)?;
            info!(count = parsed.events.len(), path = ?path, "Replaying registration journal");

            for event in parsed.events {
                memory.restore(event)?;
            }

            if parsed.valid_len < contents.len() as u64 {
                warn!(
                    path = ?path,
                    dropped = contents.len() as u64 - parsed.valid_len,
                    "Dropping torn journal tail"
                );
                truncate(&path, parsed.valid_len).await?;
            }
        }

        Ok(Self {
            path,
            memory,
            journal: Mutex::new(Journal::default()),
        })
    }

    /// Returns the journal path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of registered ids.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Returns the sequence number of the last committed registration.
    pub fn committed(&self) -> u64 {
        self.memory.committed()
    }
}

impl std::fmt::Debug for FileRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRegistry")
            .field("path", &self.path)
            .field("memory", &self.memory)
            .finish()
    }
}

#[async_trait]
impl EquipmentRegistry for FileRegistry {
    #[instrument(skip(self, name, document_ref, registrant), fields(registrant = %registrant))]
    async fn register(
        &self,
        id: EquipmentId,
        name: String,
        document_ref: String,
        registrant: Principal,
    ) -> Result<()> {
        let mut journal = self.journal.lock().await;

        if self.memory.contains(id) {
            return Err(EquipmentError::AlreadyRegistered(id));
        }

        let event = RegistrationEvent::new(
            self.memory.next_sequence(),
            id,
            name,
            registrant,
            document_ref,
        );
        journal.append(&self.path, &event).await?;

        let sequence = event.sequence;
        self.memory.commit(event)?;
        debug!(id, sequence, "Equipment registered and journaled");

        Ok(())
    }

    async fn get_details(&self, id: EquipmentId) -> Result<EquipmentDetails> {
        self.memory.get_details(id).await
    }
}

/// Reads every registration event from a journal, in commit order.
///
/// This is the consumer-side view of the registration history: a missing
/// file is an empty history and a torn final line is skipped.
pub async fn read_journal(path: impl AsRef<Path>) -> Result<Vec<RegistrationEvent>> {
    match read_existing(path.as_ref()).await? {
        Some(contents) => Ok(parse_journal(&contents)?.events),
        None => Ok(Vec::new()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JOURNAL
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct Journal {
    file: Option<fs::File>,
    /// Length of the last fully synced state
    len: u64,
}

impl Journal {
    async fn append(&mut self, path: &Path, event: &RegistrationEvent) -> Result<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        if self.file.is_none() {
            self.open(path).await?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| EquipmentError::InternalError("journal not open".into()))?;

        let written = write_synced(file, line.as_bytes()).await;
        if let Err(e) = written {
            self.rollback(path).await;
            return Err(e.into());
        }

        self.len += line.len() as u64;
        Ok(())
    }

    async fn open(&mut self, path: &Path) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        let header = header_line();
        let mut len = file.metadata().await?.len();
        if len < header.len() as u64 {
            // Empty, or a header write that never finished
            if len > 0 {
                warn!(path = ?path, len, "Rewriting incomplete journal header");
                file.set_len(0).await?;
            }
            if let Err(e) = write_synced(&mut file, header.as_bytes()).await {
                if let Err(undo) = file.set_len(0).await {
                    error!(path = ?path, error = %undo, "Failed to roll back journal header");
                }
                return Err(e.into());
            }
            len = header.len() as u64;
            info!(path = ?path, "Created registration journal");
        }

        self.file = Some(file);
        self.len = len;
        Ok(())
    }

    /// Cuts a partial append so the next one starts on a clean line.
    async fn rollback(&mut self, path: &Path) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.set_len(self.len).await {
                error!(path = ?path, error = %e, "Failed to roll back journal append");
            }
        }
    }
}

async fn write_synced(file: &mut fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_data().await
}

fn header_line() -> String {
    format!("{} v{}\n", JOURNAL_MAGIC, JOURNAL_VERSION)
}

async fn read_existing(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(EquipmentError::IoError(std::io::Error::new(
            e.kind(),
            format!("Failed to read registry journal: {}", e),
        ))),
    }
}

async fn truncate(path: &Path, len: u64) -> Result<()> {
    let file = fs::OpenOptions::new().write(true).open(path).await?;
    file.set_len(len).await?;
    file.sync_data().await?;
    Ok(())
}

struct ParsedJournal {
    events: Vec<RegistrationEvent>,
    /// Byte length of the header plus every complete event line
    valid_len: u64,
}

fn parse_journal(contents: &[u8]) -> Result<ParsedJournal> {
    let Some((header, body)) = split_line(contents) else {
        // Created but the header never fully made it to disk
        if header_line().as_bytes().starts_with(contents) {
            return Ok(ParsedJournal {
                events: Vec::new(),
                valid_len: 0,
            });
        }
        return Err(EquipmentError::StorageError("Invalid journal header".into()));
    };
    let header = std::str::from_utf8(header)
        .map_err(|_| EquipmentError::StorageError("Invalid journal header".into()))?;
    check_header(header)?;

    let mut events: Vec<RegistrationEvent> = Vec::new();
    let mut valid_len = header.len() as u64 + 1;
    let mut rest = body;

    // An unterminated final line is an append that never finished, whatever
    // its bytes; it may even end inside a multi-byte character
    while let Some((line, next)) = split_line(rest) {
        let event = serde_json::from_slice::<RegistrationEvent>(line).map_err(|e| {
            EquipmentError::StorageError(format!(
                "corrupt journal entry after sequence {}: {}",
                events.last().map_or(0, |ev| ev.sequence),
                e
            ))
        })?;
        events.push(event);
        valid_len += line.len() as u64 + 1;
        rest = next;
    }

    Ok(ParsedJournal { events, valid_len })
}

fn split_line(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = bytes.iter().position(|&b| b == b'\n')?;
    Some((&bytes[..pos], &bytes[pos + 1..]))
}

fn check_header(header: &str) -> Result<()> {
    let (magic, version) = header
        .split_once(' ')
        .ok_or_else(|| EquipmentError::StorageError("Invalid journal header".into()))?;

    if magic != JOURNAL_MAGIC {
        return Err(EquipmentError::StorageError("Invalid journal magic".into()));
    }

    let actual: u8 = version
        .strip_prefix('v')
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| EquipmentError::StorageError(format!("Invalid journal version '{}'", version)))?;

    if actual != JOURNAL_VERSION {
        return Err(EquipmentError::VersionMismatch {
            expected: JOURNAL_VERSION,
            actual,
        });
    }

    Ok(())
}
