//! Constants for EQUIPREG.
//!
//! Journal framing and server defaults shared by the registry, API and CLI crates.

// ═══════════════════════════════════════════════════════════════════════════════
// JOURNAL FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

/// Magic string opening every registration journal.
pub const JOURNAL_MAGIC: &str = "EQUIPREG-JOURNAL";

/// Current journal format version.
pub const JOURNAL_VERSION: u8 = 1;

// ═══════════════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default capacity of the registration event broadcast buffer.
///
/// Subscribers that fall further behind than this skip the missed events.
pub const DEFAULT_EVENT_BUFFER: usize = 1024;

/// Sequence number of the first committed registration.
pub const FIRST_SEQUENCE: u64 = 1;

// ═══════════════════════════════════════════════════════════════════════════════
// SERVER DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default API port.
pub const DEFAULT_PORT: u16 = 3001;

/// Header carrying the authenticated caller identity.
///
/// Set by the fronting gateway or session layer, never by the registry.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-caller-identity";

/// Maximum accepted principal length in bytes.
pub const MAX_PRINCIPAL_LEN: usize = 256;
