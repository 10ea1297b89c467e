//! App state: registry backend, event bus, config.

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderName;

use equipreg_core::constants::{DEFAULT_EVENT_BUFFER, DEFAULT_IDENTITY_HEADER};
use equipreg_core::error::{EquipmentError, Result};
use equipreg_core::traits::{EquipmentRegistry, EventSink};
use equipreg_registry::{EventBus, FileRegistry, MemoryRegistry};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Journal path; `None` keeps the registry in memory
    pub registry_path: Option<PathBuf>,
    /// Header the fronting gateway uses to pass the caller identity
    pub identity_header: String,
    /// Per-subscriber event buffer
    pub event_buffer: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            registry_path: None,
            identity_header: DEFAULT_IDENTITY_HEADER.into(),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl ApiConfig {
    /// Reads configuration from the environment (and `.env` if present).
    ///
    /// - `EQUIPREG_REGISTRY_PATH`: journal file
    /// - `EQUIPREG_IDENTITY_HEADER`: caller identity header name
    /// - `EQUIPREG_EVENT_BUFFER`: event buffer size
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let event_buffer = match std::env::var("EQUIPREG_EVENT_BUFFER") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                EquipmentError::ConfigError(format!("EQUIPREG_EVENT_BUFFER is not a number: {raw}"))
            })?,
            Err(_) => DEFAULT_EVENT_BUFFER,
        };

        Ok(Self {
            registry_path: std::env::var_os("EQUIPREG_REGISTRY_PATH")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            identity_header: std::env::var("EQUIPREG_IDENTITY_HEADER")
                .unwrap_or_else(|_| DEFAULT_IDENTITY_HEADER.into()),
            event_buffer,
        })
    }

    /// Uses the journal at `path` instead of in-memory storage.
    pub fn with_registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_path = Some(path.into());
        self
    }
}

/// Shared state handed to every handler.
pub struct AppState {
    /// Active configuration
    pub config: ApiConfig,
    /// Registry backend
    pub registry: Arc<dyn EquipmentRegistry>,
    /// Registration event fan-out
    pub events: EventBus,
    pub(crate) identity_header: HeaderName,
}

impl AppState {
    /// Builds state for `config`, opening the journal if one is configured.
    pub async fn from_config(config: ApiConfig) -> Result<Self> {
        let identity_header = parse_header(&config.identity_header)?;
        let events = EventBus::with_capacity(config.event_buffer);
        let sink: Arc<dyn EventSink> = Arc::new(events.clone());

        let registry: Arc<dyn EquipmentRegistry> = match &config.registry_path {
            Some(path) => Arc::new(FileRegistry::open_with_sink(path, sink).await?),
            None => Arc::new(MemoryRegistry::with_sink(sink)),
        };

        Ok(Self {
            config,
            registry,
            events,
            identity_header,
        })
    }

    /// Builds in-memory state.
    pub fn in_memory(config: ApiConfig) -> Result<Self> {
        let identity_header = parse_header(&config.identity_header)?;
        let events = EventBus::with_capacity(config.event_buffer);
        let registry = Arc::new(MemoryRegistry::with_sink(Arc::new(events.clone())));

        Ok(Self {
            config: ApiConfig {
                registry_path: None,
                ..config
            },
            registry,
            events,
            identity_header,
        })
    }

    /// Short name of the storage backend, for logs.
    pub fn backend_name(&self) -> &'static str {
        if self.config.registry_path.is_some() {
            "file"
        } else {
            "memory"
        }
    }
}

fn parse_header(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.trim().to_ascii_lowercase().as_bytes()).map_err(|_| {
        EquipmentError::ConfigError(format!("invalid identity header name '{}'", name))
    })
}
