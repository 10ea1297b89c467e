//! # EQUIPREG Registry
//!
//! Equipment registration and lookup for the EQUIPREG registry.
//!
//! This crate provides multiple storage backends:
//!
//! - **Memory**: Concurrent in-memory storage for development, testing and embedding
//! - **File**: Append-only journal on disk for single-node deployments
//!
//! Both publish a [`RegistrationEvent`](equipreg_core::RegistrationEvent) per
//! successful registration to an optional [`EventSink`](equipreg_core::EventSink),
//! typically an [`EventBus`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use equipreg_registry::{EventBus, MemoryRegistry, Registry};
//!
//! let events = EventBus::new();
//! let registry = MemoryRegistry::with_sink(Arc::new(events.clone()));
//! let mut rx = events.subscribe();
//!
//! registry.register(1, "Drill".into(), "QmAbc123".into(), caller).await?;
//! let details = registry.get_details(1).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod events;
mod file;
mod memory;

pub use events::EventBus;
pub use file::{read_journal, FileRegistry};
pub use memory::MemoryRegistry;

// Re-export the trait from core
pub use equipreg_core::traits::EquipmentRegistry as Registry;
