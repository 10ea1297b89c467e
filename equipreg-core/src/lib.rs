//! # EQUIPREG Core
//!
//! Core types, errors, and traits for the EQUIPREG equipment registry.
//!
//! This crate provides the foundational building blocks used by all other EQUIPREG crates:
//!
//! - **Types**: Equipment records, lookup snapshots, principals, and registration events
//! - **Errors**: The two domain errors plus infrastructure failures
//! - **Constants**: Journal format and server defaults
//! - **Traits**: The registry contract and the event sink seam
//!
//! ## Example
//!
//! ```rust
//! use equipreg_core::{Principal, RegistrationEvent};
//!
//! let registrant = Principal::new("0xA11CE").unwrap();
//! let event = RegistrationEvent::new(1, 7, "Drill", registrant, "QmAbc123");
//! let json = serde_json::to_string(&event).unwrap();
//! assert!(json.contains("\"document_ref\":\"QmAbc123\""));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{EquipmentError, Result};
pub use traits::*;
pub use types::*;
