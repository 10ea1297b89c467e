//! Domain types for EQUIPREG.
//!
//! - [`Principal`]: Opaque identity of the party performing a registration
//! - [`EquipmentRecord`]: The stored, write-once entry for one id
//! - [`EquipmentDetails`]: Snapshot returned by a lookup
//! - [`RegistrationEvent`]: Notification published once per successful registration

mod principal;
mod equipment;
mod event;

pub use principal::*;
pub use equipment::*;
pub use event::*;
