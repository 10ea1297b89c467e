//! Equipment records and lookup snapshots.
//!
//! A record is created exactly once, by a successful registration, and is
//! never changed afterwards. Its fields are private so that nothing outside
//! this module can build a half-populated record or edit a stored one.

use serde::{Deserialize, Serialize};

use super::{Principal, RegistrationEvent};

/// Caller-chosen numeric equipment identifier.
pub type EquipmentId = u64;

/// A registered equipment record.
///
/// # Slot states
///
/// ```text
/// Absent --register(ok)--> Registered
/// ```
///
/// An absent slot has no `EquipmentRecord` at all; every value of this type
/// is in the terminal `Registered` state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EquipmentRecord {
    id: EquipmentId,
    name: String,
    registrant: Principal,
    document_ref: String,
    registered: bool,
}

impl EquipmentRecord {
    /// Creates a registered record.
    ///
    /// `name` and `document_ref` are stored verbatim; empty strings are allowed.
    pub fn new(
        id: EquipmentId,
        name: impl Into<String>,
        registrant: Principal,
        document_ref: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            registrant,
            document_ref: document_ref.into(),
            registered: true,
        }
    }

    /// The equipment identifier.
    pub fn id(&self) -> EquipmentId {
        self.id
    }

    /// Human-readable label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity that performed the registration.
    pub fn registrant(&self) -> &Principal {
        &self.registrant
    }

    /// Opaque reference to the external equipment document.
    pub fn document_ref(&self) -> &str {
        &self.document_ref
    }

    /// Existence flag, always true for a stored record.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Returns the lookup snapshot for this record.
    pub fn details(&self) -> EquipmentDetails {
        EquipmentDetails {
            name: self.name.clone(),
            registrant: self.registrant.clone(),
            document_ref: self.document_ref.clone(),
            registered: self.registered,
        }
    }
}

impl From<&RegistrationEvent> for EquipmentRecord {
    fn from(event: &RegistrationEvent) -> Self {
        Self::new(
            event.id,
            event.name.clone(),
            event.registrant.clone(),
            event.document_ref.clone(),
        )
    }
}

/// Snapshot returned by a successful lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentDetails {
    /// Human-readable label
    pub name: String,
    /// Identity that performed the registration
    pub registrant: Principal,
    /// Opaque document reference (e.g. an IPFS CID)
    pub document_ref: String,
    /// Existence flag
    pub registered: bool,
}
