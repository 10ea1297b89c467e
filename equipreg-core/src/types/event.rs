//! Registration events.
//!
//! Published once per successful registration, in commit order. The event
//! stream is the only way for consumers to enumerate what has been
//! registered; the registry itself offers no listing query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EquipmentId, EquipmentRecord, Principal};

/// Notification that an id moved from absent to registered.
///
/// # Journal line (JSON)
/// ```text
/// {"sequence":1,"id":7,"name":"Drill","registrant":"0xA11CE","document_ref":"QmAbc123","registered_at":"..."}
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationEvent {
    /// Commit sequence number, starting at 1 with no gaps
    pub sequence: u64,
    /// Registered equipment id
    pub id: EquipmentId,
    /// Equipment name as registered
    pub name: String,
    /// Identity that performed the registration
    pub registrant: Principal,
    /// Document reference as registered
    pub document_ref: String,
    /// Commit time
    pub registered_at: DateTime<Utc>,
}

impl RegistrationEvent {
    /// Creates an event stamped with the current time.
    pub fn new(
        sequence: u64,
        id: EquipmentId,
        name: impl Into<String>,
        registrant: Principal,
        document_ref: impl Into<String>,
    ) -> Self {
        Self {
            sequence,
            id,
            name: name.into(),
            registrant,
            document_ref: document_ref.into(),
            registered_at: Utc::now(),
        }
    }

    /// Returns true if this event describes exactly the given stored record.
    pub fn matches(&self, record: &EquipmentRecord) -> bool {
        self.id == record.id()
            && self.name == record.name()
            && &self.registrant == record.registrant()
            && self.document_ref == record.document_ref()
    }
}
