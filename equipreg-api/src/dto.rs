//! DTOs for API requests and responses.

use serde::{Deserialize, Serialize};
use equipreg_core::types::{EquipmentDetails, EquipmentId, Principal};

/// Request to register equipment.
///
/// The registrant is not part of the body; it comes from the identity header.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Caller-chosen equipment id
    pub id: EquipmentId,
    /// Human-readable label (may be empty)
    pub name: String,
    /// Document reference such as an IPFS CID (may be empty)
    pub document_ref: String,
}

/// Response for a successful registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Registered id
    pub id: EquipmentId,
    /// Identity recorded as registrant
    pub registrant: Principal,
}

/// Response for an equipment lookup.
#[derive(Debug, Serialize)]
pub struct EquipmentResponse {
    /// Equipment id
    pub id: EquipmentId,
    /// Human-readable label
    pub name: String,
    /// Identity that registered the equipment
    pub registrant: Principal,
    /// Document reference
    pub document_ref: String,
    /// Existence flag
    pub registered: bool,
}

impl EquipmentResponse {
    pub fn new(id: EquipmentId, details: EquipmentDetails) -> Self {
        Self {
            id,
            name: details.name,
            registrant: details.registrant,
            document_ref: details.document_ref,
            registered: details.registered,
        }
    }
}

/// Response for the health check.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" when the server answers
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
}
