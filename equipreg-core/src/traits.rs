//! Common traits for EQUIPREG.
//!
//! These traits define the interfaces that different implementations can satisfy,
//! enabling modularity and testing.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EquipmentDetails, EquipmentId, Principal, RegistrationEvent};

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for equipment registration and lookup.
///
/// Implementations might use:
/// - In-memory storage (for testing/development)
/// - An append-only journal on disk (single node)
/// - A ledger, where the host serializes all state changes
///
/// There is deliberately no update, delete or listing operation.
#[async_trait]
pub trait EquipmentRegistry: Send + Sync {
    /// Registers equipment under `id`.
    ///
    /// `registrant` comes from the calling context (session, header, signer)
    /// and is stored as-is. Fails with
    /// [`EquipmentError::AlreadyRegistered`](crate::EquipmentError::AlreadyRegistered)
    /// without touching state if `id` is taken. At most one of any number of
    /// concurrent calls for the same `id` succeeds.
    async fn register(
        &self,
        id: EquipmentId,
        name: String,
        document_ref: String,
        registrant: Principal,
    ) -> Result<()>;

    /// Returns the stored fields for `id`.
    ///
    /// Fails with [`EquipmentError::NotFound`](crate::EquipmentError::NotFound)
    /// if `id` was never registered.
    async fn get_details(&self, id: EquipmentId) -> Result<EquipmentDetails>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT SINK TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Receiver of registration events.
///
/// Called synchronously inside the registry's commit section, in commit
/// order, so implementations must not block. An `Err` is logged by the
/// registry and never undoes the registration it describes.
pub trait EventSink: Send + Sync {
    /// Accepts one committed registration.
    fn publish(&self, event: &RegistrationEvent) -> Result<()>;
}
