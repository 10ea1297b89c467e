//! In-memory equipment registry.
//!
//! Thread-safe storage suitable for development, testing,
//! and single-process deployments.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

use equipreg_core::error::{EquipmentError, Result};
use equipreg_core::traits::{EquipmentRegistry, EventSink};
use equipreg_core::types::{EquipmentDetails, EquipmentId, EquipmentRecord, Principal, RegistrationEvent};

/// In-memory equipment registry.
///
/// # Atomicity
///
/// A registration holds the map shard for its id from the "is it taken?"
/// check until the fully built record is inserted, so concurrent calls for
/// the same id serialize and exactly one wins. Ids in other shards proceed
/// in parallel. Readers never see a partially written record.
///
/// # Events
///
/// Inside that same critical section a short commit lock assigns the next
/// sequence number and publishes the event, so sinks observe events in
/// commit order with gapless sequences. Lock order is always shard, then
/// commit lock.
pub struct MemoryRegistry {
    /// Primary storage: id → record
    records: DashMap<EquipmentId, EquipmentRecord>,
    /// Sequence of the last committed registration (0 when empty)
    last_sequence: Mutex<u64>,
    /// Optional event observer
    sink: Option<Arc<dyn EventSink>>,
}

impl MemoryRegistry {
    /// Creates a new empty registry with no event sink.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            last_sequence: Mutex::new(0),
            sink: None,
        }
    }

    /// Creates a registry with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
            last_sequence: Mutex::new(0),
            sink: None,
        }
    }

    /// Creates an empty registry publishing events to `sink`.
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::new()
        }
    }

    /// Returns the number of registered ids.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the sequence number of the last committed registration.
    pub fn committed(&self) -> u64 {
        *self.last_sequence.lock()
    }

    /// Returns true if `id` is registered.
    pub fn contains(&self, id: EquipmentId) -> bool {
        self.records.contains_key(&id)
    }

    /// Re-inserts a previously committed registration without publishing it.
    ///
    /// Used when rebuilding state from a journal. Events must arrive in
    /// strictly increasing sequence order and each id at most once; anything
    /// else means the source is corrupted.
    pub fn restore(&self, event: RegistrationEvent) -> Result<()> {
        match self.records.entry(event.id) {
            Entry::Occupied(_) => Err(EquipmentError::StorageError(format!(
                "id {} registered twice (second at sequence {})",
                event.id, event.sequence
            ))),
            Entry::Vacant(slot) => {
                let mut last = self.last_sequence.lock();
                if event.sequence <= *last {
                    return Err(EquipmentError::StorageError(format!(
                        "sequence {} after {} is out of order",
                        event.sequence, *last
                    )));
                }
                slot.insert(EquipmentRecord::from(&event));
                *last = event.sequence;
                Ok(())
            }
        }
    }

    /// Sequence number the next registration will receive.
    ///
    /// Only stable while the caller excludes other writers.
    pub(crate) fn next_sequence(&self) -> u64 {
        *self.last_sequence.lock() + 1
    }

    /// Commits an event built by an exclusive writer and publishes it.
    pub(crate) fn commit(&self, event: RegistrationEvent) -> Result<()> {
        match self.records.entry(event.id) {
            Entry::Occupied(_) => Err(EquipmentError::AlreadyRegistered(event.id)),
            Entry::Vacant(slot) => {
                let mut last = self.last_sequence.lock();
                if event.sequence != *last + 1 {
                    return Err(EquipmentError::InternalError(format!(
                        "commit of sequence {} after {}",
                        event.sequence, *last
                    )));
                }
                slot.insert(EquipmentRecord::from(&event));
                *last = event.sequence;
                self.emit(&event);
                Ok(())
            }
        }
    }

    fn register_now(
        &self,
        id: EquipmentId,
        name: String,
        document_ref: String,
        registrant: Principal,
    ) -> Result<RegistrationEvent> {
        match self.records.entry(id) {
            Entry::Occupied(_) => Err(EquipmentError::AlreadyRegistered(id)),
            Entry::Vacant(slot) => {
                let mut last = self.last_sequence.lock();
                let event = RegistrationEvent::new(*last + 1, id, name, registrant, document_ref);
                slot.insert(EquipmentRecord::from(&event));
                *last = event.sequence;
                self.emit(&event);
                Ok(event)
            }
        }
    }

    fn emit(&self, event: &RegistrationEvent) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.publish(event) {
            warn!(
                id = event.id,
                sequence = event.sequence,
                error = %e,
                "Registration event not delivered"
            );
        }
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRegistry")
            .field("len", &self.records.len())
            .field("committed", &self.committed())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

#[async_trait]
impl EquipmentRegistry for MemoryRegistry {
    /// Registers equipment, rejecting ids that are already taken.
    #[instrument(skip(self, name, document_ref, registrant), fields(registrant = %registrant))]
    async fn register(
        &self,
        id: EquipmentId,
        name: String,
        document_ref: String,
        registrant: Principal,
    ) -> Result<()> {
        let event = self.register_now(id, name, document_ref, registrant)?;
        debug!(id, sequence = event.sequence, "Equipment registered");
        Ok(())
    }

    /// Returns a snapshot of the stored record.
    #[instrument(skip(self))]
    async fn get_details(&self, id: EquipmentId) -> Result<EquipmentDetails> {
        self.records
            .get(&id)
            .map(|record| record.details())
            .ok_or(EquipmentError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventBus;
    use proptest::prelude::*;
    use test_case::test_case;

    fn principal(name: &str) -> Principal {
        Principal::new(name).unwrap()
    }

    struct FailingSink;

    impl EventSink for FailingSink {
        fn publish(&self, _event: &RegistrationEvent) -> Result<()> {
            Err(EquipmentError::EventPublishError("observer offline".into()))
        }
    }

    #[tokio::test]
    async fn test_register_and_get_details() {
        let registry = MemoryRegistry::new();
        let caller = principal("0xEA01");

        registry
            .register(1, "Drill".into(), "QmAbc123".into(), caller.clone())
            .await
            .unwrap();

        let details = registry.get_details(1).await.unwrap();
        assert_eq!(details.name, "Drill");
        assert_eq!(details.registrant, caller);
        assert_eq!(details.document_ref, "QmAbc123");
        assert!(details.registered);
    }

    #[test_case("Saw", "QmXyz789" ; "different fields")]
    #[test_case("Drill", "QmAbc123" ; "identical fields")]
    #[test_case("", "" ; "empty fields")]
    #[tokio::test]
    async fn test_second_registration_rejected(name: &str, document_ref: &str) {
        let registry = MemoryRegistry::new();
        registry
            .register(1, "Drill".into(), "QmAbc123".into(), principal("first"))
            .await
            .unwrap();

        let err = registry
            .register(1, name.into(), document_ref.into(), principal("second"))
            .await
            .unwrap_err();
        assert!(matches!(err, EquipmentError::AlreadyRegistered(1)));

        let details = registry.get_details(1).await.unwrap();
        assert_eq!(details.name, "Drill");
        assert_eq!(details.document_ref, "QmAbc123");
        assert_eq!(details.registrant, principal("first"));
        assert_eq!(registry.committed(), 1);
    }

    #[tokio::test]
    async fn test_get_unregistered() {
        let registry = MemoryRegistry::new();
        let err = registry.get_details(42).await.unwrap_err();
        assert!(matches!(err, EquipmentError::NotFound(42)));
    }

    #[tokio::test]
    async fn test_empty_strings_accepted() {
        let registry = MemoryRegistry::new();
        registry
            .register(2, String::new(), String::new(), principal("ea"))
            .await
            .unwrap();

        let details = registry.get_details(2).await.unwrap();
        assert_eq!(details.name, "");
        assert_eq!(details.document_ref, "");
        assert!(details.registered);
    }

    #[tokio::test]
    async fn test_extreme_ids() {
        let registry = MemoryRegistry::new();
        for id in [0, u64::MAX] {
            registry
                .register(id, "edge".into(), "Qm".into(), principal("ea"))
                .await
                .unwrap();
            assert!(registry.get_details(id).await.is_ok());
        }
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_events_match_records() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let registry = MemoryRegistry::with_sink(Arc::new(bus));

        registry.register(7, "Lathe".into(), "Qm7".into(), principal("a")).await.unwrap();
        registry.register(3, "Press".into(), "Qm3".into(), principal("b")).await.unwrap();
        let _ = registry.register(7, "Dup".into(), "QmDup".into(), principal("c")).await;

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert!(rx.try_recv().is_err());

        assert_eq!((first.sequence, first.id), (1, 7));
        assert_eq!((second.sequence, second.id), (2, 3));

        for event in [first, second] {
            let record = registry.records.get(&event.id).unwrap();
            assert!(event.matches(&record));
        }
    }

    #[tokio::test]
    async fn test_sink_failure_keeps_registration() {
        let registry = MemoryRegistry::with_sink(Arc::new(FailingSink));

        registry
            .register(1, "Drill".into(), "Qm".into(), principal("ea"))
            .await
            .unwrap();

        assert!(registry.get_details(1).await.is_ok());
        assert_eq!(registry.committed(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_id_single_winner() {
        use tokio::task::JoinSet;

        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let registry = Arc::new(MemoryRegistry::with_sink(Arc::new(bus)));
        let mut tasks = JoinSet::new();

        for i in 0..64u32 {
            let reg = registry.clone();
            tasks.spawn(async move {
                reg.register(99, format!("name-{i}"), format!("Qm{i}"), principal(&format!("caller-{i}")))
                    .await
            });
        }

        let mut winners = 0;
        let mut rejected = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                Ok(()) => winners += 1,
                Err(EquipmentError::AlreadyRegistered(99)) => rejected += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(rejected, 63);

        let event = rx.try_recv().unwrap();
        assert!(rx.try_recv().is_err());
        let details = registry.get_details(99).await.unwrap();
        assert_eq!(details.name, event.name);
        assert_eq!(details.registrant, event.registrant);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_distinct_ids_gapless_sequences() {
        use tokio::task::JoinSet;

        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let registry = Arc::new(MemoryRegistry::with_sink(Arc::new(bus)));
        let mut tasks = JoinSet::new();

        for id in 0..100u64 {
            let reg = registry.clone();
            tasks.spawn(async move {
                reg.register(id, "bulk".into(), String::new(), principal("loader")).await
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        assert_eq!(registry.len(), 100);
        for expected in 1..=100u64 {
            assert_eq!(rx.try_recv().unwrap().sequence, expected);
        }
    }

    #[test]
    fn test_restore_rebuilds_without_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let registry = MemoryRegistry::with_sink(Arc::new(bus));

        registry.restore(RegistrationEvent::new(1, 10, "A", principal("x"), "Qa")).unwrap();
        registry.restore(RegistrationEvent::new(2, 11, "B", principal("y"), "Qb")).unwrap();

        assert!(rx.try_recv().is_err());
        assert_eq!(registry.committed(), 2);
        assert_eq!(registry.next_sequence(), 3);
        assert!(registry.contains(10));
    }

    #[test]
    fn test_restore_rejects_corruption() {
        let registry = MemoryRegistry::new();
        registry.restore(RegistrationEvent::new(1, 10, "A", principal("x"), "Qa")).unwrap();

        let dup = registry.restore(RegistrationEvent::new(2, 10, "B", principal("y"), "Qb"));
        assert!(matches!(dup, Err(EquipmentError::StorageError(_))));

        let stale = registry.restore(RegistrationEvent::new(1, 11, "C", principal("z"), "Qc"));
        assert!(matches!(stale, Err(EquipmentError::StorageError(_))));

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_commit_requires_next_sequence() {
        let registry = MemoryRegistry::new();
        let skipped = registry.commit(RegistrationEvent::new(2, 1, "A", principal("x"), ""));
        assert!(matches!(skipped, Err(EquipmentError::InternalError(_))));
        assert!(registry.is_empty());

        registry.commit(RegistrationEvent::new(1, 1, "A", principal("x"), "")).unwrap();
        assert_eq!(registry.committed(), 1);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Register(u64, String, String),
        Get(u64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..8, "[a-z]{0,6}", "Qm[a-z0-9]{0,6}").prop_map(|(id, n, d)| Op::Register(id, n, d)),
            (0u64..8).prop_map(Op::Get),
        ]
    }

    proptest! {
        #[test]
        fn prop_first_registration_wins(ops in proptest::collection::vec(op_strategy(), 1..64)) {
            let bus = EventBus::new();
            let mut rx = bus.subscribe();
            let registry = MemoryRegistry::with_sink(Arc::new(bus));
            let mut model: std::collections::HashMap<u64, (String, String)> = Default::default();
            let mut successes = 0u64;

            for op in ops {
                match op {
                    Op::Register(id, name, doc) => {
                        let result = tokio_test::block_on(
                            registry.register(id, name.clone(), doc.clone(), principal("p")),
                        );
                        if model.contains_key(&id) {
                            prop_assert!(matches!(result, Err(EquipmentError::AlreadyRegistered(x)) if x == id));
                        } else {
                            prop_assert!(result.is_ok());
                            model.insert(id, (name, doc));
                            successes += 1;
                        }
                    }
                    Op::Get(id) => {
                        let result = tokio_test::block_on(registry.get_details(id));
                        match model.get(&id) {
                            Some((name, doc)) => {
                                let details = result.unwrap();
                                prop_assert_eq!(&details.name, name);
                                prop_assert_eq!(&details.document_ref, doc);
                                prop_assert!(details.registered);
                            }
                            None => prop_assert!(matches!(result, Err(EquipmentError::NotFound(_)))),
                        }
                    }
                }
            }

            let mut events = 0u64;
            while let Ok(event) = rx.try_recv() {
                events += 1;
                prop_assert_eq!(event.sequence, events);
                let (name, doc) = &model[&event.id];
                prop_assert_eq!(&event.name, name);
                prop_assert_eq!(&event.document_ref, doc);
            }
            prop_assert_eq!(events, successes);
            prop_assert_eq!(registry.len() as u64, successes);
        }
    }
}
