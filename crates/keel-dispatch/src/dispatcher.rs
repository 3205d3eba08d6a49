use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use keel_datastore::{Datastore, Key, Query, TxnDatastore};
use keel_types::{EntityId, SchemaRef, Timestamp};

use crate::error::DispatchError;
use crate::event::Event;
use crate::reducer::{Reducer, Token};

/// Filter for querying the persisted event log.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// If set, only events with this schema reference are returned.
    pub schema: Option<SchemaRef>,
    /// If set, only events for this entity are returned.
    pub entity: Option<EntityId>,
    /// If set, only events with timestamps at or after this point.
    pub since: Option<Timestamp>,
}

impl EventFilter {
    /// Returns `true` if the given event matches this filter.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref schema) = self.schema {
            if event.schema != *schema {
                return false;
            }
        }
        if let Some(ref entity) = self.entity {
            if event.entity != *entity {
                return false;
            }
        }
        if let Some(ref since) = self.since {
            if event.timestamp < *since {
                return false;
            }
        }
        true
    }
}

struct Registry {
    reducers: BTreeMap<Token, Arc<dyn Reducer>>,
    next_token: u64,
    next_seq: u64,
}

/// Serializing hub that persists events and delivers them to reducers.
///
/// One global lock covers registration, deregistration, and the whole of
/// [`dispatch`](Dispatcher::dispatch): persist the event, then invoke every
/// registered reducer in token order. This linearizes the event log across
/// all models at the cost of cross-model write throughput.
pub struct Dispatcher {
    events: Arc<TxnDatastore>,
    registry: Mutex<Registry>,
}

impl Dispatcher {
    /// Create a dispatcher over the given event store.
    ///
    /// The next sequence number is restored from the highest persisted key,
    /// so a dispatcher reopened over an existing log keeps appending in
    /// order.
    pub fn new(events: Arc<TxnDatastore>) -> Result<Self, DispatchError> {
        let existing = events.query(&Query::all())?;
        let next_seq = existing
            .last()
            .and_then(|entry| entry.key.name().parse::<u64>().ok())
            .map(|seq| seq + 1)
            .unwrap_or(0);

        Ok(Self {
            events,
            registry: Mutex::new(Registry {
                reducers: BTreeMap::new(),
                next_token: 0,
                next_seq,
            }),
        })
    }

    /// Register a reducer; every subsequent dispatch is delivered to it.
    pub fn register(&self, reducer: Arc<dyn Reducer>) -> Result<Token, DispatchError> {
        let mut registry = self.lock_registry()?;
        registry.next_token += 1;
        let token = Token::new(registry.next_token);
        registry.reducers.insert(token, reducer);
        debug!(%token, "reducer registered");
        Ok(token)
    }

    /// Remove a registration.
    pub fn deregister(&self, token: &Token) -> Result<(), DispatchError> {
        let mut registry = self.lock_registry()?;
        if registry.reducers.remove(token).is_none() {
            return Err(DispatchError::UnknownToken(*token));
        }
        debug!(%token, "reducer deregistered");
        Ok(())
    }

    /// Persist `event`, then deliver it to every registered reducer.
    ///
    /// The global lock is held for the whole call. Persistence completes
    /// before any reducer runs; if it fails, no reducer runs. The first
    /// reducer error is returned immediately and the remaining reducers are
    /// not invoked; the event stays persisted either way.
    pub fn dispatch(&self, event: &Event) -> Result<(), DispatchError> {
        let mut registry = self.lock_registry()?;

        let key = sequence_key(registry.next_seq);
        let encoded = serde_json::to_vec(event)
            .map_err(|e| DispatchError::Serialization(e.to_string()))?;
        let mut batch = self.events.transaction();
        batch.put(key, encoded);
        batch.commit()?;
        registry.next_seq += 1;

        debug!(seq = registry.next_seq - 1, entity = %event.entity, schema = %event.schema,
            "event persisted");

        for (token, reducer) in &registry.reducers {
            debug!(%token, "delivering event");
            reducer.reduce(event)?;
        }
        Ok(())
    }

    /// Return the persisted events matching `filter`, in insertion order.
    pub fn query(&self, filter: &EventFilter) -> Result<Vec<Event>, DispatchError> {
        let entries = self.events.query(&Query::all())?;
        let mut matching = Vec::new();
        for entry in entries {
            let event: Event = serde_json::from_slice(&entry.value)
                .map_err(|e| DispatchError::Serialization(e.to_string()))?;
            if filter.matches(&event) {
                matching.push(event);
            }
        }
        Ok(matching)
    }

    /// Number of persisted events.
    pub fn len(&self) -> Result<usize, DispatchError> {
        Ok(self.events.query(&Query::all())?.len())
    }

    /// Returns `true` if no event has been persisted.
    pub fn is_empty(&self) -> Result<bool, DispatchError> {
        Ok(self.len()? == 0)
    }

    /// Number of currently registered reducers.
    pub fn reducer_count(&self) -> Result<usize, DispatchError> {
        Ok(self.lock_registry()?.reducers.len())
    }

    /// A read-only handle onto the event store, for inspection.
    pub fn store(&self) -> EventStoreHandle {
        EventStoreHandle {
            events: Arc::clone(&self.events),
        }
    }

    fn lock_registry(&self) -> Result<std::sync::MutexGuard<'_, Registry>, DispatchError> {
        self.registry.lock().map_err(|_| DispatchError::LockPoisoned)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("event_count", &self.events.len())
            .finish()
    }
}

/// Read-only view of the dispatcher's event store.
///
/// Grants inspection without mutation rights; the log can only grow through
/// [`Dispatcher::dispatch`].
#[derive(Clone)]
pub struct EventStoreHandle {
    events: Arc<TxnDatastore>,
}

impl EventStoreHandle {
    /// Read the raw bytes persisted at `key`.
    pub fn get(&self, key: &Key) -> Result<Option<Vec<u8>>, DispatchError> {
        Ok(self.events.get(key)?)
    }

    /// Check whether `key` is present.
    pub fn has(&self, key: &Key) -> Result<bool, DispatchError> {
        Ok(self.events.has(key)?)
    }

    /// Raw entries matching `query`, in key (= insertion) order.
    pub fn query(&self, query: &Query) -> Result<Vec<keel_datastore::Entry>, DispatchError> {
        Ok(self.events.query(query)?)
    }
}

/// Zero-padded so that key order equals insertion order.
fn sequence_key(seq: u64) -> Key {
    Key::new(&format!("/{seq:020}"))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(TxnDatastore::new())).unwrap()
    }

    fn event(n: u64) -> Event {
        Event::new(
            Timestamp::from_nanos(n),
            EntityId::from(format!("e{n}").as_str()),
            SchemaRef::from_name("Null"),
            vec![],
        )
    }

    /// Accepts everything, does nothing.
    struct NullReducer;

    impl Reducer for NullReducer {
        fn reduce(&self, _event: &Event) -> Result<(), DispatchError> {
            Ok(())
        }
    }

    /// Fails on everything.
    struct ErrorReducer;

    impl Reducer for ErrorReducer {
        fn reduce(&self, _event: &Event) -> Result<(), DispatchError> {
            Err(DispatchError::MalformedEvent("error".into()))
        }
    }

    /// Sleeps, then counts the delivery.
    struct SlowReducer {
        delay: Duration,
        delivered: AtomicUsize,
    }

    impl SlowReducer {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                delivered: AtomicUsize::new(0),
            }
        }
    }

    impl Reducer for SlowReducer {
        fn reduce(&self, _event: &Event) -> Result<(), DispatchError> {
            thread::sleep(self.delay);
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    #[test]
    fn first_token_is_id_1() {
        let dispatcher = dispatcher();
        let token = dispatcher.register(Arc::new(NullReducer)).unwrap();
        assert_eq!(token.to_string(), "ID-1");
        assert_eq!(dispatcher.reducer_count().unwrap(), 1);
    }

    #[test]
    fn tokens_are_not_reused_after_deregister() {
        let dispatcher = dispatcher();
        let first = dispatcher.register(Arc::new(NullReducer)).unwrap();
        dispatcher.deregister(&first).unwrap();
        let second = dispatcher.register(Arc::new(NullReducer)).unwrap();
        assert_eq!(second.to_string(), "ID-2");
    }

    #[test]
    fn deregister_unknown_token_fails() {
        let dispatcher = dispatcher();
        let token = dispatcher.register(Arc::new(NullReducer)).unwrap();
        dispatcher.deregister(&token).unwrap();

        let err = dispatcher.deregister(&token).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownToken(_)));
        assert_eq!(dispatcher.reducer_count().unwrap(), 0);
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    #[test]
    fn dispatch_with_no_reducers_persists() {
        let dispatcher = dispatcher();
        dispatcher.dispatch(&event(1)).unwrap();
        assert_eq!(dispatcher.len().unwrap(), 1);
    }

    #[test]
    fn dispatch_delivers_to_all_reducers() {
        let dispatcher = dispatcher();
        let first = Arc::new(SlowReducer::new(Duration::ZERO));
        let second = Arc::new(SlowReducer::new(Duration::ZERO));
        dispatcher.register(first.clone()).unwrap();
        dispatcher.register(second.clone()).unwrap();

        dispatcher.dispatch(&event(1)).unwrap();
        assert_eq!(first.delivered.load(Ordering::SeqCst), 1);
        assert_eq!(second.delivered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reducer_error_propagates_but_event_stays_persisted() {
        let dispatcher = dispatcher();
        dispatcher.dispatch(&event(1)).unwrap();
        assert_eq!(dispatcher.len().unwrap(), 1);

        dispatcher.register(Arc::new(ErrorReducer)).unwrap();
        let err = dispatcher.dispatch(&event(2)).unwrap_err();
        assert_eq!(err, DispatchError::MalformedEvent("error".into()));
        assert_eq!(dispatcher.len().unwrap(), 2);
    }

    #[test]
    fn reducer_error_stops_remaining_deliveries() {
        let dispatcher = dispatcher();
        dispatcher.register(Arc::new(ErrorReducer)).unwrap();
        let late = Arc::new(SlowReducer::new(Duration::ZERO));
        dispatcher.register(late.clone()).unwrap();

        assert!(dispatcher.dispatch(&event(1)).is_err());
        assert_eq!(late.delivered.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_dispatches_are_serialized() {
        let dispatcher = Arc::new(dispatcher());
        let slow = Arc::new(SlowReducer::new(Duration::from_millis(200)));
        dispatcher.register(slow.clone()).unwrap();

        let started = Instant::now();
        let background = {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || dispatcher.dispatch(&event(1)))
        };
        dispatcher.dispatch(&event(2)).unwrap();
        background.join().unwrap().unwrap();

        // Two dispatches through a 200ms reducer cannot overlap.
        assert!(started.elapsed() >= Duration::from_millis(400));
        assert_eq!(slow.delivered.load(Ordering::SeqCst), 2);
    }

    // -----------------------------------------------------------------------
    // Event log
    // -----------------------------------------------------------------------

    #[test]
    fn query_returns_events_in_insertion_order() {
        let dispatcher = dispatcher();
        let count = 100;
        for n in 0..count {
            dispatcher.dispatch(&event(n)).unwrap();
        }

        let events = dispatcher.query(&EventFilter::default()).unwrap();
        assert_eq!(events.len(), count as usize);
        for (n, event) in events.iter().enumerate() {
            assert_eq!(event.entity, EntityId::from(format!("e{n}").as_str()));
        }
    }

    #[test]
    fn query_filters_by_schema_and_entity() {
        let dispatcher = dispatcher();
        dispatcher.dispatch(&event(1)).unwrap();
        dispatcher
            .dispatch(&Event::new(
                Timestamp::from_nanos(2),
                EntityId::from("other"),
                SchemaRef::from_name("Person"),
                vec![],
            ))
            .unwrap();

        let by_schema = dispatcher
            .query(&EventFilter {
                schema: Some(SchemaRef::from_name("Person")),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_schema.len(), 1);
        assert_eq!(by_schema[0].entity, EntityId::from("other"));

        let by_entity = dispatcher
            .query(&EventFilter {
                entity: Some(EntityId::from("e1")),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_entity.len(), 1);
    }

    #[test]
    fn query_filters_by_since() {
        let dispatcher = dispatcher();
        for n in 0..10 {
            dispatcher.dispatch(&event(n)).unwrap();
        }
        let recent = dispatcher
            .query(&EventFilter {
                since: Some(Timestamp::from_nanos(5)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(recent.len(), 5);
    }

    #[test]
    fn store_handle_is_inspectable() {
        let dispatcher = dispatcher();
        let handle = dispatcher.store();
        assert!(!handle.has(&Key::new("/blah")).unwrap());

        dispatcher.dispatch(&event(1)).unwrap();
        let entries = handle.query(&Query::all()).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(handle.get(&entries[0].key).unwrap().is_some());
    }

    #[test]
    fn reopened_log_continues_the_sequence() {
        let events = Arc::new(TxnDatastore::new());
        let first = Dispatcher::new(Arc::clone(&events)).unwrap();
        first.dispatch(&event(1)).unwrap();
        first.dispatch(&event(2)).unwrap();
        drop(first);

        let second = Dispatcher::new(Arc::clone(&events)).unwrap();
        second.dispatch(&event(3)).unwrap();

        let log = second.query(&EventFilter::default()).unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[2].entity, EntityId::from("e3"));
    }

    #[test]
    fn sequence_keys_sort_in_insertion_order() {
        assert!(sequence_key(9) < sequence_key(10));
        assert!(sequence_key(99) < sequence_key(100));
        assert_eq!(sequence_key(42).as_str(), "/00000000000000000042");
    }
}
