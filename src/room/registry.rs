use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info, instrument, warn};

use super::models::{Room, DEFAULT_DESCRIPTION};
use super::namegen::NameGenerator;
use crate::shared::AppError;

/// How many generate-and-insert cycles a single `create` may spend before
/// giving up.
const MAX_CREATE_ATTEMPTS: usize = 10;

/// The transport layer's mechanism for exposing and withdrawing a per-room
/// endpoint. The registry calls `bind` while it still holds the map shard
/// for the inserted key (and `unbind` likewise during removal), which is
/// what keeps route existence in lockstep with map existence.
///
/// Implementations must not call back into the registry.
pub trait RouteBinder: Send + Sync {
    fn bind(&self, room_id: &str);
    fn unbind(&self, room_id: &str);
}

/// Owns the identifier-to-room mapping shared by all request workers and
/// the cleanup task. Sharded via `DashMap`, so traffic on one room never
/// serializes another's.
pub struct RoomRegistry {
    rooms: DashMap<String, Arc<Room>>,
    names: NameGenerator,
    binder: Arc<dyn RouteBinder>,
}

impl RoomRegistry {
    pub fn new(binder: Arc<dyn RouteBinder>) -> Self {
        Self {
            rooms: DashMap::new(),
            names: NameGenerator::new(),
            binder,
        }
    }

    /// Creates a room under a freshly drawn identifier and binds its route.
    ///
    /// Insertion goes through the vacant-entry path, so two workers drawing
    /// the same name cannot both win; the loser draws again. The route is
    /// bound before the shard guard drops, so no observer can see the room
    /// without its route or vice versa.
    #[instrument(skip(self))]
    pub fn create(&self, now: DateTime<Utc>) -> Result<String, AppError> {
        for _ in 0..MAX_CREATE_ATTEMPTS {
            let candidate = self.names.generate(|name| self.rooms.contains_key(name))?;
            match self.rooms.entry(candidate.clone()) {
                Entry::Occupied(_) => {
                    debug!(room_id = %candidate, "Lost creation race, drawing a new name");
                    continue;
                }
                Entry::Vacant(slot) => {
                    let guard = slot.insert(Arc::new(Room::new(DEFAULT_DESCRIPTION, now)));
                    self.binder.bind(&candidate);
                    drop(guard);
                    info!(room_id = %candidate, total_rooms = self.rooms.len(), "Created room");
                    return Ok(candidate);
                }
            }
        }
        warn!("Exhausted creation attempts without winning an insert");
        Err(AppError::RoomCreation(super::namegen::CapacityExhausted))
    }

    /// `None` is the expected outcome for stale or expired room URLs.
    pub fn lookup(&self, room_id: &str) -> Option<Arc<Room>> {
        self.rooms.get(room_id).map(|room| Arc::clone(&room))
    }

    /// Deletes the room and withdraws its route. A no-op when the room is
    /// already gone, so explicit removal and the idle purge can race freely.
    #[instrument(skip(self))]
    pub fn remove(&self, room_id: &str) {
        self.remove_if(room_id, |_| true);
    }

    /// Sweeps every room present at the start of the sweep and removes the
    /// idle ones. Returns how many were purged.
    ///
    /// The idleness check runs inside the occupied-entry guard, so a room
    /// re-created under the same identifier mid-sweep is judged by its own
    /// timestamp, never a stale one.
    #[instrument(skip(self))]
    pub fn purge_idle(&self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let ids: Vec<String> = self.rooms.iter().map(|entry| entry.key().clone()).collect();
        ids.into_iter()
            .filter(|id| {
                let purged = self.remove_if(id, |room| room.is_idle(now, max_age));
                if purged {
                    info!(room_id = %id, "Purged idle room");
                }
                purged
            })
            .count()
    }

    /// Identifiers in lexicographic order for presentation.
    pub fn list_identifiers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rooms.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Removes the room only if the predicate holds for the entry actually
    /// present, all under the shard guard: check, unbind, delete are one
    /// atomic step to any observer of this identifier.
    fn remove_if(&self, room_id: &str, should_remove: impl FnOnce(&Room) -> bool) -> bool {
        match self.rooms.entry(room_id.to_string()) {
            Entry::Occupied(entry) => {
                if !should_remove(entry.get().as_ref()) {
                    return false;
                }
                self.binder.unbind(room_id);
                entry.remove();
                true
            }
            Entry::Vacant(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};
    use std::sync::Mutex;

    use super::*;

    /// Test binder that records the currently bound identifiers.
    #[derive(Default)]
    struct RecordingBinder {
        bound: Mutex<BTreeSet<String>>,
    }

    impl RecordingBinder {
        fn is_bound(&self, room_id: &str) -> bool {
            self.bound.lock().unwrap().contains(room_id)
        }

        fn bound_count(&self) -> usize {
            self.bound.lock().unwrap().len()
        }
    }

    impl RouteBinder for RecordingBinder {
        fn bind(&self, room_id: &str) {
            self.bound.lock().unwrap().insert(room_id.to_string());
        }

        fn unbind(&self, room_id: &str) {
            self.bound.lock().unwrap().remove(room_id);
        }
    }

    fn registry() -> (RoomRegistry, Arc<RecordingBinder>) {
        let binder = Arc::new(RecordingBinder::default());
        (RoomRegistry::new(binder.clone()), binder)
    }

    #[test]
    fn create_inserts_a_listed_room_with_the_default_topic() {
        let (registry, _) = registry();

        let id = registry.create(Utc::now()).unwrap();

        assert_eq!(registry.list_identifiers(), vec![id.clone()]);
        let room = registry.lookup(&id).unwrap();
        assert_eq!(room.snapshot().description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn created_identifiers_are_unique_while_unpurged() {
        let (registry, _) = registry();

        let mut seen = HashSet::new();
        for _ in 0..50 {
            let id = registry.create(Utc::now()).unwrap();
            assert!(seen.insert(id), "identifier handed out twice");
        }
        assert_eq!(registry.len(), 50);
    }

    #[test]
    fn create_binds_the_route_and_remove_withdraws_it() {
        let (registry, binder) = registry();

        let id = registry.create(Utc::now()).unwrap();
        assert!(binder.is_bound(&id));
        assert!(registry.list_identifiers().contains(&id));

        registry.remove(&id);
        assert!(!binder.is_bound(&id));
        assert!(registry.lookup(&id).is_none());
        assert!(registry.list_identifiers().is_empty());
    }

    #[test]
    fn remove_is_a_noop_for_absent_rooms() {
        let (registry, binder) = registry();

        registry.remove("Azure-Brave-Ant");

        assert_eq!(registry.len(), 0);
        assert_eq!(binder.bound_count(), 0);
    }

    #[test]
    fn lookup_of_unknown_identifier_is_none() {
        let (registry, _) = registry();
        assert!(registry.lookup("Lilac-Lucky-Lion").is_none());
    }

    #[test]
    fn list_identifiers_is_sorted() {
        let (registry, _) = registry();
        for _ in 0..10 {
            registry.create(Utc::now()).unwrap();
        }

        let ids = registry.list_identifiers();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn purge_removes_rooms_idle_past_max_age_only() {
        let (registry, binder) = registry();
        let t0 = Utc::now();
        let max_age = Duration::hours(24);

        let stale = registry.create(t0).unwrap();
        let fresh = registry.create(t0 + Duration::hours(12)).unwrap();

        // Exactly at the cutoff nothing is idle yet.
        assert_eq!(registry.purge_idle(t0 + max_age, max_age), 0);
        assert_eq!(registry.len(), 2);

        let purged = registry.purge_idle(t0 + max_age + Duration::seconds(1), max_age);
        assert_eq!(purged, 1);
        assert!(registry.lookup(&stale).is_none());
        assert!(!binder.is_bound(&stale));
        assert!(registry.lookup(&fresh).is_some());
        assert!(binder.is_bound(&fresh));
    }

    #[test]
    fn activity_defers_the_purge() {
        let (registry, _) = registry();
        let t0 = Utc::now();
        let max_age = Duration::hours(24);

        let id = registry.create(t0).unwrap();
        let room = registry.lookup(&id).unwrap();
        room.set_estimate("alice", "5", t0 + Duration::hours(20));

        assert_eq!(registry.purge_idle(t0 + Duration::hours(25), max_age), 0);
        assert_eq!(
            registry.purge_idle(t0 + Duration::hours(45), max_age),
            1,
            "room should expire once quiet past the cutoff again"
        );
    }

    #[test]
    fn inflight_operations_on_a_removed_room_complete_against_their_handle() {
        let (registry, _) = registry();
        let id = registry.create(Utc::now()).unwrap();
        let room = registry.lookup(&id).unwrap();

        registry.remove(&id);

        // The detached handle still works; the registry stays empty.
        room.set_estimate("alice", "5", Utc::now());
        assert_eq!(room.snapshot().estimates.len(), 1);
        assert!(registry.lookup(&id).is_none());
    }

    #[test]
    fn concurrent_creates_never_hand_out_duplicates() {
        let (registry, binder) = registry();
        let registry = Arc::new(registry);

        let ids: Vec<String> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let registry = Arc::clone(&registry);
                    scope.spawn(move || registry.create(Utc::now()).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let distinct: HashSet<&String> = ids.iter().collect();
        assert_eq!(distinct.len(), 16);
        assert_eq!(registry.len(), 16);
        assert_eq!(binder.bound_count(), 16);
    }

    #[test]
    fn purge_races_cleanly_with_explicit_removal() {
        let (registry, binder) = registry();
        let t0 = Utc::now();
        let ids: Vec<String> = (0..8).map(|_| registry.create(t0).unwrap()).collect();
        let registry = Arc::new(registry);

        std::thread::scope(|scope| {
            let purger = Arc::clone(&registry);
            scope.spawn(move || purger.purge_idle(t0 + Duration::hours(25), Duration::hours(24)));
            for id in &ids {
                let registry = Arc::clone(&registry);
                scope.spawn(move || registry.remove(id));
            }
        });

        assert_eq!(registry.len(), 0);
        assert_eq!(binder.bound_count(), 0);
    }
}
