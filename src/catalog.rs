//! In-memory catalog mirrored to one key-value slot.
//!
//! The store keeps the tracks in insertion order and rewrites the whole slot
//! after every mutation. Writes happen before the in-memory list changes, so
//! a failed write leaves both sides as they were.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::KeyValueStore;
use crate::errors::CatalogError;
use crate::models::{Track, TrackFields};

/// Slot name used when the configuration does not override it.
pub const DEFAULT_STORAGE_KEY: &str = "globalSongsCatalog";

pub struct CatalogStore<S: KeyValueStore> {
    storage: S,
    key: String,
    tracks: Vec<Track>,
}

impl<S: KeyValueStore> CatalogStore<S> {
    /// Read the slot under `key` and build the store around it. A missing
    /// slot is an empty catalog. Content that cannot be decoded is logged and
    /// skipped rather than failing start-up; only backend failures are
    /// returned.
    pub fn load(storage: S, key: impl Into<String>) -> Result<Self, CatalogError> {
        let key = key.into();
        let tracks = match storage.get(&key)? {
            None => Vec::new(),
            Some(raw) => match decode_catalog(&raw) {
                Ok(tracks) => tracks,
                Err(err) => {
                    warn!(%key, error = %err, "discarding unreadable catalog slot");
                    Vec::new()
                }
            },
        };

        info!(%key, count = tracks.len(), "catalog loaded");
        Ok(Self {
            storage,
            key,
            tracks,
        })
    }

    /// Append a new track with a freshly generated id and persist.
    pub fn add(&mut self, fields: TrackFields) -> Result<Track, CatalogError> {
        let fields = fields.normalized()?;
        let track = Track::from_fields(self.next_id(), fields);

        let mut next = self.tracks.clone();
        next.push(track.clone());
        self.commit(next)?;

        info!(id = %track.id, title = %track.title, "track added");
        Ok(track)
    }

    /// Replace every field of the track with `id` except the id itself.
    pub fn update(&mut self, id: &str, fields: TrackFields) -> Result<Track, CatalogError> {
        let fields = fields.normalized()?;
        let index = self.position(id)?;

        let mut next = self.tracks.clone();
        next[index].apply(fields);
        let updated = next[index].clone();
        self.commit(next)?;

        info!(%id, title = %updated.title, "track updated");
        Ok(updated)
    }

    /// Drop the track with `id` and persist the remainder.
    pub fn remove(&mut self, id: &str) -> Result<Track, CatalogError> {
        let index = self.position(id)?;

        let mut next = self.tracks.clone();
        let removed = next.remove(index);
        self.commit(next)?;

        info!(%id, title = %removed.title, "track removed");
        Ok(removed)
    }

    /// Tracks whose title, artist or genre contains `term`, ignoring case, in
    /// catalog order. A blank term selects everything.
    pub fn search(&self, term: &str) -> Vec<&Track> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.tracks.iter().collect();
        }
        self.tracks
            .iter()
            .filter(|track| track.matches(&needle))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == id)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Backend the store writes through.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn position(&self, id: &str) -> Result<usize, CatalogError> {
        self.tracks
            .iter()
            .position(|track| track.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    fn next_id(&self) -> String {
        loop {
            let candidate = Uuid::new_v4().to_string();
            if self.get(&candidate).is_none() {
                return candidate;
            }
        }
    }

    /// Serialize `next`, write it to the slot, and only then adopt it.
    fn commit(&mut self, next: Vec<Track>) -> Result<(), CatalogError> {
        let payload = serde_json::to_string(&next)?;
        self.storage.set(&self.key, &payload)?;
        debug!(key = %self.key, count = next.len(), bytes = payload.len(), "catalog persisted");
        self.tracks = next;
        Ok(())
    }
}

/// Decode the slot contents. The top level must be a JSON array; entries
/// that do not have the record shape, or that reuse an id seen earlier, are
/// skipped with a warning.
pub(crate) fn decode_catalog(raw: &str) -> Result<Vec<Track>, CatalogError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| CatalogError::Malformed(err.to_string()))?;
    let Value::Array(entries) = value else {
        return Err(CatalogError::Malformed("expected a JSON array".into()));
    };

    let mut seen = HashSet::new();
    let mut tracks = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let track = match serde_json::from_value::<Track>(entry) {
            Ok(track) => track,
            Err(err) => {
                warn!(index, error = %err, "skipping unreadable catalog entry");
                continue;
            }
        };
        if track.id.trim().is_empty()
            || track.title.trim().is_empty()
            || track.artist.trim().is_empty()
        {
            warn!(index, id = %track.id, "skipping catalog entry with blank required field");
            continue;
        }
        if !seen.insert(track.id.clone()) {
            warn!(index, id = %track.id, "skipping catalog entry with duplicate id");
            continue;
        }
        tracks.push(track);
    }

    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryKv;
    use crate::errors::StorageError;

    fn empty_store() -> CatalogStore<MemoryKv> {
        CatalogStore::load(MemoryKv::new(), DEFAULT_STORAGE_KEY).unwrap()
    }

    fn imagine() -> TrackFields {
        TrackFields::new("Imagine", "John Lennon")
            .with_genre("Rock")
            .with_year(1971)
    }

    fn stored(store: &CatalogStore<MemoryKv>) -> Option<String> {
        store.storage().get(DEFAULT_STORAGE_KEY).unwrap()
    }

    /// Backend whose writes always fail.
    struct ReadOnlyKv(MemoryKv);

    impl KeyValueStore for ReadOnlyKv {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("read-only".into()))
        }
    }

    #[test]
    fn load_without_slot_is_empty() {
        let store = empty_store();
        assert!(store.is_empty());
        assert_eq!(stored(&store), None);
    }

    #[test]
    fn load_recovers_from_malformed_slot() {
        for raw in ["not json", "{\"id\":\"1\"}", "42", ""] {
            let kv = MemoryKv::with_entry(DEFAULT_STORAGE_KEY, raw);
            let store = CatalogStore::load(kv, DEFAULT_STORAGE_KEY).unwrap();
            assert!(store.is_empty(), "slot {raw:?} should load as empty");
        }
    }

    #[test]
    fn load_keeps_valid_entries_of_partially_broken_array() {
        let raw = r#"[
            {"id":"1","title":"Imagine","artist":"John Lennon","genre":"Rock","year":1971},
            {"id":"2","title":"","artist":"Nobody","genre":"","year":null},
            {"title":"No id","artist":"Someone"},
            "garbage",
            {"id":"1","title":"Duplicate","artist":"Someone","genre":"","year":null},
            {"id":"3","title":"Heroes","artist":"David Bowie","genre":null}
        ]"#;
        let kv = MemoryKv::with_entry(DEFAULT_STORAGE_KEY, raw);
        let store = CatalogStore::load(kv, DEFAULT_STORAGE_KEY).unwrap();

        let ids: Vec<&str> = store.tracks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
        assert_eq!(store.get("3").unwrap().genre, None);
    }

    #[test]
    fn odd_years_survive_load_and_the_next_write() {
        let raw = r#"[
            {"id":"a","title":"Big","artist":"Band","genre":"","year":3000000000},
            {"id":"b","title":"Imagine","artist":"John Lennon","genre":"Rock","year":1971.0},
            {"id":"c","title":"Zero","artist":"Band","genre":"","year":0}
        ]"#;
        let kv = MemoryKv::with_entry(DEFAULT_STORAGE_KEY, raw);
        let mut store = CatalogStore::load(kv, DEFAULT_STORAGE_KEY).unwrap();

        let years: Vec<Option<i32>> = store.tracks().iter().map(|t| t.year).collect();
        assert_eq!(years, [None, Some(1971), Some(0)]);

        let added = store.add(TrackFields::new("Heroes", "David Bowie")).unwrap();
        let reloaded = CatalogStore::load(store.storage().clone(), DEFAULT_STORAGE_KEY).unwrap();
        let ids: Vec<&str> = reloaded.tracks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", added.id.as_str()]);
    }

    #[test]
    fn add_assigns_unique_ids_and_persists() {
        let mut store = empty_store();
        let first = store.add(imagine()).unwrap();
        let second = store.add(imagine()).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.len(), 2);
        assert_eq!(first.fields(), imagine());

        let reloaded = CatalogStore::load(store.storage().clone(), DEFAULT_STORAGE_KEY).unwrap();
        assert_eq!(reloaded.tracks(), store.tracks());
    }

    #[test]
    fn add_rejects_blank_required_fields() {
        let mut store = empty_store();
        let err = store.add(TrackFields::new("", "Artist")).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert!(store.is_empty());
        assert_eq!(stored(&store), None);
    }

    #[test]
    fn update_keeps_id_and_position() {
        let mut store = empty_store();
        store.add(TrackFields::new("First", "A")).unwrap();
        let target = store.add(imagine()).unwrap();
        store.add(TrackFields::new("Last", "C")).unwrap();

        let fields = TrackFields::new("Imagine (Remastered)", "John Lennon").with_year(2010);
        let updated = store.update(&target.id, fields.clone()).unwrap();

        assert_eq!(updated.id, target.id);
        assert_eq!(updated.fields(), fields);
        assert_eq!(store.tracks()[1], updated);
        assert_eq!(store.get(&target.id).unwrap().genre, None);
    }

    #[test]
    fn update_unknown_id_is_not_found_and_writes_nothing() {
        let mut store = empty_store();
        let err = store.update("missing", imagine()).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(ref id) if id == "missing"));
        assert_eq!(stored(&store), None);
    }

    #[test]
    fn remove_twice_reports_not_found_second_time() {
        let mut store = empty_store();
        let keep = store.add(TrackFields::new("Keep", "Me")).unwrap();
        let gone = store.add(imagine()).unwrap();

        let removed = store.remove(&gone.id).unwrap();
        assert_eq!(removed, gone);
        let snapshot = stored(&store);

        let err = store.remove(&gone.id).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
        assert_eq!(store.tracks(), [keep]);
        assert_eq!(stored(&store), snapshot);
        assert!(store.search("").iter().all(|t| t.id != gone.id));
    }

    #[test]
    fn search_matches_text_fields_only() {
        let mut store = empty_store();
        let imagine = store.add(imagine()).unwrap();
        let heroes = store
            .add(TrackFields::new("Heroes", "David Bowie").with_year(1977))
            .unwrap();
        store
            .add(TrackFields::new("So What", "Miles Davis").with_genre("Jazz"))
            .unwrap();

        let ids = |term: &str| -> Vec<String> {
            store.search(term).into_iter().map(|t| t.id.clone()).collect()
        };

        assert_eq!(ids("LENNON"), [imagine.id.clone()]);
        assert_eq!(ids("her"), [heroes.id.clone()]);
        assert_eq!(ids("jaz").len(), 1);
        assert!(ids("1977").is_empty());
        assert_eq!(ids("d").len(), 2);
    }

    #[test]
    fn blank_search_returns_everything_in_order() {
        let mut store = empty_store();
        for title in ["C", "A", "B"] {
            store.add(TrackFields::new(title, "Artist")).unwrap();
        }

        let titles: Vec<&str> = store.search("  ").iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["C", "A", "B"]);
        assert_eq!(store.search("").len(), 3);
    }

    #[test]
    fn failed_write_leaves_catalog_untouched() {
        let raw = r#"[{"id":"1","title":"Imagine","artist":"John Lennon","genre":"","year":null}]"#;
        let kv = ReadOnlyKv(MemoryKv::with_entry(DEFAULT_STORAGE_KEY, raw));
        let mut store = CatalogStore::load(kv, DEFAULT_STORAGE_KEY).unwrap();

        assert!(matches!(
            store.add(TrackFields::new("New", "Song")),
            Err(CatalogError::Storage(_))
        ));
        assert!(store.update("1", TrackFields::new("Changed", "Song")).is_err());
        assert!(store.remove("1").is_err());

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("1").unwrap().title, "Imagine");
    }

    #[test]
    fn lifecycle_walkthrough() {
        let mut store = empty_store();
        let track = store.add(imagine()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.search("lennon"), [&track]);

        let remastered = TrackFields::new("Imagine (Remastered)", "John Lennon")
            .with_genre("Rock")
            .with_year(1971);
        let updated = store.update(&track.id, remastered).unwrap();
        assert_eq!(store.search("remastered"), [&updated]);

        store.remove(&track.id).unwrap();
        assert!(store.is_empty());
        assert_eq!(stored(&store).as_deref(), Some("[]"));
    }
}
