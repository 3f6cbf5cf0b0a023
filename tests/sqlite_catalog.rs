use song_catalog::{
    CatalogError, CatalogStore, KeyValueStore, SqliteKv, TrackFields, DEFAULT_STORAGE_KEY,
};
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> CatalogStore<SqliteKv> {
    let storage = SqliteKv::open(&dir.path().join("data").join("catalog.sqlite")).unwrap();
    CatalogStore::load(storage, DEFAULT_STORAGE_KEY).unwrap()
}

#[test]
fn catalog_survives_reopening_the_database() {
    let dir = TempDir::new().unwrap();

    let (kept, updated_id) = {
        let mut store = open_store(&dir);
        let kept = store
            .add(TrackFields::new("Imagine", "John Lennon").with_genre("Rock").with_year(1971))
            .unwrap();
        let gone = store.add(TrackFields::new("Yesterday", "The Beatles")).unwrap();
        let edited = store.add(TrackFields::new("Heroes", "Bowie")).unwrap();
        store
            .update(&edited.id, TrackFields::new("Heroes", "David Bowie").with_year(1977))
            .unwrap();
        store.remove(&gone.id).unwrap();
        (kept, edited.id)
    };

    let store = open_store(&dir);
    assert_eq!(store.len(), 2);
    assert_eq!(store.tracks()[0], kept);

    let heroes = store.get(&updated_id).unwrap();
    assert_eq!(heroes.artist, "David Bowie");
    assert_eq!(heroes.year, Some(1977));
    assert_eq!(heroes.genre, None);
    assert!(store.search("yesterday").is_empty());
}

#[test]
fn stored_slot_is_a_flat_json_array() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    let track = store.add(TrackFields::new("So What", "Miles Davis")).unwrap();

    let raw = store.storage().get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entries = value.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], track.id.as_str());
    assert_eq!(entries[0]["title"], "So What");
    assert_eq!(entries[0]["artist"], "Miles Davis");
    assert_eq!(entries[0]["genre"], "");
    assert!(entries[0]["year"].is_null());
}

#[test]
fn reads_slot_written_by_other_clients() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.sqlite");
    {
        let mut storage = SqliteKv::open(&path).unwrap();
        storage
            .set(
                DEFAULT_STORAGE_KEY,
                r#"[{"title":"Imagine","artist":"John Lennon","genre":"Rock","year":1971,"id":"1700000000000"}]"#,
            )
            .unwrap();
    }

    let storage = SqliteKv::open(&path).unwrap();
    let mut store = CatalogStore::load(storage, DEFAULT_STORAGE_KEY).unwrap();
    assert_eq!(store.search("ROCK").len(), 1);
    assert_eq!(store.get("1700000000000").unwrap().year, Some(1971));

    store.remove("1700000000000").unwrap();
    assert!(matches!(
        store.remove("1700000000000"),
        Err(CatalogError::NotFound(_))
    ));
}

#[test]
fn corrupted_slot_starts_empty_and_is_replaced_on_next_write() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.sqlite");
    {
        let mut storage = SqliteKv::open(&path).unwrap();
        storage.set(DEFAULT_STORAGE_KEY, "{not json").unwrap();
    }

    let storage = SqliteKv::open(&path).unwrap();
    let mut store = CatalogStore::load(storage, DEFAULT_STORAGE_KEY).unwrap();
    assert!(store.is_empty());

    store.add(TrackFields::new("Blackbird", "The Beatles")).unwrap();
    let reopened = CatalogStore::load(SqliteKv::open(&path).unwrap(), DEFAULT_STORAGE_KEY).unwrap();
    assert_eq!(reopened.len(), 1);
}

#[test]
fn separate_keys_hold_separate_catalogs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.sqlite");

    let mut first = CatalogStore::load(SqliteKv::open(&path).unwrap(), "first").unwrap();
    first.add(TrackFields::new("One", "A")).unwrap();

    let second = CatalogStore::load(SqliteKv::open(&path).unwrap(), "second").unwrap();
    assert!(second.is_empty());
}
