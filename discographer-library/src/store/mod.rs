//! Storage contract and the mirror-keeping library engine.
//!
//! [`MediaStore`] is the set of primitives a backing store must provide;
//! [`Library`] layers the public operations on top: it owns the in-memory
//! mirror of the full library and keeps it consistent with every
//! committed mutation. Unfiltered whole-library reads are served from the
//! mirror alone and never touch the backing store.

pub mod sqlite;

use crate::error::{LibraryError, Result};
use crate::fields::{normalize, FieldMask};
use crate::models::{DynamicPlaylist, EntryId, MediaEntry, PlaylistId, StandardPlaylist};
use crate::query::DynamicQuery;
use crate::search::{SearchKind, SearchMethod, SearchRequest};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, info};

pub use sqlite::SqliteStore;

/// Scope an id-returning search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Every entry in the library.
    Library,
    /// Only members of the given standard playlist.
    Playlist(PlaylistId),
}

/// Result of persisting one entry through [`MediaStore::insert_media`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredEntry {
    /// Store-assigned id (existing id when the path was already present).
    pub id: EntryId,
    /// Whether a row for the entry's path already existed.
    pub existed: bool,
}

/// Primitive operations a backing store implements.
///
/// Every mutating primitive is atomic: it either commits completely or
/// leaves the store unchanged. Terms passed to [`Self::match_terms`] are
/// expected in normalized form (see [`crate::fields::normalize`]).
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// One-time full read used to fill the mirror at engine start.
    async fn load_all(&self) -> Result<Vec<MediaEntry>>;

    /// Insert or update entries, assigning ids to new rows. Rows whose
    /// path already exists are rewritten only when `update_existing`;
    /// otherwise they are left untouched and reported back as existing.
    /// A field whose value became empty has its row deleted.
    async fn insert_media(
        &self,
        entries: &[MediaEntry],
        update_existing: bool,
    ) -> Result<Vec<StoredEntry>>;

    /// Remove entries by id. All-or-nothing: a missing id fails the whole
    /// call and rolls back every removal.
    async fn delete_media(&self, ids: &[EntryId]) -> Result<()>;

    /// Ids of entries matching the terms under `method`, restricted to
    /// `scope`. With no terms, the unfiltered id set of the scope.
    async fn match_terms(
        &self,
        scope: SearchScope,
        terms: &[String],
        term_fields: &[FieldMask],
        method: SearchMethod,
    ) -> Result<HashSet<EntryId>>;

    /// Ids of entries matching a dynamic query. An empty query matches
    /// nothing.
    async fn evaluate_query(&self, query: &DynamicQuery) -> Result<HashSet<EntryId>>;

    // Standard playlists.

    async fn create_playlist(
        &self,
        name: &str,
        created_at: i64,
        tracks: &[EntryId],
    ) -> Result<PlaylistId>;

    async fn rename_playlist(&self, id: PlaylistId, name: &str) -> Result<()>;

    async fn touch_playlist(&self, id: PlaylistId, created_at: i64) -> Result<()>;

    /// Insert tracks at positions, applied element by element in array
    /// order; existing tracks at or above each position shift up first.
    async fn insert_playlist_tracks(
        &self,
        id: PlaylistId,
        inserts: &[(u32, EntryId)],
    ) -> Result<()>;

    /// Move tracks between positions, applied element by element in array
    /// order; each pair is expressed against the state left by the pairs
    /// before it.
    async fn move_playlist_tracks(&self, id: PlaylistId, moves: &[(u32, u32)]) -> Result<()>;

    /// Remove tracks by position, applied element by element in array
    /// order; tracks above each removed position shift down.
    async fn remove_playlist_tracks(&self, id: PlaylistId, positions: &[u32]) -> Result<()>;

    async fn delete_playlist(&self, id: PlaylistId) -> Result<()>;

    async fn playlist(&self, id: PlaylistId) -> Result<StandardPlaylist>;

    async fn playlists(&self) -> Result<Vec<StandardPlaylist>>;

    // Dynamic playlists.

    async fn create_dynamic_playlist(
        &self,
        name: &str,
        query: Option<&DynamicQuery>,
        created_at: i64,
    ) -> Result<PlaylistId>;

    async fn rename_dynamic_playlist(&self, id: PlaylistId, name: &str) -> Result<()>;

    async fn touch_dynamic_playlist(&self, id: PlaylistId, created_at: i64) -> Result<()>;

    async fn set_dynamic_playlist_query(
        &self,
        id: PlaylistId,
        query: Option<&DynamicQuery>,
    ) -> Result<()>;

    async fn delete_dynamic_playlist(&self, id: PlaylistId) -> Result<()>;

    async fn dynamic_playlist(&self, id: PlaylistId) -> Result<DynamicPlaylist>;

    async fn dynamic_playlists(&self) -> Result<Vec<DynamicPlaylist>>;
}

/// The library engine: a backing store plus the in-memory mirror.
///
/// The mirror reflects exactly the committed state of the store after
/// every successful mutation. Mutating calls are expected to come from a
/// single logical writer; the internal lock keeps reads coherent while a
/// mutation is in flight. External writes to the backing store that
/// bypass this engine are out of contract.
pub struct Library {
    store: Box<dyn MediaStore>,
    mirror: RwLock<HashMap<EntryId, MediaEntry>>,
}

impl Library {
    /// Open the engine over a store, filling the mirror with a one-time
    /// full-library read before any operation is accepted.
    pub async fn open(store: Box<dyn MediaStore>) -> Result<Self> {
        let entries = store.load_all().await?;
        info!(entries = entries.len(), "library mirror filled");
        let mirror = entries.into_iter().map(|e| (e.id, e)).collect();
        Ok(Self {
            store,
            mirror: RwLock::new(mirror),
        })
    }

    /// Number of entries currently in the library.
    pub async fn entry_count(&self) -> usize {
        self.mirror.read().await.len()
    }

    /// One entry by id, from the mirror.
    pub async fn entry(&self, id: EntryId) -> Result<MediaEntry> {
        self.mirror
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| LibraryError::not_found("MediaEntry", id))
    }

    /// Add entries to the library, returning their assigned ids.
    ///
    /// Entries whose path already exists are rewritten only when
    /// `update_if_exists`; new entries always enter both the store and
    /// the mirror.
    pub async fn add_media(
        &self,
        entries: Vec<MediaEntry>,
        update_if_exists: bool,
    ) -> Result<Vec<EntryId>> {
        for entry in &entries {
            entry.validate().map_err(|message| LibraryError::InvalidInput {
                field: "entry".to_string(),
                message,
            })?;
        }

        let outcomes = self.store.insert_media(&entries, update_if_exists).await?;
        debug!(entries = entries.len(), "media committed to store");

        let mut mirror = self.mirror.write().await;
        let mut ids = Vec::with_capacity(outcomes.len());
        for (mut entry, outcome) in entries.into_iter().zip(outcomes) {
            entry.id = outcome.id;
            ids.push(outcome.id);
            if !outcome.existed || update_if_exists {
                mirror.insert(outcome.id, entry);
            }
        }
        Ok(ids)
    }

    /// Remove entries by id. All-or-nothing: on any failure the store is
    /// rolled back and the mirror is left untouched.
    pub async fn remove_media(&self, ids: &[EntryId]) -> Result<()> {
        self.store.delete_media(ids).await?;

        let mut mirror = self.mirror.write().await;
        for id in ids {
            mirror.remove(id);
        }
        debug!(removed = ids.len(), "media removed");
        Ok(())
    }

    /// Search the whole library by terms. With no terms this is a
    /// snapshot of the mirror; otherwise the store supplies matching ids
    /// which are hydrated from the mirror.
    pub async fn search_media(
        &self,
        terms: &[String],
        term_fields: &[FieldMask],
        method: SearchMethod,
    ) -> Result<Vec<MediaEntry>> {
        if terms.is_empty() {
            return Ok(self.snapshot().await);
        }
        let term_fields = self.effective_fields(terms, term_fields)?;
        let terms = normalized(terms);
        let ids = self
            .store
            .match_terms(SearchScope::Library, &terms, &term_fields, method)
            .await?;
        self.hydrate(ids).await
    }

    /// Evaluate a dynamic query, optionally intersected with a term
    /// search, and hydrate the result from the mirror.
    pub async fn search_dynamic_query(
        &self,
        query: &DynamicQuery,
        terms: &[String],
        term_fields: &[FieldMask],
        method: SearchMethod,
    ) -> Result<Vec<MediaEntry>> {
        let mut ids = self.store.evaluate_query(query).await?;
        if !terms.is_empty() {
            let term_fields = self.effective_fields(terms, term_fields)?;
            let terms = normalized(terms);
            let term_ids = self
                .store
                .match_terms(SearchScope::Library, &terms, &term_fields, method)
                .await?;
            ids.retain(|id| term_ids.contains(id));
        }
        let mut entries = self.hydrate(ids).await?;
        if let Some(cap) = query.max_results() {
            entries.truncate(cap);
        }
        Ok(entries)
    }

    /// Route a [`SearchRequest`] to the operation matching its kind,
    /// serving whole-collection listings from the mirror when the request
    /// carries no terms.
    pub async fn search_database(&self, request: &SearchRequest) -> Result<Vec<MediaEntry>> {
        match request.kind() {
            SearchKind::Library => {
                self.search_media(request.terms(), request.term_fields(), request.method())
                    .await
            }
            SearchKind::StandardPlaylist(id) => {
                if request.terms().is_empty() {
                    let playlist = self.store.playlist(id).await?;
                    let mirror = self.mirror.read().await;
                    return playlist
                        .tracks
                        .iter()
                        .map(|track| {
                            mirror
                                .get(track)
                                .cloned()
                                .ok_or_else(|| LibraryError::not_found("MediaEntry", *track))
                        })
                        .collect();
                }
                let term_fields = self.effective_fields(request.terms(), request.term_fields())?;
                let terms = normalized(request.terms());
                let ids = self
                    .store
                    .match_terms(
                        SearchScope::Playlist(id),
                        &terms,
                        &term_fields,
                        request.method(),
                    )
                    .await?;
                self.hydrate(ids).await
            }
            SearchKind::DynamicPlaylist(id) => {
                let playlist = self.store.dynamic_playlist(id).await?;
                match playlist.query {
                    // A dynamic playlist without a query has no members.
                    None => Ok(Vec::new()),
                    Some(query) => {
                        self.search_dynamic_query(
                            &query,
                            request.terms(),
                            request.term_fields(),
                            request.method(),
                        )
                        .await
                    }
                }
            }
        }
    }

    // Standard playlist operations.

    /// Create a playlist, empty or pre-populated, with an explicit or
    /// defaulted creation time.
    pub async fn create_standard_playlist(
        &self,
        name: &str,
        created_at: Option<i64>,
        tracks: &[EntryId],
    ) -> Result<PlaylistId> {
        let created_at = created_at.unwrap_or_else(|| chrono::Utc::now().timestamp());
        self.store.create_playlist(name, created_at, tracks).await
    }

    pub async fn rename_standard_playlist(&self, id: PlaylistId, name: &str) -> Result<()> {
        self.store.rename_playlist(id, name).await
    }

    pub async fn touch_standard_playlist(
        &self,
        id: PlaylistId,
        created_at: Option<i64>,
    ) -> Result<()> {
        let created_at = created_at.unwrap_or_else(|| chrono::Utc::now().timestamp());
        self.store.touch_playlist(id, created_at).await
    }

    pub async fn insert_playlist_tracks(
        &self,
        id: PlaylistId,
        inserts: &[(u32, EntryId)],
    ) -> Result<()> {
        self.store.insert_playlist_tracks(id, inserts).await
    }

    pub async fn move_playlist_tracks(&self, id: PlaylistId, moves: &[(u32, u32)]) -> Result<()> {
        self.store.move_playlist_tracks(id, moves).await
    }

    pub async fn remove_playlist_tracks(&self, id: PlaylistId, positions: &[u32]) -> Result<()> {
        self.store.remove_playlist_tracks(id, positions).await
    }

    pub async fn remove_standard_playlist(&self, id: PlaylistId) -> Result<()> {
        self.store.delete_playlist(id).await
    }

    pub async fn standard_playlist(&self, id: PlaylistId) -> Result<StandardPlaylist> {
        self.store.playlist(id).await
    }

    pub async fn standard_playlists(&self) -> Result<Vec<StandardPlaylist>> {
        self.store.playlists().await
    }

    // Dynamic playlist operations.

    pub async fn create_dynamic_playlist(
        &self,
        name: &str,
        query: Option<&DynamicQuery>,
        created_at: Option<i64>,
    ) -> Result<PlaylistId> {
        let created_at = created_at.unwrap_or_else(|| chrono::Utc::now().timestamp());
        self.store
            .create_dynamic_playlist(name, query, created_at)
            .await
    }

    pub async fn rename_dynamic_playlist(&self, id: PlaylistId, name: &str) -> Result<()> {
        self.store.rename_dynamic_playlist(id, name).await
    }

    pub async fn touch_dynamic_playlist(
        &self,
        id: PlaylistId,
        created_at: Option<i64>,
    ) -> Result<()> {
        let created_at = created_at.unwrap_or_else(|| chrono::Utc::now().timestamp());
        self.store.touch_dynamic_playlist(id, created_at).await
    }

    pub async fn set_dynamic_playlist_query(
        &self,
        id: PlaylistId,
        query: Option<&DynamicQuery>,
    ) -> Result<()> {
        self.store.set_dynamic_playlist_query(id, query).await
    }

    pub async fn remove_dynamic_playlist(&self, id: PlaylistId) -> Result<()> {
        self.store.delete_dynamic_playlist(id).await
    }

    pub async fn dynamic_playlist(&self, id: PlaylistId) -> Result<DynamicPlaylist> {
        self.store.dynamic_playlist(id).await
    }

    pub async fn dynamic_playlists(&self) -> Result<Vec<DynamicPlaylist>> {
        self.store.dynamic_playlists().await
    }

    // Internals.

    async fn snapshot(&self) -> Vec<MediaEntry> {
        let mirror = self.mirror.read().await;
        let mut entries: Vec<MediaEntry> = mirror.values().cloned().collect();
        entries.sort_by_key(|e| e.id);
        entries
    }

    /// Hydrate an id set into full records via the mirror, in id order.
    /// Every id a primitive returns must exist in the mirror; a miss
    /// means the consistency invariant was violated and is surfaced as
    /// a missing-entity error.
    async fn hydrate(&self, ids: HashSet<EntryId>) -> Result<Vec<MediaEntry>> {
        let mirror = self.mirror.read().await;
        let mut ids: Vec<EntryId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.into_iter()
            .map(|id| {
                mirror
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| LibraryError::not_found("MediaEntry", id))
            })
            .collect()
    }

    fn effective_fields(&self, terms: &[String], term_fields: &[FieldMask]) -> Result<Vec<FieldMask>> {
        if term_fields.is_empty() {
            return Ok(vec![FieldMask::ALL; terms.len()]);
        }
        if term_fields.len() != terms.len() {
            return Err(LibraryError::invalid_input(
                "term_fields",
                "terms and term fields must have the same length",
            ));
        }
        Ok(term_fields
            .iter()
            .map(|mask| if mask.is_empty() { FieldMask::ALL } else { *mask })
            .collect())
    }
}

fn normalized(terms: &[String]) -> Vec<String> {
    terms.iter().map(|t| normalize(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::fields::MetaField;
    use crate::query::{BoolOp, Comparator};

    async fn open_library() -> Library {
        let store = SqliteStore::new(create_test_pool().await.unwrap());
        Library::open(Box::new(store)).await.unwrap()
    }

    fn entry(path: &str, artist: &str, title: &str) -> MediaEntry {
        let mut e = MediaEntry::new(path);
        e.length_ms = 200_000;
        e.set_field(MetaField::Artist, artist);
        e.set_field(MetaField::Title, title);
        e
    }

    async fn seed(library: &Library) -> Vec<EntryId> {
        let mut rock = entry("/m/rock.mp3", "The Amps", "Tipp City");
        rock.set_field(MetaField::Genre, "Rock");
        rock.set_field(MetaField::Year, "2010");
        let mut jazz = entry("/m/jazz.mp3", "Alice Coltrane", "Blue Nile");
        jazz.set_field(MetaField::Genre, "Jazz");
        jazz.set_field(MetaField::Year, "1970");
        let mut old_rock = entry("/m/old.mp3", "The Sonics", "The Witch");
        old_rock.set_field(MetaField::Genre, "Rock");
        old_rock.set_field(MetaField::Year, "1965");
        library
            .add_media(vec![rock, jazz, old_rock], false)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn open_fills_mirror_from_store() {
        let pool = create_test_pool().await.unwrap();
        let store = SqliteStore::new(pool.clone());
        store
            .insert_media(&[entry("/m/preexisting.mp3", "A", "X")], false)
            .await
            .unwrap();

        let library = Library::open(Box::new(SqliteStore::new(pool))).await.unwrap();
        assert_eq!(library.entry_count().await, 1);
        let all = library.search_media(&[], &[], SearchMethod::NORMAL).await.unwrap();
        assert_eq!(all[0].path, "/m/preexisting.mp3");
    }

    #[tokio::test]
    async fn empty_term_search_is_a_mirror_snapshot() {
        let library = open_library().await;
        let ids = seed(&library).await;

        // Method must not matter when there are no terms.
        for method in [
            SearchMethod::NORMAL,
            SearchMethod::MATCH_ANY_PARAM | SearchMethod::MATCH_ALL_FIELDS,
        ] {
            let all = library.search_media(&[], &[], method).await.unwrap();
            assert_eq!(all.len(), ids.len());
        }
    }

    #[tokio::test]
    async fn mirror_matches_store_after_mutations() {
        let library = open_library().await;
        let ids = seed(&library).await;
        library.remove_media(&ids[1..2]).await.unwrap();

        let mut updated = entry("/m/rock.mp3", "The Amps", "Full On");
        updated.set_field(MetaField::Genre, "Rock");
        library.add_media(vec![updated], true).await.unwrap();

        // Hydrating through the mirror must agree with the store's rows.
        let from_store = library.store.load_all().await.unwrap();
        assert_eq!(from_store.len(), library.entry_count().await);
        for stored in from_store {
            assert_eq!(library.entry(stored.id).await.unwrap(), stored);
        }
    }

    #[tokio::test]
    async fn add_without_update_flag_keeps_mirror_and_store_aligned() {
        let library = open_library().await;
        let ids = seed(&library).await;

        let replaced = library
            .add_media(vec![entry("/m/rock.mp3", "Imposter", "Nope")], false)
            .await
            .unwrap();
        assert_eq!(replaced[0], ids[0]);

        let mirrored = library.entry(ids[0]).await.unwrap();
        assert_eq!(mirrored.field(MetaField::Artist), "The Amps");
        let stored = library.store.load_all().await.unwrap();
        let stored = stored.iter().find(|e| e.id == ids[0]).unwrap();
        assert_eq!(stored.field(MetaField::Artist), "The Amps");
    }

    #[tokio::test]
    async fn failed_remove_leaves_mirror_untouched() {
        let library = open_library().await;
        let ids = seed(&library).await;

        let result = library.remove_media(&[ids[0], 9999]).await;
        assert!(matches!(result, Err(LibraryError::NotFound { .. })));
        assert_eq!(library.entry_count().await, ids.len());
        assert!(library.entry(ids[0]).await.is_ok());
    }

    #[tokio::test]
    async fn add_media_rejects_invalid_entries() {
        let library = open_library().await;
        let result = library.add_media(vec![MediaEntry::new("  ")], false).await;
        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
        assert_eq!(library.entry_count().await, 0);
    }

    #[tokio::test]
    async fn normal_method_requires_every_term_in_some_field() {
        let library = open_library().await;
        let ids = seed(&library).await;

        let hits = library
            .search_media(
                &["rock".to_string(), "2010".to_string()],
                &[],
                SearchMethod::NORMAL,
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, ids[0]);
    }

    #[tokio::test]
    async fn term_search_hydrates_full_records_from_the_mirror() {
        let library = open_library().await;
        seed(&library).await;

        let hits = library
            .search_media(&["coltrane".to_string()], &[], SearchMethod::NORMAL)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].field(MetaField::Title), "Blue Nile");
        assert_eq!(hits[0].field(MetaField::Genre), "Jazz");
    }

    #[tokio::test]
    async fn mismatched_term_fields_are_rejected() {
        let library = open_library().await;
        seed(&library).await;
        let result = library
            .search_media(
                &["rock".to_string()],
                &[FieldMask::ALL, FieldMask::ALL],
                SearchMethod::NORMAL,
            )
            .await;
        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn dynamic_query_search_intersects_with_terms_and_caps_results() {
        let library = open_library().await;
        let ids = seed(&library).await;

        let mut rock = DynamicQuery::new();
        rock.add_condition(MetaField::Genre.into(), Comparator::Eq, "rock", BoolOp::And)
            .unwrap();

        let all_rock = library
            .search_dynamic_query(&rock, &[], &[], SearchMethod::NORMAL)
            .await
            .unwrap();
        assert_eq!(all_rock.len(), 2);

        let recent_rock = library
            .search_dynamic_query(
                &rock,
                &["2010".to_string()],
                &[],
                SearchMethod::NORMAL,
            )
            .await
            .unwrap();
        assert_eq!(recent_rock.len(), 1);
        assert_eq!(recent_rock[0].id, ids[0]);

        let capped = rock.clone().with_max_results(1);
        let hits = library
            .search_dynamic_query(&capped, &[], &[], SearchMethod::NORMAL)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn search_database_routes_library_requests() {
        let library = open_library().await;
        let ids = seed(&library).await;

        let listing = library
            .search_database(&SearchRequest::library())
            .await
            .unwrap();
        assert_eq!(listing.len(), ids.len());

        let filtered = library
            .search_database(&SearchRequest::library().with_term("witch", None))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, ids[2]);
    }

    #[tokio::test]
    async fn search_database_serves_standard_playlists_in_order() {
        let library = open_library().await;
        let ids = seed(&library).await;
        let playlist = library
            .create_standard_playlist("mix", None, &[ids[2], ids[0]])
            .await
            .unwrap();

        let members = library
            .search_database(&SearchRequest::standard_playlist(playlist))
            .await
            .unwrap();
        assert_eq!(
            members.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![ids[2], ids[0]]
        );

        let filtered = library
            .search_database(&SearchRequest::standard_playlist(playlist).with_term("rock", None))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 2);

        let narrowed = library
            .search_database(&SearchRequest::standard_playlist(playlist).with_term("2010", None))
            .await
            .unwrap();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].id, ids[0]);
    }

    #[tokio::test]
    async fn search_database_evaluates_dynamic_playlists() {
        let library = open_library().await;
        let ids = seed(&library).await;

        let mut rock = DynamicQuery::new();
        rock.add_condition(MetaField::Genre.into(), Comparator::Eq, "rock", BoolOp::And)
            .unwrap();
        let playlist = library
            .create_dynamic_playlist("rock box", Some(&rock), None)
            .await
            .unwrap();

        let members = library
            .search_database(&SearchRequest::dynamic_playlist(playlist))
            .await
            .unwrap();
        assert_eq!(
            members.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![ids[0], ids[2]]
        );

        let filtered = library
            .search_database(&SearchRequest::dynamic_playlist(playlist).with_term("witch", None))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, ids[2]);
    }

    #[tokio::test]
    async fn dynamic_playlist_without_query_has_no_members() {
        let library = open_library().await;
        seed(&library).await;
        let playlist = library
            .create_dynamic_playlist("unconfigured", None, None)
            .await
            .unwrap();

        let members = library
            .search_database(&SearchRequest::dynamic_playlist(playlist))
            .await
            .unwrap();
        assert!(members.is_empty());
    }

    #[tokio::test]
    async fn missing_playlist_surfaces_not_found() {
        let library = open_library().await;
        let result = library
            .search_database(&SearchRequest::standard_playlist(404))
            .await;
        assert!(matches!(result, Err(LibraryError::NotFound { .. })));
    }
}
