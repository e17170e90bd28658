//! SQLite realization of the storage contract.
//!
//! Every mutating primitive runs inside one transaction and commits or
//! rolls back atomically. Term and query matching runs against the
//! normalized `searchable` column of `media_fields`; group nodes of a
//! dynamic query are combined with in-process set algebra, one statement
//! per leaf.

use crate::db::{create_pool, DatabaseConfig};
use crate::error::{LibraryError, Result};
use crate::fields::{normalize, FieldMask, MetaField};
use crate::models::{DynamicPlaylist, EntryId, MediaEntry, PlaylistId, StandardPlaylist};
use crate::query::{Comparator, DynamicQuery, GroupOp, SearchNode};
use crate::search::SearchMethod;
use crate::store::{MediaStore, SearchScope, StoredEntry};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use sqlx::{query, query_as, Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// SQLite-backed media store over a connection pool.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an existing pool (schema already migrated).
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database described by `config`.
    pub async fn open(config: DatabaseConfig) -> Result<Self> {
        Ok(Self::new(create_pool(config).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Write one entry's field rows: non-empty values are upserted with
    /// their searchable copy, empty values delete the row so the model
    /// stays free of placeholder rows.
    async fn write_fields(
        tx: &mut SqliteConnection,
        item_id: EntryId,
        entry: &MediaEntry,
    ) -> Result<()> {
        for field in MetaField::ALL_FIELDS {
            let value = entry.field(field);
            if value.trim().is_empty() {
                query("DELETE FROM media_fields WHERE item_id = ? AND field_id = ?")
                    .bind(item_id)
                    .bind(field.index() as i64)
                    .execute(&mut *tx)
                    .await?;
            } else {
                query(
                    r#"
                    INSERT INTO media_fields (item_id, field_id, value, searchable)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT(item_id, field_id)
                    DO UPDATE SET value = excluded.value, searchable = excluded.searchable
                    "#,
                )
                .bind(item_id)
                .bind(field.index() as i64)
                .bind(value)
                .bind(normalize(value))
                .execute(&mut *tx)
                .await?;
            }
        }
        Ok(())
    }

    /// Ids matching one normalized term against one field's searchable
    /// values.
    async fn field_term_ids(&self, field: MetaField, pattern: &str) -> Result<HashSet<EntryId>> {
        let rows: Vec<(i64,)> = query_as(
            "SELECT item_id FROM media_fields WHERE field_id = ? AND searchable LIKE ?",
        )
        .bind(field.index() as i64)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Ids matching one normalized term under its field mask.
    async fn term_ids(
        &self,
        term: &str,
        mask: FieldMask,
        all_fields: bool,
    ) -> Result<HashSet<EntryId>> {
        let pattern = format!("%{term}%");

        // No restriction (or the aggregate mask): one statement over every
        // field; "all fields" degenerates to "any" because requiring every
        // field of the scheme would be vacuous.
        if mask.is_empty() || mask.is_all() {
            let rows: Vec<(i64,)> =
                query_as("SELECT DISTINCT item_id FROM media_fields WHERE searchable LIKE ?")
                    .bind(&pattern)
                    .fetch_all(&self.pool)
                    .await?;
            return Ok(rows.into_iter().map(|(id,)| id).collect());
        }

        let mut combined: Option<HashSet<EntryId>> = None;
        for field in mask.iter() {
            let ids = self.field_term_ids(field, &pattern).await?;
            combined = Some(match combined {
                None => ids,
                Some(acc) if all_fields => acc.intersection(&ids).copied().collect(),
                Some(mut acc) => {
                    acc.extend(ids);
                    acc
                }
            });
        }
        Ok(combined.unwrap_or_default())
    }

    fn eval_node<'a>(&'a self, node: &'a SearchNode) -> BoxFuture<'a, Result<HashSet<EntryId>>> {
        async move {
            match node {
                SearchNode::Leaf {
                    fields,
                    comparator,
                    term,
                } => self.eval_leaf(*fields, *comparator, term).await,
                SearchNode::Group { first, op, second } => match op {
                    GroupOp::Group => self.eval_node(first).await,
                    GroupOp::And | GroupOp::Or => {
                        let second = second.as_deref().ok_or_else(|| {
                            LibraryError::invalid_input(
                                "query",
                                "a binary group node is missing its second child",
                            )
                        })?;
                        let left = self.eval_node(first).await?;
                        let right = self.eval_node(second).await?;
                        Ok(match op {
                            GroupOp::And => left.intersection(&right).copied().collect(),
                            _ => left.union(&right).copied().collect(),
                        })
                    }
                },
            }
        }
        .boxed()
    }

    /// One statement per field bit of the leaf; the leaf matches an entry
    /// when any of its field bits matches.
    async fn eval_leaf(
        &self,
        mask: FieldMask,
        comparator: Comparator,
        term: &str,
    ) -> Result<HashSet<EntryId>> {
        let mask = if mask.is_empty() { FieldMask::ALL } else { mask };
        let op = match comparator {
            Comparator::Like => None,
            Comparator::Eq => Some("="),
            Comparator::Ne => Some("<>"),
            Comparator::Gt => Some(">"),
            Comparator::Lt => Some("<"),
            Comparator::Ge => Some(">="),
            Comparator::Le => Some("<="),
        };
        let mut result = HashSet::new();
        for field in mask.iter() {
            let rows: Vec<(i64,)> = match op {
                None => {
                    query_as(
                        "SELECT item_id FROM media_fields WHERE field_id = ? AND searchable LIKE ?",
                    )
                    .bind(field.index() as i64)
                    .bind(format!("%{term}%"))
                    .fetch_all(&self.pool)
                    .await?
                }
                Some(op) => {
                    // Numeric fields order as integers, string fields as
                    // normalized text.
                    let sql = if field.is_string() {
                        format!(
                            "SELECT item_id FROM media_fields \
                             WHERE field_id = ? AND searchable {op} ?"
                        )
                    } else {
                        format!(
                            "SELECT item_id FROM media_fields \
                             WHERE field_id = ? AND CAST(value AS INTEGER) {op} CAST(? AS INTEGER)"
                        )
                    };
                    query_as(&sql)
                        .bind(field.index() as i64)
                        .bind(term)
                        .fetch_all(&self.pool)
                        .await?
                }
            };
            result.extend(rows.into_iter().map(|(id,)| id));
        }
        Ok(result)
    }

    async fn playlist_member_ids(&self, id: PlaylistId) -> Result<HashSet<EntryId>> {
        self.require_playlist(id).await?;
        let rows: Vec<(i64,)> =
            query_as("SELECT item_id FROM playlist_tracks WHERE playlist_id = ?")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(item,)| item).collect())
    }

    async fn require_playlist(&self, id: PlaylistId) -> Result<()> {
        let row: Option<(i64,)> = query_as("SELECT id FROM playlists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|_| ())
            .ok_or_else(|| LibraryError::not_found("Playlist", id))
    }

    async fn track_count(tx: &mut SqliteConnection, id: PlaylistId) -> Result<i64> {
        let (count,): (i64,) =
            query_as("SELECT COUNT(*) FROM playlist_tracks WHERE playlist_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        Ok(count)
    }

    async fn require_playlist_tx(tx: &mut SqliteConnection, id: PlaylistId) -> Result<()> {
        let row: Option<(i64,)> = query_as("SELECT id FROM playlists WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        row.map(|_| ())
            .ok_or_else(|| LibraryError::not_found("Playlist", id))
    }

    /// Shift positions `>= from` up by one. Runs as a sign-flip two-step
    /// so the (playlist, position) primary key is never transiently
    /// violated mid-update.
    async fn shift_up(tx: &mut SqliteConnection, id: PlaylistId, from: u32) -> Result<()> {
        query(
            "UPDATE playlist_tracks SET position = -(position + 1) \
             WHERE playlist_id = ? AND position >= ?",
        )
        .bind(id)
        .bind(from as i64)
        .execute(&mut *tx)
        .await?;
        query("UPDATE playlist_tracks SET position = -position WHERE playlist_id = ? AND position < 0")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Ok(())
    }

    /// Shift positions `> above` down by one, closing the gap at `above`.
    async fn shift_down(tx: &mut SqliteConnection, id: PlaylistId, above: u32) -> Result<()> {
        query(
            "UPDATE playlist_tracks SET position = -(position - 1) \
             WHERE playlist_id = ? AND position > ?",
        )
        .bind(id)
        .bind(above as i64)
        .execute(&mut *tx)
        .await?;
        query("UPDATE playlist_tracks SET position = -position WHERE playlist_id = ? AND position < 0")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MediaStore for SqliteStore {
    async fn load_all(&self) -> Result<Vec<MediaEntry>> {
        let items: Vec<(i64, String, i64, i64)> =
            query_as("SELECT id, path, length_ms, time_added FROM media_items ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        let mut entries: HashMap<EntryId, MediaEntry> = items
            .into_iter()
            .map(|(id, path, length_ms, time_added)| {
                let mut entry = MediaEntry::new(path);
                entry.id = id;
                entry.length_ms = length_ms;
                entry.time_added = time_added;
                (id, entry)
            })
            .collect();

        let fields: Vec<(i64, i64, String)> =
            query_as("SELECT item_id, field_id, value FROM media_fields")
                .fetch_all(&self.pool)
                .await?;
        for (item_id, field_id, value) in fields {
            if let (Some(entry), Some(field)) = (
                entries.get_mut(&item_id),
                MetaField::from_index(field_id as usize),
            ) {
                entry.set_field(field, value);
            }
        }

        let mut entries: Vec<MediaEntry> = entries.into_values().collect();
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }

    async fn insert_media(
        &self,
        entries: &[MediaEntry],
        update_existing: bool,
    ) -> Result<Vec<StoredEntry>> {
        let mut tx: Transaction<'_, Sqlite> = self.pool.begin().await?;
        let mut outcomes = Vec::with_capacity(entries.len());

        for entry in entries {
            let existing: Option<(i64,)> = query_as("SELECT id FROM media_items WHERE path = ?")
                .bind(&entry.path)
                .fetch_optional(&mut *tx)
                .await?;

            let outcome = match existing {
                Some((id,)) => {
                    if update_existing {
                        query("UPDATE media_items SET length_ms = ?, time_added = ? WHERE id = ?")
                            .bind(entry.length_ms)
                            .bind(entry.time_added)
                            .bind(id)
                            .execute(&mut *tx)
                            .await?;
                        Self::write_fields(&mut *tx, id, entry).await?;
                    }
                    StoredEntry { id, existed: true }
                }
                None => {
                    let result =
                        query("INSERT INTO media_items (path, length_ms, time_added) VALUES (?, ?, ?)")
                            .bind(&entry.path)
                            .bind(entry.length_ms)
                            .bind(entry.time_added)
                            .execute(&mut *tx)
                            .await?;
                    let id = result.last_insert_rowid();
                    Self::write_fields(&mut *tx, id, entry).await?;
                    StoredEntry { id, existed: false }
                }
            };
            outcomes.push(outcome);
        }

        tx.commit().await?;
        debug!(entries = entries.len(), "insert_media committed");
        Ok(outcomes)
    }

    async fn delete_media(&self, ids: &[EntryId]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for id in ids {
            // Drop playlist memberships first, closing each position gap
            // so the dense 0..n-1 invariant survives the removal.
            // Descending position order keeps later shifts from moving
            // rows this loop still has to delete.
            let memberships: Vec<(i64, i64)> = query_as(
                "SELECT playlist_id, position FROM playlist_tracks \
                 WHERE item_id = ? ORDER BY playlist_id, position DESC",
            )
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
            for (playlist_id, position) in memberships {
                query("DELETE FROM playlist_tracks WHERE playlist_id = ? AND position = ?")
                    .bind(playlist_id)
                    .bind(position)
                    .execute(&mut *tx)
                    .await?;
                Self::shift_down(&mut *tx, playlist_id, position as u32).await?;
            }

            query("DELETE FROM media_fields WHERE item_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            let result = query("DELETE FROM media_items WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                // Rolls back every removal in this call.
                return Err(LibraryError::not_found("MediaEntry", *id));
            }
        }

        tx.commit().await?;
        debug!(removed = ids.len(), "delete_media committed");
        Ok(())
    }

    async fn match_terms(
        &self,
        scope: SearchScope,
        terms: &[String],
        term_fields: &[FieldMask],
        method: SearchMethod,
    ) -> Result<HashSet<EntryId>> {
        if terms.len() != term_fields.len() {
            return Err(LibraryError::invalid_input(
                "term_fields",
                "terms and term fields must have the same length",
            ));
        }

        if terms.is_empty() {
            return match scope {
                SearchScope::Library => {
                    let rows: Vec<(i64,)> = query_as("SELECT id FROM media_items")
                        .fetch_all(&self.pool)
                        .await?;
                    Ok(rows.into_iter().map(|(id,)| id).collect())
                }
                SearchScope::Playlist(id) => self.playlist_member_ids(id).await,
            };
        }

        let mut combined: Option<HashSet<EntryId>> = None;
        for (term, mask) in terms.iter().zip(term_fields) {
            let ids = self
                .term_ids(&normalize(term), *mask, method.all_fields())
                .await?;
            combined = Some(match combined {
                None => ids,
                Some(acc) if method.any_param() => acc.union(&ids).copied().collect(),
                Some(acc) => acc.intersection(&ids).copied().collect(),
            });
        }
        let mut result = combined.unwrap_or_default();

        if let SearchScope::Playlist(id) = scope {
            let members = self.playlist_member_ids(id).await?;
            result.retain(|entry| members.contains(entry));
        }
        Ok(result)
    }

    async fn evaluate_query(&self, query: &DynamicQuery) -> Result<HashSet<EntryId>> {
        match query.root() {
            None => Ok(HashSet::new()),
            Some(root) => self.eval_node(root).await,
        }
    }

    async fn create_playlist(
        &self,
        name: &str,
        created_at: i64,
        tracks: &[EntryId],
    ) -> Result<PlaylistId> {
        let mut tx = self.pool.begin().await?;
        let result = query("INSERT INTO playlists (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        let id = result.last_insert_rowid();

        for (position, item) in tracks.iter().enumerate() {
            query("INSERT INTO playlist_tracks (playlist_id, position, item_id) VALUES (?, ?, ?)")
                .bind(id)
                .bind(position as i64)
                .bind(item)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(playlist = id, tracks = tracks.len(), "playlist created");
        Ok(id)
    }

    async fn rename_playlist(&self, id: PlaylistId, name: &str) -> Result<()> {
        let result = query("UPDATE playlists SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("Playlist", id));
        }
        Ok(())
    }

    async fn touch_playlist(&self, id: PlaylistId, created_at: i64) -> Result<()> {
        let result = query("UPDATE playlists SET created_at = ? WHERE id = ?")
            .bind(created_at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("Playlist", id));
        }
        Ok(())
    }

    async fn insert_playlist_tracks(
        &self,
        id: PlaylistId,
        inserts: &[(u32, EntryId)],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::require_playlist_tx(&mut *tx, id).await?;

        for (position, item) in inserts {
            let count = Self::track_count(&mut *tx, id).await?;
            if i64::from(*position) > count {
                return Err(LibraryError::invalid_input(
                    "position",
                    format!("insert position {position} exceeds playlist length {count}"),
                ));
            }
            Self::shift_up(&mut *tx, id, *position).await?;
            query("INSERT INTO playlist_tracks (playlist_id, position, item_id) VALUES (?, ?, ?)")
                .bind(id)
                .bind(*position as i64)
                .bind(item)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn move_playlist_tracks(&self, id: PlaylistId, moves: &[(u32, u32)]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::require_playlist_tx(&mut *tx, id).await?;

        // Each pair is applied as lift-out, close the gap, reopen at the
        // target, drop back in. Positions stay dense after every pair, and
        // the inverse pair (new -> old) undoes the move exactly.
        for (old, new) in moves {
            let row: Option<(i64,)> = query_as(
                "SELECT item_id FROM playlist_tracks WHERE playlist_id = ? AND position = ?",
            )
            .bind(id)
            .bind(*old as i64)
            .fetch_optional(&mut *tx)
            .await?;
            let (item,) = row.ok_or_else(|| {
                LibraryError::not_found("PlaylistTrack", format!("{id}@{old}"))
            })?;

            query("DELETE FROM playlist_tracks WHERE playlist_id = ? AND position = ?")
                .bind(id)
                .bind(*old as i64)
                .execute(&mut *tx)
                .await?;
            Self::shift_down(&mut *tx, id, *old).await?;

            let count = Self::track_count(&mut *tx, id).await?;
            if i64::from(*new) > count {
                return Err(LibraryError::invalid_input(
                    "position",
                    format!("move target {new} exceeds playlist length {count}"),
                ));
            }
            Self::shift_up(&mut *tx, id, *new).await?;
            query("INSERT INTO playlist_tracks (playlist_id, position, item_id) VALUES (?, ?, ?)")
                .bind(id)
                .bind(*new as i64)
                .bind(item)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove_playlist_tracks(&self, id: PlaylistId, positions: &[u32]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::require_playlist_tx(&mut *tx, id).await?;

        for position in positions {
            let result = query("DELETE FROM playlist_tracks WHERE playlist_id = ? AND position = ?")
                .bind(id)
                .bind(*position as i64)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(LibraryError::not_found(
                    "PlaylistTrack",
                    format!("{id}@{position}"),
                ));
            }
            Self::shift_down(&mut *tx, id, *position).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_playlist(&self, id: PlaylistId) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        query("DELETE FROM playlist_tracks WHERE playlist_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("Playlist", id));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn playlist(&self, id: PlaylistId) -> Result<StandardPlaylist> {
        let row: Option<(i64, String, i64)> =
            query_as("SELECT id, name, created_at FROM playlists WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let (id, name, created_at) =
            row.ok_or_else(|| LibraryError::not_found("Playlist", id))?;

        let tracks: Vec<(i64,)> = query_as(
            "SELECT item_id FROM playlist_tracks WHERE playlist_id = ? ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(StandardPlaylist {
            id,
            name,
            created_at,
            tracks: tracks.into_iter().map(|(item,)| item).collect(),
        })
    }

    async fn playlists(&self) -> Result<Vec<StandardPlaylist>> {
        let rows: Vec<(i64, String, i64)> =
            query_as("SELECT id, name, created_at FROM playlists ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;

        let members: Vec<(i64, i64)> = query_as(
            "SELECT playlist_id, item_id FROM playlist_tracks ORDER BY playlist_id, position",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut tracks_by_playlist: HashMap<i64, Vec<EntryId>> = HashMap::new();
        for (playlist_id, item_id) in members {
            tracks_by_playlist.entry(playlist_id).or_default().push(item_id);
        }

        Ok(rows
            .into_iter()
            .map(|(id, name, created_at)| StandardPlaylist {
                id,
                name,
                created_at,
                tracks: tracks_by_playlist.remove(&id).unwrap_or_default(),
            })
            .collect())
    }

    async fn create_dynamic_playlist(
        &self,
        name: &str,
        dynamic_query: Option<&DynamicQuery>,
        created_at: i64,
    ) -> Result<PlaylistId> {
        let blob = dynamic_query.map(|q| q.to_blob()).transpose()?;
        let result = query("INSERT INTO dynamic_playlists (name, query, created_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(blob)
            .bind(created_at)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn rename_dynamic_playlist(&self, id: PlaylistId, name: &str) -> Result<()> {
        let result = query("UPDATE dynamic_playlists SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("DynamicPlaylist", id));
        }
        Ok(())
    }

    async fn touch_dynamic_playlist(&self, id: PlaylistId, created_at: i64) -> Result<()> {
        let result = query("UPDATE dynamic_playlists SET created_at = ? WHERE id = ?")
            .bind(created_at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("DynamicPlaylist", id));
        }
        Ok(())
    }

    async fn set_dynamic_playlist_query(
        &self,
        id: PlaylistId,
        dynamic_query: Option<&DynamicQuery>,
    ) -> Result<()> {
        let blob = dynamic_query.map(|q| q.to_blob()).transpose()?;
        let result = query("UPDATE dynamic_playlists SET query = ? WHERE id = ?")
            .bind(blob)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("DynamicPlaylist", id));
        }
        Ok(())
    }

    async fn delete_dynamic_playlist(&self, id: PlaylistId) -> Result<()> {
        let result = query("DELETE FROM dynamic_playlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("DynamicPlaylist", id));
        }
        Ok(())
    }

    async fn dynamic_playlist(&self, id: PlaylistId) -> Result<DynamicPlaylist> {
        let row: Option<(i64, String, Option<Vec<u8>>, i64)> =
            query_as("SELECT id, name, query, created_at FROM dynamic_playlists WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let (id, name, blob, created_at) =
            row.ok_or_else(|| LibraryError::not_found("DynamicPlaylist", id))?;
        Ok(DynamicPlaylist {
            id,
            name,
            created_at,
            query: blob.as_deref().map(DynamicQuery::from_blob).transpose()?,
        })
    }

    async fn dynamic_playlists(&self) -> Result<Vec<DynamicPlaylist>> {
        let rows: Vec<(i64, String, Option<Vec<u8>>, i64)> =
            query_as("SELECT id, name, query, created_at FROM dynamic_playlists ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter()
            .map(|(id, name, blob, created_at)| {
                Ok(DynamicPlaylist {
                    id,
                    name,
                    created_at,
                    query: blob.as_deref().map(DynamicQuery::from_blob).transpose()?,
                })
            })
            .collect()
    }
}
