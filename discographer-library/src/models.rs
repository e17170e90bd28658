//! Domain models for the media library.

use crate::fields::MetaField;
use crate::query::DynamicQuery;
use serde::{Deserialize, Serialize};

/// Store-assigned identifier of a media entry. Zero until assigned.
pub type EntryId = i64;

/// Store-assigned identifier of a playlist (standard or dynamic).
pub type PlaylistId = i64;

/// One track: identity, timestamps, and a sparse set of field values
/// indexed by the field's dense index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    /// Backing-store assigned id; zero for entries not yet persisted.
    pub id: EntryId,
    /// Unique source path of the media file.
    pub path: String,
    /// Track length in milliseconds.
    pub length_ms: i64,
    /// Unix timestamp of when the entry was added to the library.
    pub time_added: i64,
    fields: Vec<Option<String>>,
}

impl MediaEntry {
    /// New unsaved entry for a path, timestamped now, with no field values.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            id: 0,
            path: path.into(),
            length_ms: 0,
            time_added: chrono::Utc::now().timestamp(),
            fields: vec![None; MetaField::COUNT],
        }
    }

    /// Value of a field, or the empty string when unset.
    pub fn field(&self, field: MetaField) -> &str {
        self.fields[field.index()].as_deref().unwrap_or("")
    }

    /// Set a field value. Setting an empty or whitespace-only value clears
    /// the field instead of storing a placeholder.
    pub fn set_field(&mut self, field: MetaField, value: impl Into<String>) {
        let value = value.into();
        self.fields[field.index()] = if value.trim().is_empty() {
            None
        } else {
            Some(value)
        };
    }

    /// Clear a field value.
    pub fn clear_field(&mut self, field: MetaField) {
        self.fields[field.index()] = None;
    }

    /// Iterate the fields that currently hold a value.
    pub fn set_fields(&self) -> impl Iterator<Item = (MetaField, &str)> {
        MetaField::ALL_FIELDS.into_iter().filter_map(|field| {
            self.fields[field.index()]
                .as_deref()
                .map(|value| (field, value))
        })
    }

    /// Validate entry data before it is handed to the store.
    pub fn validate(&self) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("entry path cannot be empty".to_string());
        }
        if self.length_ms < 0 {
            return Err("entry length cannot be negative".to_string());
        }
        Ok(())
    }
}

/// An explicitly ordered playlist. Track positions are dense `0..n-1`
/// at all times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardPlaylist {
    pub id: PlaylistId,
    pub name: String,
    pub created_at: i64,
    /// Entry ids in playback order.
    pub tracks: Vec<EntryId>,
}

/// A playlist whose membership is recomputed by evaluating its stored
/// query at search time; it is never materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicPlaylist {
    pub id: PlaylistId,
    pub name: String,
    pub created_at: i64,
    pub query: Option<DynamicQuery>,
}
