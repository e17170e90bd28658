//! # Discographer Library
//!
//! The search-and-persistence engine of a personal media library:
//! track metadata, ordered standard playlists, query-defined dynamic
//! playlists, and a search layer combining free-text terms, field
//! filters, and boolean query trees.
//!
//! ## Overview
//!
//! - [`fields`] - the bitmask field scheme and multi-key sort comparator
//! - [`models`] - media entries and both playlist flavors
//! - [`query`] - the serializable boolean dynamic-query tree
//! - [`search`] - search request and method value objects
//! - [`store`] - the storage contract, the mirror-keeping [`Library`]
//!   engine, and its SQLite realization
//! - [`db`] - connection pooling and embedded migrations
//!
//! Unfiltered whole-library reads are served from the engine's in-memory
//! mirror; everything else is delegated to the backing store and hydrated
//! back through the mirror.

pub mod db;
pub mod error;
pub mod fields;
pub mod models;
pub mod query;
pub mod search;
pub mod store;

pub use error::{LibraryError, Result};
pub use fields::{FieldMask, MetaField, SortDirection};
pub use models::{DynamicPlaylist, EntryId, MediaEntry, PlaylistId, StandardPlaylist};
pub use query::{BoolOp, Comparator, DynamicQuery, GroupOp, SearchNode};
pub use search::{SearchKind, SearchMethod, SearchRequest};
pub use store::{Library, MediaStore, SearchScope, SqliteStore, StoredEntry};
