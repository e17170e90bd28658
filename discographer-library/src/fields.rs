//! Searchable metadata fields and multi-key ordering.
//!
//! Every field carries a power-of-two flag so sets of fields can be packed
//! into a [`FieldMask`]. A field's dense index (used to key per-field rows
//! in the store and the sparse value array on an entry) is `log2(flag)`.

use crate::error::{LibraryError, Result};
use crate::models::MediaEntry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::BitOr;

/// One searchable metadata field.
///
/// Discriminants are exact powers of two; the aggregate "all fields" value
/// lives on [`FieldMask`], never here.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetaField {
    Artist = 1,
    Title = 1 << 1,
    Album = 1 << 2,
    AlbumArtist = 1 << 3,
    Comment = 1 << 4,
    Composer = 1 << 5,
    Genre = 1 << 6,
    TrackNumber = 1 << 7,
    DiscNumber = 1 << 8,
    Year = 1 << 9,
}

impl MetaField {
    /// Every real field, in flag order.
    pub const ALL_FIELDS: [MetaField; 10] = [
        MetaField::Artist,
        MetaField::Title,
        MetaField::Album,
        MetaField::AlbumArtist,
        MetaField::Comment,
        MetaField::Composer,
        MetaField::Genre,
        MetaField::TrackNumber,
        MetaField::DiscNumber,
        MetaField::Year,
    ];

    /// Number of real fields.
    pub const COUNT: usize = Self::ALL_FIELDS.len();

    /// The power-of-two flag value.
    pub fn flag(self) -> u32 {
        self as u32
    }

    /// Dense index derived from the flag (`log2(flag)`).
    pub fn index(self) -> usize {
        (self as u32).trailing_zeros() as usize
    }

    /// Field for a dense index, if one exists.
    pub fn from_index(index: usize) -> Option<MetaField> {
        Self::ALL_FIELDS.get(index).copied()
    }

    /// Friendly display name.
    pub fn name(self) -> &'static str {
        match self {
            MetaField::Artist => "Artist",
            MetaField::Title => "Title",
            MetaField::Album => "Album",
            MetaField::AlbumArtist => "Album Artist",
            MetaField::Comment => "Comment",
            MetaField::Composer => "Composer",
            MetaField::Genre => "Genre",
            MetaField::TrackNumber => "Track Number",
            MetaField::DiscNumber => "Disc Number",
            MetaField::Year => "Year",
        }
    }

    /// Whether values of this field order as text. Non-string fields hold
    /// unsigned integers and compare numerically.
    pub fn is_string(self) -> bool {
        !matches!(
            self,
            MetaField::TrackNumber | MetaField::DiscNumber | MetaField::Year
        )
    }
}

/// A set of fields packed as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FieldMask(u32);

impl FieldMask {
    /// No field selected.
    pub const NONE: FieldMask = FieldMask(0);

    /// Every real field; means "search each field independently".
    pub const ALL: FieldMask = FieldMask((1 << MetaField::COUNT as u32) - 1);

    /// Raw bit value.
    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_all(self) -> bool {
        self.0 == Self::ALL.0
    }

    pub fn contains(self, field: MetaField) -> bool {
        self.0 & field.flag() != 0
    }

    pub fn insert(&mut self, field: MetaField) {
        self.0 |= field.flag();
    }

    /// Iterate the fields whose bits are set, in flag order.
    pub fn iter(self) -> impl Iterator<Item = MetaField> {
        MetaField::ALL_FIELDS
            .into_iter()
            .filter(move |f| self.contains(*f))
    }
}

impl From<MetaField> for FieldMask {
    fn from(field: MetaField) -> Self {
        FieldMask(field.flag())
    }
}

impl BitOr for FieldMask {
    type Output = FieldMask;
    fn bitor(self, rhs: FieldMask) -> FieldMask {
        FieldMask(self.0 | rhs.0)
    }
}

impl BitOr<MetaField> for FieldMask {
    type Output = FieldMask;
    fn bitor(self, rhs: MetaField) -> FieldMask {
        FieldMask(self.0 | rhs.flag())
    }
}

impl BitOr for MetaField {
    type Output = FieldMask;
    fn bitor(self, rhs: MetaField) -> FieldMask {
        FieldMask(self.flag() | rhs.flag())
    }
}

/// Dense index of the lowest set field in `mask`.
///
/// Field-id derivation is undefined for the empty mask, so that case is an
/// error rather than `log2(0)`.
pub fn field_index(mask: FieldMask) -> Result<usize> {
    if mask.is_empty() {
        return Err(LibraryError::invalid_input(
            "field",
            "cannot derive a field id from an empty mask",
        ));
    }
    Ok(mask.bits().trailing_zeros() as usize)
}

/// Normalized ("searchable") form of a metadata value: trimmed and
/// lower-cased. All term and query matching runs against this form.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Direction for one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

// Per-entry decorated key so a malformed numeric value is an error before
// ordering starts, instead of a panic mid-sort.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Number(u64),
    Text(String),
}

fn sort_key(entry: &MediaEntry, field: MetaField) -> Result<SortKey> {
    let value = entry.field(field);
    if field.is_string() {
        return Ok(SortKey::Text(value.to_lowercase()));
    }
    if value.is_empty() {
        // Missing values compare as empty, which orders before any number.
        return Ok(SortKey::Number(0));
    }
    let number = value.trim().parse::<u64>().map_err(|_| {
        LibraryError::invalid_input(
            field.name(),
            format!("expected an unsigned integer, got {value:?}"),
        )
    })?;
    Ok(SortKey::Number(number))
}

/// Compare two entries by an ordered priority list of fields.
///
/// `keys` and `directions` are parallel arrays; the first field whose
/// values differ decides the ordering.
pub fn compare_entries(
    a: &MediaEntry,
    b: &MediaEntry,
    keys: &[MetaField],
    directions: &[SortDirection],
) -> Result<Ordering> {
    if keys.len() != directions.len() {
        return Err(LibraryError::invalid_input(
            "directions",
            "sort keys and directions must have the same length",
        ));
    }
    for (field, direction) in keys.iter().zip(directions) {
        let ka = sort_key(a, *field)?;
        let kb = sort_key(b, *field)?;
        let ordering = match direction {
            SortDirection::Ascending => ka.cmp(&kb),
            SortDirection::Descending => kb.cmp(&ka),
        };
        if ordering != Ordering::Equal {
            return Ok(ordering);
        }
    }
    Ok(Ordering::Equal)
}

/// Sort entries in place by the given priority fields and directions.
///
/// Fails up front if a non-string field holds a non-numeric value.
pub fn sort_entries(
    entries: &mut Vec<MediaEntry>,
    keys: &[MetaField],
    directions: &[SortDirection],
) -> Result<()> {
    if keys.len() != directions.len() {
        return Err(LibraryError::invalid_input(
            "directions",
            "sort keys and directions must have the same length",
        ));
    }

    let mut decorated = Vec::with_capacity(entries.len());
    for entry in entries.drain(..) {
        let mut entry_keys = Vec::with_capacity(keys.len());
        for field in keys {
            entry_keys.push(sort_key(&entry, *field)?);
        }
        decorated.push((entry_keys, entry));
    }

    decorated.sort_by(|(ka, _), (kb, _)| {
        for ((a, b), direction) in ka.iter().zip(kb).zip(directions) {
            let ordering = match direction {
                SortDirection::Ascending => a.cmp(b),
                SortDirection::Descending => b.cmp(a),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    entries.extend(decorated.into_iter().map(|(_, entry)| entry));
    Ok(())
}
