//! Search request value objects.

use crate::fields::FieldMask;
use crate::models::PlaylistId;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Two independent binary choices packed into one bitmask: how per-term
/// id sets combine across terms, and how a term's field bits combine
/// within the term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMethod(u32);

impl SearchMethod {
    /// Union of per-term id sets.
    pub const MATCH_ANY_PARAM: SearchMethod = SearchMethod(1);
    /// Intersection of per-term id sets (the default).
    pub const MATCH_ALL_PARAMS: SearchMethod = SearchMethod(1 << 1);
    /// A term matches if any of its field bits matches (the default).
    pub const MATCH_ANY_FIELD: SearchMethod = SearchMethod(1 << 2);
    /// A term matches only if every one of its field bits matches.
    pub const MATCH_ALL_FIELDS: SearchMethod = SearchMethod(1 << 3);

    /// Intersect across terms, OR within a term's fields.
    pub const NORMAL: SearchMethod =
        SearchMethod(Self::MATCH_ALL_PARAMS.0 | Self::MATCH_ANY_FIELD.0);

    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether per-term sets combine by union rather than intersection.
    pub fn any_param(self) -> bool {
        self.0 & Self::MATCH_ANY_PARAM.0 != 0
    }

    /// Whether every field bit of a term must match.
    pub fn all_fields(self) -> bool {
        self.0 & Self::MATCH_ALL_FIELDS.0 != 0
    }
}

impl Default for SearchMethod {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl BitOr for SearchMethod {
    type Output = SearchMethod;
    fn bitor(self, rhs: SearchMethod) -> SearchMethod {
        SearchMethod(self.0 | rhs.0)
    }
}

/// What a search targets. The target is fixed at construction time, so a
/// request built for one scope can never be rerouted to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchKind {
    /// The whole library.
    Library,
    /// Members of an ordered playlist.
    StandardPlaylist(PlaylistId),
    /// Members computed from a dynamic playlist's stored query.
    DynamicPlaylist(PlaylistId),
}

/// A value object describing one search: its target, free-text terms,
/// per-term field filters, and combination method.
///
/// `terms` and `term_fields` are parallel arrays kept in lock step by
/// [`Self::push_term`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    kind: SearchKind,
    terms: Vec<String>,
    term_fields: Vec<FieldMask>,
    method: SearchMethod,
}

impl SearchRequest {
    fn new(kind: SearchKind) -> Self {
        Self {
            kind,
            terms: Vec::new(),
            term_fields: Vec::new(),
            method: SearchMethod::NORMAL,
        }
    }

    /// Request against the whole library.
    pub fn library() -> Self {
        Self::new(SearchKind::Library)
    }

    /// Request against one standard playlist's members.
    pub fn standard_playlist(id: PlaylistId) -> Self {
        Self::new(SearchKind::StandardPlaylist(id))
    }

    /// Request against a dynamic playlist's computed members.
    pub fn dynamic_playlist(id: PlaylistId) -> Self {
        Self::new(SearchKind::DynamicPlaylist(id))
    }

    pub fn kind(&self) -> SearchKind {
        self.kind
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn term_fields(&self) -> &[FieldMask] {
        &self.term_fields
    }

    pub fn method(&self) -> SearchMethod {
        self.method
    }

    pub fn with_method(mut self, method: SearchMethod) -> Self {
        self.method = method;
        self
    }

    /// Append a term and its field filter. `None` (or an empty mask)
    /// means the term searches every field independently.
    pub fn push_term(&mut self, term: impl Into<String>, fields: Option<FieldMask>) {
        self.terms.push(term.into());
        self.term_fields.push(match fields {
            Some(mask) if !mask.is_empty() => mask,
            _ => FieldMask::ALL,
        });
    }

    /// Builder form of [`Self::push_term`].
    pub fn with_term(mut self, term: impl Into<String>, fields: Option<FieldMask>) -> Self {
        self.push_term(term, fields);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::MetaField;

    #[test]
    fn normal_method_intersects_terms_and_ors_fields() {
        let method = SearchMethod::NORMAL;
        assert!(!method.any_param());
        assert!(!method.all_fields());
    }

    #[test]
    fn method_bits_compose() {
        let method = SearchMethod::MATCH_ANY_PARAM | SearchMethod::MATCH_ALL_FIELDS;
        assert!(method.any_param());
        assert!(method.all_fields());
    }

    #[test]
    fn push_term_defaults_fields_to_all() {
        let mut request = SearchRequest::library();
        request.push_term("rock", None);
        request.push_term("2010", Some(FieldMask::NONE));
        request.push_term("bowie", Some(MetaField::Artist.into()));

        assert_eq!(request.terms().len(), request.term_fields().len());
        assert_eq!(request.term_fields()[0], FieldMask::ALL);
        assert_eq!(request.term_fields()[1], FieldMask::ALL);
        assert_eq!(request.term_fields()[2], FieldMask::from(MetaField::Artist));
    }

    #[test]
    fn kind_is_fixed_at_construction() {
        let request = SearchRequest::standard_playlist(7);
        assert_eq!(request.kind(), SearchKind::StandardPlaylist(7));

        let request = SearchRequest::library().with_term("rock", None);
        assert_eq!(request.kind(), SearchKind::Library);
    }
}
