//! Boolean dynamic-query representation.
//!
//! A [`DynamicQuery`] is a serializable boolean expression tree over
//! field/comparator/term triples. Saved dynamic playlists persist the
//! whole query as an opaque-to-the-schema blob; the blob itself is a
//! versioned JSON envelope so it stays inspectable.

use crate::error::{LibraryError, Result};
use crate::fields::{normalize, FieldMask};
use serde::{Deserialize, Serialize};

/// How a leaf's term is compared against a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    /// Substring match on the normalized field value.
    Like,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

/// Binding operator accepted when combining trees. This is deliberately
/// narrower than [`GroupOp`] so callers cannot bind with the unary
/// grouping operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOp {
    And,
    Or,
}

/// Operator of a group node. `Group` is unary parenthesization: it wraps
/// `first` and carries no second child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupOp {
    And,
    Or,
    Group,
}

impl From<BoolOp> for GroupOp {
    fn from(op: BoolOp) -> Self {
        match op {
            BoolOp::And => GroupOp::And,
            BoolOp::Or => GroupOp::Or,
        }
    }
}

/// One node of the query tree.
///
/// Trees built through [`DynamicQuery`] are well-formed by construction:
/// `And`/`Or` groups always have both children, `Group` exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchNode {
    Leaf {
        /// Fields the term is matched against; any set bit may match.
        fields: FieldMask,
        comparator: Comparator,
        /// Normalized at construction, so comparisons are case and
        /// whitespace insensitive.
        term: String,
    },
    Group {
        first: Box<SearchNode>,
        op: GroupOp,
        second: Option<Box<SearchNode>>,
    },
}

impl SearchNode {
    fn leaf(fields: FieldMask, comparator: Comparator, term: &str) -> SearchNode {
        SearchNode::Leaf {
            fields,
            comparator,
            term: normalize(term),
        }
    }

    /// Wrap a node in a unary group.
    fn wrapped(node: SearchNode) -> SearchNode {
        SearchNode::Group {
            first: Box::new(node),
            op: GroupOp::Group,
            second: None,
        }
    }

    fn combined(first: SearchNode, op: BoolOp, second: SearchNode) -> SearchNode {
        SearchNode::Group {
            first: Box::new(first),
            op: op.into(),
            second: Some(Box::new(second)),
        }
    }
}

const QUERY_BLOB_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct QueryBlob {
    version: u32,
    query: DynamicQuery,
}

/// A boolean query over the library, plus an optional result cap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicQuery {
    root: Option<SearchNode>,
    max_results: Option<usize>,
}

impl DynamicQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn set_max_results(&mut self, max_results: Option<usize>) {
        self.max_results = max_results;
    }

    pub fn max_results(&self) -> Option<usize> {
        self.max_results
    }

    pub fn root(&self) -> Option<&SearchNode> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Add a field/comparator/term condition.
    ///
    /// On an empty tree this installs a single wrapped leaf and `bind` is
    /// ignored; otherwise the existing tree and the new leaf are combined
    /// under a new group root bound by `bind`.
    pub fn add_condition(
        &mut self,
        fields: FieldMask,
        comparator: Comparator,
        term: &str,
        bind: BoolOp,
    ) -> Result<()> {
        if fields.is_empty() {
            return Err(LibraryError::invalid_input(
                "fields",
                "a condition requires at least one field",
            ));
        }
        let leaf = SearchNode::wrapped(SearchNode::leaf(fields, comparator, term));
        self.root = Some(match self.root.take() {
            None => leaf,
            Some(existing) => SearchNode::combined(existing, bind, leaf),
        });
        Ok(())
    }

    /// Combine this query with another under a new group root.
    pub fn merge(&mut self, other: DynamicQuery, bind: BoolOp) -> Result<()> {
        let other_root = other.root.ok_or_else(|| {
            LibraryError::invalid_input("other", "cannot merge an empty query")
        })?;
        self.root = Some(match self.root.take() {
            None => other_root,
            Some(existing) => SearchNode::combined(existing, bind, other_root),
        });
        Ok(())
    }

    /// Wrap the current tree in a unary group, fixing its precedence when
    /// the query is combined further. Each call adds one wrapper.
    pub fn group(&mut self) -> Result<()> {
        let root = self.root.take().ok_or_else(|| {
            LibraryError::invalid_input("query", "cannot group an empty query")
        })?;
        self.root = Some(SearchNode::wrapped(root));
        Ok(())
    }

    /// Serialize the whole query (tree plus result cap) to a blob.
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        let blob = QueryBlob {
            version: QUERY_BLOB_VERSION,
            query: self.clone(),
        };
        Ok(serde_json::to_vec(&blob)?)
    }

    /// Reconstruct a query from a blob produced by [`Self::to_blob`].
    pub fn from_blob(bytes: &[u8]) -> Result<DynamicQuery> {
        let blob: QueryBlob = serde_json::from_slice(bytes)?;
        if blob.version != QUERY_BLOB_VERSION {
            return Err(LibraryError::invalid_input(
                "query",
                format!("unsupported query blob version {}", blob.version),
            ));
        }
        Ok(blob.query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::MetaField;

    fn artist_eq(term: &str) -> (FieldMask, Comparator, &str) {
        (MetaField::Artist.into(), Comparator::Eq, term)
    }

    #[test]
    fn first_condition_installs_wrapped_leaf() {
        let mut query = DynamicQuery::new();
        let (fields, cmp, term) = artist_eq("Tobacco");
        query.add_condition(fields, cmp, term, BoolOp::Or).unwrap();

        match query.root().unwrap() {
            SearchNode::Group {
                first,
                op: GroupOp::Group,
                second: None,
            } => match first.as_ref() {
                SearchNode::Leaf {
                    term, comparator, ..
                } => {
                    assert_eq!(term, "tobacco");
                    assert_eq!(*comparator, Comparator::Eq);
                }
                other => panic!("expected leaf, got {other:?}"),
            },
            other => panic!("expected unary group, got {other:?}"),
        }
    }

    #[test]
    fn second_condition_combines_under_new_root() {
        let mut query = DynamicQuery::new();
        query
            .add_condition(MetaField::Artist.into(), Comparator::Eq, "Tobacco", BoolOp::Or)
            .unwrap();
        query
            .add_condition(
                MetaField::Artist.into(),
                Comparator::Eq,
                "Civil Civic",
                BoolOp::Or,
            )
            .unwrap();

        match query.root().unwrap() {
            SearchNode::Group {
                op: GroupOp::Or,
                second: Some(_),
                ..
            } => {}
            other => panic!("expected OR group root, got {other:?}"),
        }
    }

    #[test]
    fn add_condition_rejects_empty_field_mask() {
        let mut query = DynamicQuery::new();
        let result = query.add_condition(FieldMask::NONE, Comparator::Like, "x", BoolOp::And);
        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
    }

    #[test]
    fn terms_are_normalized_at_construction() {
        let mut query = DynamicQuery::new();
        query
            .add_condition(FieldMask::ALL, Comparator::Like, "  ROCK ", BoolOp::And)
            .unwrap();
        match query.root().unwrap() {
            SearchNode::Group { first, .. } => match first.as_ref() {
                SearchNode::Leaf { term, .. } => assert_eq!(term, "rock"),
                other => panic!("expected leaf, got {other:?}"),
            },
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn merge_rejects_empty_other() {
        let mut query = DynamicQuery::new();
        query
            .add_condition(FieldMask::ALL, Comparator::Like, "rock", BoolOp::And)
            .unwrap();
        let result = query.merge(DynamicQuery::new(), BoolOp::And);
        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
    }

    #[test]
    fn merge_combines_trees() {
        let mut left = DynamicQuery::new();
        left.add_condition(FieldMask::ALL, Comparator::Like, "rock", BoolOp::And)
            .unwrap();
        let mut right = DynamicQuery::new();
        right
            .add_condition(FieldMask::ALL, Comparator::Like, "2010", BoolOp::And)
            .unwrap();

        left.merge(right, BoolOp::And).unwrap();
        match left.root().unwrap() {
            SearchNode::Group {
                op: GroupOp::And,
                second: Some(_),
                ..
            } => {}
            other => panic!("expected AND group root, got {other:?}"),
        }
    }

    #[test]
    fn group_rejects_empty_query() {
        let mut query = DynamicQuery::new();
        assert!(query.group().is_err());
    }

    #[test]
    fn group_wraps_each_time() {
        let mut query = DynamicQuery::new();
        query
            .add_condition(FieldMask::ALL, Comparator::Like, "rock", BoolOp::And)
            .unwrap();
        let once = {
            let mut q = query.clone();
            q.group().unwrap();
            q
        };
        let twice = {
            let mut q = once.clone();
            q.group().unwrap();
            q
        };
        // Not structurally idempotent: each call adds one wrapper.
        assert_ne!(once, twice);
        match twice.root().unwrap() {
            SearchNode::Group {
                first,
                op: GroupOp::Group,
                second: None,
            } => assert!(matches!(
                first.as_ref(),
                SearchNode::Group {
                    op: GroupOp::Group,
                    ..
                }
            )),
            other => panic!("expected nested group, got {other:?}"),
        }
    }

    #[test]
    fn blob_round_trip_preserves_query() {
        let mut query = DynamicQuery::new().with_max_results(25);
        query
            .add_condition(
                MetaField::Artist | MetaField::Title,
                Comparator::Like,
                "Night",
                BoolOp::And,
            )
            .unwrap();
        query
            .add_condition(MetaField::Year.into(), Comparator::Ge, "2010", BoolOp::And)
            .unwrap();
        query.group().unwrap();

        let blob = query.to_blob().unwrap();
        let restored = DynamicQuery::from_blob(&blob).unwrap();
        assert_eq!(restored, query);
        assert_eq!(restored.max_results(), Some(25));
    }

    #[test]
    fn from_blob_rejects_unknown_version() {
        let blob = serde_json::json!({
            "version": 99,
            "query": { "root": null, "max_results": null }
        });
        let bytes = serde_json::to_vec(&blob).unwrap();
        let result = DynamicQuery::from_blob(&bytes);
        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
    }

    #[test]
    fn from_blob_rejects_garbage() {
        assert!(matches!(
            DynamicQuery::from_blob(b"not json"),
            Err(LibraryError::Serialization(_))
        ));
    }
}
