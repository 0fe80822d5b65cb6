// Copyright 2026 Oxide Computer Company

//! Revision types.

use std::{borrow::Borrow, fmt};

/// A backend-specific, immutable reference to a point in upstream history.
///
/// For git and mercurial this is a full commit hash; for bazaar and
/// subversion it is a revision number.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RevisionId(String);

impl RevisionId {
    /// Creates a new revision identifier.
    pub fn new(id: impl Into<String>) -> Self {
        RevisionId(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Borrow<str> for RevisionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RevisionId {
    fn from(s: &str) -> Self {
        RevisionId::new(s)
    }
}

/// A revision as seen by the [`RevisionCatalog`](crate::RevisionCatalog).
///
/// Revisions are constructed once, when first observed, and never mutated
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Revision {
    id: RevisionId,
    tags: Vec<String>,
    position: usize,
}

impl Revision {
    /// Creates a revision. `tags` is sorted and deduplicated.
    pub fn new(id: RevisionId, mut tags: Vec<String>, position: usize) -> Self {
        tags.sort();
        tags.dedup();
        Revision { id, tags, position }
    }

    /// Returns the revision identifier.
    pub fn id(&self) -> &RevisionId {
        &self.id
    }

    /// Returns the tags attached to this revision, sorted by name.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns whether any tag is attached to this revision.
    pub fn is_tagged(&self) -> bool {
        !self.tags.is_empty()
    }

    /// Returns the tag reported as this revision's version.
    ///
    /// When several tags point at the same revision, the greatest name wins
    /// so that the choice does not depend on backend output order.
    pub fn version_tag(&self) -> Option<&str> {
        self.tags.last().map(String::as_str)
    }

    /// Returns the position of this revision in history: 0 is the newest,
    /// larger values are older.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version_tag() {
            Some(tag) => write!(f, "{} ({})", self.id, tag),
            None => write!(f, "{}", self.id),
        }
    }
}
