// Copyright 2026 Oxide Computer Company

//! The capability the resolver needs from a version control backend.

use crate::{HashScheme, RevisionId, TreeSignature, VcsError};
use std::{collections::BTreeMap, fmt};

/// The name of a version control system.
///
/// Used in error messages and for identifying which backend is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum VcsName {
    /// Git.
    Git,
    /// Mercurial.
    Hg,
    /// Bazaar.
    Bzr,
    /// Subversion.
    Svn,
}

impl fmt::Display for VcsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsName::Git => write!(f, "git"),
            VcsName::Hg => write!(f, "hg"),
            VcsName::Bzr => write!(f, "bzr"),
            VcsName::Svn => write!(f, "svn"),
        }
    }
}

/// A lazily produced sequence of revision identifiers, newest first.
pub type RevisionIter<'a> =
    Box<dyn Iterator<Item = Result<RevisionId, VcsError>> + 'a>;

/// Tags in an upstream history, keyed by the revision they point at.
pub type TagMap = BTreeMap<RevisionId, Vec<String>>;

/// Read-only queries against one upstream history.
///
/// Implementations must be usable from several threads at once, since tree
/// signatures may be prefetched in parallel.
pub trait VcsQuery: Send + Sync {
    /// Returns the backend's name.
    fn vcs_name(&self) -> VcsName;

    /// Returns the scheme used for the hashes in [`tree_at`](Self::tree_at)
    /// results. The local tree must be hashed with the same scheme.
    fn hash_scheme(&self) -> HashScheme;

    /// Lists every revision in a stable order, newest first.
    ///
    /// The returned iterator should do as little work up front as possible:
    /// the resolver usually stops long before the end of history.
    fn revisions(&self) -> Result<RevisionIter<'_>, VcsError>;

    /// Lists tags. An empty map is valid.
    fn tags(&self) -> Result<TagMap, VcsError>;

    /// Returns the signature of the tree at `revision`.
    fn tree_at(&self, revision: &RevisionId) -> Result<TreeSignature, VcsError>;

    /// Returns the most recent tag that is an ancestor of `revision`, if the
    /// backend can tell.
    fn nearest_tag(
        &self,
        revision: &RevisionId,
    ) -> Result<Option<String>, VcsError> {
        let _ = revision;
        Ok(None)
    }
}

impl<T: VcsQuery + ?Sized> VcsQuery for &T {
    fn vcs_name(&self) -> VcsName {
        (**self).vcs_name()
    }

    fn hash_scheme(&self) -> HashScheme {
        (**self).hash_scheme()
    }

    fn revisions(&self) -> Result<RevisionIter<'_>, VcsError> {
        (**self).revisions()
    }

    fn tags(&self) -> Result<TagMap, VcsError> {
        (**self).tags()
    }

    fn tree_at(
        &self,
        revision: &RevisionId,
    ) -> Result<TreeSignature, VcsError> {
        (**self).tree_at(revision)
    }

    fn nearest_tag(
        &self,
        revision: &RevisionId,
    ) -> Result<Option<String>, VcsError> {
        (**self).nearest_tag(revision)
    }
}
