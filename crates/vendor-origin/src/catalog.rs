// Copyright 2026 Oxide Computer Company

//! A cached, tag-annotated view of upstream history.

use crate::{
    Revision, RevisionId, RevisionIter, TagMap, TreeSignature, VcsError,
    VcsQuery,
};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

type TreeSlot = Arc<Mutex<Option<Arc<TreeSignature>>>>;

/// Presents one upstream history to the resolver.
///
/// The catalog lives for a single resolution session. It fetches tags once,
/// records each revision the first time it is observed, and caches tree
/// signatures by revision id. Tree signatures are only fetched when asked
/// for.
pub struct RevisionCatalog<Q> {
    query: Q,
    tags: Mutex<Option<Arc<TagMap>>>,
    observed: Mutex<HashMap<RevisionId, Revision>>,
    trees: Mutex<HashMap<RevisionId, TreeSlot>>,
}

impl<Q: VcsQuery> RevisionCatalog<Q> {
    /// Creates an empty catalog over `query`.
    pub fn new(query: Q) -> Self {
        RevisionCatalog {
            query,
            tags: Mutex::new(None),
            observed: Mutex::new(HashMap::new()),
            trees: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the underlying backend.
    pub fn query(&self) -> &Q {
        &self.query
    }

    /// Returns the tag mapping, fetching it on first use.
    ///
    /// A failed fetch is not cached.
    pub fn tags(&self) -> Result<Arc<TagMap>, VcsError> {
        let mut tags = self.tags.lock();
        if let Some(tags) = &*tags {
            return Ok(Arc::clone(tags));
        }
        let fetched = Arc::new(self.query.tags()?);
        debug!(
            "{} history has {} tagged revision(s)",
            self.query.vcs_name(),
            fetched.len()
        );
        *tags = Some(Arc::clone(&fetched));
        Ok(fetched)
    }

    /// Iterates over history, newest first, with tags attached.
    ///
    /// Positions count from 0 at the newest revision. A revision seen on an
    /// earlier pass is returned as it was first recorded.
    pub fn revisions(&self) -> Result<Revisions<'_, Q>, VcsError> {
        let tags = self.tags()?;
        let inner = self.query.revisions()?;
        Ok(Revisions { catalog: self, inner, tags, position: 0 })
    }

    /// Returns a previously observed revision.
    pub fn revision(&self, id: &RevisionId) -> Option<Revision> {
        self.observed.lock().get(id).cloned()
    }

    /// Returns the number of distinct revisions observed so far.
    pub fn observed_len(&self) -> usize {
        self.observed.lock().len()
    }

    /// Returns the tree signature at `id`, fetching it if it is not cached.
    ///
    /// Concurrent calls for the same id perform a single fetch. Failures are
    /// returned to the caller and not cached.
    pub fn tree_at(
        &self,
        id: &RevisionId,
    ) -> Result<Arc<TreeSignature>, VcsError> {
        let slot = {
            let mut trees = self.trees.lock();
            Arc::clone(trees.entry(id.clone()).or_default())
        };
        let mut slot = slot.lock();
        if let Some(tree) = &*slot {
            return Ok(Arc::clone(tree));
        }
        let tree = Arc::new(self.query.tree_at(id)?);
        *slot = Some(Arc::clone(&tree));
        Ok(tree)
    }

    /// Returns whether the tree signature at `id` is cached.
    pub fn is_cached(&self, id: &RevisionId) -> bool {
        self.trees.lock().get(id).is_some_and(|slot| slot.lock().is_some())
    }

    /// Fetches tree signatures for `revisions` in parallel.
    ///
    /// Results are returned in the same order as `revisions`.
    pub fn prefetch(
        &self,
        revisions: &[Revision],
    ) -> Vec<Result<Arc<TreeSignature>, VcsError>> {
        revisions
            .par_iter()
            .map(|revision| self.tree_at(revision.id()))
            .collect()
    }

    /// Asks the backend for the nearest tag preceding `id`.
    pub fn nearest_tag(
        &self,
        id: &RevisionId,
    ) -> Result<Option<String>, VcsError> {
        self.query.nearest_tag(id)
    }

    fn observe(
        &self,
        id: RevisionId,
        tags: &TagMap,
        position: usize,
    ) -> Revision {
        let mut observed = self.observed.lock();
        observed
            .entry(id)
            .or_insert_with_key(|id| {
                let names = tags.get(id).cloned().unwrap_or_default();
                Revision::new(id.clone(), names, position)
            })
            .clone()
    }
}

/// Iterator over a [`RevisionCatalog`]'s history.
pub struct Revisions<'a, Q> {
    catalog: &'a RevisionCatalog<Q>,
    inner: RevisionIter<'a>,
    tags: Arc<TagMap>,
    position: usize,
}

impl<Q: VcsQuery> Iterator for Revisions<'_, Q> {
    type Item = Result<Revision, VcsError>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = match self.inner.next()? {
            Ok(id) => id,
            Err(error) => return Some(Err(error)),
        };
        let revision = self.catalog.observe(id, &self.tags, self.position);
        self.position += 1;
        Some(Ok(revision))
    }
}
