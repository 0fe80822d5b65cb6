// Copyright 2026 Oxide Computer Company

//! An in-memory history for exercising the resolver.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::atomic::{AtomicUsize, Ordering},
};
use vendor_origin::{
    Cancellation, HashScheme, RevisionId, RevisionIter, TagMap, TreeSignature,
    VcsError, VcsName, VcsQuery,
};

/// Builds a tree signature from `(path, contents)` pairs.
pub fn tree(files: &[(&str, &str)]) -> TreeSignature {
    files
        .iter()
        .map(|(path, contents)| {
            (*path, HashScheme::Sha256.hash(contents.as_bytes()))
        })
        .collect()
}

/// A scripted history. Revisions are listed newest first.
#[derive(Default)]
pub struct FakeHistory {
    revisions: Vec<(String, TreeSignature)>,
    tags: TagMap,
    broken: BTreeSet<String>,
    listing_error: Option<usize>,
    nearest_tags: BTreeMap<String, String>,
    cancel_after_fetches: Option<(usize, Cancellation)>,
    tree_fetches: AtomicUsize,
}

impl FakeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an older revision.
    pub fn revision(mut self, id: &str, tree: TreeSignature) -> Self {
        self.revisions.push((id.to_owned(), tree));
        self
    }

    pub fn tag(mut self, id: &str, tag: &str) -> Self {
        self.tags.entry(id.into()).or_default().push(tag.to_owned());
        self
    }

    /// Makes `tree_at` fail for `id`.
    pub fn broken(mut self, id: &str) -> Self {
        self.broken.insert(id.to_owned());
        self
    }

    /// Makes the revision listing yield an error at `index`.
    pub fn listing_error_at(mut self, index: usize) -> Self {
        self.listing_error = Some(index);
        self
    }

    pub fn nearest_tag(mut self, id: &str, tag: &str) -> Self {
        self.nearest_tags.insert(id.to_owned(), tag.to_owned());
        self
    }

    /// Triggers `cancel` once `count` trees have been fetched.
    pub fn cancel_after(mut self, count: usize, cancel: Cancellation) -> Self {
        self.cancel_after_fetches = Some((count, cancel));
        self
    }

    pub fn tree_fetches(&self) -> usize {
        self.tree_fetches.load(Ordering::SeqCst)
    }

    fn listing_failure(&self) -> VcsError {
        VcsError::HistoryUnavailable {
            vcs_name: VcsName::Git,
            repo_root: "/fake".into(),
            reason: "shallow clone".to_owned(),
        }
    }
}

impl VcsQuery for FakeHistory {
    fn vcs_name(&self) -> VcsName {
        VcsName::Git
    }

    fn hash_scheme(&self) -> HashScheme {
        HashScheme::Sha256
    }

    fn revisions(&self) -> Result<RevisionIter<'_>, VcsError> {
        let error_at = self.listing_error;
        Ok(Box::new(self.revisions.iter().enumerate().map(
            move |(index, (id, _))| {
                if Some(index) == error_at {
                    Err(self.listing_failure())
                } else {
                    Ok(RevisionId::new(id.as_str()))
                }
            },
        )))
    }

    fn tags(&self) -> Result<TagMap, VcsError> {
        Ok(self.tags.clone())
    }

    fn tree_at(&self, id: &RevisionId) -> Result<TreeSignature, VcsError> {
        let fetched = self.tree_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((count, cancel)) = &self.cancel_after_fetches {
            if fetched >= *count {
                cancel.cancel();
            }
        }
        if self.broken.contains(id.as_str()) {
            return Err(VcsError::CommandFailed {
                vcs_name: VcsName::Git,
                operation: "list tree",
                exit_status: "exit status: 128".to_owned(),
                stderr: "fatal: not a tree object".to_owned(),
            });
        }
        self.revisions
            .iter()
            .find(|(candidate, _)| candidate == id.as_str())
            .map(|(_, tree)| tree.clone())
            .ok_or_else(|| VcsError::NoSuchRevision {
                vcs_name: VcsName::Git,
                revision: id.clone(),
            })
    }

    fn nearest_tag(
        &self,
        id: &RevisionId,
    ) -> Result<Option<String>, VcsError> {
        Ok(self.nearest_tags.get(id.as_str()).cloned())
    }
}

/// A history whose revision listing fails outright.
pub struct UnavailableHistory;

impl VcsQuery for UnavailableHistory {
    fn vcs_name(&self) -> VcsName {
        VcsName::Hg
    }

    fn hash_scheme(&self) -> HashScheme {
        HashScheme::Sha256
    }

    fn revisions(&self) -> Result<RevisionIter<'_>, VcsError> {
        Err(VcsError::CommandFailed {
            vcs_name: VcsName::Hg,
            operation: "list revisions",
            exit_status: "exit status: 255".to_owned(),
            stderr: "abort: no repository found".to_owned(),
        })
    }

    fn tags(&self) -> Result<TagMap, VcsError> {
        Ok(TagMap::new())
    }

    fn tree_at(&self, id: &RevisionId) -> Result<TreeSignature, VcsError> {
        Err(VcsError::NoSuchRevision {
            vcs_name: VcsName::Hg,
            revision: id.clone(),
        })
    }
}
