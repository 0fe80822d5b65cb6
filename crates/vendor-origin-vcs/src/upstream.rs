// Copyright 2026 Oxide Computer Company

//! Upstream repositories as [`VcsQuery`] implementations.

use crate::{
    CommandRunner, IdentifyError, SystemRunner, Vcs,
    backend::{self, Context},
    vcs::VcsKind,
};
use camino::{Utf8Path, Utf8PathBuf};
use std::{fmt, sync::OnceLock};
use tracing::debug;
use vendor_origin::{
    Cancellation, HashScheme, MatchResult, ResolveOptions, Resolver, RevisionId,
    RevisionIter, TagMap, TreeSignature, VcsError, VcsName, VcsQuery,
};

/// An upstream repository checked out on disk.
///
/// Every command runs through a [`CommandRunner`]; by default that is
/// [`SystemRunner`], which spawns the VCS binary chosen by [`Vcs`].
pub struct Upstream {
    vcs: Vcs,
    repo_root: Utf8PathBuf,
    runner: Box<dyn CommandRunner>,
    allow_shallow: bool,
    cancellation: Cancellation,
    hash_scheme: OnceLock<HashScheme>,
    svn_url: OnceLock<String>,
}

impl fmt::Debug for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upstream")
            .field("vcs", &self.vcs)
            .field("repo_root", &self.repo_root)
            .field("allow_shallow", &self.allow_shallow)
            .finish_non_exhaustive()
    }
}

impl Upstream {
    /// Creates an upstream for the repository at `repo_root`.
    pub fn new(vcs: Vcs, repo_root: impl Into<Utf8PathBuf>) -> Self {
        Upstream {
            vcs,
            repo_root: repo_root.into(),
            runner: Box::new(SystemRunner),
            allow_shallow: false,
            cancellation: Cancellation::new(),
            hash_scheme: OnceLock::new(),
            svn_url: OnceLock::new(),
        }
    }

    /// Runs commands through `runner` instead of spawning processes.
    pub fn with_runner(
        mut self,
        runner: impl CommandRunner + 'static,
    ) -> Self {
        self.runner = Box::new(runner);
        self
    }

    /// Accepts shallow git clones instead of reporting their history as
    /// unavailable. Resolution then only sees the commits that are present.
    pub fn allow_shallow(mut self, allow: bool) -> Self {
        self.allow_shallow = allow;
        self
    }

    /// Stops hashing exported trees once `cancellation` fires.
    ///
    /// Pass the same signal given to `ResolveOptions::cancellation`;
    /// [`identify`] does this itself.
    pub fn cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Returns the VCS in use.
    pub fn vcs(&self) -> &Vcs {
        &self.vcs
    }

    /// Returns the repository root.
    pub fn repo_root(&self) -> &Utf8Path {
        &self.repo_root
    }

    fn context(&self) -> Context<'_> {
        Context {
            vcs_name: self.vcs.name(),
            binary: self.vcs.binary(),
            repo_root: &self.repo_root,
            runner: &*self.runner,
            cancel: &self.cancellation,
        }
    }

    /// Returns the Subversion repository URL, reading it on first use.
    fn svn_url(&self) -> Result<&str, VcsError> {
        if let Some(url) = self.svn_url.get() {
            return Ok(url);
        }
        let url = backend::svn::url(&self.context())?;
        Ok(self.svn_url.get_or_init(|| url))
    }
}

impl VcsQuery for Upstream {
    fn vcs_name(&self) -> VcsName {
        self.vcs.name()
    }

    fn hash_scheme(&self) -> HashScheme {
        *self.hash_scheme.get_or_init(|| match self.vcs.kind() {
            VcsKind::Git { .. } => {
                backend::git::hash_scheme(&self.context())
            }
            VcsKind::Hg { .. } | VcsKind::Bzr { .. } | VcsKind::Svn { .. } => {
                HashScheme::Sha256
            }
        })
    }

    fn revisions(&self) -> Result<RevisionIter<'_>, VcsError> {
        let cx = self.context();
        match self.vcs.kind() {
            VcsKind::Git { .. } => {
                if !self.allow_shallow {
                    backend::git::check_shallow(&cx)?;
                }
                backend::git::revisions(&cx)
            }
            VcsKind::Hg { .. } => backend::hg::revisions(&cx),
            VcsKind::Bzr { .. } => backend::bzr::revisions(&cx),
            VcsKind::Svn { .. } => backend::svn::revisions(&cx),
        }
    }

    fn tags(&self) -> Result<TagMap, VcsError> {
        let cx = self.context();
        match self.vcs.kind() {
            VcsKind::Git { .. } => backend::git::tags(&cx),
            VcsKind::Hg { .. } => backend::hg::tags(&cx),
            VcsKind::Bzr { .. } => backend::bzr::tags(&cx),
            VcsKind::Svn { .. } => Ok(TagMap::new()),
        }
    }

    fn tree_at(&self, id: &RevisionId) -> Result<TreeSignature, VcsError> {
        let cx = self.context();
        match self.vcs.kind() {
            VcsKind::Git { .. } => backend::git::tree_at(&cx, id),
            VcsKind::Hg { .. } => backend::hg::tree_at(&cx, id),
            VcsKind::Bzr { .. } => backend::bzr::tree_at(&cx, id),
            VcsKind::Svn { .. } => {
                backend::svn::tree_at(&cx, self.svn_url()?, id)
            }
        }
    }

    fn nearest_tag(
        &self,
        id: &RevisionId,
    ) -> Result<Option<String>, VcsError> {
        let cx = self.context();
        match self.vcs.kind() {
            VcsKind::Git { .. } => backend::git::nearest_tag(&cx, id),
            VcsKind::Hg { .. } => backend::hg::nearest_tag(&cx, id),
            VcsKind::Bzr { .. } | VcsKind::Svn { .. } => Ok(None),
        }
    }
}

/// Identifies which revision of the repository at `upstream_root` the
/// directory `local` was copied from.
///
/// The upstream VCS is detected with [`Vcs::detect`], and `local` is hashed
/// with whatever scheme that VCS's trees use.
pub fn identify(
    local: &Utf8Path,
    upstream_root: &Utf8Path,
    options: ResolveOptions,
) -> Result<MatchResult, IdentifyError> {
    let vcs = Vcs::detect(upstream_root)?;
    debug!("identifying {local} against {} at {upstream_root}", vcs.name());
    let upstream = Upstream::new(vcs, upstream_root)
        .cancellation(options.get_cancellation().clone());
    let resolver = Resolver::new(upstream, options);
    Ok(resolver.resolve_dir(local)?)
}
