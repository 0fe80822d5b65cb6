// Copyright 2026 Oxide Computer Company

//! Matching a local tree against upstream history.

use crate::{
    DifferenceReport, ResolveError, ResolveOptions, Revision, RevisionCatalog,
    RevisionId, SignatureBuilder, SignatureError, TreeSignature, VcsError,
    VcsQuery,
};
use camino::Utf8Path;
use std::{borrow::Cow, fmt, sync::Arc};
use tracing::{debug, info, warn};

/// How a [`MatchResult`] relates to the local tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// The local tree is identical to a tagged revision.
    ExactRelease {
        /// The tag naming the release.
        tag: String,
    },
    /// The local tree is identical to a revision with no tag.
    ExactUnreleased,
    /// No revision is identical to the local tree; the result is the
    /// closest one found.
    Approximate,
}

impl Classification {
    /// Returns whether this is an exact match, released or not.
    pub fn is_exact(&self) -> bool {
        !matches!(self, Classification::Approximate)
    }
}

/// Why the scan over history stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanStop {
    /// An exact match was found.
    ExactMatch,
    /// Every revision in history was visited.
    Exhausted,
    /// The configured search bound was reached.
    SearchBound,
    /// The cancellation signal was triggered.
    Cancelled,
}

/// A candidate that was not evaluated because its tree could not be
/// fetched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedRevision {
    /// The revision that was skipped.
    pub revision: RevisionId,
    /// The error that caused it to be skipped.
    pub reason: String,
}

/// Diagnostics describing how a resolution went.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanStats {
    /// The number of candidates that were compared with the local tree.
    pub evaluated: usize,
    /// Candidates skipped because their tree could not be fetched.
    pub skipped: Vec<SkippedRevision>,
    /// Entries in the revision listing that could not be read.
    pub listing_errors: usize,
    /// Why the scan stopped.
    pub stop: ScanStop,
}

/// The outcome of a successful resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchResult {
    revision: Revision,
    classification: Classification,
    report: DifferenceReport,
    nearest_tag: Option<String>,
    stats: ScanStats,
}

impl MatchResult {
    /// Returns the matched revision.
    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    /// Returns how the revision relates to the local tree.
    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    /// Returns the differences between the local tree and the revision.
    pub fn report(&self) -> &DifferenceReport {
        &self.report
    }

    /// Returns the nearest tag preceding an untagged revision, if the
    /// backend reported one.
    pub fn nearest_tag(&self) -> Option<&str> {
        self.nearest_tag.as_deref()
    }

    /// Returns scan diagnostics.
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Returns the version string for this result: the tag for an exact
    /// release, otherwise the revision identifier.
    pub fn version(&self) -> &str {
        match &self.classification {
            Classification::ExactRelease { tag } => tag,
            Classification::ExactUnreleased | Classification::Approximate => {
                self.revision.id().as_str()
            }
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.classification {
            Classification::ExactRelease { tag } => {
                let id = self.revision.id();
                write!(f, "exact match: release {tag} ({id})")
            }
            Classification::ExactUnreleased => {
                let id = self.revision.id();
                write!(f, "exact match: unreleased revision {id}")?;
                if let Some(tag) = &self.nearest_tag {
                    write!(f, " (after {tag})")?;
                }
                Ok(())
            }
            Classification::Approximate => {
                write!(
                    f,
                    "closest match: {} with {} differing file(s) ({})",
                    self.revision,
                    self.report.total_differences(),
                    self.report,
                )
            }
        }
    }
}

struct Candidate {
    revision: Revision,
    report: DifferenceReport,
}

impl Candidate {
    /// Returns whether this candidate should replace `best`.
    ///
    /// Candidates arrive newest first, so keeping the incumbent on a full
    /// tie prefers the more recent revision.
    fn beats(&self, best: Option<&Candidate>) -> bool {
        let Some(best) = best else {
            return true;
        };
        let mine = self.report.total_differences();
        let theirs = best.report.total_differences();
        mine < theirs
            || (mine == theirs
                && self.revision.is_tagged()
                && !best.revision.is_tagged())
    }
}

/// Finds the revision of an upstream history that a local tree came from.
///
/// A resolver owns one [`RevisionCatalog`] and is meant for a single
/// session; resolving the same tree twice reuses the cached signatures and
/// yields the same result.
pub struct Resolver<Q> {
    catalog: RevisionCatalog<Q>,
    options: ResolveOptions,
}

impl<Q: VcsQuery> Resolver<Q> {
    /// Creates a resolver over `query`.
    pub fn new(query: Q, options: ResolveOptions) -> Self {
        Resolver { catalog: RevisionCatalog::new(query), options }
    }

    /// Returns the catalog backing this resolver.
    pub fn catalog(&self) -> &RevisionCatalog<Q> {
        &self.catalog
    }

    /// Returns the options in use.
    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Hashes the directory at `local_root` with the backend's hash scheme
    /// and resolves it.
    ///
    /// Cancellation while the local tree is being hashed is reported as
    /// [`ResolveError::Cancelled`].
    pub fn resolve_dir(
        &self,
        local_root: &Utf8Path,
    ) -> Result<MatchResult, ResolveError> {
        let scheme = self.catalog.query().hash_scheme();
        let builder = SignatureBuilder::new(scheme);
        let local = builder
            .build(local_root, self.options.get_cancellation())
            .map_err(|error| match error {
                SignatureError::Cancelled => ResolveError::Cancelled,
                error => ResolveError::LocalTree(error),
            })?;
        debug!("local tree {local_root} has {} file(s)", local.len());
        self.resolve(&local)
    }

    /// Resolves `local` against upstream history.
    ///
    /// Revisions are visited newest first. The first exact match ends the
    /// scan. Otherwise the candidate with the fewest differences wins, with
    /// ties going to tagged revisions and then to newer ones.
    pub fn resolve(
        &self,
        local: &TreeSignature,
    ) -> Result<MatchResult, ResolveError> {
        let cancel = self.options.get_cancellation();
        let bound = self.options.get_search_bound();
        let window = self.options.get_prefetch().max(1);

        self.catalog.tags().map_err(ResolveError::Tags)?;
        let mut revisions = self
            .catalog
            .revisions()
            .map_err(ResolveError::HistoryUnavailable)?;

        let mut stats = ScanStats {
            evaluated: 0,
            skipped: Vec::new(),
            listing_errors: 0,
            stop: ScanStop::Exhausted,
        };
        let mut seen_any = false;
        let mut best: Option<Candidate> = None;

        'scan: loop {
            if cancel.is_cancelled() {
                stats.stop = ScanStop::Cancelled;
                break;
            }
            let remaining = match bound {
                Some(bound) if stats.evaluated >= bound => {
                    stats.stop = ScanStop::SearchBound;
                    break;
                }
                Some(bound) => bound - stats.evaluated,
                None => usize::MAX,
            };

            let mut batch = Vec::new();
            while batch.len() < window.min(remaining) {
                match revisions.next() {
                    None => break,
                    Some(Ok(revision)) => batch.push(revision),
                    Some(Err(error)) if !seen_any && batch.is_empty() => {
                        return Err(ResolveError::HistoryUnavailable(error));
                    }
                    Some(Err(error)) => {
                        warn!("skipping unreadable revision entry: {error}");
                        stats.listing_errors += 1;
                    }
                }
            }
            if batch.is_empty() {
                stats.stop = ScanStop::Exhausted;
                break;
            }
            seen_any = true;

            let trees = if batch.len() > 1 {
                self.catalog.prefetch(&batch)
            } else {
                batch.iter().map(|r| self.catalog.tree_at(r.id())).collect()
            };

            // Trees already fetched are scored even if cancellation fired
            // meanwhile; the signal is honored before the next fetch.
            for (revision, tree) in batch.into_iter().zip(trees) {
                if bound.is_some_and(|bound| stats.evaluated >= bound) {
                    stats.stop = ScanStop::SearchBound;
                    break 'scan;
                }

                let tree = match tree {
                    Ok(tree) => tree,
                    Err(error) if cancel.is_cancelled() => {
                        debug!(
                            "fetch of {} interrupted: {error}",
                            revision.id()
                        );
                        continue;
                    }
                    Err(error) => {
                        self.skip(&mut stats, &revision, &error);
                        continue;
                    }
                };
                let report = self.score(local, &tree);
                stats.evaluated += 1;
                debug!(
                    "revision {} (position {}): {report}",
                    revision,
                    revision.position()
                );

                if report.is_exact() {
                    stats.stop = ScanStop::ExactMatch;
                    return Ok(self.finish(revision, report, stats));
                }
                let candidate = Candidate { revision, report };
                if candidate.beats(best.as_ref()) {
                    best = Some(candidate);
                }
            }
        }

        if !seen_any {
            return Err(match stats.stop {
                ScanStop::Cancelled => ResolveError::Cancelled,
                _ => ResolveError::NoHistory,
            });
        }
        match best {
            Some(best) => Ok(self.finish(best.revision, best.report, stats)),
            None if stats.stop == ScanStop::Cancelled => {
                Err(ResolveError::Cancelled)
            }
            None => Err(ResolveError::NoUsableRevision {
                skipped: stats.skipped.len(),
            }),
        }
    }

    fn score(
        &self,
        local: &TreeSignature,
        tree: &Arc<TreeSignature>,
    ) -> DifferenceReport {
        let candidate = match self.options.get_upstream_subdir() {
            Some(subdir) => Cow::Owned(tree.subtree(subdir)),
            None => Cow::Borrowed(&**tree),
        };
        DifferenceReport::compare(local, &candidate)
    }

    fn skip(
        &self,
        stats: &mut ScanStats,
        revision: &Revision,
        error: &VcsError,
    ) {
        warn!("skipping revision {}: {error}", revision.id());
        stats.skipped.push(SkippedRevision {
            revision: revision.id().clone(),
            reason: error.to_string(),
        });
    }

    fn finish(
        &self,
        revision: Revision,
        report: DifferenceReport,
        stats: ScanStats,
    ) -> MatchResult {
        let classification = if report.is_exact() {
            match revision.version_tag() {
                Some(tag) => {
                    Classification::ExactRelease { tag: tag.to_owned() }
                }
                None => Classification::ExactUnreleased,
            }
        } else {
            Classification::Approximate
        };

        let nearest_tag = if revision.is_tagged()
            || self.options.get_cancellation().is_cancelled()
        {
            None
        } else {
            self.catalog.nearest_tag(revision.id()).unwrap_or_else(|error| {
                debug!("no nearest tag for {}: {error}", revision.id());
                None
            })
        };

        if !stats.skipped.is_empty() {
            info!("{} candidate revision(s) skipped", stats.skipped.len());
        }
        let result = MatchResult {
            revision,
            classification,
            report,
            nearest_tag,
            stats,
        };
        info!("{result}, {} revision(s) evaluated", result.stats.evaluated);
        result
    }
}
