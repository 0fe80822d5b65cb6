// Copyright 2026 Oxide Computer Company

//! Identify the upstream revision a vendored source tree was copied from.
//!
//! Projects often carry copies of third-party code whose provenance has
//! been lost: the vendoring metadata is missing, stale, or not trusted.
//! Given the vendored directory and the upstream project's history, this
//! crate finds the revision the copy came from, says whether the copy is an
//! exact, unmodified checkout of it, and if not, how far it has drifted.
//!
//! The comparison is by whole-file content: each tree is reduced to a
//! [`TreeSignature`] mapping relative paths to content hashes, and two trees
//! are compared with [`DifferenceReport::compare`]. Upstream history is
//! reached through the [`VcsQuery`] trait; implementations for git,
//! mercurial, bazaar and subversion live in the
//! [`vendor-origin-vcs`](https://crates.io/crates/vendor-origin-vcs) crate.
//!
//! The main entry point is [`Resolver`].
//!
//! # Examples
//!
//! ```
//! use vendor_origin::{
//!     Classification, HashScheme, ResolveOptions, Resolver, RevisionId,
//!     RevisionIter, TagMap, TreeSignature, VcsError, VcsName, VcsQuery,
//! };
//!
//! /// A one-revision history, for illustration.
//! struct Single(TreeSignature);
//!
//! impl VcsQuery for Single {
//!     fn vcs_name(&self) -> VcsName {
//!         VcsName::Git
//!     }
//!     fn hash_scheme(&self) -> HashScheme {
//!         HashScheme::Sha256
//!     }
//!     fn revisions(&self) -> Result<RevisionIter<'_>, VcsError> {
//!         Ok(Box::new(std::iter::once(Ok(RevisionId::new("r1")))))
//!     }
//!     fn tags(&self) -> Result<TagMap, VcsError> {
//!         Ok(TagMap::from([("r1".into(), vec!["v1.0".to_owned()])]))
//!     }
//!     fn tree_at(&self, _: &RevisionId) -> Result<TreeSignature, VcsError> {
//!         Ok(self.0.clone())
//!     }
//! }
//!
//! let mut tree = TreeSignature::new();
//! tree.insert("lib.rs", HashScheme::Sha256.hash(b"fn f() {}"));
//!
//! let resolver = Resolver::new(Single(tree.clone()), ResolveOptions::new());
//! let result = resolver.resolve(&tree).unwrap();
//! assert_eq!(
//!     result.classification(),
//!     &Classification::ExactRelease { tag: "v1.0".to_owned() },
//! );
//! assert_eq!(result.version(), "v1.0");
//! ```

#![deny(missing_docs)]

mod catalog;
mod errors;
mod hash;
mod options;
mod query;
mod report;
mod resolve;
mod revision;
mod signature;

pub use catalog::{RevisionCatalog, Revisions};
pub use errors::{
    ConfigError, ContentHashParseError, ResolveError, SignatureError, VcsError,
};
pub use hash::{ContentHash, HashScheme};
pub use options::{
    Cancellation, PREFETCH_ENV, ResolveOptions, SEARCH_BOUND_ENV,
};
pub use query::{RevisionIter, TagMap, VcsName, VcsQuery};
pub use report::DifferenceReport;
pub use resolve::{
    Classification, MatchResult, Resolver, ScanStats, ScanStop,
    SkippedRevision,
};
pub use revision::{Revision, RevisionId};
pub use signature::{
    FileSignature, SignatureBuilder, TreeSignature, VCS_METADATA_NAMES,
};
