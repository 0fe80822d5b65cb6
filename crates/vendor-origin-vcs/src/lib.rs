// Copyright 2026 Oxide Computer Company

//! Version control backends for
//! [`vendor-origin`](https://docs.rs/vendor-origin).
//!
//! [`Upstream`] implements [`vendor_origin::VcsQuery`] for Git, Mercurial,
//! Bazaar and Subversion checkouts by running the VCS's command-line tool.
//! The binary for each VCS is taken from `$GIT`, `$HG`, `$BZR` or `$SVN`,
//! falling back to `git`, `hg`, `bzr` or `svn` on the `PATH`.
//!
//! Git trees are read from the object database without a checkout, and
//! compared by blob id. The other backends export each revision into a
//! temporary directory and hash the files there.
//!
//! # Examples
//!
//! ```no_run
//! use camino::Utf8Path;
//! use vendor_origin::ResolveOptions;
//!
//! let options = ResolveOptions::from_env().expect("valid settings");
//! let result = vendor_origin_vcs::identify(
//!     Utf8Path::new("third_party/zlib"),
//!     Utf8Path::new("/src/zlib"),
//!     options,
//! )
//! .expect("resolution succeeded");
//! println!("{result}");
//! ```
//!
//! To pick the backend explicitly, or to allow a shallow git clone:
//!
//! ```no_run
//! use camino::Utf8Path;
//! use vendor_origin::{ResolveOptions, Resolver};
//! use vendor_origin_vcs::{Upstream, Vcs};
//!
//! let upstream = Upstream::new(Vcs::git()?, "/src/zlib").allow_shallow(true);
//! let resolver = Resolver::new(upstream, ResolveOptions::new());
//! let result = resolver.resolve_dir(Utf8Path::new("third_party/zlib"))?;
//! println!("{}", result.version());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]

mod backend;
mod errors;
mod runner;
mod upstream;
mod vcs;

pub use errors::{IdentifyError, VcsDetectError, VcsEnvError};
pub use runner::{CommandOutput, CommandRunner, Invocation, SystemRunner};
pub use upstream::{Upstream, identify};
pub use vcs::Vcs;
pub use vendor_origin::VcsName;
