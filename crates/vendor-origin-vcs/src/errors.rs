// Copyright 2026 Oxide Computer Company

//! Error types for backend selection and identification.

use camino::Utf8PathBuf;
use std::{ffi::OsString, io};
use thiserror::Error;
use vendor_origin::ResolveError;

/// An error from reading a VCS binary path from the environment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VcsEnvError {
    /// The environment variable is set but is not valid UTF-8.
    #[error(
        "${var} environment variable is not valid \
         UTF-8: {value:?}"
    )]
    NonUtf8 {
        /// The environment variable name.
        var: &'static str,
        /// The non-UTF-8 value.
        value: OsString,
    },
}

/// An error that occurs during VCS detection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VcsDetectError {
    /// The provided repository root does not exist.
    #[error(
        "{repo_root} does not exist \
         (expected a repository root with .git, .hg, .bzr or .svn)"
    )]
    PathNotFound {
        /// The path that was provided.
        repo_root: Utf8PathBuf,
    },

    /// The provided repository root is not a directory.
    #[error(
        "{repo_root} is not a directory \
         (expected a repository root with .git, .hg, .bzr or .svn)"
    )]
    NotADirectory {
        /// The path that was provided.
        repo_root: Utf8PathBuf,
    },

    /// An I/O error occurred while probing the repository root.
    #[error("I/O error while checking for VCS at {path}")]
    Io {
        /// The path being checked when the error occurred.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// No VCS metadata was found at the repository root.
    #[error(
        "no VCS found at {repo_root} (expected .git, .hg, .bzr or .svn)"
    )]
    NotFound {
        /// The repository root that was searched.
        repo_root: Utf8PathBuf,
    },

    /// A VCS environment variable is not valid UTF-8.
    #[error(transparent)]
    Env(#[from] VcsEnvError),
}

/// An error from [`identify`](crate::identify).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IdentifyError {
    /// The upstream repository's VCS could not be determined.
    #[error("failed to detect upstream VCS")]
    Detect(#[from] VcsDetectError),

    /// Resolution failed.
    #[error("failed to identify vendored tree")]
    Resolve(#[from] ResolveError),
}
