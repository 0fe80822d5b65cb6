// Copyright 2026 Oxide Computer Company

//! Error types for signatures, VCS queries and resolution.

use crate::{RevisionId, VcsName};
use camino::Utf8PathBuf;
use std::{io, path::PathBuf};
use thiserror::Error;

/// An error that occurs while parsing a [`ContentHash`](crate::ContentHash).
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum ContentHashParseError {
    /// The hash has an invalid length.
    #[error(
        "invalid length: expected 40 (SHA-1) or 64 (SHA-256) hex characters, \
         got {0}"
    )]
    InvalidLength(usize),

    /// The hash is not valid hexadecimal.
    #[error("invalid hexadecimal")]
    InvalidHex(hex::FromHexError),
}

/// An error that occurs while building a
/// [`TreeSignature`](crate::TreeSignature) from a directory.
///
/// Signatures are all-or-nothing: any of these errors means no signature
/// was produced.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SignatureError {
    /// The tree could not be enumerated.
    #[error("failed to walk {root}")]
    Walk {
        /// The root of the tree being walked.
        root: Utf8PathBuf,
        /// The underlying walk error.
        #[source]
        source: walkdir::Error,
    },

    /// A file could not be read.
    #[error("failed to read {path}")]
    ReadFile {
        /// The path to the file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A path in the tree is not valid UTF-8.
    #[error("path is not valid UTF-8: {path:?}")]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },

    /// The build was cancelled before every file was read.
    #[error("signature build cancelled")]
    Cancelled,
}

/// An error reported by a [`VcsQuery`](crate::VcsQuery) implementation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VcsError {
    /// Failed to spawn the VCS process.
    #[error("failed to run {vcs_name} at {binary_path:?} in {repo_root}")]
    SpawnFailed {
        /// The name of the VCS.
        vcs_name: VcsName,
        /// The path to the VCS executable.
        binary_path: String,
        /// The working directory where the command was run.
        repo_root: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The VCS command exited unsuccessfully.
    #[error("{vcs_name} {operation} failed ({exit_status}): {stderr}")]
    CommandFailed {
        /// The name of the VCS.
        vcs_name: VcsName,
        /// What the command was asked to do (e.g. "list revisions").
        operation: &'static str,
        /// A human-readable description of the exit status (e.g.,
        /// "exit status: 128" or "killed by signal").
        exit_status: String,
        /// The stderr output from the VCS.
        stderr: String,
    },

    /// The VCS command succeeded but its output could not be interpreted.
    #[error(
        "{vcs_name} returned unexpected output for {operation}: {output:?}"
    )]
    UnexpectedOutput {
        /// The name of the VCS.
        vcs_name: VcsName,
        /// What the command was asked to do.
        operation: &'static str,
        /// The portion of output that could not be interpreted.
        output: String,
    },

    /// The revision does not exist in the upstream history.
    #[error("{vcs_name} has no revision {revision}")]
    NoSuchRevision {
        /// The name of the VCS.
        vcs_name: VcsName,
        /// The revision that was requested.
        revision: RevisionId,
    },

    /// The upstream history is missing or incomplete.
    #[error("{vcs_name} history unavailable at {repo_root}: {reason}")]
    HistoryUnavailable {
        /// The name of the VCS.
        vcs_name: VcsName,
        /// The repository root.
        repo_root: Utf8PathBuf,
        /// Why the history cannot be used.
        reason: String,
    },

    /// Failed to create a scratch directory for exporting a revision.
    #[error("failed to create export directory for {revision}")]
    Export {
        /// The revision being exported.
        revision: RevisionId,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Hashing an exported revision failed.
    #[error("failed to hash exported tree for {revision}")]
    Signature {
        /// The revision being hashed.
        revision: RevisionId,
        /// The underlying signature error.
        #[source]
        source: SignatureError,
    },
}

/// An error that prevents resolution from producing any
/// [`MatchResult`](crate::MatchResult).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolveError {
    /// The upstream history contains no revisions at all.
    ///
    /// This usually means the upstream location is misconfigured, and is
    /// distinct from "no revision matched".
    #[error("upstream history contains no revisions")]
    NoHistory,

    /// Listing revisions failed before any revision was produced.
    #[error("failed to list upstream revisions")]
    HistoryUnavailable(#[source] VcsError),

    /// Listing tags failed.
    #[error("failed to list upstream tags")]
    Tags(#[source] VcsError),

    /// The local tree could not be hashed.
    #[error("failed to build signature for local tree")]
    LocalTree(#[from] SignatureError),

    /// Every candidate revision failed to produce a tree signature.
    #[error(
        "no usable revision: all {skipped} candidate(s) failed to produce \
         a tree signature"
    )]
    NoUsableRevision {
        /// The number of candidates that were skipped.
        skipped: usize,
    },

    /// Resolution was cancelled before any candidate was evaluated.
    #[error("resolution cancelled before any revision was evaluated")]
    Cancelled,
}

/// An error from reading a numeric setting from the environment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The environment variable is set but is not valid UTF-8.
    #[error("${var} environment variable is not valid UTF-8: {value:?}")]
    NonUtf8 {
        /// The environment variable name.
        var: &'static str,
        /// The non-UTF-8 value.
        value: std::ffi::OsString,
    },

    /// The environment variable is not a non-negative integer.
    #[error("${var} environment variable is not a valid count: {value:?}")]
    InvalidCount {
        /// The environment variable name.
        var: &'static str,
        /// The value that failed to parse.
        value: String,
        /// The underlying parse error.
        #[source]
        source: std::num::ParseIntError,
    },
}
