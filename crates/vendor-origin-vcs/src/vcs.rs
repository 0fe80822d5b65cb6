// Copyright 2026 Oxide Computer Company

//! Selecting a version control system and its binary.

use crate::{VcsDetectError, VcsEnvError};
use camino::Utf8Path;
use fs_err as fs;
use std::io;
use vendor_origin::VcsName;

/// Reads a VCS binary path from an environment variable, falling back
/// to `default` if the variable is unset or empty.
///
/// The value is trimmed of leading and trailing whitespace.
///
/// Returns an error if the variable is set but is not valid UTF-8.
fn read_vcs_env(
    var: &'static str,
    default: &str,
) -> Result<String, VcsEnvError> {
    match std::env::var(var) {
        Ok(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(default.to_string())
            } else {
                Ok(trimmed.to_string())
            }
        }
        Err(std::env::VarError::NotPresent) => Ok(default.to_string()),
        Err(std::env::VarError::NotUnicode(value)) => {
            Err(VcsEnvError::NonUtf8 { var, value })
        }
    }
}

/// The version control system holding upstream history.
///
/// Use [`Vcs::git()`], [`Vcs::hg()`], [`Vcs::bzr()`], [`Vcs::svn()`], or
/// [`Vcs::detect()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vcs(VcsKind);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum VcsKind {
    Git { binary: String },
    Hg { binary: String },
    Bzr { binary: String },
    Svn { binary: String },
}

type VcsConstructor = fn() -> Result<Vcs, VcsEnvError>;

/// Metadata entries probed by [`Vcs::detect`], in order.
const DETECT_ORDER: [(&str, VcsConstructor); 4] = [
    (".git", Vcs::git),
    (".hg", Vcs::hg),
    (".bzr", Vcs::bzr),
    (".svn", Vcs::svn),
];

impl Vcs {
    /// Creates a Git VCS using the `$GIT` environment variable or
    /// `"git"`.
    ///
    /// Returns an error if the `$GIT` environment variable is set
    /// but is not valid UTF-8.
    pub fn git() -> Result<Self, VcsEnvError> {
        let binary = read_vcs_env("GIT", "git")?;
        Ok(Vcs(VcsKind::Git { binary }))
    }

    /// Creates a Mercurial VCS using the `$HG` environment variable or
    /// `"hg"`.
    pub fn hg() -> Result<Self, VcsEnvError> {
        let binary = read_vcs_env("HG", "hg")?;
        Ok(Vcs(VcsKind::Hg { binary }))
    }

    /// Creates a Bazaar VCS using the `$BZR` environment variable or
    /// `"bzr"`.
    pub fn bzr() -> Result<Self, VcsEnvError> {
        let binary = read_vcs_env("BZR", "bzr")?;
        Ok(Vcs(VcsKind::Bzr { binary }))
    }

    /// Creates a Subversion VCS using the `$SVN` environment variable or
    /// `"svn"`.
    pub fn svn() -> Result<Self, VcsEnvError> {
        let binary = read_vcs_env("SVN", "svn")?;
        Ok(Vcs(VcsKind::Svn { binary }))
    }

    /// Detects the VCS for a repository.
    ///
    /// `repo_root` must be the repository (or, for Subversion, working
    /// copy) root. `.git`, `.hg`, `.bzr` and `.svn` are probed in that
    /// order and the first one present wins. (`.git` may be a directory
    /// or a file, as in worktrees and submodules.)
    pub fn detect(repo_root: &Utf8Path) -> Result<Self, VcsDetectError> {
        // Use metadata() to distinguish "not a directory" from I/O
        // errors (e.g., permission denied).
        match fs::metadata(repo_root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(VcsDetectError::NotADirectory {
                    repo_root: repo_root.to_owned(),
                });
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(VcsDetectError::PathNotFound {
                    repo_root: repo_root.to_owned(),
                });
            }
            Err(err) => {
                return Err(VcsDetectError::Io {
                    path: repo_root.to_owned(),
                    source: err,
                });
            }
        }

        for (entry, constructor) in DETECT_ORDER {
            let path = repo_root.join(entry);
            match path.try_exists() {
                Ok(true) => return Ok(constructor()?),
                Ok(false) => {}
                Err(source) => {
                    return Err(VcsDetectError::Io { path, source });
                }
            }
        }

        Err(VcsDetectError::NotFound { repo_root: repo_root.to_owned() })
    }

    /// Returns the path to the VCS binary.
    pub fn binary(&self) -> &str {
        match &self.0 {
            VcsKind::Git { binary }
            | VcsKind::Hg { binary }
            | VcsKind::Bzr { binary }
            | VcsKind::Svn { binary } => binary,
        }
    }

    /// Returns the name of the VCS.
    pub fn name(&self) -> VcsName {
        match &self.0 {
            VcsKind::Git { .. } => VcsName::Git,
            VcsKind::Hg { .. } => VcsName::Hg,
            VcsKind::Bzr { .. } => VcsName::Bzr,
            VcsKind::Svn { .. } => VcsName::Svn,
        }
    }

    pub(crate) fn kind(&self) -> &VcsKind {
        &self.0
    }
}
