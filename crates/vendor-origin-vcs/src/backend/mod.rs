// Copyright 2026 Oxide Computer Company

//! Per-VCS command construction and output parsing.

pub(crate) mod bzr;
pub(crate) mod git;
pub(crate) mod hg;
pub(crate) mod svn;

use crate::{CommandOutput, CommandRunner, Invocation};
use camino::Utf8Path;
use camino_tempfile::Utf8TempDir;
use vendor_origin::{
    Cancellation, HashScheme, RevisionId, RevisionIter, SignatureBuilder,
    TreeSignature, VcsError, VcsName,
};

/// Everything a backend needs to run commands against one repository.
pub(crate) struct Context<'a> {
    pub(crate) vcs_name: VcsName,
    pub(crate) binary: &'a str,
    pub(crate) repo_root: &'a Utf8Path,
    pub(crate) runner: &'a dyn CommandRunner,
    pub(crate) cancel: &'a Cancellation,
}

impl Context<'_> {
    /// Starts an invocation of the VCS binary in the repository root.
    pub(crate) fn command<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation::new(self.binary, self.repo_root).args(args)
    }

    /// Runs `invocation`, failing only if it cannot be started.
    pub(crate) fn run(
        &self,
        invocation: &Invocation,
    ) -> Result<CommandOutput, VcsError> {
        self.runner.run(invocation).map_err(|source| VcsError::SpawnFailed {
            vcs_name: self.vcs_name,
            binary_path: self.binary.to_string(),
            repo_root: self.repo_root.to_owned(),
            source,
        })
    }

    /// Runs `invocation` and returns its stdout, treating a non-zero exit
    /// as an error.
    pub(crate) fn run_ok(
        &self,
        operation: &'static str,
        invocation: &Invocation,
    ) -> Result<Vec<u8>, VcsError> {
        let output = self.run(invocation)?;
        if output.success {
            Ok(output.stdout)
        } else {
            Err(self.failed(operation, &output))
        }
    }

    /// Like [`run_ok`](Self::run_ok), decoding stdout as UTF-8.
    pub(crate) fn run_text(
        &self,
        operation: &'static str,
        invocation: &Invocation,
    ) -> Result<String, VcsError> {
        let stdout = self.run_ok(operation, invocation)?;
        String::from_utf8(stdout).map_err(|err| {
            let lossy = String::from_utf8_lossy(err.as_bytes()).into_owned();
            self.unexpected(operation, lossy)
        })
    }

    pub(crate) fn failed(
        &self,
        operation: &'static str,
        output: &CommandOutput,
    ) -> VcsError {
        VcsError::CommandFailed {
            vcs_name: self.vcs_name,
            operation,
            exit_status: output.exit_status.clone(),
            stderr: output.stderr_text(),
        }
    }

    pub(crate) fn unexpected(
        &self,
        operation: &'static str,
        output: impl Into<String>,
    ) -> VcsError {
        VcsError::UnexpectedOutput {
            vcs_name: self.vcs_name,
            operation,
            output: output.into(),
        }
    }

    pub(crate) fn no_such_revision(&self, revision: &RevisionId) -> VcsError {
        VcsError::NoSuchRevision {
            vcs_name: self.vcs_name,
            revision: revision.clone(),
        }
    }
}

/// Exports `revision` into a scratch directory with `export` and hashes
/// the result. The scratch directory is removed afterwards.
///
/// `export` receives the path to export into, which does not exist yet.
/// Hashing stops early if the context's cancellation fires.
pub(crate) fn export_and_hash<F>(
    cx: &Context<'_>,
    revision: &RevisionId,
    export: F,
) -> Result<TreeSignature, VcsError>
where
    F: FnOnce(&Utf8Path) -> Result<(), VcsError>,
{
    let scratch = Utf8TempDir::with_prefix("vendor-origin-export-").map_err(
        |source| VcsError::Export { revision: revision.clone(), source },
    )?;
    let dest = scratch.path().join("tree");
    export(&dest)?;

    SignatureBuilder::new(HashScheme::Sha256)
        .build(&dest, cx.cancel)
        .map_err(|source| VcsError::Signature {
            revision: revision.clone(),
            source,
        })
}

/// Turns captured listing output into a revision stream, one revision per
/// non-blank line. Lines `parse` rejects become
/// [`VcsError::UnexpectedOutput`] items rather than ending the stream.
pub(crate) fn revision_lines<'a, I, F>(
    vcs_name: VcsName,
    operation: &'static str,
    lines: I,
    parse: F,
) -> RevisionIter<'static>
where
    I: IntoIterator<Item = &'a str>,
    F: Fn(&str) -> Option<RevisionId> + 'static,
{
    let lines: Vec<String> = lines
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect();
    Box::new(lines.into_iter().map(move |line| {
        parse(&line).ok_or(VcsError::UnexpectedOutput {
            vcs_name,
            operation,
            output: line,
        })
    }))
}

/// Returns whether `line` is a full 40-character hex node id.
pub(crate) fn is_node_id(line: &str) -> bool {
    line.len() == 40 && line.bytes().all(|b| b.is_ascii_hexdigit())
}
