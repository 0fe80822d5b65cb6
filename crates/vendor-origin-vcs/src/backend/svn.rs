// Copyright 2026 Oxide Computer Company

//! Subversion: revisions are exported from the working copy's repository
//! URL. Tags are ordinary directories, so none are reported.

use super::{Context, export_and_hash, revision_lines};
use vendor_origin::{RevisionId, RevisionIter, TreeSignature, VcsError};

pub(crate) fn revisions(
    cx: &Context<'_>,
) -> Result<RevisionIter<'static>, VcsError> {
    const OPERATION: &str = "list revisions";
    let stdout = cx.run_text(OPERATION, &cx.command(["log", "-q"]))?;
    let entries = stdout.lines().filter(|line| !is_separator(line));
    Ok(revision_lines(cx.vcs_name, OPERATION, entries, parse_log_entry))
}

fn is_separator(line: &str) -> bool {
    line.starts_with("---")
}

/// Parses an `svn log -q` entry such as `r42 | alice | 2024-01-01 ...`.
pub(crate) fn parse_log_entry(line: &str) -> Option<RevisionId> {
    let (revision, _) = line.split_once(" |")?;
    let number = revision.strip_prefix('r')?;
    number.parse::<u64>().ok()?;
    Some(RevisionId::new(number))
}

/// Returns the repository URL of the working copy.
pub(crate) fn url(cx: &Context<'_>) -> Result<String, VcsError> {
    const OPERATION: &str = "read repository url";
    let invocation = cx.command(["info", "--show-item", "url"]);
    let stdout = cx.run_text(OPERATION, &invocation)?;
    let url = stdout.trim();
    if url.is_empty() {
        return Err(cx.unexpected(OPERATION, url));
    }
    Ok(url.to_owned())
}

/// Exports `revision` of the repository at `url`.
pub(crate) fn tree_at(
    cx: &Context<'_>,
    url: &str,
    revision: &RevisionId,
) -> Result<TreeSignature, VcsError> {
    export_and_hash(cx, revision, |dest| {
        let invocation = cx
            .command(["export", "-q", "-r", revision.as_str()])
            .args([format!("{url}@{revision}"), dest.to_string()]);
        let output = cx.run(&invocation)?;
        if output.success {
            Ok(())
        } else if output.stderr_text().contains("No such revision") {
            Err(cx.no_such_revision(revision))
        } else {
            Err(cx.failed("export revision", &output))
        }
    })
}
