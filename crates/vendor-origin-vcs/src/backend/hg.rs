// Copyright 2026 Oxide Computer Company

//! Mercurial: revisions are archived to a scratch directory and hashed.

use super::{Context, export_and_hash, is_node_id, revision_lines};
use vendor_origin::{RevisionId, RevisionIter, TagMap, TreeSignature, VcsError};

pub(crate) fn revisions(
    cx: &Context<'_>,
) -> Result<RevisionIter<'static>, VcsError> {
    const OPERATION: &str = "list revisions";
    let invocation = cx.command(["log", "--template", "{node}\\n"]);
    let stdout = cx.run_text(OPERATION, &invocation)?;
    Ok(revision_lines(cx.vcs_name, OPERATION, stdout.lines(), |line| {
        is_node_id(line).then(|| RevisionId::new(line))
    }))
}

pub(crate) fn tags(cx: &Context<'_>) -> Result<TagMap, VcsError> {
    const OPERATION: &str = "list tags";
    let invocation = cx.command(["tags", "--template", "{node} {tag}\\n"]);
    let stdout = cx.run_text(OPERATION, &invocation)?;
    parse_tags(&stdout).map_err(|line| cx.unexpected(OPERATION, line))
}

/// Parses `hg tags --template "{node} {tag}\n"`. The moving `tip` tag is
/// left out.
///
/// On failure, returns the offending line.
pub(crate) fn parse_tags(stdout: &str) -> Result<TagMap, String> {
    let mut tags = TagMap::new();
    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (node, tag) = line
            .split_once(' ')
            .filter(|(node, _)| is_node_id(node))
            .ok_or_else(|| line.to_owned())?;
        if tag == "tip" {
            continue;
        }
        tags.entry(RevisionId::new(node)).or_default().push(tag.to_owned());
    }
    Ok(tags)
}

pub(crate) fn tree_at(
    cx: &Context<'_>,
    revision: &RevisionId,
) -> Result<TreeSignature, VcsError> {
    export_and_hash(cx, revision, |dest| {
        let invocation = cx
            .command(["archive", "--config", "ui.archivemeta=false", "-r"])
            .args([revision.as_str(), "--type", "files", dest.as_str()]);
        let output = cx.run(&invocation)?;
        if output.success {
            Ok(())
        } else if output.stderr_text().contains("unknown revision") {
            Err(cx.no_such_revision(revision))
        } else {
            Err(cx.failed("archive revision", &output))
        }
    })
}

pub(crate) fn nearest_tag(
    cx: &Context<'_>,
    revision: &RevisionId,
) -> Result<Option<String>, VcsError> {
    let invocation = cx
        .command(["log", "-r", revision.as_str()])
        .args(["--template", "{latesttag}"]);
    let stdout = cx.run_text("describe revision", &invocation)?;
    Ok(parse_latest_tag(&stdout))
}

/// `{latesttag}` renders as `null` when no ancestor is tagged.
fn parse_latest_tag(stdout: &str) -> Option<String> {
    match stdout.trim() {
        "" | "null" => None,
        tag => Some(tag.to_owned()),
    }
}
