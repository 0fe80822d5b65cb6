// Copyright 2026 Oxide Computer Company

//! Bazaar: revisions are mainline revision numbers, newest first.

use super::{Context, export_and_hash};
use vendor_origin::{RevisionId, RevisionIter, TagMap, TreeSignature, VcsError};

pub(crate) fn revisions(
    cx: &Context<'_>,
) -> Result<RevisionIter<'static>, VcsError> {
    const OPERATION: &str = "list revisions";
    let stdout = cx.run_text(OPERATION, &cx.command(["revno"]))?;
    let head: u64 = stdout
        .trim()
        .parse()
        .map_err(|_| cx.unexpected(OPERATION, stdout.trim()))?;
    let revisions = (1..=head).rev();
    Ok(Box::new(revisions.map(|revno| Ok(RevisionId::new(revno.to_string())))))
}

pub(crate) fn tags(cx: &Context<'_>) -> Result<TagMap, VcsError> {
    const OPERATION: &str = "list tags";
    let stdout = cx.run_text(OPERATION, &cx.command(["tags"]))?;
    parse_tags(&stdout).map_err(|line| cx.unexpected(OPERATION, line))
}

/// Parses `bzr tags`: a tag name, whitespace, and a revision number.
///
/// Only mainline revisions are ever listed, so tags on merged revisions
/// (dotted revnos such as `38.1.2`) and tags outside the ancestry (`?`) are
/// left out.
///
/// On failure, returns the offending line.
pub(crate) fn parse_tags(stdout: &str) -> Result<TagMap, String> {
    let mut tags = TagMap::new();
    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (tag, revno) = line
            .rsplit_once(char::is_whitespace)
            .ok_or_else(|| line.to_owned())?;
        if revno == "?" || is_dotted_revno(revno) {
            continue;
        }
        if revno.parse::<u64>().is_err() {
            return Err(line.to_owned());
        }
        let tag = tag.trim_end().to_owned();
        tags.entry(RevisionId::new(revno)).or_default().push(tag);
    }
    Ok(tags)
}

fn is_dotted_revno(revno: &str) -> bool {
    revno.contains('.')
        && revno.split('.').all(|part| part.parse::<u64>().is_ok())
}

pub(crate) fn tree_at(
    cx: &Context<'_>,
    revision: &RevisionId,
) -> Result<TreeSignature, VcsError> {
    export_and_hash(cx, revision, |dest| {
        let invocation = cx
            .command(["export", "-r", revision.as_str()])
            .arg(dest.as_str());
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
