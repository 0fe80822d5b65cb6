// Copyright 2026 Oxide Computer Company

//! Git: blob ids are read straight from `git ls-tree`, so no checkout is
//! needed.

use super::{Context, revision_lines};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use vendor_origin::{
    ContentHash, HashScheme, RevisionId, RevisionIter, TagMap, TreeSignature,
    VcsError,
};

/// `git ls-tree` mode for symbolic links.
const SYMLINK_MODE: &str = "120000";

/// Substrings of git's stderr meaning the revision does not exist.
const MISSING_REVISION: [&str; 3] =
    ["bad object", "not a tree object", "Not a valid object name"];

/// Returns the hash scheme matching the repository's object format.
///
/// Git versions too old to know `--show-object-format` only support SHA-1.
pub(crate) fn hash_scheme(cx: &Context<'_>) -> HashScheme {
    let invocation = cx.command(["rev-parse", "--show-object-format"]);
    match cx.run_text("read object format", &invocation) {
        Ok(format) if format.trim() == "sha256" => HashScheme::GitBlobSha256,
        Ok(_) => HashScheme::GitBlobSha1,
        Err(error) => {
            debug!("assuming sha1 object format: {error}");
            HashScheme::GitBlobSha1
        }
    }
}

/// Fails with [`VcsError::HistoryUnavailable`] if the repository is a
/// shallow clone.
pub(crate) fn check_shallow(cx: &Context<'_>) -> Result<(), VcsError> {
    const OPERATION: &str = "check for shallow clone";
    let invocation = cx.command(["rev-parse", "--is-shallow-repository"]);
    let stdout = cx.run_text(OPERATION, &invocation)?;
    match stdout.trim() {
        "false" => Ok(()),
        "true" => {
            warn!("{} is a shallow clone", cx.repo_root);
            Err(VcsError::HistoryUnavailable {
                vcs_name: cx.vcs_name,
                repo_root: cx.repo_root.to_owned(),
                reason: "shallow clone detected \
                         (run `git fetch --unshallow`)"
                    .to_owned(),
            })
        }
        other => Err(cx.unexpected(OPERATION, other)),
    }
}

pub(crate) fn revisions(
    cx: &Context<'_>,
) -> Result<RevisionIter<'static>, VcsError> {
    const OPERATION: &str = "list revisions";
    let stdout = cx.run_text(OPERATION, &cx.command(["rev-list", "--all"]))?;
    Ok(revision_lines(cx.vcs_name, OPERATION, stdout.lines(), parse_commit))
}

fn parse_commit(line: &str) -> Option<RevisionId> {
    line.parse::<ContentHash>().ok().map(|_| RevisionId::new(line))
}

pub(crate) fn tags(cx: &Context<'_>) -> Result<TagMap, VcsError> {
    const OPERATION: &str = "list tags";
    let output = cx.run(&cx.command(["show-ref", "--tags", "-d"]))?;
    if !output.success {
        // show-ref exits 1 when there is nothing to show.
        if output.code == Some(1) && output.stdout.is_empty() {
            return Ok(TagMap::new());
        }
        return Err(cx.failed(OPERATION, &output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_show_ref(&stdout).map_err(|line| cx.unexpected(OPERATION, line))
}

/// Parses `git show-ref --tags -d`, peeling annotated tags to the commit
/// they point at.
///
/// On failure, returns the offending line.
pub(crate) fn parse_show_ref(stdout: &str) -> Result<TagMap, String> {
    let mut targets: BTreeMap<&str, &str> = BTreeMap::new();
    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (object, name) =
            line.split_once(' ').ok_or_else(|| line.to_owned())?;
        let name =
            name.strip_prefix("refs/tags/").ok_or_else(|| line.to_owned())?;
        match name.strip_suffix("^{}") {
            Some(tag) => {
                targets.insert(tag, object);
            }
            None => {
                targets.entry(name).or_insert(object);
            }
        }
    }

    let mut tags = TagMap::new();
    for (tag, object) in targets {
        tags.entry(RevisionId::new(object)).or_default().push(tag.to_owned());
    }
    Ok(tags)
}

pub(crate) fn tree_at(
    cx: &Context<'_>,
    revision: &RevisionId,
) -> Result<TreeSignature, VcsError> {
    const OPERATION: &str = "list tree";
    let invocation = cx
        .command(["ls-tree", "-r", "-z", "--full-tree"])
        .arg(revision.as_str());
    let output = cx.run(&invocation)?;
    if !output.success {
        let stderr = output.stderr_text();
        if MISSING_REVISION.iter().any(|marker| stderr.contains(marker)) {
            return Err(cx.no_such_revision(revision));
        }
        return Err(cx.failed(OPERATION, &output));
    }
    parse_ls_tree(&output.stdout)
        .map_err(|entry| cx.unexpected(OPERATION, entry))
}

/// Parses `git ls-tree -r -z` output into a signature of blob ids.
///
/// Symbolic links and submodules (gitlinks) are left out. On failure,
/// returns the offending entry.
pub(crate) fn parse_ls_tree(stdout: &[u8]) -> Result<TreeSignature, String> {
    let mut tree = TreeSignature::new();
    for entry in stdout.split(|&b| b == 0).filter(|e| !e.is_empty()) {
        let entry = std::str::from_utf8(entry)
            .map_err(|_| String::from_utf8_lossy(entry).into_owned())?;
        let malformed = || entry.to_owned();

        // <mode> SP <type> SP <object> TAB <path>
        let (meta, path) = entry.split_once('\t').ok_or_else(malformed)?;
        let mut fields = meta.split(' ');
        let (Some(mode), Some(kind), Some(object), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed());
        };
        if kind != "blob" || mode == SYMLINK_MODE {
            continue;
        }
        let hash = object.parse::<ContentHash>().map_err(|_| malformed())?;
        tree.insert(path, hash);
    }
    Ok(tree)
}

pub(crate) fn nearest_tag(
    cx: &Context<'_>,
    revision: &RevisionId,
) -> Result<Option<String>, VcsError> {
    let invocation = cx
        .command(["describe", "--tags", "--abbrev=0"])
        .arg(revision.as_str());
    let output = cx.run(&invocation)?;
    if !output.success {
        let stderr = output.stderr_text();
        if stderr.contains("No names found")
            || stderr.contains("No tags can describe")
        {
            return Ok(None);
        }
        return Err(cx.failed("describe revision", &output));
    }
    let tag = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    Ok((!tag.is_empty()).then_some(tag))
}
