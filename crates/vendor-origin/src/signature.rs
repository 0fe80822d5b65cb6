// Copyright 2026 Oxide Computer Company

//! Content signatures for file trees.

use crate::{Cancellation, ContentHash, HashScheme, SignatureError};
use camino::Utf8Path;
use fs_err as fs;
use std::{
    collections::{BTreeMap, btree_map},
    ops::Bound,
};
use walkdir::WalkDir;

/// Names of version control metadata entries. Any file or directory with
/// one of these names is left out of a signature, wherever it appears.
pub const VCS_METADATA_NAMES: &[&str] = &[
    ".git",
    ".hg",
    ".bzr",
    ".svn",
    ".jj",
    "_darcs",
    "CVS",
    // Written by `hg archive` unless disabled.
    ".hg_archival.txt",
];

/// One file in a [`TreeSignature`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileSignature<'a> {
    /// The slash-separated path relative to the tree root.
    pub path: &'a str,
    /// The hash of the file's contents.
    pub hash: ContentHash,
}

/// The content identity of a complete file tree.
///
/// Maps slash-separated relative paths to content hashes. Paths are unique,
/// relative, and use forward slashes on every platform.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeSignature {
    files: BTreeMap<String, ContentHash>,
}

impl TreeSignature {
    /// Creates an empty signature.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `hash` for `path`, returning the previous hash if the path
    /// was already present.
    ///
    /// Backslashes are normalized to forward slashes and leading `./` or `/`
    /// is stripped.
    pub fn insert(
        &mut self,
        path: impl AsRef<str>,
        hash: ContentHash,
    ) -> Option<ContentHash> {
        self.files.insert(normalize_path(path.as_ref()), hash)
    }

    /// Returns the hash recorded for `path`.
    pub fn get(&self, path: &str) -> Option<&ContentHash> {
        self.files.get(path)
    }

    /// Returns the number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns whether the tree has no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterates over the files in path order.
    pub fn iter(&self) -> impl Iterator<Item = FileSignature<'_>> {
        self.files
            .iter()
            .map(|(path, hash)| FileSignature { path, hash: *hash })
    }

    /// Returns the signature of the subdirectory `prefix`, with `prefix`
    /// stripped from every path.
    ///
    /// An empty prefix returns a copy of the whole tree.
    pub fn subtree(&self, prefix: &str) -> TreeSignature {
        let prefix = normalize_path(prefix);
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return self.clone();
        }
        let dir = format!("{prefix}/");
        let files = self
            .files
            .range::<str, _>((Bound::Included(dir.as_str()), Bound::Unbounded))
            .take_while(|(path, _)| path.starts_with(&dir))
            .map(|(path, hash)| (path[dir.len()..].to_owned(), *hash))
            .collect();
        TreeSignature { files }
    }
}

impl<S: AsRef<str>> FromIterator<(S, ContentHash)> for TreeSignature {
    fn from_iter<I: IntoIterator<Item = (S, ContentHash)>>(iter: I) -> Self {
        let mut signature = TreeSignature::new();
        for (path, hash) in iter {
            signature.insert(path, hash);
        }
        signature
    }
}

impl<'a> IntoIterator for &'a TreeSignature {
    type Item = (&'a String, &'a ContentHash);
    type IntoIter = btree_map::Iter<'a, String, ContentHash>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

fn normalize_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let mut rest = normalized.as_str();
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }
    rest.to_owned()
}

/// Builds a [`TreeSignature`] from a directory on disk.
///
/// Symbolic links are neither followed nor recorded, and version control
/// metadata (see [`VCS_METADATA_NAMES`]) is skipped.
#[derive(Clone, Debug)]
pub struct SignatureBuilder {
    scheme: HashScheme,
    excluded: Vec<String>,
}

impl SignatureBuilder {
    /// Creates a builder hashing files with `scheme`.
    pub fn new(scheme: HashScheme) -> Self {
        SignatureBuilder {
            scheme,
            excluded: VCS_METADATA_NAMES
                .iter()
                .map(|name| (*name).to_owned())
                .collect(),
        }
    }

    /// Also skips files and directories named `name`.
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.excluded.push(name.into());
        self
    }

    /// Returns the hash scheme in use.
    pub fn scheme(&self) -> HashScheme {
        self.scheme
    }

    /// Walks `root` and hashes every regular file below it.
    ///
    /// `cancel` is checked before each file is read; cancellation fails the
    /// build with [`SignatureError::Cancelled`].
    pub fn build(
        &self,
        root: &Utf8Path,
        cancel: &Cancellation,
    ) -> Result<TreeSignature, SignatureError> {
        let mut signature = TreeSignature::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            // The root itself is never excluded, so that a checkout can be
            // hashed even if it happens to be named like a metadata dir.
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| self.is_excluded(name))
            });

        for entry in walker {
            let entry = entry.map_err(|source| SignatureError::Walk {
                root: root.to_owned(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if cancel.is_cancelled() {
                return Err(SignatureError::Cancelled);
            }

            let path = Utf8Path::from_path(entry.path()).ok_or_else(|| {
                SignatureError::NonUtf8Path { path: entry.path().to_owned() }
            })?;
            let contents = fs::read(path).map_err(|source| {
                SignatureError::ReadFile { path: path.to_owned(), source }
            })?;
            signature
                .insert(relative_path(root, path), self.scheme.hash(&contents));
        }

        Ok(signature)
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.excluded.iter().any(|excluded| excluded == name)
    }
}

fn relative_path(root: &Utf8Path, path: &Utf8Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().map(|c| c.as_str()).collect::<Vec<_>>().join("/")
}
