// Copyright 2026 Oxide Computer Company

//! File content hash types.

use crate::ContentHashParseError;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};

/// A digest of a file's contents.
///
/// This type guarantees the contained value is either:
///
/// - 20 bytes (SHA-1, displayed as 40 lowercase hex characters)
/// - 32 bytes (SHA-256, displayed as 64 lowercase hex characters)
///
/// The framing that was hashed is described by the [`HashScheme`] that
/// produced it. Two hashes are only comparable if they were produced by the
/// same scheme.
///
/// # Parsing
///
/// ```
/// use vendor_origin::ContentHash;
///
/// let hash: ContentHash =
///     "ce013625030ba8dba906f756967f9e9ca394464a".parse().unwrap();
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentHash {
    /// A SHA-1 digest.
    Sha1([u8; 20]),
    /// A SHA-256 digest.
    Sha256([u8; 32]),
}

impl FromStr for ContentHash {
    type Err = ContentHashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let len = s.len();
        match len {
            40 => {
                let mut bytes = [0; 20];
                hex::decode_to_slice(s, &mut bytes)
                    .map_err(ContentHashParseError::InvalidHex)?;
                Ok(ContentHash::Sha1(bytes))
            }
            64 => {
                let mut bytes = [0; 32];
                hex::decode_to_slice(s, &mut bytes)
                    .map_err(ContentHashParseError::InvalidHex)?;
                Ok(ContentHash::Sha256(bytes))
            }
            _ => Err(ContentHashParseError::InvalidLength(len)),
        }
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentHash::Sha1(bytes) => hex::encode(bytes).fmt(f),
            ContentHash::Sha256(bytes) => hex::encode(bytes).fmt(f),
        }
    }
}

/// How file bytes are turned into a [`ContentHash`].
///
/// Backends that can list content hashes directly (git) advertise the
/// scheme their object store uses, so that the local tree can be hashed the
/// same way without reading anything out of history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum HashScheme {
    /// SHA-1 over `blob <len>\0` followed by the contents: the object id of
    /// a blob in a SHA-1 git repository.
    GitBlobSha1,
    /// SHA-256 over `blob <len>\0` followed by the contents: the object id
    /// of a blob in a SHA-256 git repository.
    GitBlobSha256,
    /// Plain SHA-256 over the contents.
    Sha256,
}

impl HashScheme {
    /// Hashes `contents` according to this scheme.
    pub fn hash(self, contents: &[u8]) -> ContentHash {
        match self {
            HashScheme::GitBlobSha1 => {
                let mut hasher = Sha1::new();
                hasher.update(blob_header(contents));
                hasher.update(contents);
                ContentHash::Sha1(hasher.finalize().into())
            }
            HashScheme::GitBlobSha256 => {
                let mut hasher = Sha256::new();
                hasher.update(blob_header(contents));
                hasher.update(contents);
                ContentHash::Sha256(hasher.finalize().into())
            }
            HashScheme::Sha256 => {
                ContentHash::Sha256(Sha256::digest(contents).into())
            }
        }
    }
}

impl fmt::Display for HashScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashScheme::GitBlobSha1 => write!(f, "git-blob-sha1"),
            HashScheme::GitBlobSha256 => write!(f, "git-blob-sha256"),
            HashScheme::Sha256 => write!(f, "sha256"),
        }
    }
}

fn blob_header(contents: &[u8]) -> Vec<u8> {
    format!("blob {}\0", contents.len()).into_bytes()
}
