// Copyright 2026 Oxide Computer Company

//! Comparing two tree signatures.

use crate::TreeSignature;
use std::fmt;

/// File-level differences between a local tree and a candidate revision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DifferenceReport {
    /// Files present in both trees with the same contents.
    pub identical: usize,
    /// Files present only in the local tree.
    pub only_in_local: usize,
    /// Files present only in the candidate revision.
    pub only_in_candidate: usize,
    /// Files present in both trees with different contents.
    pub different: usize,
}

impl DifferenceReport {
    /// Compares `local` against `candidate`.
    ///
    /// Swapping the arguments swaps `only_in_local` and `only_in_candidate`
    /// and leaves the other counts unchanged.
    pub fn compare(local: &TreeSignature, candidate: &TreeSignature) -> Self {
        let mut report = DifferenceReport::default();
        for file in local.iter() {
            match candidate.get(file.path) {
                Some(hash) if *hash == file.hash => report.identical += 1,
                Some(_) => report.different += 1,
                None => report.only_in_local += 1,
            }
        }
        report.only_in_candidate =
            candidate.len() - (report.identical + report.different);
        report
    }

    /// Returns the number of files that keep the trees from being identical.
    pub fn total_differences(&self) -> usize {
        self.only_in_local + self.only_in_candidate + self.different
    }

    /// Returns whether the two trees are identical in file set and contents.
    pub fn is_exact(&self) -> bool {
        self.total_differences() == 0
    }
}

impl fmt::Display for DifferenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} identical, {} changed, {} only in local, \
             {} only in revision",
            self.identical,
            self.different,
            self.only_in_local,
            self.only_in_candidate,
        )
    }
}
