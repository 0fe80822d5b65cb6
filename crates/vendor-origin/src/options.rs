// Copyright 2026 Oxide Computer Company

//! Resolution options and cancellation.

use crate::ConfigError;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

/// Environment variable overriding [`ResolveOptions::search_bound`].
pub const SEARCH_BOUND_ENV: &str = "VENDOR_ORIGIN_SEARCH_BOUND";

/// Environment variable overriding [`ResolveOptions::prefetch`].
pub const PREFETCH_ENV: &str = "VENDOR_ORIGIN_PREFETCH";

/// A cancellation signal shared between a caller and a running resolution.
///
/// Clones share the same flag. A deadline, if set, cancels automatically
/// once it passes.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// Creates a signal that is never triggered unless
    /// [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a signal that triggers at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Cancellation { flag: Arc::default(), deadline: Some(deadline) }
    }

    /// Triggers the signal for every clone.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns whether the signal has been triggered or the deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Options controlling a resolution.
///
/// ```
/// use vendor_origin::ResolveOptions;
///
/// let options = ResolveOptions::new()
///     .search_bound(Some(500))
///     .prefetch(4)
///     .upstream_subdir("src/widget");
/// assert_eq!(options.get_search_bound(), Some(500));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ResolveOptions {
    search_bound: Option<usize>,
    prefetch: usize,
    upstream_subdir: Option<String>,
    cancellation: Cancellation,
}

impl ResolveOptions {
    /// Creates the default options: the whole history is searched, there is
    /// no prefetching, and the whole upstream tree is compared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the default options, overridden by
    /// `$VENDOR_ORIGIN_SEARCH_BOUND` and `$VENDOR_ORIGIN_PREFETCH`.
    ///
    /// Unset or empty variables keep the default. A search bound of `0`
    /// means unbounded.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut options = Self::new();
        if let Some(bound) = read_count_env(SEARCH_BOUND_ENV)? {
            options = options.search_bound(Some(bound));
        }
        if let Some(prefetch) = read_count_env(PREFETCH_ENV)? {
            options.prefetch = prefetch;
        }
        Ok(options)
    }

    /// Limits how many candidate revisions are evaluated when no exact match
    /// is found. Skipped candidates do not count. `None` (or `Some(0)`)
    /// searches the whole history.
    pub fn search_bound(mut self, bound: Option<usize>) -> Self {
        self.search_bound = bound.filter(|&bound| bound > 0);
        self
    }

    /// Fetches tree signatures for up to `count` upcoming candidates in
    /// parallel. Candidates are still scored in history order.
    pub fn prefetch(mut self, count: usize) -> Self {
        self.prefetch = count;
        self
    }

    /// Compares the local tree against `subdir` of each revision instead of
    /// the revision's whole tree.
    pub fn upstream_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.upstream_subdir = Some(subdir.into());
        self
    }

    /// Uses `cancellation` to stop resolution early.
    pub fn cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Returns the search bound.
    pub fn get_search_bound(&self) -> Option<usize> {
        self.search_bound
    }

    /// Returns the prefetch window size.
    pub fn get_prefetch(&self) -> usize {
        self.prefetch
    }

    /// Returns the upstream subdirectory, if any.
    pub fn get_upstream_subdir(&self) -> Option<&str> {
        self.upstream_subdir.as_deref()
    }

    /// Returns the cancellation signal.
    pub fn get_cancellation(&self) -> &Cancellation {
        &self.cancellation
    }
}

/// Reads a count from an environment variable.
///
/// The value is trimmed; unset or empty yields `None`.
fn read_count_env(var: &'static str) -> Result<Option<usize>, ConfigError> {
    let value = match std::env::var(var) {
        Ok(s) => s,
        Err(std::env::VarError::NotPresent) => return Ok(None),
        Err(std::env::VarError::NotUnicode(value)) => {
            return Err(ConfigError::NonUtf8 { var, value });
        }
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse().map(Some).map_err(|source| ConfigError::InvalidCount {
        var,
        value: trimmed.to_owned(),
        source,
    })
}
