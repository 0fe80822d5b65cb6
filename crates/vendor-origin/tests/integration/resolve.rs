// Copyright 2026 Oxide Computer Company

//! Resolver behavior against scripted histories.

use crate::fake::{FakeHistory, UnavailableHistory, tree};
use vendor_origin::{
    Cancellation, Classification, DifferenceReport, ResolveError,
    ResolveOptions, Resolver, ScanStop, TreeSignature,
};

fn resolver(history: FakeHistory) -> Resolver<FakeHistory> {
    Resolver::new(history, ResolveOptions::new())
}

#[test]
fn test_exact_release_skips_newer_superset() {
    // The newer revision has an extra file, so only the older tagged one is
    // an exact match.
    let local = tree(&[("a.txt", "hello"), ("b.txt", "world")]);
    let history = FakeHistory::new()
        .revision(
            "r2",
            tree(&[("a.txt", "hello"), ("b.txt", "world"), ("c.txt", "extra")]),
        )
        .revision("r1", tree(&[("a.txt", "hello"), ("b.txt", "world")]))
        .tag("r1", "v1.0");

    let result = resolver(history).resolve(&local).unwrap();
    assert_eq!(
        result.classification(),
        &Classification::ExactRelease { tag: "v1.0".to_owned() }
    );
    assert_eq!(result.revision().id().as_str(), "r1");
    assert_eq!(result.version(), "v1.0");
    assert!(result.report().is_exact());
    assert_eq!(result.report().identical, 2);
    assert_eq!(result.stats().evaluated, 2);
    assert_eq!(result.stats().stop, ScanStop::ExactMatch);
    assert_eq!(result.to_string(), "exact match: release v1.0 (r1)");
}

#[test]
fn test_exact_unreleased_reports_revision() {
    let local = tree(&[("lib.rs", "fn new() {}")]);
    let history = FakeHistory::new()
        .revision("r3", tree(&[("lib.rs", "fn newer() {}")]))
        .revision("r2", tree(&[("lib.rs", "fn new() {}")]))
        .revision("r1", tree(&[("lib.rs", "fn old() {}")]))
        .tag("r1", "v0.1")
        .nearest_tag("r2", "v0.1");

    let result = resolver(history).resolve(&local).unwrap();
    assert_eq!(result.classification(), &Classification::ExactUnreleased);
    assert_eq!(result.version(), "r2");
    assert_eq!(result.nearest_tag(), Some("v0.1"));
    assert_eq!(
        result.to_string(),
        "exact match: unreleased revision r2 (after v0.1)"
    );
}

#[test]
fn test_newest_exact_match_wins() {
    // r3 and r2 are byte-identical (a no-op commit between them).
    let contents = [("main.c", "int main(void) { return 0; }")];
    let history = FakeHistory::new()
        .revision("r3", tree(&contents))
        .revision("r2", tree(&contents))
        .tag("r2", "v2.0")
        .revision("r1", tree(&[("main.c", "")]));

    let history_fetches = {
        let resolver = resolver(history);
        let result = resolver.resolve(&tree(&contents)).unwrap();
        assert_eq!(result.revision().id().as_str(), "r3");
        assert_eq!(result.classification(), &Classification::ExactUnreleased);
        assert_eq!(result.stats().evaluated, 1, "stops at first exact match");
        resolver.catalog().query().tree_fetches()
    };
    assert_eq!(history_fetches, 1);
}

#[test]
fn test_single_changed_file_is_approximate() {
    let local = tree(&[("a.txt", "patched"), ("b.txt", "same")]);
    let history = FakeHistory::new()
        .revision("r1", tree(&[("a.txt", "original"), ("b.txt", "same")]));

    let result = resolver(history).resolve(&local).unwrap();
    assert_eq!(result.classification(), &Classification::Approximate);
    assert_eq!(
        result.report(),
        &DifferenceReport {
            identical: 1,
            only_in_local: 0,
            only_in_candidate: 0,
            different: 1,
        }
    );
    assert_eq!(result.stats().stop, ScanStop::Exhausted);
    assert!(
        result.to_string().starts_with("closest match: r1 with 1 differing"),
        "{result}"
    );
}

#[test]
fn test_approximate_picks_fewest_differences() {
    let local = tree(&[("a", "1"), ("b", "2"), ("c", "3")]);
    let history = FakeHistory::new()
        .revision("r3", tree(&[("a", "x"), ("b", "y"), ("c", "3")]))
        .revision("r2", tree(&[("a", "1"), ("b", "2"), ("c", "old")]))
        .revision("r1", tree(&[("a", "1")]));

    let result = resolver(history).resolve(&local).unwrap();
    assert_eq!(result.revision().id().as_str(), "r2");
    assert_eq!(result.report().total_differences(), 1);
}

#[test]
fn test_approximate_tie_prefers_tagged() {
    let local = tree(&[("a", "1"), ("b", "2")]);
    let history = FakeHistory::new()
        .revision("r2", tree(&[("a", "1"), ("b", "newer")]))
        .revision("r1", tree(&[("a", "1"), ("b", "older")]))
        .tag("r1", "v1.0");

    let result = resolver(history).resolve(&local).unwrap();
    assert_eq!(result.classification(), &Classification::Approximate);
    assert_eq!(result.revision().id().as_str(), "r1");
    assert_eq!(result.revision().version_tag(), Some("v1.0"));
}

#[test]
fn test_approximate_tie_prefers_newer() {
    let local = tree(&[("a", "1"), ("b", "2")]);
    let history = FakeHistory::new()
        .revision("r3", tree(&[("a", "1"), ("b", "three")]))
        .revision("r2", tree(&[("a", "1"), ("b", "two")]))
        .revision("r1", tree(&[("a", "1"), ("b", "one")]));

    let result = resolver(history).resolve(&local).unwrap();
    assert_eq!(result.revision().id().as_str(), "r3");
}

#[test]
fn test_empty_history_is_no_history() {
    let local = tree(&[("a", "1")]);
    let err = resolver(FakeHistory::new()).resolve(&local).unwrap_err();
    assert!(matches!(err, ResolveError::NoHistory), "{err:?}");
}

#[test]
fn test_listing_failure_is_fatal() {
    let resolver = Resolver::new(UnavailableHistory, ResolveOptions::new());
    let err = resolver.resolve(&tree(&[("a", "1")])).unwrap_err();
    assert!(matches!(err, ResolveError::HistoryUnavailable(_)), "{err:?}");
}

#[test]
fn test_listing_error_on_first_entry_is_fatal() {
    let history = FakeHistory::new()
        .revision("r2", tree(&[("a", "1")]))
        .revision("r1", tree(&[("a", "1")]))
        .listing_error_at(0);
    let err = resolver(history).resolve(&tree(&[("a", "1")])).unwrap_err();
    assert!(matches!(err, ResolveError::HistoryUnavailable(_)), "{err:?}");
}

#[test]
fn test_listing_error_later_is_skipped() {
    let history = FakeHistory::new()
        .revision("r3", tree(&[("a", "3")]))
        .revision("r2", tree(&[("a", "2")]))
        .revision("r1", tree(&[("a", "1")]))
        .listing_error_at(1);
    let result = resolver(history).resolve(&tree(&[("a", "1")])).unwrap();
    assert_eq!(result.revision().id().as_str(), "r1");
    assert_eq!(result.stats().listing_errors, 1);
}

#[test]
fn test_failed_fetch_is_skipped() {
    let local = tree(&[("a", "1"), ("b", "2")]);
    let history = FakeHistory::new()
        .revision("r5", tree(&[("a", "5"), ("b", "5")]))
        .revision("r4", tree(&[("a", "4"), ("b", "4")]))
        .revision("r3", tree(&[("a", "1"), ("b", "2")]))
        .revision("r2", tree(&[("a", "2"), ("b", "2")]))
        .revision("r1", tree(&[("a", "1"), ("b", "1")]))
        .broken("r3");

    let result = resolver(history).resolve(&local).unwrap();
    assert_eq!(result.classification(), &Classification::Approximate);
    assert_eq!(result.stats().evaluated, 4);
    assert_eq!(result.stats().skipped.len(), 1);
    assert_eq!(result.stats().skipped[0].revision.as_str(), "r3");
    assert!(
        result.stats().skipped[0].reason.contains("not a tree object"),
        "{:?}",
        result.stats().skipped
    );
    // r2 and r1 tie at one differing file; the newer one wins.
    assert_eq!(result.revision().id().as_str(), "r2");
}

#[test]
fn test_every_fetch_failing_is_no_usable_revision() {
    let history = FakeHistory::new()
        .revision("r2", tree(&[("a", "1")]))
        .revision("r1", tree(&[("a", "1")]))
        .broken("r2")
        .broken("r1");
    let err = resolver(history).resolve(&tree(&[("a", "1")])).unwrap_err();
    assert!(
        matches!(err, ResolveError::NoUsableRevision { skipped: 2 }),
        "{err:?}"
    );
}

#[test]
fn test_empty_local_tree_matches_empty_revision() {
    let history = FakeHistory::new()
        .revision("r3", tree(&[("a", "1")]))
        .revision("r2", TreeSignature::new())
        .revision("r1", TreeSignature::new());

    let result = resolver(history).resolve(&TreeSignature::new()).unwrap();
    assert_eq!(result.classification(), &Classification::ExactUnreleased);
    assert_eq!(result.revision().id().as_str(), "r2");
}

#[test]
fn test_search_bound_limits_evaluation() {
    let local = tree(&[("a", "0")]);
    let history = FakeHistory::new()
        .revision("r4", tree(&[("a", "4")]))
        .revision("r3", tree(&[("a", "3")]))
        .broken("r3")
        .revision("r2", tree(&[("a", "2")]))
        .revision("r1", tree(&[("a", "0")]));

    let options = ResolveOptions::new().search_bound(Some(2));
    let result = Resolver::new(history, options).resolve(&local).unwrap();
    assert_eq!(result.classification(), &Classification::Approximate);
    assert_eq!(result.stats().stop, ScanStop::SearchBound);
    assert_eq!(result.stats().evaluated, 2, "skipped r3 does not count");
    assert_eq!(result.stats().skipped.len(), 1);
    assert_eq!(result.revision().id().as_str(), "r4");
}

#[test]
fn test_prefetch_keeps_history_order() {
    let contents = [("x", "match")];
    let mut history = FakeHistory::new();
    for i in (1..=20).rev() {
        let id = format!("r{i}");
        let files =
            if i <= 5 { tree(&contents) } else { tree(&[("x", "no")]) };
        history = history.revision(&id, files);
    }
    history = history.tag("r3", "v3").broken("r12");

    let options = ResolveOptions::new().prefetch(4);
    let resolver = Resolver::new(history, options);
    let result = resolver.resolve(&tree(&contents)).unwrap();
    assert_eq!(
        result.revision().id().as_str(),
        "r5",
        "newest exact match, even when later ones were fetched in parallel"
    );
    assert_eq!(result.classification(), &Classification::ExactUnreleased);
    assert_eq!(result.stats().skipped.len(), 1);
}

#[test]
fn test_resolution_is_reproducible() {
    let local = tree(&[("a", "1"), ("b", "2")]);
    let history = FakeHistory::new()
        .revision("r2", tree(&[("a", "1"), ("b", "x")]))
        .revision("r1", tree(&[("a", "1")]))
        .tag("r1", "v1");

    let resolver = resolver(history);
    let first = resolver.resolve(&local).unwrap();
    let second = resolver.resolve(&local).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        resolver.catalog().query().tree_fetches(),
        2,
        "second resolution is served from the cache"
    );
}

#[test]
fn test_cancelled_before_start() {
    let cancel = Cancellation::new();
    cancel.cancel();
    let history = FakeHistory::new().revision("r1", tree(&[("a", "1")]));
    let options = ResolveOptions::new().cancellation(cancel);
    let resolver = Resolver::new(history, options);
    let err = resolver.resolve(&tree(&[("a", "1")])).unwrap_err();
    assert!(matches!(err, ResolveError::Cancelled), "{err:?}");
}

#[test]
fn test_cancelled_midway_returns_best_so_far() {
    let cancel = Cancellation::new();
    let local = tree(&[("a", "1"), ("b", "2")]);
    let history = FakeHistory::new()
        .revision("r4", tree(&[("a", "x"), ("b", "y")]))
        .revision("r3", tree(&[("a", "1"), ("b", "y")]))
        .revision("r2", tree(&[("a", "x"), ("b", "x")]))
        .revision("r1", tree(&[("a", "1"), ("b", "2")]))
        .cancel_after(2, cancel.clone());

    let options = ResolveOptions::new().cancellation(cancel);
    let resolver = Resolver::new(history, options);
    let result = resolver.resolve(&local).unwrap();
    assert_eq!(result.stats().stop, ScanStop::Cancelled);
    assert_eq!(result.classification(), &Classification::Approximate);
    // r3 was fetched as the signal fired, so it is still scored.
    assert_eq!(result.revision().id().as_str(), "r3");
    assert_eq!(result.stats().evaluated, 2);
    assert_eq!(result.report().different, 1);
    assert_eq!(resolver.catalog().query().tree_fetches(), 2);
}

#[test]
fn test_cancelled_prefetch_scores_whole_batch() {
    let cancel = Cancellation::new();
    let local = tree(&[("a", "1"), ("b", "2")]);
    let history = FakeHistory::new()
        .revision("r4", tree(&[("a", "x"), ("b", "y")]))
        .revision("r3", tree(&[("a", "x"), ("b", "x")]))
        .revision("r2", tree(&[("a", "1"), ("b", "y")]))
        .revision("r1", tree(&[("a", "1"), ("b", "2")]))
        .cancel_after(1, cancel.clone());

    let options = ResolveOptions::new().prefetch(3).cancellation(cancel);
    let resolver = Resolver::new(history, options);
    let result = resolver.resolve(&local).unwrap();
    assert_eq!(result.stats().stop, ScanStop::Cancelled);
    assert_eq!(result.stats().evaluated, 3);
    assert_eq!(result.revision().id().as_str(), "r2");
    assert_eq!(resolver.catalog().query().tree_fetches(), 3);
}

#[test]
fn test_interrupted_fetch_is_not_a_skip() {
    let cancel = Cancellation::new();
    let local = tree(&[("a", "1")]);
    let history = FakeHistory::new()
        .revision("r3", tree(&[("a", "3")]))
        .revision("r2", tree(&[("a", "2")]))
        .revision("r1", tree(&[("a", "1")]))
        .broken("r2")
        .cancel_after(2, cancel.clone());

    let options = ResolveOptions::new().cancellation(cancel);
    let result = Resolver::new(history, options).resolve(&local).unwrap();
    assert_eq!(result.stats().stop, ScanStop::Cancelled);
    assert!(result.stats().skipped.is_empty());
    assert_eq!(result.revision().id().as_str(), "r3");
}

#[test]
fn test_upstream_subdir() {
    let local = tree(&[("widget.go", "package widget")]);
    let history = FakeHistory::new()
        .revision(
            "r1",
            tree(&[
                ("README", "upstream"),
                ("pkg/widget/widget.go", "package widget"),
            ]),
        )
        .tag("r1", "v0.3.0");

    let options = ResolveOptions::new().upstream_subdir("pkg/widget");
    let result = Resolver::new(history, options).resolve(&local).unwrap();
    assert_eq!(
        result.classification(),
        &Classification::ExactRelease { tag: "v0.3.0".to_owned() }
    );
}
