use ada::services::AdaptiveRouter;
use proptest::prelude::*;
use test_strategy::proptest;

const EXECUTORS: [&str; 4] = ["omnisearch", "quality-assessor", "claude-code", "duplicate-detector-ion"];

/// Property: routing always yields at least one executor
#[proptest]
fn prop_route_never_empty(#[strategy(".{0,200}")] text: String) {
    let router = AdaptiveRouter::with_defaults();
    prop_assert!(!router.route(text.as_str()).is_empty());
}

/// Property: candidates come back ranked by descending score
#[proptest]
fn prop_candidates_ranked(#[strategy("[a-z ./?]{0,80}")] text: String) {
    let decision = AdaptiveRouter::with_defaults().route_detailed(text.as_str());
    prop_assert!(decision
        .candidates
        .windows(2)
        .all(|pair| pair[0].score >= pair[1].score));
    if !decision.fallback_used {
        prop_assert_eq!(decision.executors.len(), decision.candidates.len());
    }
}

/// Property: success rates stay within [0, 1] under any outcome sequence
#[proptest]
fn prop_success_rate_bounded(
    #[strategy(prop::collection::vec((0usize..4, any::<bool>()), 0..200))] outcomes: Vec<(usize, bool)>,
) {
    let router = AdaptiveRouter::with_defaults();
    for (i, success) in outcomes {
        let rate = router.update(EXECUTORS[i], success);
        prop_assert!(rate.is_some_and(|r| (0.0..=1.0).contains(&r)));
    }
}

/// Property: consecutive failures never raise the rate, successes never lower it
#[proptest]
fn prop_updates_move_monotonically(#[strategy(1usize..50)] failures: usize, #[strategy(1usize..50)] successes: usize) {
    let router = AdaptiveRouter::with_defaults();
    let mut last = router.success_rate("omnisearch").unwrap_or(1.0);
    for _ in 0..failures {
        let next = router.update("omnisearch", false).unwrap_or(last);
        prop_assert!(next <= last);
        last = next;
    }
    for _ in 0..successes {
        let next = router.update("omnisearch", true).unwrap_or(last);
        prop_assert!(next >= last);
        last = next;
    }
}

/// Property: updating an unknown executor changes nothing
#[proptest]
fn prop_unknown_executor_is_ignored(#[strategy("[a-z]{3,12}-unknown")] name: String, success: bool) {
    let router = AdaptiveRouter::with_defaults();
    let before = router.routes();
    prop_assert!(router.update(&name, success).is_none());
    prop_assert_eq!(before, router.routes());
}
