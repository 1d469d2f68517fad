//! Property tests: evaluation is total and empty specs never block.

use buildblock_core::{
    try_match, ActiveJob, BlockingDecisionEngine, BlockingSpec, CandidateItem, QueuedItem,
};
use proptest::prelude::*;

fn arb_job() -> impl Strategy<Value = ActiveJob> {
    ("[a-zA-Z0-9_-]{0,12}", "[a-z]{1,6}", ".{0,8}")
        .prop_map(|(name, var, value)| ActiveJob::new(name).with_env(var, value))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_try_match_never_panics(pattern in ".{0,24}", text in ".{0,24}") {
        let _ = try_match(&pattern, &text);
    }

    #[test]
    fn test_blank_spec_never_blocks(
        blank in "[ \t\n]{0,6}",
        jobs in prop::collection::vec(arb_job(), 0..6),
        names in prop::collection::vec("[a-zA-Z]{1,8}", 0..4),
    ) {
        let engine = BlockingDecisionEngine::new();
        let queued: Vec<QueuedItem> = names.into_iter().map(QueuedItem::new).collect();
        let candidate = CandidateItem::new().with_parameter("branch", "main");
        let spec = BlockingSpec::new(Some(blank.clone()), Some(blank));
        prop_assert!(engine
            .find_blocking_job(Some(&spec), Some(&candidate), &jobs, &queued)
            .is_none());
    }

    #[test]
    fn test_arbitrary_spec_never_panics(
        patterns in ".{0,40}",
        vars in ".{0,20}",
        jobs in prop::collection::vec(arb_job(), 0..4),
    ) {
        let engine = BlockingDecisionEngine::new();
        let spec = BlockingSpec::new(Some(patterns), Some(vars));
        let _ = engine.find_blocking_job(Some(&spec), None, &jobs, &[]);
    }

    #[test]
    fn test_literal_name_matches_itself(name in "[a-zA-Z0-9_]{1,16}") {
        prop_assert!(try_match(&name, &name));
        let longer = format!("{name}x");
        prop_assert!(!try_match(&name, &longer));
    }
}
