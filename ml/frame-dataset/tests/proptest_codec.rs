//! Property-based tests for the name codec and the partitioner.
//!
//! Run with: cargo test -p frame-dataset -- proptest

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeSet;

use frame_dataset::{
    ResolutionTag, SplitRatios, ToolFolder, extract_frame_index, normalize_tool_folder,
    parse_frame_name, partition_seeded, synthesize_frame_name,
};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_resolution() -> impl Strategy<Value = ResolutionTag> {
    (1u32..10_000, 1u32..10_000).prop_map(|(w, h)| ResolutionTag::new(w, h))
}

fn arb_video_id() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..1000).prop_map(|n| format!("vid_{n:03}")),
        "[a-z][a-z0-9]{0,8}(_[a-z0-9]{1,4}){0,2}",
    ]
}

fn arb_tool_id() -> impl Strategy<Value = String> {
    (0u32..100).prop_map(|n| format!("{n}tool"))
}

fn arb_tool_folder() -> impl Strategy<Value = (String, String, ResolutionTag, String)> {
    (arb_video_id(), arb_resolution(), arb_tool_id()).prop_map(|(video, res, tool)| {
        (format!("{video}_{res}_{tool}"), video, res, tool)
    })
}

fn arb_ratios() -> impl Strategy<Value = SplitRatios> {
    (0u32..=100, 0u32..=100).prop_filter_map("ratios must fit in 1.0", |(a, b)| {
        if a + b > 100 {
            return None;
        }
        let train = f64::from(a) / 100.0;
        let val = f64::from(b) / 100.0;
        SplitRatios::new(train, val, 1.0 - train - val).ok()
    })
}

// =============================================================================
// Codec properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_normalize_then_retag((name, video, res, tool) in arb_tool_folder(), other in arb_resolution()) {
        let key = normalize_tool_folder(&name);
        prop_assert_eq!(key.as_str(), format!("{video}_{tool}"));

        let folder = ToolFolder::parse(&name).unwrap();
        prop_assert_eq!(folder.resolution(), &res);

        let rebuilt = folder.with_resolution(&other);
        prop_assert_eq!(&rebuilt, &format!("{video}_{other}_{tool}"));
        prop_assert_eq!(normalize_tool_folder(&rebuilt), key);
    }

    #[test]
    fn proptest_synthesize_then_extract((name, _video, _res, _tool) in arb_tool_folder(), other in arb_resolution(), index in any::<u64>()) {
        let file = synthesize_frame_name(&name, &other, index).unwrap();
        prop_assert_eq!(extract_frame_index(&file), Some(index));

        let frame = parse_frame_name(&file).unwrap();
        prop_assert_eq!(frame.resolution(), &other);
        prop_assert_eq!(frame.key(), normalize_tool_folder(&name));
    }

    #[test]
    fn proptest_frame_name_round_trip((name, _video, res, _tool) in arb_tool_folder(), index in 0u64..1_000_000, target in arb_resolution()) {
        let original = synthesize_frame_name(&name, &res, index).unwrap();
        let extracted = extract_frame_index(&original).unwrap();
        let projected = synthesize_frame_name(&name, &target, extracted).unwrap();
        prop_assert_eq!(extract_frame_index(&projected), Some(index));
    }

    #[test]
    fn proptest_extract_never_panics(name in "\\PC{0,40}") {
        let _ = extract_frame_index(&name);
        let _ = normalize_tool_folder(&name);
    }
}

// =============================================================================
// Partition properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_partition_is_exact(n in 0usize..300, ratios in arb_ratios(), seed in any::<u64>()) {
        let items: Vec<usize> = (0..n).collect();
        let parts = partition_seeded(&items, ratios, seed);

        prop_assert_eq!(parts.train.len() + parts.val.len() + parts.test.len(), n);

        let (train, val, _) = ratios.counts(n);
        prop_assert_eq!(parts.train.len(), train);
        prop_assert_eq!(parts.val.len(), val);

        let union: BTreeSet<usize> = parts
            .train
            .iter()
            .chain(&parts.val)
            .chain(&parts.test)
            .copied()
            .collect();
        prop_assert_eq!(union.len(), n);
        prop_assert_eq!(union, items.iter().copied().collect::<BTreeSet<_>>());
    }

    #[test]
    fn proptest_partition_is_reproducible(n in 0usize..200, ratios in arb_ratios(), seed in any::<u64>()) {
        let items: Vec<String> = (0..n).map(|i| format!("frame_{i}.png")).collect();
        let a = partition_seeded(&items, ratios, seed);
        let b = partition_seeded(&items, ratios, seed);
        prop_assert_eq!(a, b);
    }
}
