#![no_main]

use libfuzzer_sys::fuzz_target;

use hid_descriptor::{
    analyze_importance, capture_snapshots, capture_snapshots_with_limits, compare_snapshots,
    split_items, ItemReader, StateLimits,
};

fuzz_target!(|data: &[u8]| {
    let items = match split_items(data) {
        Ok(items) => items,
        Err(err) => {
            // The streaming reader must fail at the same item as the slice splitter.
            let complete = ItemReader::new(data).take_while(Result::is_ok).count();
            assert_eq!(err.index(), Some(complete));
            return;
        }
    };

    if let Ok(analysis) = analyze_importance(&items) {
        assert_eq!(analysis.len(), items.len());
    }

    // A descriptor is always equivalent to itself.
    if let Ok(snapshots) = capture_snapshots(&items) {
        assert!(compare_snapshots(&snapshots, &snapshots).is_equivalent());
    }

    let tight = StateLimits { max_stack_depth: 2 };
    let _ = capture_snapshots_with_limits(&items, tight);
});
