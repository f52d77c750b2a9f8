//! Property-based test generators using proptest.
//!
//! Keys and values are arbitrary bytes, including empty values and
//! embedded zero bytes, since the engine treats both as opaque spans.

use lmdbx_core::RangeOptions;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy for generating non-empty keys.
pub fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..64)
}

/// Strategy for generating printable ASCII keys.
pub fn text_key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating values (arbitrary bytes, possibly empty).
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

/// Strategy for generating a key/value dataset with unique keys.
pub fn dataset_strategy(max_entries: usize) -> impl Strategy<Value = BTreeMap<Vec<u8>, Vec<u8>>> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 0..max_entries)
}

/// Strategy for generating scan options over arbitrary bounds.
pub fn range_options_strategy() -> impl Strategy<Value = RangeOptions> {
    (
        prop::option::of(key_strategy()),
        prop::option::of(key_strategy()),
        prop::option::of(0usize..20),
        any::<bool>(),
    )
        .prop_map(|(start, end, limit, reverse)| RangeOptions {
            start,
            end,
            limit,
            reverse,
        })
}

/// Computes what a scan over `data` must return for `options`.
///
/// `default_limit` stands in for the session bound when `options.limit` is
/// unset or zero.
pub fn expected_range(
    data: &BTreeMap<Vec<u8>, Vec<u8>>,
    options: &RangeOptions,
    default_limit: usize,
) -> Vec<(Vec<u8>, Vec<u8>)> {
    let limit = options.limit.filter(|&l| l != 0).unwrap_or(default_limit);
    let in_bounds = |key: &Vec<u8>| {
        options.start.as_ref().map_or(true, |s| key >= s)
            && options.end.as_ref().map_or(true, |e| key <= e)
    };

    let matching = data.iter().filter(|(k, _)| in_bounds(k));
    let picked: Vec<_> = if options.reverse {
        matching.rev().take(limit).collect()
    } else {
        matching.take(limit).collect()
    };
    picked
        .into_iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
