//! Hydration
//!
//! Partial-update merge of a new value into a stored one. Merging only
//! happens when both sides are plain objects; every other pairing, including
//! arrays, dates, patterns and binary blobs, is replaced wholesale.

use crate::cache::value::{CacheValue, ObjectMap};

/// How two plain objects are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HydrateMode {
    /// Overlay top-level keys; nested objects are replaced
    #[default]
    Shallow,
    /// Recurse into keys where both sides hold plain objects
    Deep,
}

/// Merges `incoming` into `current` according to `mode`.
pub fn hydrate(current: CacheValue, incoming: CacheValue, mode: HydrateMode) -> CacheValue {
    match (current, incoming) {
        (CacheValue::Object(base), CacheValue::Object(patch)) => CacheValue::Object(match mode {
            HydrateMode::Shallow => shallow_merge(base, patch),
            HydrateMode::Deep => deep_merge(base, patch),
        }),
        (_, incoming) => incoming,
    }
}

fn shallow_merge(mut base: ObjectMap, patch: ObjectMap) -> ObjectMap {
    base.extend(patch);
    base
}

fn deep_merge(mut base: ObjectMap, patch: ObjectMap) -> ObjectMap {
    for (key, incoming) in patch {
        let merged = match (base.remove(&key), incoming) {
            (Some(CacheValue::Object(existing)), CacheValue::Object(nested)) => {
                CacheValue::Object(deep_merge(existing, nested))
            }
            (_, incoming) => incoming,
        };
        base.insert(key, merged);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn value(v: serde_json::Value) -> CacheValue {
        CacheValue::from(v)
    }

    #[test]
    fn test_shallow_replaces_nested_objects() {
        let merged = hydrate(
            value(json!({"a": 1, "b": {"x": 1}})),
            value(json!({"b": {"y": 2}})),
            HydrateMode::Shallow,
        );
        assert_eq!(merged, value(json!({"a": 1, "b": {"y": 2}})));
    }

    #[test]
    fn test_deep_merges_nested_objects() {
        let merged = hydrate(
            value(json!({"a": 1, "b": {"x": 1}})),
            value(json!({"b": {"y": 2}})),
            HydrateMode::Deep,
        );
        assert_eq!(merged, value(json!({"a": 1, "b": {"x": 1, "y": 2}})));
    }

    #[test]
    fn test_deep_merge_three_levels() {
        let merged = hydrate(
            value(json!({"p": {"q": {"r": 1, "s": 2}, "t": 3}})),
            value(json!({"p": {"q": {"s": 20, "u": 4}}})),
            HydrateMode::Deep,
        );
        assert_eq!(
            merged,
            value(json!({"p": {"q": {"r": 1, "s": 20, "u": 4}, "t": 3}}))
        );
    }

    #[test]
    fn test_deep_incoming_scalar_wins_over_object() {
        let merged = hydrate(
            value(json!({"b": {"x": 1}})),
            value(json!({"b": 5})),
            HydrateMode::Deep,
        );
        assert_eq!(merged, value(json!({"b": 5})));
    }

    #[test]
    fn test_arrays_are_replaced_not_merged() {
        let merged = hydrate(
            value(json!({"list": [1, 2, 3]})),
            value(json!({"list": [9]})),
            HydrateMode::Deep,
        );
        assert_eq!(merged, value(json!({"list": [9]})));

        let top = hydrate(value(json!([1, 2])), value(json!([3])), HydrateMode::Deep);
        assert_eq!(top, value(json!([3])));
    }

    #[test]
    fn test_non_plain_side_replaces() {
        let now = Utc::now();
        let merged = hydrate(
            CacheValue::Date(now),
            value(json!({"a": 1})),
            HydrateMode::Deep,
        );
        assert_eq!(merged, value(json!({"a": 1})));

        let merged = hydrate(
            value(json!({"a": 1})),
            CacheValue::Bytes(vec![1]),
            HydrateMode::Shallow,
        );
        assert_eq!(merged, CacheValue::Bytes(vec![1]));
    }

    #[test]
    fn test_deep_does_not_merge_into_date() {
        let now = Utc::now();
        let mut base = ObjectMap::new();
        base.insert("when".into(), CacheValue::Date(now));
        let merged = hydrate(
            CacheValue::Object(base),
            value(json!({"when": {"tz": "utc"}})),
            HydrateMode::Deep,
        );
        assert_eq!(merged, value(json!({"when": {"tz": "utc"}})));
    }
}
