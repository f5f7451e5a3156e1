//! Right-biased recursive merge of partial filter maps.
//!
//! # Invariants
//! - Later filters win on scalar collisions.
//! - Nested maps merge key by key instead of being replaced.
//! - A later value of a different kind (map vs. scalar) replaces the earlier
//!   one outright.
//! - Inputs are never mutated.

use crate::model::record::Filter;
use serde_json::Value;

/// Folds `filters` left to right into one effective filter.
///
/// An empty sequence yields an empty map.
pub fn merge_filters<'a, I>(filters: I) -> Filter
where
    I: IntoIterator<Item = &'a Filter>,
{
    filters.into_iter().fold(Filter::new(), |mut merged, filter| {
        merge_into(&mut merged, filter);
        merged
    })
}

/// Deep-merges `overlay` into `target`.
pub fn merge_into(target: &mut Filter, overlay: &Filter) {
    for (key, incoming) in overlay {
        match (target.get_mut(key), incoming) {
            (Some(Value::Object(existing)), Value::Object(nested)) => merge_into(existing, nested),
            _ => {
                target.insert(key.clone(), incoming.clone());
            }
        }
    }
}
