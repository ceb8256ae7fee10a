//! The process-wide factory registry: `tag -> deserializer`, populated once
//! at first access and read lock-free afterward.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::{debug, trace};

use crate::aggregator::Past;
use crate::error::Error;
use crate::primitives::{
    absolute_err, adaptively_bin, average, bag, bin, branch, categorize, centrally_bin, count, deviate, fraction,
    label, limit, minmax, partition, quantile, select, sparsely_bin, stack, sum,
};

pub type Deserializer = fn(&Value, Option<String>) -> Result<Past, Error>;

static REGISTRY: Lazy<RwLock<HashMap<&'static str, Deserializer>>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, Deserializer> = HashMap::new();
    register_builtins(&mut map);
    RwLock::new(map)
});

fn register_builtins(map: &mut HashMap<&'static str, Deserializer>) {
    map.insert(count::TAG, |d, n| Past::from_json_fragment(count::TAG, d, n));
    map.insert(sum::TAG, |d, n| Past::from_json_fragment(sum::TAG, d, n));
    map.insert(average::TAG, |d, n| Past::from_json_fragment(average::TAG, d, n));
    map.insert(deviate::TAG, |d, n| Past::from_json_fragment(deviate::TAG, d, n));
    map.insert(absolute_err::TAG, |d, n| Past::from_json_fragment(absolute_err::TAG, d, n));
    map.insert(minmax::MINIMIZE_TAG, |d, n| Past::from_json_fragment(minmax::MINIMIZE_TAG, d, n));
    map.insert(minmax::MAXIMIZE_TAG, |d, n| Past::from_json_fragment(minmax::MAXIMIZE_TAG, d, n));
    map.insert(quantile::TAG, |d, n| Past::from_json_fragment(quantile::TAG, d, n));
    map.insert(bag::TAG, |d, n| Past::from_json_fragment(bag::TAG, d, n));
    map.insert(bin::TAG, |d, n| Past::from_json_fragment(bin::TAG, d, n));
    map.insert(sparsely_bin::TAG, |d, n| Past::from_json_fragment(sparsely_bin::TAG, d, n));
    map.insert(centrally_bin::TAG, |d, n| Past::from_json_fragment(centrally_bin::TAG, d, n));
    map.insert(adaptively_bin::TAG, |d, n| Past::from_json_fragment(adaptively_bin::TAG, d, n));
    map.insert(categorize::TAG, |d, n| Past::from_json_fragment(categorize::TAG, d, n));
    map.insert(select::TAG, |d, n| Past::from_json_fragment(select::TAG, d, n));
    map.insert(limit::TAG, |d, n| Past::from_json_fragment(limit::TAG, d, n));
    map.insert(fraction::TAG, |d, n| Past::from_json_fragment(fraction::TAG, d, n));
    map.insert(stack::TAG, |d, n| Past::from_json_fragment(stack::TAG, d, n));
    map.insert(partition::TAG, |d, n| Past::from_json_fragment(partition::TAG, d, n));
    map.insert(label::LABEL_TAG, |d, n| Past::from_json_fragment(label::LABEL_TAG, d, n));
    map.insert(label::UNTYPED_LABEL_TAG, |d, n| {
        Past::from_json_fragment(label::UNTYPED_LABEL_TAG, d, n)
    });
    map.insert(label::INDEX_TAG, |d, n| Past::from_json_fragment(label::INDEX_TAG, d, n));
    map.insert(branch::TAG, |d, n| Past::from_json_fragment(branch::TAG, d, n));
    debug!(count = map.len(), "registered built-in aggregator factories");
}

/// The process-wide aggregator factory: a `tag -> deserializer` table that
/// backs [`Factory::from_json`] and [`Factory::from_value`].
pub struct Factory;

impl Factory {
    /// Register a new tag. Built-ins are pre-registered; re-registering an
    /// existing tag is rejected rather than silently overwriting it.
    pub fn register(tag: &'static str, deserializer: Deserializer) -> Result<(), Error> {
        let mut guard = REGISTRY.write().expect("registry lock poisoned");
        if guard.contains_key(tag) {
            return Err(Error::StructureMismatch(format!(
                "a factory is already registered under tag {tag:?}"
            )));
        }
        guard.insert(tag, deserializer);
        Ok(())
    }

    pub fn lookup(tag: &str) -> Option<Deserializer> {
        let guard = REGISTRY.read().expect("registry lock poisoned");
        guard.get(tag).copied()
    }

    /// Parse a top-level `{"type", "data"}` document and build a `Past` tree.
    pub fn from_json(text: &str) -> Result<Past, Error> {
        let value: Value = serde_json::from_str(text).map_err(|e| Error::JsonFormat(e.to_string()))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Past, Error> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::JsonFormat(format!("expected a JSON object, got {value}")))?;
        let tag = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::JsonFormat("missing or non-string \"type\" field".to_string()))?;
        let data = obj
            .get("data")
            .ok_or_else(|| Error::JsonFormat("missing \"data\" field".to_string()))?;
        let deserializer = Self::lookup(tag).ok_or_else(|| Error::UnknownType(tag.to_string()))?;
        trace!(tag, "decoding aggregator from JSON");
        deserializer(data, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_all_registered() {
        for tag in [
            count::TAG,
            sum::TAG,
            average::TAG,
            deviate::TAG,
            absolute_err::TAG,
            minmax::MINIMIZE_TAG,
            minmax::MAXIMIZE_TAG,
            quantile::TAG,
            bag::TAG,
            bin::TAG,
            sparsely_bin::TAG,
            centrally_bin::TAG,
            adaptively_bin::TAG,
            categorize::TAG,
            select::TAG,
            limit::TAG,
            fraction::TAG,
            stack::TAG,
            partition::TAG,
            label::LABEL_TAG,
            label::UNTYPED_LABEL_TAG,
            label::INDEX_TAG,
            branch::TAG,
        ] {
            assert!(Factory::lookup(tag).is_some(), "missing factory for {tag}");
        }
    }

    #[test]
    fn round_trips_a_count_through_text_json() {
        let count = Past::Count(crate::primitives::count::Counted::ed(3.0).unwrap());
        let text = serde_json::to_string(&count.to_json()).unwrap();
        let back = Factory::from_json(&text).unwrap();
        assert_eq!(count, back);
    }

    #[test]
    fn re_registering_a_builtin_tag_is_rejected() {
        assert!(Factory::register(count::TAG, |d, n| Past::from_json_fragment(count::TAG, d, n)).is_err());
    }

    #[test]
    fn unknown_type_is_reported() {
        let v = serde_json::json!({ "type": "NoSuchThing", "data": {} });
        assert!(matches!(Factory::from_value(&v), Err(Error::UnknownType(_))));
    }
}
