//! `Label`, `UntypedLabel`, and `Index`: the three "every sub sees every
//! datum" composites addressed by name (ordered, `Label`/`UntypedLabel`) or
//! by position (`Index`). `Label` and `Index` require a shared sub-type,
//! checked at construction since the type system can't express it across a
//! runtime-built collection; `UntypedLabel` allows mixed types.

use indexmap::IndexMap;
use serde_json::Value;

use crate::aggregator::{Past, Present};
use crate::error::{merge_names, Error};
use crate::json::{field, field_f64, obj, opt_name, with_name};

pub const LABEL_TAG: &str = "Label";
pub const UNTYPED_LABEL_TAG: &str = "UntypedLabel";
pub const INDEX_TAG: &str = "Index";

fn same_tag<D>(subs: &IndexMap<String, Present<D>>) -> Result<(), Error> {
    let mut it = subs.values();
    let Some(first) = it.next() else { return Ok(()) };
    let tag = first.to_past().factory_tag();
    for s in it {
        if s.to_past().factory_tag() != tag {
            return Err(Error::StructureMismatch(
                "Label requires every sub to share the same type".to_string(),
            ));
        }
    }
    Ok(())
}

pub struct Labeling<D> {
    entries: f64,
    subs: IndexMap<String, Present<D>>,
}

impl<D> Labeling<D> {
    pub fn create(subs: IndexMap<String, Present<D>>) -> Result<Self, Error>
    where
        D: 'static,
    {
        if subs.is_empty() {
            return Err(Error::Validation("Label needs at least one sub-aggregator".to_string()));
        }
        same_tag(&subs)?;
        Ok(Labeling { entries: 0.0, subs })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn subs(&self) -> &IndexMap<String, Present<D>> {
        &self.subs
    }

    pub fn fill(&mut self, datum: &D, weight: f64) -> Result<(), Error>
    where
        D: 'static,
    {
        if weight <= 0.0 {
            return Ok(());
        }
        for sub in self.subs.values_mut() {
            sub.fill(datum, weight)?;
        }
        self.entries += weight;
        Ok(())
    }

    pub fn zero(&self) -> Self
    where
        D: 'static,
    {
        Labeling {
            entries: 0.0,
            subs: self.subs.iter().map(|(k, v)| (k.clone(), v.zero())).collect(),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error>
    where
        D: 'static,
    {
        if self.subs.len() != other.subs.len() || self.subs.keys().ne(other.subs.keys()) {
            return Err(Error::StructureMismatch("Label key set does not match".to_string()));
        }
        let mut subs = IndexMap::new();
        for (k, a) in self.subs.iter() {
            let b = other.subs.get(k).expect("key set checked above");
            subs.insert(k.clone(), a.merge(b)?);
        }
        Ok(Labeling { entries: self.entries + other.entries, subs })
    }

    pub fn to_past(&self) -> Labeled {
        Labeled {
            entries: self.entries,
            subs: self.subs.iter().map(|(k, v)| (k.clone(), v.to_past())).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Labeled {
    entries: f64,
    subs: IndexMap<String, Past>,
}

impl Labeled {
    pub fn ed(entries: f64, subs: IndexMap<String, Past>) -> Result<Self, Error> {
        if subs.is_empty() {
            return Err(Error::Validation("Label needs at least one sub-aggregator".to_string()));
        }
        let mut it = subs.values();
        let tag = it.next().expect("non-empty").factory_tag();
        if it.any(|s| s.factory_tag() != tag) {
            return Err(Error::StructureMismatch(
                "Label requires every sub to share the same type".to_string(),
            ));
        }
        Ok(Labeled { entries, subs })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn subs(&self) -> &IndexMap<String, Past> {
        &self.subs
    }

    pub fn zero(&self) -> Self {
        Labeled { entries: 0.0, subs: self.subs.iter().map(|(k, v)| (k.clone(), v.zero())).collect() }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        if self.subs.len() != other.subs.len() || self.subs.keys().ne(other.subs.keys()) {
            return Err(Error::StructureMismatch("Label key set does not match".to_string()));
        }
        let mut subs = IndexMap::new();
        for (k, a) in self.subs.iter() {
            let b = other.subs.get(k).expect("key set checked above");
            subs.insert(k.clone(), a.merge(b)?);
        }
        Ok(Labeled { entries: self.entries + other.entries, subs })
    }

    pub fn children(&self) -> Vec<&Past> {
        self.subs.values().collect()
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), serde_json::json!(self.entries));
        let tag = self.subs.values().next().map(|p| p.factory_tag()).unwrap_or("");
        map.insert("type".to_string(), Value::String(tag.to_string()));
        let mut data = serde_json::Map::new();
        for (k, v) in &self.subs {
            data.insert(k.clone(), v.to_json_fragment(false));
        }
        map.insert("data".to_string(), Value::Object(data));
        with_name(map, &None, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let entries = field_f64(m, "entries")?;
        let tag = field(m, "type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"type\" is not a string".to_string()))?;
        let data_obj = obj(field(m, "data")?)?;
        let mut subs = IndexMap::new();
        for (k, v) in data_obj {
            subs.insert(k.clone(), Past::from_json_fragment(tag, v, None)?);
        }
        let _ = opt_name(m, name_from_parent)?;
        Self::ed(entries, subs)
    }
}

pub struct UntypedLabeling<D> {
    entries: f64,
    subs: IndexMap<String, Present<D>>,
}

impl<D> UntypedLabeling<D> {
    pub fn create(subs: IndexMap<String, Present<D>>) -> Result<Self, Error> {
        if subs.is_empty() {
            return Err(Error::Validation("UntypedLabel needs at least one sub-aggregator".to_string()));
        }
        Ok(UntypedLabeling { entries: 0.0, subs })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn subs(&self) -> &IndexMap<String, Present<D>> {
        &self.subs
    }

    pub fn fill(&mut self, datum: &D, weight: f64) -> Result<(), Error>
    where
        D: 'static,
    {
        if weight <= 0.0 {
            return Ok(());
        }
        for sub in self.subs.values_mut() {
            sub.fill(datum, weight)?;
        }
        self.entries += weight;
        Ok(())
    }

    pub fn zero(&self) -> Self
    where
        D: 'static,
    {
        UntypedLabeling {
            entries: 0.0,
            subs: self.subs.iter().map(|(k, v)| (k.clone(), v.zero())).collect(),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error>
    where
        D: 'static,
    {
        if self.subs.len() != other.subs.len() || self.subs.keys().ne(other.subs.keys()) {
            return Err(Error::StructureMismatch("UntypedLabel key set does not match".to_string()));
        }
        let mut subs = IndexMap::new();
        for (k, a) in self.subs.iter() {
            let b = other.subs.get(k).expect("key set checked above");
            subs.insert(k.clone(), a.merge(b)?);
        }
        Ok(UntypedLabeling { entries: self.entries + other.entries, subs })
    }

    pub fn to_past(&self) -> UntypedLabeled {
        UntypedLabeled {
            entries: self.entries,
            subs: self.subs.iter().map(|(k, v)| (k.clone(), v.to_past())).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UntypedLabeled {
    entries: f64,
    subs: IndexMap<String, Past>,
}

impl UntypedLabeled {
    pub fn ed(entries: f64, subs: IndexMap<String, Past>) -> Result<Self, Error> {
        if subs.is_empty() {
            return Err(Error::Validation("UntypedLabel needs at least one sub-aggregator".to_string()));
        }
        Ok(UntypedLabeled { entries, subs })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn subs(&self) -> &IndexMap<String, Past> {
        &self.subs
    }

    pub fn zero(&self) -> Self {
        UntypedLabeled { entries: 0.0, subs: self.subs.iter().map(|(k, v)| (k.clone(), v.zero())).collect() }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        if self.subs.len() != other.subs.len() || self.subs.keys().ne(other.subs.keys()) {
            return Err(Error::StructureMismatch("UntypedLabel key set does not match".to_string()));
        }
        let mut subs = IndexMap::new();
        for (k, a) in self.subs.iter() {
            let b = other.subs.get(k).expect("key set checked above");
            subs.insert(k.clone(), a.merge(b)?);
        }
        Ok(UntypedLabeled { entries: self.entries + other.entries, subs })
    }

    pub fn children(&self) -> Vec<&Past> {
        self.subs.values().collect()
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), serde_json::json!(self.entries));
        let mut data = serde_json::Map::new();
        for (k, v) in &self.subs {
            data.insert(
                k.clone(),
                serde_json::json!({ "type": v.factory_tag(), "data": v.to_json_fragment(false) }),
            );
        }
        map.insert("data".to_string(), Value::Object(data));
        with_name(map, &None, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, _name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let entries = field_f64(m, "entries")?;
        let data_obj = obj(field(m, "data")?)?;
        let mut subs = IndexMap::new();
        for (k, v) in data_obj {
            let vo = obj(v)?;
            let tag = field(vo, "type")?
                .as_str()
                .ok_or_else(|| Error::JsonFormat("field \"type\" is not a string".to_string()))?;
            subs.insert(k.clone(), Past::from_json_fragment(tag, field(vo, "data")?, None)?);
        }
        Self::ed(entries, subs)
    }
}

pub struct Indexing<D> {
    entries: f64,
    subs: Vec<Present<D>>,
}

impl<D> Indexing<D> {
    pub fn create(subs: Vec<Present<D>>) -> Result<Self, Error>
    where
        D: 'static,
    {
        if subs.is_empty() {
            return Err(Error::Validation("Index needs at least one sub-aggregator".to_string()));
        }
        let tag = subs[0].to_past().factory_tag();
        if subs.iter().any(|s| s.to_past().factory_tag() != tag) {
            return Err(Error::StructureMismatch(
                "Index requires every sub to share the same type".to_string(),
            ));
        }
        Ok(Indexing { entries: 0.0, subs })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn subs(&self) -> &[Present<D>] {
        &self.subs
    }

    pub fn fill(&mut self, datum: &D, weight: f64) -> Result<(), Error>
    where
        D: 'static,
    {
        if weight <= 0.0 {
            return Ok(());
        }
        for sub in &mut self.subs {
            sub.fill(datum, weight)?;
        }
        self.entries += weight;
        Ok(())
    }

    pub fn zero(&self) -> Self
    where
        D: 'static,
    {
        Indexing { entries: 0.0, subs: self.subs.iter().map(|s| s.zero()).collect() }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error>
    where
        D: 'static,
    {
        if self.subs.len() != other.subs.len() {
            return Err(Error::StructureMismatch("Index length does not match".to_string()));
        }
        let subs = self
            .subs
            .iter()
            .zip(other.subs.iter())
            .map(|(a, b)| a.merge(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Indexing { entries: self.entries + other.entries, subs })
    }

    pub fn to_past(&self) -> Indexed {
        Indexed { entries: self.entries, subs: self.subs.iter().map(|v| v.to_past()).collect() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Indexed {
    entries: f64,
    subs: Vec<Past>,
}

impl Indexed {
    pub fn ed(entries: f64, subs: Vec<Past>) -> Result<Self, Error> {
        if subs.is_empty() {
            return Err(Error::Validation("Index needs at least one sub-aggregator".to_string()));
        }
        let tag = subs[0].factory_tag();
        if subs.iter().any(|s| s.factory_tag() != tag) {
            return Err(Error::StructureMismatch(
                "Index requires every sub to share the same type".to_string(),
            ));
        }
        Ok(Indexed { entries, subs })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn subs(&self) -> &[Past] {
        &self.subs
    }

    pub fn zero(&self) -> Self {
        Indexed { entries: 0.0, subs: self.subs.iter().map(|v| v.zero()).collect() }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        if self.subs.len() != other.subs.len() {
            return Err(Error::StructureMismatch("Index length does not match".to_string()));
        }
        let subs = self
            .subs
            .iter()
            .zip(other.subs.iter())
            .map(|(a, b)| a.merge(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Indexed { entries: self.entries + other.entries, subs })
    }

    pub fn children(&self) -> Vec<&Past> {
        self.subs.iter().collect()
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), serde_json::json!(self.entries));
        let tag = self.subs.first().map(|p| p.factory_tag()).unwrap_or("");
        map.insert("type".to_string(), Value::String(tag.to_string()));
        map.insert(
            "data".to_string(),
            Value::Array(self.subs.iter().map(|v| v.to_json_fragment(false)).collect()),
        );
        with_name(map, &None, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, _name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let entries = field_f64(m, "entries")?;
        let tag = field(m, "type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"type\" is not a string".to_string()))?;
        let data_arr = field(m, "data")?
            .as_array()
            .ok_or_else(|| Error::JsonFormat("field \"data\" is not an array".to_string()))?;
        let mut subs = Vec::with_capacity(data_arr.len());
        for v in data_arr {
            subs.push(Past::from_json_fragment(tag, v, None)?);
        }
        Self::ed(entries, subs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::count::Counting;

    #[test]
    fn label_round_trip_through_json() {
        let mut subs: IndexMap<String, Present<f64>> = IndexMap::new();
        subs.insert("px".to_string(), Present::Count(Counting::create()));
        subs.insert("pt".to_string(), Present::Count(Counting::create()));
        let mut l = Labeling::create(subs).unwrap();
        l.fill(&1.0, 1.0).unwrap();
        l.fill(&2.0, 1.0).unwrap();
        let past = l.to_past();
        let json = Past::Label(past.clone()).to_json();
        let back = Past::from_json_fragment(LABEL_TAG, &json["data"], None).unwrap();
        assert_eq!(Past::Label(past), back);
    }

    #[test]
    fn label_rejects_mismatched_sub_types() {
        let mut subs: IndexMap<String, Present<f64>> = IndexMap::new();
        subs.insert("a".to_string(), Present::Count(Counting::create()));
        subs.insert(
            "b".to_string(),
            Present::Sum(crate::primitives::sum::Summing::create(crate::quantity::Quantity::new(
                |x: &f64| *x,
            ))),
        );
        assert!(Labeling::create(subs).is_err());
    }

    #[test]
    fn untyped_label_allows_mixed_types() {
        let mut subs: IndexMap<String, Present<f64>> = IndexMap::new();
        subs.insert("a".to_string(), Present::Count(Counting::create()));
        subs.insert(
            "b".to_string(),
            Present::Sum(crate::primitives::sum::Summing::create(crate::quantity::Quantity::new(
                |x: &f64| *x,
            ))),
        );
        let mut u = UntypedLabeling::create(subs).unwrap();
        u.fill(&3.0, 1.0).unwrap();
        let past = u.to_past();
        assert_eq!(past.entries(), 1.0);
    }

    #[test]
    fn index_addresses_subs_by_position() {
        let mut idx: Indexing<f64> =
            Indexing::create(vec![Present::Count(Counting::create()), Present::Count(Counting::create())]).unwrap();
        idx.fill(&1.0, 1.0).unwrap();
        let past = idx.to_past();
        assert_eq!(past.subs()[0].entries(), 1.0);
        assert_eq!(past.subs()[1].entries(), 1.0);
    }
}
