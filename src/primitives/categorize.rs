//! `Categorize`: one sub-aggregator per observed category string, created
//! on demand.

use indexmap::IndexMap;
use serde_json::Value;

use crate::aggregator::{Past, Present};
use crate::error::{merge_names, Error};
use crate::json::{field, field_f64, obj, opt_name, with_name};
use crate::quantity::CategoryQuantity;

pub const TAG: &str = "Categorize";

pub struct Categorizing<D> {
    quantity: CategoryQuantity<D>,
    entries: f64,
    template: Box<Present<D>>,
    bins: IndexMap<String, Present<D>>,
}

impl<D> Categorizing<D> {
    pub fn create(quantity: CategoryQuantity<D>, template: Present<D>) -> Self
    where
        D: 'static,
    {
        Categorizing { quantity, entries: 0.0, template: Box::new(template), bins: IndexMap::new() }
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn fill(&mut self, datum: &D, weight: f64) -> Result<(), Error>
    where
        D: 'static,
    {
        if weight <= 0.0 {
            return Ok(());
        }
        let key = self.quantity.call(datum);
        let sub = self.bins.entry(key).or_insert_with(|| self.template.zero());
        sub.fill(datum, weight)?;
        self.entries += weight;
        Ok(())
    }

    pub fn zero(&self) -> Self
    where
        D: 'static,
    {
        Categorizing {
            quantity: self.quantity.clone(),
            entries: 0.0,
            template: Box::new(self.template.zero()),
            bins: IndexMap::new(),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error>
    where
        D: 'static,
    {
        merge_names(&self.quantity.name().map(str::to_string), &other.quantity.name().map(str::to_string))?;
        let mut bins: IndexMap<String, Present<D>> = IndexMap::new();
        for (k, v) in self.bins.iter() {
            bins.insert(k.clone(), v.zero().merge(v)?);
        }
        for (k, v) in other.bins.iter() {
            match bins.get_mut(k) {
                Some(existing) => *existing = existing.merge(v)?,
                None => {
                    bins.insert(k.clone(), self.template.zero().merge(v)?);
                }
            }
        }
        Ok(Categorizing {
            quantity: self.quantity.clone(),
            entries: self.entries + other.entries,
            template: Box::new(self.template.zero()),
            bins,
        })
    }

    pub fn to_past(&self) -> Categorized {
        let mut bins = IndexMap::new();
        for (k, v) in &self.bins {
            bins.insert(k.clone(), v.to_past());
        }
        Categorized {
            name: self.quantity.name().map(str::to_string),
            entries: self.entries,
            bins,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Categorized {
    name: Option<String>,
    entries: f64,
    bins: IndexMap<String, Past>,
}

impl Categorized {
    pub fn ed(name: Option<String>, entries: f64, bins: IndexMap<String, Past>) -> Result<Self, Error> {
        if entries < 0.0 {
            return Err(Error::Validation(format!("entries must be >= 0, got {entries}")));
        }
        Ok(Categorized { name, entries, bins })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn bins(&self) -> &IndexMap<String, Past> {
        &self.bins
    }

    pub fn zero(&self) -> Self {
        Categorized { name: self.name.clone(), entries: 0.0, bins: IndexMap::new() }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        let mut bins = self.bins.clone();
        for (k, v) in &other.bins {
            match bins.get_mut(k) {
                Some(existing) => *existing = existing.merge(v)?,
                None => {
                    bins.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(Categorized { name, entries: self.entries + other.entries, bins })
    }

    pub fn children(&self) -> Vec<&Past> {
        self.bins.values().collect()
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), serde_json::json!(self.entries));
        let bins_type = self.bins.values().next().map(|p| p.factory_tag()).unwrap_or("");
        map.insert("bins:type".to_string(), Value::String(bins_type.to_string()));
        let mut bins_obj = serde_json::Map::new();
        for (k, v) in &self.bins {
            bins_obj.insert(k.clone(), v.to_json_fragment(false));
        }
        map.insert("bins".to_string(), Value::Object(bins_obj));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let entries = field_f64(m, "entries")?;
        let tag = field(m, "bins:type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"bins:type\" is not a string".to_string()))?;
        let bins_obj = obj(field(m, "bins")?)?;
        let mut bins = IndexMap::new();
        for (k, v) in bins_obj {
            bins.insert(k.clone(), Past::from_json_fragment(tag, v, None)?);
        }
        let name = opt_name(m, name_from_parent)?;
        Self::ed(name, entries, bins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::count::Counting;
    use crate::quantity::Extractor;

    #[test]
    fn fill_creates_bins_on_demand() {
        let mut c: Categorizing<&str> = Categorizing::create(
            Extractor::new(|s: &&str| s.to_string()),
            Present::Count(Counting::create()),
        );
        for v in ["a", "b", "a"] {
            c.fill(&v, 1.0).unwrap();
        }
        let past = c.to_past();
        assert_eq!(past.entries(), 3.0);
        assert_eq!(past.bins().get("a").unwrap().entries(), 2.0);
        assert_eq!(past.bins().get("b").unwrap().entries(), 1.0);
    }
}
