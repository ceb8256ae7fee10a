//! `Bag`: accumulates every distinct observed value (scalar, string, or
//! fixed-length numeric vector) together with its summed weight.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::{merge_names, Error};
use crate::json::{field, field_f64, obj, opt_name, with_name};
use crate::quantity::{BagKey, BagQuantity};

pub const TAG: &str = "Bag";

#[derive(Clone)]
pub struct Bagging<D> {
    quantity: BagQuantity<D>,
    entries: f64,
    values: BTreeMap<BagKey, f64>,
    vector_len: Option<usize>,
}

impl<D> Bagging<D> {
    pub fn create(quantity: BagQuantity<D>) -> Self {
        Bagging { quantity, entries: 0.0, values: BTreeMap::new(), vector_len: None }
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn fill(&mut self, datum: &D, weight: f64) -> Result<(), Error> {
        if weight <= 0.0 {
            return Ok(());
        }
        let key = self.quantity.call(datum);
        if let BagKey::Vector(v) = &key {
            match self.vector_len {
                Some(n) if n != v.len() => {
                    return Err(Error::Validation(format!(
                        "bag vector key has length {} but bag is locked to length {}",
                        v.len(),
                        n
                    )))
                }
                None => self.vector_len = Some(v.len()),
                _ => {}
            }
        }
        *self.values.entry(key).or_insert(0.0) += weight;
        self.entries += weight;
        Ok(())
    }

    pub fn zero(&self) -> Self {
        Bagging { quantity: self.quantity.clone(), entries: 0.0, values: BTreeMap::new(), vector_len: self.vector_len }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        merge_names(&self.quantity.name().map(str::to_string), &other.quantity.name().map(str::to_string))?;
        let vector_len = match (self.vector_len, other.vector_len) {
            (Some(a), Some(b)) if a != b => {
                return Err(Error::Validation(format!(
                    "cannot merge bags with vector-key lengths {a} and {b}"
                )))
            }
            (Some(a), _) => Some(a),
            (None, b) => b,
        };
        let mut values = self.values.clone();
        for (k, w) in &other.values {
            *values.entry(k.clone()).or_insert(0.0) += w;
        }
        Ok(Bagging {
            quantity: self.quantity.clone(),
            entries: self.entries + other.entries,
            values,
            vector_len,
        })
    }

    pub fn to_past(&self) -> Bagged {
        Bagged {
            name: self.quantity.name().map(str::to_string),
            entries: self.entries,
            values: self.values.clone(),
            vector_len: self.vector_len,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bagged {
    name: Option<String>,
    entries: f64,
    values: BTreeMap<BagKey, f64>,
    vector_len: Option<usize>,
}

impl Bagged {
    pub fn ed(
        name: Option<String>,
        entries: f64,
        values: BTreeMap<BagKey, f64>,
        vector_len: Option<usize>,
    ) -> Result<Self, Error> {
        if entries < 0.0 {
            return Err(Error::Validation(format!("entries must be >= 0, got {entries}")));
        }
        for key in values.keys() {
            if let (BagKey::Vector(v), Some(n)) = (key, vector_len) {
                if v.len() != n {
                    return Err(Error::Validation(format!(
                        "bag vector key has length {} but bag is locked to length {}",
                        v.len(),
                        n
                    )));
                }
            }
        }
        Ok(Bagged { name, entries, values, vector_len })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn values(&self) -> &BTreeMap<BagKey, f64> {
        &self.values
    }

    pub fn zero(&self) -> Self {
        Bagged { name: self.name.clone(), entries: 0.0, values: BTreeMap::new(), vector_len: self.vector_len }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        let vector_len = match (self.vector_len, other.vector_len) {
            (Some(a), Some(b)) if a != b => {
                return Err(Error::Validation(format!(
                    "cannot merge bags with vector-key lengths {a} and {b}"
                )))
            }
            (Some(a), _) => Some(a),
            (None, b) => b,
        };
        let mut values = self.values.clone();
        for (k, w) in &other.values {
            *values.entry(k.clone()).or_insert(0.0) += w;
        }
        Ok(Bagged { name, entries: self.entries + other.entries, values, vector_len })
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), json!(self.entries));
        let values: Vec<Value> = self
            .values
            .iter()
            .map(|(k, w)| json!({ "key": k, "weight": w }))
            .collect();
        map.insert("values".to_string(), Value::Array(values));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let entries = field_f64(m, "entries")?;
        let values_json = field(m, "values")?
            .as_array()
            .ok_or_else(|| Error::JsonFormat("field \"values\" is not an array".to_string()))?;
        let mut values = BTreeMap::new();
        let mut vector_len = None;
        for entry in values_json {
            let eo = obj(entry)?;
            let key: BagKey = serde_json::from_value(field(eo, "key")?.clone())
                .map_err(|e| Error::JsonFormat(format!("bad bag key: {e}")))?;
            let weight = field_f64(eo, "weight")?;
            if let BagKey::Vector(v) = &key {
                vector_len = Some(v.len());
            }
            values.insert(key, weight);
        }
        let name = opt_name(m, name_from_parent)?;
        Self::ed(name, entries, values, vector_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Extractor;

    #[test]
    fn fill_accumulates_distinct_keys() {
        let mut b: Bagging<f64> = Bagging::create(Extractor::new(|x: &f64| BagKey::num(*x)));
        for v in [1.0, 2.0, 1.0, 3.0] {
            b.fill(&v, 1.0).unwrap();
        }
        let past = b.to_past();
        assert_eq!(past.entries(), 4.0);
        assert_eq!(past.values().get(&BagKey::num(1.0)), Some(&2.0));
    }

    #[test]
    fn mismatched_vector_lengths_rejected() {
        let mut b: Bagging<Vec<f64>> =
            Bagging::create(Extractor::new(|v: &Vec<f64>| BagKey::vector(None, v.clone()).unwrap()));
        b.fill(&vec![1.0, 2.0], 1.0).unwrap();
        assert!(b.fill(&vec![1.0, 2.0, 3.0], 1.0).is_err());
    }

    #[test]
    fn merge_sums_weights_per_key() {
        let mut a = BTreeMap::new();
        a.insert(BagKey::num(1.0), 2.0);
        let mut b = BTreeMap::new();
        b.insert(BagKey::num(1.0), 3.0);
        b.insert(BagKey::num(2.0), 1.0);
        let ba = Bagged::ed(None, 2.0, a, None).unwrap();
        let bb = Bagged::ed(None, 4.0, b, None).unwrap();
        let merged = ba.merge(&bb).unwrap();
        assert_eq!(merged.values().get(&BagKey::num(1.0)), Some(&5.0));
        assert_eq!(merged.entries(), 6.0);
    }
}
