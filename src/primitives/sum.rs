//! `Sum`: the weighted sum of a numeric quantity.

use serde_json::{json, Value};

use crate::error::{merge_names, Error};
use crate::json::{field_f64, obj, opt_name, with_name};
use crate::quantity::Quantity;

pub const TAG: &str = "Sum";

#[derive(Clone)]
pub struct Summing<D> {
    quantity: Quantity<D>,
    entries: f64,
    sum: f64,
}

impl<D> Summing<D> {
    pub fn create(quantity: Quantity<D>) -> Self {
        Summing { quantity, entries: 0.0, sum: 0.0 }
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn fill(&mut self, datum: &D, weight: f64) {
        if weight <= 0.0 {
            return;
        }
        let q = self.quantity.call(datum);
        self.sum += weight * q;
        self.entries += weight;
    }

    pub fn zero(&self) -> Self {
        Summing { quantity: self.quantity.clone(), entries: 0.0, sum: 0.0 }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        merge_names(&self.quantity.name().map(str::to_string), &other.quantity.name().map(str::to_string))?;
        Ok(Summing {
            quantity: self.quantity.clone(),
            entries: self.entries + other.entries,
            sum: self.sum + other.sum,
        })
    }

    pub fn to_past(&self) -> Summed {
        Summed {
            name: self.quantity.name().map(str::to_string),
            entries: self.entries,
            sum: self.sum,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Summed {
    name: Option<String>,
    entries: f64,
    sum: f64,
}

impl Summed {
    pub fn ed(name: Option<String>, entries: f64, sum: f64) -> Result<Self, Error> {
        if entries < 0.0 {
            return Err(Error::Validation(format!("entries must be >= 0, got {entries}")));
        }
        Ok(Summed { name, entries, sum })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn zero(&self) -> Self {
        Summed { name: self.name.clone(), entries: 0.0, sum: 0.0 }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        Ok(Summed {
            name,
            entries: self.entries + other.entries,
            sum: self.sum + other.sum,
        })
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), json!(self.entries));
        map.insert("sum".to_string(), json!(self.sum));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let entries = field_f64(m, "entries")?;
        let sum = field_f64(m, "sum")?;
        let name = opt_name(m, name_from_parent)?;
        Self::ed(name, entries, sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_entries_and_totals() {
        let a = Summed::ed(None, 2.0, 4.0).unwrap();
        let b = Summed::ed(None, 3.0, 9.0).unwrap();
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.entries(), 5.0);
        assert_eq!(merged.sum, 13.0);
    }

    #[test]
    fn merge_rejects_conflicting_names() {
        let a = Summed::ed(Some("x".into()), 1.0, 1.0).unwrap();
        let b = Summed::ed(Some("y".into()), 1.0, 1.0).unwrap();
        assert!(a.merge(&b).is_err());
    }

    #[test]
    fn fill_accumulates_weighted_sum() {
        let mut s: Summing<i64> = Summing::create(Quantity::new(|d: &i64| *d as f64));
        s.fill(&2, 1.0);
        s.fill(&3, 1.0);
        s.fill(&100, -1.0); // ignored
        let past = s.to_past();
        assert_eq!(past.entries(), 2.0);
        assert_eq!(past.sum, 5.0);
    }
}
