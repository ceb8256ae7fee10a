//! `Minimize` and `Maximize`: the smallest/largest observed quantity value.
//! Both are NaN when no entries have been filled, and both ignore NaN
//! quantity values the same way binning containers route them to nanflow
//! (a NaN quantity simply cannot win a min/max comparison).

use serde_json::{json, Value};

use crate::error::{merge_names, Error};
use crate::json::{num_from_json, num_to_json, obj, field, opt_name, with_name};
use crate::quantity::Quantity;

pub const MINIMIZE_TAG: &str = "Minimize";
pub const MAXIMIZE_TAG: &str = "Maximize";

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Min,
    Max,
}

impl Extreme {
    fn better(self, a: f64, b: f64) -> f64 {
        match self {
            Extreme::Min => a.min(b),
            Extreme::Max => a.max(b),
        }
    }
}

#[derive(Clone)]
pub struct Extremizing<D> {
    quantity: Quantity<D>,
    entries: f64,
    value: f64,
    extreme: Extreme,
}

impl<D> Extremizing<D> {
    pub fn create(extreme: Extreme, quantity: Quantity<D>) -> Self {
        Extremizing { quantity, entries: 0.0, value: f64::NAN, extreme }
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn fill(&mut self, datum: &D, weight: f64) {
        if weight <= 0.0 {
            return;
        }
        let q = self.quantity.call(datum);
        if !q.is_nan() {
            self.value = if self.entries == 0.0 || self.value.is_nan() {
                q
            } else {
                self.extreme.better(self.value, q)
            };
        }
        self.entries += weight;
    }

    pub fn zero(&self) -> Self {
        Extremizing { quantity: self.quantity.clone(), entries: 0.0, value: f64::NAN, extreme: self.extreme }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        merge_names(&self.quantity.name().map(str::to_string), &other.quantity.name().map(str::to_string))?;
        let value = match (self.value.is_nan(), other.value.is_nan()) {
            (true, true) => f64::NAN,
            (true, false) => other.value,
            (false, true) => self.value,
            (false, false) => self.extreme.better(self.value, other.value),
        };
        Ok(Extremizing {
            quantity: self.quantity.clone(),
            entries: self.entries + other.entries,
            value,
            extreme: self.extreme,
        })
    }

    pub fn to_past(&self) -> Extremized {
        Extremized {
            name: self.quantity.name().map(str::to_string),
            entries: self.entries,
            value: self.value,
            extreme: self.extreme,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Extremized {
    name: Option<String>,
    entries: f64,
    value: f64,
    extreme: Extreme,
}

impl PartialEq for Extremized {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.entries == other.entries
            && (self.value.is_nan() && other.value.is_nan() || self.value == other.value)
            && self.extreme == other.extreme
    }
}

impl Extremized {
    pub fn ed(extreme: Extreme, name: Option<String>, entries: f64, value: f64) -> Result<Self, Error> {
        if entries < 0.0 {
            return Err(Error::Validation(format!("entries must be >= 0, got {entries}")));
        }
        Ok(Extremized { name, entries, value, extreme })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn zero(&self) -> Self {
        Extremized { name: self.name.clone(), entries: 0.0, value: f64::NAN, extreme: self.extreme }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        let value = match (self.value.is_nan(), other.value.is_nan()) {
            (true, true) => f64::NAN,
            (true, false) => other.value,
            (false, true) => self.value,
            (false, false) => self.extreme.better(self.value, other.value),
        };
        Ok(Extremized { name, entries: self.entries + other.entries, value, extreme: self.extreme })
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), json!(self.entries));
        let key = match self.extreme {
            Extreme::Min => "min",
            Extreme::Max => "max",
        };
        map.insert(key.to_string(), num_to_json(self.value));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(extreme: Extreme, data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let entries = crate::json::field_f64(m, "entries")?;
        let key = match extreme {
            Extreme::Min => "min",
            Extreme::Max => "max",
        };
        let value = num_from_json(field(m, key)?)?;
        let name = opt_name(m, name_from_parent)?;
        Self::ed(extreme, name, entries, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimize_tracks_smallest_value() {
        let mut m: Extremizing<i64> = Extremizing::create(Extreme::Min, Quantity::new(|x: &i64| *x as f64));
        for v in [5, 2, 9, -3, 4] {
            m.fill(&v, 1.0);
        }
        assert_eq!(m.to_past().value(), -3.0);
    }

    #[test]
    fn maximize_with_no_entries_is_nan() {
        let m: Extremizing<i64> = Extremizing::create(Extreme::Max, Quantity::new(|x: &i64| *x as f64));
        assert!(m.to_past().value().is_nan());
    }

    #[test]
    fn nan_quantity_values_are_ignored() {
        let mut m: Extremizing<f64> = Extremizing::create(Extreme::Max, Quantity::new(|x: &f64| *x));
        m.fill(&f64::NAN, 1.0);
        m.fill(&3.0, 1.0);
        m.fill(&f64::NAN, 1.0);
        assert_eq!(m.to_past().value(), 3.0);
    }

    #[test]
    fn merge_combines_extremes() {
        let a = Extremized::ed(Extreme::Min, None, 1.0, 5.0).unwrap();
        let b = Extremized::ed(Extreme::Min, None, 1.0, -2.0).unwrap();
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.value(), -2.0);
        assert_eq!(merged.entries(), 2.0);
    }
}
