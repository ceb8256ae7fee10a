//! `AbsoluteErr`: the weighted mean absolute value of a numeric quantity.
//! Identical in shape to `Average`, applied to `|quantity|` instead of the
//! signed quantity.

use serde_json::{json, Value};

use crate::error::{merge_names, Error};
use crate::json::{field_f64, obj, opt_name, with_name};
use crate::primitives::average::combine_mean;
use crate::quantity::Quantity;

pub const TAG: &str = "AbsoluteErr";

#[derive(Clone)]
pub struct Deviating<D> {
    quantity: Quantity<D>,
    entries: f64,
    mae: f64,
}

impl<D> Deviating<D> {
    pub fn create(quantity: Quantity<D>) -> Self {
        Deviating { quantity, entries: 0.0, mae: 0.0 }
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn fill(&mut self, datum: &D, weight: f64) {
        if weight <= 0.0 {
            return;
        }
        let q = self.quantity.call(datum).abs();
        let new_entries = self.entries + weight;
        self.mae += (weight / new_entries) * (q - self.mae);
        self.entries = new_entries;
    }

    pub fn zero(&self) -> Self {
        Deviating { quantity: self.quantity.clone(), entries: 0.0, mae: 0.0 }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        merge_names(&self.quantity.name().map(str::to_string), &other.quantity.name().map(str::to_string))?;
        let (entries, mae) = combine_mean(self.entries, self.mae, other.entries, other.mae);
        Ok(Deviating { quantity: self.quantity.clone(), entries, mae })
    }

    pub fn to_past(&self) -> Errored {
        Errored {
            name: self.quantity.name().map(str::to_string),
            entries: self.entries,
            mae: self.mae,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Errored {
    name: Option<String>,
    entries: f64,
    mae: f64,
}

impl Errored {
    pub fn ed(name: Option<String>, entries: f64, mae: f64) -> Result<Self, Error> {
        if entries < 0.0 {
            return Err(Error::Validation(format!("entries must be >= 0, got {entries}")));
        }
        Ok(Errored { name, entries, mae })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn mae(&self) -> f64 {
        self.mae
    }

    pub fn zero(&self) -> Self {
        Errored { name: self.name.clone(), entries: 0.0, mae: 0.0 }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        let (entries, mae) = combine_mean(self.entries, self.mae, other.entries, other.mae);
        Ok(Errored { name, entries, mae })
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), json!(self.entries));
        map.insert("mae".to_string(), json!(self.mae));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let entries = field_f64(m, "entries")?;
        let mae = field_f64(m, "mae")?;
        let name = opt_name(m, name_from_parent)?;
        Self::ed(name, entries, mae)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_averages_absolute_values() {
        let mut d: Deviating<i64> = Deviating::create(Quantity::new(|x: &i64| *x as f64));
        for v in [-3, 3, -1, 1] {
            d.fill(&v, 1.0);
        }
        assert!((d.to_past().mae() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn merge_weights_by_entries() {
        let a = Errored::ed(None, 2.0, 10.0).unwrap();
        let b = Errored::ed(None, 1.0, 1.0).unwrap();
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.entries(), 3.0);
        assert!((merged.mae() - 7.0).abs() < 1e-9);
    }
}
