//! `Average`: the weighted mean of a numeric quantity, updated with a
//! numerically stable one-pass formula.

use serde_json::{json, Value};

use crate::error::{merge_names, Error};
use crate::json::{field_f64, obj, opt_name, with_name};
use crate::quantity::Quantity;

pub const TAG: &str = "Average";

#[derive(Clone)]
pub struct Averaging<D> {
    quantity: Quantity<D>,
    entries: f64,
    mean: f64,
}

impl<D> Averaging<D> {
    pub fn create(quantity: Quantity<D>) -> Self {
        Averaging { quantity, entries: 0.0, mean: 0.0 }
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn fill(&mut self, datum: &D, weight: f64) {
        if weight <= 0.0 {
            return;
        }
        let q = self.quantity.call(datum);
        let new_entries = self.entries + weight;
        self.mean += (weight / new_entries) * (q - self.mean);
        self.entries = new_entries;
    }

    pub fn zero(&self) -> Self {
        Averaging { quantity: self.quantity.clone(), entries: 0.0, mean: 0.0 }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        merge_names(&self.quantity.name().map(str::to_string), &other.quantity.name().map(str::to_string))?;
        let (entries, mean) = combine_mean(self.entries, self.mean, other.entries, other.mean);
        Ok(Averaging { quantity: self.quantity.clone(), entries, mean })
    }

    pub fn to_past(&self) -> Averaged {
        Averaged {
            name: self.quantity.name().map(str::to_string),
            entries: self.entries,
            mean: self.mean,
        }
    }
}

/// Combine two weighted running means into one, without ever summing the
/// raw products (keeps the result stable for large, disparate `entries`).
pub(crate) fn combine_mean(ea: f64, ma: f64, eb: f64, mb: f64) -> (f64, f64) {
    let total = ea + eb;
    if total <= 0.0 {
        return (total.max(0.0), 0.0);
    }
    let mean = ma + (mb - ma) * (eb / total);
    (total, mean)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Averaged {
    name: Option<String>,
    entries: f64,
    mean: f64,
}

impl Averaged {
    pub fn ed(name: Option<String>, entries: f64, mean: f64) -> Result<Self, Error> {
        if entries < 0.0 {
            return Err(Error::Validation(format!("entries must be >= 0, got {entries}")));
        }
        Ok(Averaged { name, entries, mean })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn zero(&self) -> Self {
        Averaged { name: self.name.clone(), entries: 0.0, mean: 0.0 }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        let (entries, mean) = combine_mean(self.entries, self.mean, other.entries, other.mean);
        Ok(Averaged { name, entries, mean })
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), json!(self.entries));
        map.insert("mean".to_string(), json!(self.mean));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let entries = field_f64(m, "entries")?;
        let mean = field_f64(m, "mean")?;
        let name = opt_name(m, name_from_parent)?;
        Self::ed(name, entries, mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_converges_to_mean() {
        let mut a: Averaging<i64> = Averaging::create(Quantity::new(|d: &i64| *d as f64));
        for v in [1, 2, 3, 4, 5] {
            a.fill(&v, 1.0);
        }
        assert!((a.to_past().mean() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn merge_weights_by_entries() {
        let a = Averaged::ed(None, 2.0, 10.0).unwrap();
        let b = Averaged::ed(None, 1.0, 1.0).unwrap();
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.entries(), 3.0);
        assert!((merged.mean() - 7.0).abs() < 1e-9);
    }
}
