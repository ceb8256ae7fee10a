//! `Deviate`: weighted mean and variance of a numeric quantity, using
//! Welford's one-pass update for `fill` and Chan et al.'s parallel-variance
//! formula for `merge`.

use serde_json::{json, Value};

use crate::error::{merge_names, Error};
use crate::json::{field_f64, obj, opt_name, with_name};
use crate::quantity::Quantity;

pub const TAG: &str = "Deviate";

#[derive(Clone)]
pub struct Deviating<D> {
    quantity: Quantity<D>,
    entries: f64,
    mean: f64,
    // sum of squared deviations from the running mean (Welford's M2).
    m2: f64,
}

impl<D> Deviating<D> {
    pub fn create(quantity: Quantity<D>) -> Self {
        Deviating { quantity, entries: 0.0, mean: 0.0, m2: 0.0 }
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
        let delta = q - self.mean;
        self.mean += delta * weight / new_entries;
        let delta2 = q - self.mean;
        self.m2 += weight * delta * delta2;
        self.entries = new_entries;
    }

    pub fn zero(&self) -> Self {
        Deviating { quantity: self.quantity.clone(), entries: 0.0, mean: 0.0, m2: 0.0 }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        merge_names(&self.quantity.name().map(str::to_string), &other.quantity.name().map(str::to_string))?;
        let (entries, mean, m2) = combine_moments(self.entries, self.mean, self.m2, other.entries, other.mean, other.m2);
        Ok(Deviating { quantity: self.quantity.clone(), entries, mean, m2 })
    }

    pub fn to_past(&self) -> Deviated {
        let variance = if self.entries > 0.0 { self.m2 / self.entries } else { 0.0 };
        Deviated {
            name: self.quantity.name().map(str::to_string),
            entries: self.entries,
            mean: self.mean,
            variance,
        }
    }
}

fn combine_moments(ea: f64, ma: f64, m2a: f64, eb: f64, mb: f64, m2b: f64) -> (f64, f64, f64) {
    let total = ea + eb;
    if total <= 0.0 {
        return (total.max(0.0), 0.0, 0.0);
    }
    let delta = mb - ma;
    let mean = ma + delta * (eb / total);
    let m2 = m2a + m2b + delta * delta * (ea * eb / total);
    (total, mean, m2)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Deviated {
    name: Option<String>,
    entries: f64,
    mean: f64,
    variance: f64,
}

impl Deviated {
    pub fn ed(name: Option<String>, entries: f64, mean: f64, variance: f64) -> Result<Self, Error> {
        if entries < 0.0 {
            return Err(Error::Validation(format!("entries must be >= 0, got {entries}")));
        }
        if variance < 0.0 {
            return Err(Error::Validation(format!("variance must be >= 0, got {variance}")));
        }
        Ok(Deviated { name, entries, mean, variance })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }

    pub fn zero(&self) -> Self {
        Deviated { name: self.name.clone(), entries: 0.0, mean: 0.0, variance: 0.0 }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        let m2a = self.variance * self.entries;
        let m2b = other.variance * other.entries;
        let (entries, mean, m2) = combine_moments(self.entries, self.mean, m2a, other.entries, other.mean, m2b);
        let variance = if entries > 0.0 { m2 / entries } else { 0.0 };
        Ok(Deviated { name, entries, mean, variance })
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), json!(self.entries));
        map.insert("mean".to_string(), json!(self.mean));
        map.insert("variance".to_string(), json!(self.variance));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let entries = field_f64(m, "entries")?;
        let mean = field_f64(m, "mean")?;
        let variance = field_f64(m, "variance")?;
        let name = opt_name(m, name_from_parent)?;
        Self::ed(name, entries, mean, variance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_matches_population_variance() {
        let mut d: Deviating<i64> = Deviating::create(Quantity::new(|x: &i64| *x as f64));
        for v in [2, 4, 4, 4, 5, 5, 7, 9] {
            d.fill(&v, 1.0);
        }
        let past = d.to_past();
        assert!((past.mean() - 5.0).abs() < 1e-9);
        assert!((past.variance() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn split_and_merge_matches_single_pass() {
        let data = [2i64, 4, 4, 4, 5, 5, 7, 9];
        let mut whole: Deviating<i64> = Deviating::create(Quantity::new(|x: &i64| *x as f64));
        for v in data {
            whole.fill(&v, 1.0);
        }

        let mut left: Deviating<i64> = Deviating::create(Quantity::new(|x: &i64| *x as f64));
        let mut right: Deviating<i64> = Deviating::create(Quantity::new(|x: &i64| *x as f64));
        for v in &data[..4] {
            left.fill(v, 1.0);
        }
        for v in &data[4..] {
            right.fill(v, 1.0);
        }
        let merged = left.merge(&right).unwrap().to_past();
        let single = whole.to_past();
        assert!((merged.mean() - single.mean()).abs() < 1e-9);
        assert!((merged.variance() - single.variance()).abs() < 1e-9);
    }
}
