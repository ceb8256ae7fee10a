//! `Quantile`: a single-point estimate of the `p`-th weighted quantile of a
//! numeric quantity, built on the same mergeable cluster structure as
//! `AdaptivelyBin` (a classic P² estimator has no associative merge, so a
//! one-pass P² formulation cannot satisfy this crate's monoid contract).

use serde_json::{json, Value};

use crate::cluster::KCenters;
use crate::error::{merge_names, Error};
use crate::json::{field, field_f64, obj, opt_name, with_name};
use crate::quantity::Quantity;

pub const TAG: &str = "Quantile";

/// Cluster cap for the internal estimator. Not user-configurable: `Quantile`
/// exposes only `p`, matching the state row in the primitive inventory.
const NUM_CLUSTERS: usize = 32;
const TAIL_DETAIL: f64 = 0.0;

#[derive(Clone)]
pub struct Quantiling<D> {
    quantity: Quantity<D>,
    p: f64,
    entries: f64,
    min: f64,
    max: f64,
    clusters: KCenters<f64>,
}

impl<D> Quantiling<D> {
    pub fn create(p: f64, quantity: Quantity<D>) -> Result<Self, Error> {
        if !(0.0..=1.0).contains(&p) {
            return Err(Error::Validation(format!("p must be in [0,1], got {p}")));
        }
        Ok(Quantiling {
            quantity,
            p,
            entries: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            clusters: KCenters::new(),
        })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn fill(&mut self, datum: &D, weight: f64) {
        if weight <= 0.0 {
            return;
        }
        let q = self.quantity.call(datum);
        if q.is_nan() {
            return;
        }
        self.clusters.insert(q, weight);
        self.min = self.min.min(q);
        self.max = self.max.max(q);
        self.entries += weight;
        let _ = self.clusters.shrink_to(NUM_CLUSTERS, TAIL_DETAIL, self.min, self.max);
    }

    pub fn zero(&self) -> Self {
        Quantiling {
            quantity: self.quantity.clone(),
            p: self.p,
            entries: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            clusters: KCenters::new(),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        merge_names(&self.quantity.name().map(str::to_string), &other.quantity.name().map(str::to_string))?;
        if self.p != other.p {
            return Err(Error::StructureMismatch(format!(
                "cannot merge Quantile with p={} and p={}",
                self.p, other.p
            )));
        }
        let min = self.min.min(other.min);
        let max = self.max.max(other.max);
        let clusters = if min.is_finite() && max.is_finite() {
            self.clusters.merge(&other.clusters, NUM_CLUSTERS, TAIL_DETAIL, min, max)?
        } else {
            KCenters::new()
        };
        Ok(Quantiling {
            quantity: self.quantity.clone(),
            p: self.p,
            entries: self.entries + other.entries,
            min,
            max,
            clusters,
        })
    }

    pub fn to_past(&self) -> Quantiled {
        Quantiled {
            name: self.quantity.name().map(str::to_string),
            p: self.p,
            entries: self.entries,
            min: self.min,
            max: self.max,
            clusters: self.clusters.clone(),
        }
    }
}

fn estimate(p: f64, entries: f64, clusters: &KCenters<f64>) -> f64 {
    if clusters.centers.is_empty() || entries <= 0.0 {
        return f64::NAN;
    }
    let target = p * entries;
    let mut cumulative = 0.0;
    for (center, weight) in &clusters.centers {
        cumulative += weight;
        if cumulative >= target {
            return *center;
        }
    }
    clusters.centers.last().unwrap().0
}

#[derive(Clone, Debug)]
pub struct Quantiled {
    name: Option<String>,
    p: f64,
    entries: f64,
    min: f64,
    max: f64,
    clusters: KCenters<f64>,
}

impl PartialEq for Quantiled {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.p == other.p
            && self.entries == other.entries
            && (self.estimate() - other.estimate()).abs() < 1e-9
    }
}

impl Quantiled {
    pub fn ed(name: Option<String>, p: f64, entries: f64, clusters: KCenters<f64>) -> Result<Self, Error> {
        if !(0.0..=1.0).contains(&p) {
            return Err(Error::Validation(format!("p must be in [0,1], got {p}")));
        }
        if entries < 0.0 {
            return Err(Error::Validation(format!("entries must be >= 0, got {entries}")));
        }
        let min = clusters.centers.iter().map(|(c, _)| *c).fold(f64::INFINITY, f64::min);
        let max = clusters.centers.iter().map(|(c, _)| *c).fold(f64::NEG_INFINITY, f64::max);
        Ok(Quantiled { name, p, entries, min, max, clusters })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn estimate(&self) -> f64 {
        estimate(self.p, self.entries, &self.clusters)
    }

    pub fn zero(&self) -> Self {
        Quantiled {
            name: self.name.clone(),
            p: self.p,
            entries: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            clusters: KCenters::new(),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        if self.p != other.p {
            return Err(Error::StructureMismatch(format!(
                "cannot merge Quantile with p={} and p={}",
                self.p, other.p
            )));
        }
        let min = self.min.min(other.min);
        let max = self.max.max(other.max);
        let clusters = if min.is_finite() && max.is_finite() {
            self.clusters.merge(&other.clusters, NUM_CLUSTERS, TAIL_DETAIL, min, max)?
        } else {
            KCenters::new()
        };
        Ok(Quantiled { name, p: self.p, entries: self.entries + other.entries, min, max, clusters })
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("p".to_string(), json!(self.p));
        map.insert("entries".to_string(), json!(self.entries));
        map.insert("estimate".to_string(), json!(self.estimate()));
        let centers: Vec<Value> = self
            .clusters
            .centers
            .iter()
            .map(|(c, w)| json!({ "center": c, "weight": w }))
            .collect();
        map.insert("centers".to_string(), Value::Array(centers));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let p = field_f64(m, "p")?;
        let entries = field_f64(m, "entries")?;
        let centers_json = field(m, "centers")?
            .as_array()
            .ok_or_else(|| Error::JsonFormat("field \"centers\" is not an array".to_string()))?;
        let mut clusters = KCenters::new();
        for c in centers_json {
            let co = obj(c)?;
            let center = field_f64(co, "center")?;
            let weight = field_f64(co, "weight")?;
            clusters.insert(center, weight);
        }
        let name = opt_name(m, name_from_parent)?;
        Self::ed(name, p, entries, clusters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_uniform_data() {
        let mut q: Quantiling<i64> = Quantiling::create(0.5, Quantity::new(|x: &i64| *x as f64)).unwrap();
        for v in 1..=9 {
            q.fill(&v, 1.0);
        }
        let past = q.to_past();
        assert!((past.estimate() - 5.0).abs() <= 1.0);
    }

    #[test]
    fn rejects_out_of_range_p() {
        let q: Result<Quantiling<i64>, Error> = Quantiling::create(1.5, Quantity::new(|x: &i64| *x as f64));
        assert!(q.is_err());
    }

    #[test]
    fn merge_requires_matching_p() {
        let a = Quantiled::ed(None, 0.5, 1.0, KCenters::new()).unwrap();
        let b = Quantiled::ed(None, 0.9, 1.0, KCenters::new()).unwrap();
        assert!(a.merge(&b).is_err());
    }
}
