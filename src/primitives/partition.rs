//! `Partition`: adjacent half-open intervals; each datum is routed to
//! exactly the interval `[cutoffs[k], cutoffs[k+1])` containing its
//! quantity. Values below the first cutoff or at/above the last count
//! toward `entries` but are not routed to any sub-aggregator, so `n`
//! cutoffs produce `n-1` subs (one fewer than `Stack` for the same list).

use serde_json::Value;

use crate::aggregator::{Past, Present};
use crate::error::{merge_names, Error};
use crate::json::{field, field_f64, obj, opt_name, with_name};
use crate::quantity::Quantity;

pub const TAG: &str = "Partition";

pub struct Partitioning<D> {
    quantity: Quantity<D>,
    cutoffs: Vec<f64>,
    entries: f64,
    subs: Vec<Present<D>>,
}

impl<D> Partitioning<D> {
    pub fn create(quantity: Quantity<D>, cutoffs: Vec<f64>, template: Present<D>) -> Result<Self, Error>
    where
        D: 'static,
    {
        if cutoffs.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(Error::Validation("cutoffs must be strictly increasing".to_string()));
        }
        let subs = (0..cutoffs.len().saturating_sub(1)).map(|_| template.zero()).collect();
        Ok(Partitioning { quantity, cutoffs, entries: 0.0, subs })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    /// The index of the sub whose interval `[cutoffs[k], cutoffs[k+1])`
    /// contains `q`, or `None` if `q` falls outside `[c0, cn)`.
    fn interval_index(&self, q: f64) -> Option<usize> {
        if self.subs.is_empty() {
            return None;
        }
        if q < self.cutoffs[0] || q >= *self.cutoffs.last().expect("subs non-empty implies cutoffs non-empty") {
            return None;
        }
        Some(self.cutoffs.partition_point(|c| *c <= q) - 1)
    }

    pub fn fill(&mut self, datum: &D, weight: f64) -> Result<(), Error>
    where
        D: 'static,
    {
        if weight <= 0.0 {
            return Ok(());
        }
        let q = self.quantity.call(datum);
        if q.is_nan() {
            return Ok(());
        }
        self.entries += weight;
        if let Some(idx) = self.interval_index(q) {
            self.subs[idx].fill(datum, weight)?;
        }
        Ok(())
    }

    pub fn zero(&self) -> Self
    where
        D: 'static,
    {
        Partitioning {
            quantity: self.quantity.clone(),
            cutoffs: self.cutoffs.clone(),
            entries: 0.0,
            subs: self.subs.iter().map(|s| s.zero()).collect(),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error>
    where
        D: 'static,
    {
        merge_names(&self.quantity.name().map(str::to_string), &other.quantity.name().map(str::to_string))?;
        if self.cutoffs != other.cutoffs {
            return Err(Error::StructureMismatch("Partition cutoffs do not match".to_string()));
        }
        let subs = self
            .subs
            .iter()
            .zip(other.subs.iter())
            .map(|(a, b)| a.merge(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Partitioning {
            quantity: self.quantity.clone(),
            cutoffs: self.cutoffs.clone(),
            entries: self.entries + other.entries,
            subs,
        })
    }

    pub fn to_past(&self) -> Partitioned {
        Partitioned {
            name: self.quantity.name().map(str::to_string),
            entries: self.entries,
            cutoffs: self.cutoffs.clone(),
            subs: self.subs.iter().map(|s| s.to_past()).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Partitioned {
    name: Option<String>,
    entries: f64,
    cutoffs: Vec<f64>,
    subs: Vec<Past>,
}

impl Partitioned {
    pub fn ed(name: Option<String>, entries: f64, cutoffs: Vec<f64>, subs: Vec<Past>) -> Result<Self, Error> {
        if entries < 0.0 {
            return Err(Error::Validation(format!("entries must be >= 0, got {entries}")));
        }
        if subs.len() != cutoffs.len().saturating_sub(1) {
            return Err(Error::Validation("Partition must have one fewer sub than cutoffs".to_string()));
        }
        if cutoffs.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(Error::Validation("cutoffs must be strictly increasing".to_string()));
        }
        Ok(Partitioned { name, entries, cutoffs, subs })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn cutoffs(&self) -> &[f64] {
        &self.cutoffs
    }

    pub fn subs(&self) -> &[Past] {
        &self.subs
    }

    pub fn zero(&self) -> Self {
        Partitioned {
            name: self.name.clone(),
            entries: 0.0,
            cutoffs: self.cutoffs.clone(),
            subs: self.subs.iter().map(|s| s.zero()).collect(),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        if self.cutoffs != other.cutoffs {
            return Err(Error::StructureMismatch("Partition cutoffs do not match".to_string()));
        }
        let subs = self
            .subs
            .iter()
            .zip(other.subs.iter())
            .map(|(a, b)| a.merge(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Partitioned { name, entries: self.entries + other.entries, cutoffs: self.cutoffs.clone(), subs })
    }

    pub fn children(&self) -> Vec<&Past> {
        self.subs.iter().collect()
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), serde_json::json!(self.entries));
        let bins_type = self.subs.first().map(|s| s.factory_tag()).unwrap_or("");
        map.insert("bins:type".to_string(), Value::String(bins_type.to_string()));
        map.insert("cutoffs".to_string(), serde_json::json!(self.cutoffs));
        let bins: Vec<Value> = self.subs.iter().map(|s| s.to_json_fragment(false)).collect();
        map.insert("bins".to_string(), Value::Array(bins));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let entries = field_f64(m, "entries")?;
        let tag = field(m, "bins:type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"bins:type\" is not a string".to_string()))?;
        let cutoffs_json = field(m, "cutoffs")?
            .as_array()
            .ok_or_else(|| Error::JsonFormat("field \"cutoffs\" is not an array".to_string()))?;
        let mut cutoffs = Vec::with_capacity(cutoffs_json.len());
        for c in cutoffs_json {
            cutoffs.push(c.as_f64().ok_or_else(|| Error::JsonFormat("cutoff is not a number".to_string()))?);
        }
        let bins_json = field(m, "bins")?
            .as_array()
            .ok_or_else(|| Error::JsonFormat("field \"bins\" is not an array".to_string()))?;
        let mut subs = Vec::with_capacity(bins_json.len());
        for b in bins_json {
            subs.push(Past::from_json_fragment(tag, b, None)?);
        }
        let name = opt_name(m, name_from_parent)?;
        Self::ed(name, entries, cutoffs, subs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::count::Counting;

    #[test]
    fn routes_to_containing_interval_and_excludes_outliers() {
        let mut p: Partitioning<i64> = Partitioning::create(
            Quantity::new(|x: &i64| *x as f64),
            vec![0.0, 5.0, 10.0],
            Present::Count(Counting::create()),
        )
        .unwrap();
        for v in [-5, 0, 3, 5, 9, 10, 15] {
            p.fill(&v, 1.0).unwrap();
        }
        let past = p.to_past();
        // [-5, 15] fall outside [0, 10) and count toward entries but no sub.
        assert_eq!(past.entries(), 7.0);
        let counts: Vec<f64> = past.subs().iter().map(|s| s.entries()).collect();
        assert_eq!(counts, vec![2.0, 2.0]);
    }

    #[test]
    fn one_cutoff_has_no_subs(){
        let mut p: Partitioning<i64> =
            Partitioning::create(Quantity::new(|x: &i64| *x as f64), vec![0.0], Present::Count(Counting::create()))
                .unwrap();
        assert!(p.to_past().subs().is_empty());
        p.fill(&5, 1.0).unwrap();
        assert_eq!(p.to_past().entries(), 1.0);
    }
}
