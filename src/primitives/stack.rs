//! `Stack`: a sorted list of cutoffs, one sub per cutoff, each filled iff
//! the quantity is at least that cutoff (so lower cutoffs accumulate more
//! data — a "greater-or-equal" cumulative stack of histograms).

use serde_json::Value;

use crate::aggregator::{Past, Present};
use crate::error::{merge_names, Error};
use crate::json::{field, field_f64, obj, opt_name, with_name};
use crate::quantity::Quantity;

pub const TAG: &str = "Stack";

pub struct Stacking<D> {
    quantity: Quantity<D>,
    cutoffs: Vec<f64>,
    subs: Vec<Present<D>>,
}

impl<D> Stacking<D> {
    pub fn create(quantity: Quantity<D>, cutoffs: Vec<f64>, template: Present<D>) -> Result<Self, Error>
    where
        D: 'static,
    {
        if cutoffs.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(Error::Validation("cutoffs must be strictly increasing".to_string()));
        }
        let subs = (0..cutoffs.len()).map(|_| template.zero()).collect();
        Ok(Stacking { quantity, cutoffs, subs })
    }

    pub fn entries(&self) -> f64 {
        self.subs.first().map(|s| s.entries()).unwrap_or(0.0)
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
        for (cutoff, sub) in self.cutoffs.iter().zip(self.subs.iter_mut()) {
            if q >= *cutoff {
                sub.fill(datum, weight)?;
            }
        }
        Ok(())
    }

    pub fn zero(&self) -> Self
    where
        D: 'static,
    {
        Stacking {
            quantity: self.quantity.clone(),
            cutoffs: self.cutoffs.clone(),
            subs: self.subs.iter().map(|s| s.zero()).collect(),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error>
    where
        D: 'static,
    {
        merge_names(&self.quantity.name().map(str::to_string), &other.quantity.name().map(str::to_string))?;
        if self.cutoffs != other.cutoffs {
            return Err(Error::StructureMismatch("Stack cutoffs do not match".to_string()));
        }
        let subs = self
            .subs
            .iter()
            .zip(other.subs.iter())
            .map(|(a, b)| a.merge(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Stacking { quantity: self.quantity.clone(), cutoffs: self.cutoffs.clone(), subs })
    }

    pub fn to_past(&self) -> Stacked {
        Stacked {
            name: self.quantity.name().map(str::to_string),
            cutoffs: self.cutoffs.clone(),
            subs: self.subs.iter().map(|s| s.to_past()).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stacked {
    name: Option<String>,
    cutoffs: Vec<f64>,
    subs: Vec<Past>,
}

impl Stacked {
    pub fn ed(name: Option<String>, cutoffs: Vec<f64>, subs: Vec<Past>) -> Result<Self, Error> {
        if cutoffs.len() != subs.len() {
            return Err(Error::Validation("Stack cutoffs and subs length mismatch".to_string()));
        }
        if cutoffs.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(Error::Validation("cutoffs must be strictly increasing".to_string()));
        }
        Ok(Stacked { name, cutoffs, subs })
    }

    pub fn entries(&self) -> f64 {
        self.subs.first().map(|s| s.entries()).unwrap_or(0.0)
    }

    pub fn cutoffs(&self) -> &[f64] {
        &self.cutoffs
    }

    pub fn subs(&self) -> &[Past] {
        &self.subs
    }

    pub fn zero(&self) -> Self {
        Stacked { name: self.name.clone(), cutoffs: self.cutoffs.clone(), subs: self.subs.iter().map(|s| s.zero()).collect() }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        if self.cutoffs != other.cutoffs {
            return Err(Error::StructureMismatch("Stack cutoffs do not match".to_string()));
        }
        let subs = self
            .subs
            .iter()
            .zip(other.subs.iter())
            .map(|(a, b)| a.merge(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Stacked { name, cutoffs: self.cutoffs.clone(), subs })
    }

    pub fn children(&self) -> Vec<&Past> {
        self.subs.iter().collect()
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), serde_json::json!(self.entries()));
        let bins_type = self.subs.first().map(|s| s.factory_tag()).unwrap_or("");
        map.insert("bins:type".to_string(), Value::String(bins_type.to_string()));
        let bins: Vec<Value> = self
            .cutoffs
            .iter()
            .zip(self.subs.iter())
            .map(|(c, s)| serde_json::json!({ "atleast": c, "value": s.to_json_fragment(false) }))
            .collect();
        map.insert("bins".to_string(), Value::Array(bins));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let tag = field(m, "bins:type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"bins:type\" is not a string".to_string()))?;
        let bins = field(m, "bins")?
            .as_array()
            .ok_or_else(|| Error::JsonFormat("field \"bins\" is not an array".to_string()))?;
        let mut cutoffs = Vec::with_capacity(bins.len());
        let mut subs = Vec::with_capacity(bins.len());
        for b in bins {
            let bo = obj(b)?;
            cutoffs.push(field_f64(bo, "atleast")?);
            subs.push(Past::from_json_fragment(tag, field(bo, "value")?, None)?);
        }
        let name = opt_name(m, name_from_parent)?;
        Self::ed(name, cutoffs, subs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::count::Counting;

    #[test]
    fn each_sub_counts_at_least_its_cutoff() {
        let mut s: Stacking<i64> = Stacking::create(
            Quantity::new(|x: &i64| *x as f64),
            vec![0.0, 5.0, 10.0],
            Present::Count(Counting::create()),
        )
        .unwrap();
        for v in [-1, 2, 6, 11] {
            s.fill(&v, 1.0).unwrap();
        }
        let past = s.to_past();
        let counts: Vec<f64> = past.subs().iter().map(|p| p.entries()).collect();
        assert_eq!(counts, vec![3.0, 2.0, 1.0]);
    }
}
