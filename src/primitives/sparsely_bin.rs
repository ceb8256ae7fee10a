//! `SparselyBin`: bins of fixed width indexed by `⌊(q − origin)/binWidth⌋`,
//! created on demand rather than allocated up front like `Bin`.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::aggregator::{Past, Present};
use crate::error::{merge_names, Error};
use crate::json::{field, field_f64, obj, opt_name, with_name};
use crate::quantity::Quantity;

pub const TAG: &str = "SparselyBin";

pub struct SparselyBinning<D> {
    quantity: Quantity<D>,
    bin_width: f64,
    origin: f64,
    template: Box<Present<D>>,
    bins: BTreeMap<i64, Present<D>>,
    nanflow: Box<Present<D>>,
}

impl<D> SparselyBinning<D> {
    pub fn create(bin_width: f64, origin: f64, quantity: Quantity<D>, template: Present<D>) -> Result<Self, Error>
    where
        D: 'static,
    {
        if !(bin_width > 0.0) {
            return Err(Error::Validation(format!("binWidth must be > 0, got {bin_width}")));
        }
        Ok(SparselyBinning {
            quantity,
            bin_width,
            origin,
            nanflow: Box::new(template.zero()),
            template: Box::new(template),
            bins: BTreeMap::new(),
        })
    }

    pub fn entries(&self) -> f64 {
        self.bins.values().map(|v| v.entries()).sum::<f64>() + self.nanflow.entries()
    }

    fn index_of(&self, q: f64) -> i64 {
        ((q - self.origin) / self.bin_width).floor() as i64
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
            return self.nanflow.fill(datum, weight);
        }
        let idx = self.index_of(q);
        let sub = self.bins.entry(idx).or_insert_with(|| self.template.zero());
        sub.fill(datum, weight)
    }

    pub fn zero(&self) -> Self
    where
        D: 'static,
    {
        SparselyBinning {
            quantity: self.quantity.clone(),
            bin_width: self.bin_width,
            origin: self.origin,
            template: Box::new(self.template.zero()),
            bins: BTreeMap::new(),
            nanflow: Box::new(self.nanflow.zero()),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error>
    where
        D: 'static,
    {
        merge_names(&self.quantity.name().map(str::to_string), &other.quantity.name().map(str::to_string))?;
        if self.bin_width != other.bin_width || self.origin != other.origin {
            return Err(Error::StructureMismatch(
                "SparselyBin binWidth/origin do not match".to_string(),
            ));
        }
        let mut bins: BTreeMap<i64, Present<D>> = BTreeMap::new();
        for (k, v) in self.bins.iter() {
            bins.insert(*k, self.template.zero().merge(v)?);
        }
        for (k, v) in other.bins.iter() {
            match bins.get_mut(k) {
                Some(existing) => *existing = existing.merge(v)?,
                None => {
                    bins.insert(*k, self.template.zero().merge(v)?);
                }
            }
        }
        Ok(SparselyBinning {
            quantity: self.quantity.clone(),
            bin_width: self.bin_width,
            origin: self.origin,
            template: Box::new(self.template.zero()),
            bins,
            nanflow: Box::new(self.nanflow.merge(&other.nanflow)?),
        })
    }

    pub fn to_past(&self) -> SparselyBinned {
        let mut bins = BTreeMap::new();
        for (k, v) in &self.bins {
            bins.insert(*k, v.to_past());
        }
        SparselyBinned {
            name: self.quantity.name().map(str::to_string),
            bin_width: self.bin_width,
            origin: self.origin,
            bins,
            nanflow: Box::new(self.nanflow.to_past()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SparselyBinned {
    name: Option<String>,
    bin_width: f64,
    origin: f64,
    bins: BTreeMap<i64, Past>,
    nanflow: Box<Past>,
}

impl SparselyBinned {
    pub fn ed(
        name: Option<String>,
        bin_width: f64,
        origin: f64,
        bins: BTreeMap<i64, Past>,
        nanflow: Past,
    ) -> Result<Self, Error> {
        if !(bin_width > 0.0) {
            return Err(Error::Validation(format!("binWidth must be > 0, got {bin_width}")));
        }
        Ok(SparselyBinned { name, bin_width, origin, bins, nanflow: Box::new(nanflow) })
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub fn origin(&self) -> f64 {
        self.origin
    }

    pub fn bins(&self) -> &BTreeMap<i64, Past> {
        &self.bins
    }

    pub fn nanflow(&self) -> &Past {
        &self.nanflow
    }

    /// Number of bins implied by the observed index range (`maxIndex − minIndex + 1`).
    pub fn num(&self) -> i64 {
        match (self.bins.keys().min(), self.bins.keys().max()) {
            (Some(lo), Some(hi)) => hi - lo + 1,
            _ => 0,
        }
    }

    pub fn low(&self) -> Option<f64> {
        self.bins.keys().min().map(|i| *i as f64 * self.bin_width + self.origin)
    }

    pub fn high(&self) -> Option<f64> {
        self.bins.keys().max().map(|i| (*i + 1) as f64 * self.bin_width + self.origin)
    }

    pub fn entries(&self) -> f64 {
        self.bins.values().map(|v| v.entries()).sum::<f64>() + self.nanflow.entries()
    }

    pub fn zero(&self) -> Self {
        SparselyBinned {
            name: self.name.clone(),
            bin_width: self.bin_width,
            origin: self.origin,
            bins: BTreeMap::new(),
            nanflow: Box::new(self.nanflow.zero()),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        if self.bin_width != other.bin_width || self.origin != other.origin {
            return Err(Error::StructureMismatch(
                "SparselyBin binWidth/origin do not match".to_string(),
            ));
        }
        let mut bins = self.bins.clone();
        for (k, v) in &other.bins {
            match bins.get_mut(k) {
                Some(existing) => *existing = existing.merge(v)?,
                None => {
                    bins.insert(*k, v.clone());
                }
            }
        }
        Ok(SparselyBinned {
            name,
            bin_width: self.bin_width,
            origin: self.origin,
            bins,
            nanflow: Box::new(self.nanflow.merge(&other.nanflow)?),
        })
    }

    pub fn children(&self) -> Vec<&Past> {
        let mut c: Vec<&Past> = self.bins.values().collect();
        c.push(&self.nanflow);
        c
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("binWidth".to_string(), serde_json::json!(self.bin_width));
        map.insert("origin".to_string(), serde_json::json!(self.origin));
        map.insert("entries".to_string(), serde_json::json!(self.entries()));
        let bins_type = self.bins.values().next().map(|p| p.factory_tag()).unwrap_or("");
        map.insert("bins:type".to_string(), Value::String(bins_type.to_string()));
        let mut bins_obj = serde_json::Map::new();
        for (k, v) in &self.bins {
            bins_obj.insert(k.to_string(), v.to_json_fragment(false));
        }
        map.insert("bins".to_string(), Value::Object(bins_obj));
        map.insert(
            "nanflow:type".to_string(),
            Value::String(self.nanflow.factory_tag().to_string()),
        );
        map.insert("nanflow".to_string(), self.nanflow.to_json_fragment(false));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let bin_width = field_f64(m, "binWidth")?;
        let origin = field_f64(m, "origin")?;
        let bins_tag = field(m, "bins:type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"bins:type\" is not a string".to_string()))?;
        let bins_obj = obj(field(m, "bins")?)?;
        let mut bins = BTreeMap::new();
        for (k, v) in bins_obj {
            let idx: i64 = k
                .parse()
                .map_err(|_| Error::JsonFormat(format!("bin key {k:?} is not an integer")))?;
            bins.insert(idx, Past::from_json_fragment(bins_tag, v, None)?);
        }
        let nanflow_tag = field(m, "nanflow:type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"nanflow:type\" is not a string".to_string()))?;
        let nanflow = Past::from_json_fragment(nanflow_tag, field(m, "nanflow")?, None)?;
        let name = opt_name(m, name_from_parent)?;
        Self::ed(name, bin_width, origin, bins, nanflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::count::Counting;

    #[test]
    fn routes_per_scenario_three() {
        let mut b: SparselyBinning<f64> = SparselyBinning::create(
            1.0,
            0.0,
            Quantity::new(|x: &f64| *x),
            Present::Count(Counting::create()),
        )
        .unwrap();
        for v in [0.2, 3.7, 3.9, -0.1] {
            b.fill(&v, 1.0).unwrap();
        }
        let past = b.to_past();
        assert_eq!(past.entries(), 4.0);
        assert_eq!(past.bins().get(&0).unwrap().entries(), 1.0);
        assert_eq!(past.bins().get(&3).unwrap().entries(), 2.0);
        assert_eq!(past.bins().get(&-1).unwrap().entries(), 1.0);
    }
}
