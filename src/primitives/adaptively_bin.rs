//! `AdaptivelyBin`: one-pass adaptive clustering. Every observed quantity
//! value starts its own singleton cluster; whenever the cluster count
//! exceeds `num`, the two adjacent clusters with the smallest blended gap
//! are merged. See `crate::cluster` for the shared blend formula.

use serde_json::Value;

use crate::aggregator::{Past, Present};
use crate::cluster::{ClusterValue, KCenters};
use crate::error::{merge_names, Error};
use crate::json::{field, field_f64, obj, opt_name, with_name};
use crate::quantity::Quantity;

pub const TAG: &str = "AdaptivelyBin";

impl ClusterValue for Past {
    fn cluster_weight(&self) -> f64 {
        self.entries()
    }
    fn cluster_merge(&self, other: &Self) -> Result<Self, Error> {
        self.merge(other)
    }
}

pub struct AdaptivelyBinning<D> {
    quantity: Quantity<D>,
    num: usize,
    tail_detail: f64,
    template: Box<Present<D>>,
    centers: Vec<(f64, Present<D>)>,
    min: f64,
    max: f64,
    nanflow: Box<Present<D>>,
}

fn blended_gap(c0: f64, c1: f64, tail_detail: f64, mid: f64) -> f64 {
    let gap = c1 - c0;
    let pair_mid = (c0 + c1) / 2.0;
    let dist = (pair_mid - mid).abs();
    (1.0 - tail_detail) * gap + tail_detail * gap / (1.0 + dist)
}

impl<D> AdaptivelyBinning<D> {
    pub fn create(num: usize, tail_detail: f64, quantity: Quantity<D>, template: Present<D>) -> Result<Self, Error>
    where
        D: 'static,
    {
        if num < 2 {
            return Err(Error::Validation("AdaptivelyBin num must be >= 2".to_string()));
        }
        if !(0.0..=1.0).contains(&tail_detail) {
            return Err(Error::Validation(format!("tailDetail must be in [0,1], got {tail_detail}")));
        }
        Ok(AdaptivelyBinning {
            quantity,
            num,
            tail_detail,
            nanflow: Box::new(template.zero()),
            template: Box::new(template),
            centers: Vec::new(),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        })
    }

    pub fn entries(&self) -> f64 {
        self.centers.iter().map(|(_, v)| v.entries()).sum::<f64>() + self.nanflow.entries()
    }

    fn shrink(&mut self) -> Result<(), Error>
    where
        D: 'static,
    {
        let mid = (self.min + self.max) / 2.0;
        while self.centers.len() > self.num {
            let mut best_i = 0;
            let mut best_score = f64::INFINITY;
            for i in 0..self.centers.len() - 1 {
                let score = blended_gap(self.centers[i].0, self.centers[i + 1].0, self.tail_detail, mid);
                if score < best_score {
                    best_score = score;
                    best_i = i;
                }
            }
            let (c0, v0) = self.centers.remove(best_i);
            let (c1, v1) = self.centers.remove(best_i);
            let w0 = v0.entries();
            let w1 = v1.entries();
            let merged_center = if w0 + w1 > 0.0 { (c0 * w0 + c1 * w1) / (w0 + w1) } else { (c0 + c1) / 2.0 };
            let merged_value = v0.merge(&v1)?;
            self.centers.insert(best_i, (merged_center, merged_value));
        }
        Ok(())
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
        let mut fresh = self.template.zero();
        fresh.fill(datum, weight)?;
        let idx = self.centers.partition_point(|(c, _)| *c < q);
        self.centers.insert(idx, (q, fresh));
        self.min = self.min.min(q);
        self.max = self.max.max(q);
        self.shrink()
    }

    pub fn zero(&self) -> Self
    where
        D: 'static,
    {
        AdaptivelyBinning {
            quantity: self.quantity.clone(),
            num: self.num,
            tail_detail: self.tail_detail,
            template: Box::new(self.template.zero()),
            centers: Vec::new(),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            nanflow: Box::new(self.nanflow.zero()),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error>
    where
        D: 'static,
    {
        merge_names(&self.quantity.name().map(str::to_string), &other.quantity.name().map(str::to_string))?;
        if self.num != other.num || self.tail_detail != other.tail_detail {
            return Err(Error::StructureMismatch(
                "AdaptivelyBin num/tailDetail do not match".to_string(),
            ));
        }
        let mut centers: Vec<(f64, Present<D>)> = Vec::new();
        for (c, v) in self.centers.iter() {
            centers.push((*c, self.template.zero().merge(v)?));
        }
        for (c, v) in other.centers.iter() {
            if let Some(existing) = centers.iter_mut().find(|(ec, _)| ec == c) {
                existing.1 = existing.1.merge(v)?;
            } else {
                centers.push((*c, self.template.zero().merge(v)?));
            }
        }
        centers.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("cluster centers are never NaN"));
        let min = self.min.min(other.min);
        let max = self.max.max(other.max);
        let mut merged = AdaptivelyBinning {
            quantity: self.quantity.clone(),
            num: self.num,
            tail_detail: self.tail_detail,
            template: Box::new(self.template.zero()),
            centers,
            min,
            max,
            nanflow: Box::new(self.nanflow.merge(&other.nanflow)?),
        };
        merged.shrink()?;
        Ok(merged)
    }

    pub fn to_past(&self) -> AdaptivelyBinned {
        let mut clusters = KCenters::new();
        for (c, v) in &self.centers {
            clusters.insert(*c, v.to_past());
        }
        AdaptivelyBinned {
            name: self.quantity.name().map(str::to_string),
            num: self.num,
            tail_detail: self.tail_detail,
            clusters,
            min: self.min,
            max: self.max,
            nanflow: Box::new(self.nanflow.to_past()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AdaptivelyBinned {
    name: Option<String>,
    num: usize,
    tail_detail: f64,
    clusters: KCenters<Past>,
    min: f64,
    max: f64,
    nanflow: Box<Past>,
}

impl AdaptivelyBinned {
    pub fn ed(
        name: Option<String>,
        num: usize,
        tail_detail: f64,
        clusters: KCenters<Past>,
        min: f64,
        max: f64,
        nanflow: Past,
    ) -> Result<Self, Error> {
        if num < 2 {
            return Err(Error::Validation("AdaptivelyBin num must be >= 2".to_string()));
        }
        if !(0.0..=1.0).contains(&tail_detail) {
            return Err(Error::Validation(format!("tailDetail must be in [0,1], got {tail_detail}")));
        }
        Ok(AdaptivelyBinned { name, num, tail_detail, clusters, min, max, nanflow: Box::new(nanflow) })
    }

    pub fn num(&self) -> usize {
        self.num
    }

    pub fn tail_detail(&self) -> f64 {
        self.tail_detail
    }

    pub fn clusters(&self) -> &KCenters<Past> {
        &self.clusters
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn nanflow(&self) -> &Past {
        &self.nanflow
    }

    pub fn entries(&self) -> f64 {
        self.clusters.centers.iter().map(|(_, v)| v.entries()).sum::<f64>() + self.nanflow.entries()
    }

    pub fn zero(&self) -> Self {
        AdaptivelyBinned {
            name: self.name.clone(),
            num: self.num,
            tail_detail: self.tail_detail,
            clusters: KCenters::new(),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            nanflow: Box::new(self.nanflow.zero()),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        if self.num != other.num || self.tail_detail != other.tail_detail {
            return Err(Error::StructureMismatch(
                "AdaptivelyBin num/tailDetail do not match".to_string(),
            ));
        }
        let min = self.min.min(other.min);
        let max = self.max.max(other.max);
        let clusters = if min.is_finite() && max.is_finite() {
            self.clusters.merge(&other.clusters, self.num, self.tail_detail, min, max)?
        } else {
            KCenters::new()
        };
        Ok(AdaptivelyBinned {
            name,
            num: self.num,
            tail_detail: self.tail_detail,
            clusters,
            min,
            max,
            nanflow: Box::new(self.nanflow.merge(&other.nanflow)?),
        })
    }

    pub fn children(&self) -> Vec<&Past> {
        let mut c: Vec<&Past> = self.clusters.centers.iter().map(|(_, v)| v).collect();
        c.push(&self.nanflow);
        c
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), serde_json::json!(self.entries()));
        map.insert("num".to_string(), serde_json::json!(self.num));
        map.insert("tailDetail".to_string(), serde_json::json!(self.tail_detail));
        map.insert("min".to_string(), serde_json::json!(self.min));
        map.insert("max".to_string(), serde_json::json!(self.max));
        let bins_type = self.clusters.centers.first().map(|(_, v)| v.factory_tag()).unwrap_or("");
        map.insert("bins:type".to_string(), Value::String(bins_type.to_string()));
        let bins: Vec<Value> = self
            .clusters
            .centers
            .iter()
            .map(|(c, v)| serde_json::json!({ "center": c, "value": v.to_json_fragment(false) }))
            .collect();
        map.insert("bins".to_string(), Value::Array(bins));
        map.insert(
            "nanflow:type".to_string(),
            Value::String(self.nanflow.factory_tag().to_string()),
        );
        map.insert("nanflow".to_string(), self.nanflow.to_json_fragment(false));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let num = field_f64(m, "num")? as usize;
        let tail_detail = field_f64(m, "tailDetail")?;
        let min = field_f64(m, "min")?;
        let max = field_f64(m, "max")?;
        let bins_tag = field(m, "bins:type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"bins:type\" is not a string".to_string()))?;
        let bins_json = field(m, "bins")?
            .as_array()
            .ok_or_else(|| Error::JsonFormat("field \"bins\" is not an array".to_string()))?;
        let mut clusters = KCenters::new();
        for b in bins_json {
            let bo = obj(b)?;
            let center = field_f64(bo, "center")?;
            let value = Past::from_json_fragment(bins_tag, field(bo, "value")?, None)?;
            clusters.insert(center, value);
        }
        let nanflow_tag = field(m, "nanflow:type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"nanflow:type\" is not a string".to_string()))?;
        let nanflow = Past::from_json_fragment(nanflow_tag, field(m, "nanflow")?, None)?;
        let name = opt_name(m, name_from_parent)?;
        Self::ed(name, num, tail_detail, clusters, min, max, nanflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::count::Counting;

    #[test]
    fn scenario_six_coalesces_middle_values() {
        let mut b: AdaptivelyBinning<f64> = AdaptivelyBinning::create(
            3,
            0.2,
            Quantity::new(|x: &f64| *x),
            Present::Count(Counting::create()),
        )
        .unwrap();
        for v in [0.0, 10.0, 10.1, 10.2, 20.0] {
            b.fill(&v, 1.0).unwrap();
        }
        let past = b.to_past();
        assert_eq!(past.clusters().len(), 3);
        assert_eq!(past.entries(), 5.0);
        let centers: Vec<f64> = past.clusters().centers.iter().map(|(c, _)| *c).collect();
        assert!((centers[0] - 0.0).abs() < 1e-9);
        assert!((centers[2] - 20.0).abs() < 1e-9);
        assert!((centers[1] - 10.1).abs() < 0.2);
    }
}
