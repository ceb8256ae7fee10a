//! `CentrallyBin`: a fixed sorted list of centers; a datum is routed to its
//! nearest center, ties broken toward the lower one. Unlike `Bin`, the
//! extremes are unbounded — there is no underflow/overflow, only `nanflow`.

use serde_json::Value;

use crate::aggregator::{Past, Present};
use crate::error::{merge_names, Error};
use crate::json::{field, field_f64, obj, opt_name, with_name};
use crate::quantity::Quantity;

pub const TAG: &str = "CentrallyBin";

pub struct CentrallyBinning<D> {
    quantity: Quantity<D>,
    centers: Vec<f64>,
    values: Vec<Present<D>>,
    nanflow: Box<Present<D>>,
}

impl<D> CentrallyBinning<D> {
    pub fn create(mut centers: Vec<f64>, quantity: Quantity<D>, template: Present<D>) -> Result<Self, Error>
    where
        D: 'static,
    {
        if centers.is_empty() {
            return Err(Error::Validation("CentrallyBin needs at least one center".to_string()));
        }
        centers.sort_by(|a, b| a.partial_cmp(b).expect("centers must not be NaN"));
        let values = (0..centers.len()).map(|_| template.zero()).collect();
        Ok(CentrallyBinning { quantity, centers, values, nanflow: Box::new(template.zero()) })
    }

    pub fn entries(&self) -> f64 {
        self.values.iter().map(|v| v.entries()).sum::<f64>() + self.nanflow.entries()
    }

    fn nearest_index(&self, q: f64) -> usize {
        let idx = self.centers.partition_point(|c| *c < q);
        if idx == 0 {
            return 0;
        }
        if idx == self.centers.len() {
            return self.centers.len() - 1;
        }
        let lower = self.centers[idx - 1];
        let upper = self.centers[idx];
        if (q - lower) <= (upper - q) {
            idx - 1
        } else {
            idx
        }
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
        let idx = self.nearest_index(q);
        self.values[idx].fill(datum, weight)
    }

    pub fn zero(&self) -> Self
    where
        D: 'static,
    {
        CentrallyBinning {
            quantity: self.quantity.clone(),
            centers: self.centers.clone(),
            values: self.values.iter().map(|v| v.zero()).collect(),
            nanflow: Box::new(self.nanflow.zero()),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error>
    where
        D: 'static,
    {
        merge_names(&self.quantity.name().map(str::to_string), &other.quantity.name().map(str::to_string))?;
        if self.centers != other.centers {
            return Err(Error::StructureMismatch("CentrallyBin centers do not match".to_string()));
        }
        let values = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a.merge(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CentrallyBinning {
            quantity: self.quantity.clone(),
            centers: self.centers.clone(),
            values,
            nanflow: Box::new(self.nanflow.merge(&other.nanflow)?),
        })
    }

    pub fn to_past(&self) -> CentrallyBinned {
        CentrallyBinned {
            name: self.quantity.name().map(str::to_string),
            centers: self.centers.clone(),
            values: self.values.iter().map(|v| v.to_past()).collect(),
            nanflow: Box::new(self.nanflow.to_past()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CentrallyBinned {
    name: Option<String>,
    centers: Vec<f64>,
    values: Vec<Past>,
    nanflow: Box<Past>,
}

impl CentrallyBinned {
    pub fn ed(name: Option<String>, centers: Vec<f64>, values: Vec<Past>, nanflow: Past) -> Result<Self, Error> {
        if centers.len() != values.len() {
            return Err(Error::Validation("CentrallyBin centers and values length mismatch".to_string()));
        }
        if centers.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(Error::Validation("CentrallyBin centers must be sorted and distinct".to_string()));
        }
        Ok(CentrallyBinned { name, centers, values, nanflow: Box::new(nanflow) })
    }

    pub fn centers(&self) -> &[f64] {
        &self.centers
    }

    pub fn values(&self) -> &[Past] {
        &self.values
    }

    pub fn nanflow(&self) -> &Past {
        &self.nanflow
    }

    pub fn entries(&self) -> f64 {
        self.values.iter().map(|v| v.entries()).sum::<f64>() + self.nanflow.entries()
    }

    pub fn zero(&self) -> Self {
        CentrallyBinned {
            name: self.name.clone(),
            centers: self.centers.clone(),
            values: self.values.iter().map(|v| v.zero()).collect(),
            nanflow: Box::new(self.nanflow.zero()),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        if self.centers != other.centers {
            return Err(Error::StructureMismatch("CentrallyBin centers do not match".to_string()));
        }
        let values = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a.merge(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CentrallyBinned {
            name,
            centers: self.centers.clone(),
            values,
            nanflow: Box::new(self.nanflow.merge(&other.nanflow)?),
        })
    }

    pub fn children(&self) -> Vec<&Past> {
        let mut c: Vec<&Past> = self.values.iter().collect();
        c.push(&self.nanflow);
        c
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), serde_json::json!(self.entries()));
        map.insert("centers".to_string(), serde_json::json!(self.centers));
        let values_type = self.values.first().map(|p| p.factory_tag()).unwrap_or("");
        map.insert("values:type".to_string(), Value::String(values_type.to_string()));
        map.insert(
            "values".to_string(),
            Value::Array(self.values.iter().map(|v| v.to_json_fragment(false)).collect()),
        );
        map.insert(
            "nanflow:type".to_string(),
            Value::String(self.nanflow.factory_tag().to_string()),
        );
        map.insert("nanflow".to_string(), self.nanflow.to_json_fragment(false));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let centers_json = field(m, "centers")?
            .as_array()
            .ok_or_else(|| Error::JsonFormat("field \"centers\" is not an array".to_string()))?;
        let mut centers = Vec::with_capacity(centers_json.len());
        for c in centers_json {
            centers.push(c.as_f64().ok_or_else(|| Error::JsonFormat("center is not a number".to_string()))?);
        }
        let values_tag = field(m, "values:type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"values:type\" is not a string".to_string()))?;
        let values_json = field(m, "values")?
            .as_array()
            .ok_or_else(|| Error::JsonFormat("field \"values\" is not an array".to_string()))?;
        let mut values = Vec::with_capacity(values_json.len());
        for v in values_json {
            values.push(Past::from_json_fragment(values_tag, v, None)?);
        }
        let nanflow_tag = field(m, "nanflow:type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"nanflow:type\" is not a string".to_string()))?;
        let nanflow = Past::from_json_fragment(nanflow_tag, field(m, "nanflow")?, None)?;
        let name = opt_name(m, name_from_parent)?;
        Self::ed(name, centers, values, nanflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::count::Counting;

    #[test]
    fn routes_to_nearest_center_tie_to_lower() {
        let mut b: CentrallyBinning<f64> = CentrallyBinning::create(
            vec![0.0, 10.0],
            Quantity::new(|x: &f64| *x),
            Present::Count(Counting::create()),
        )
        .unwrap();
        for v in [-100.0, 4.9, 5.0, 5.1, 100.0] {
            b.fill(&v, 1.0).unwrap();
        }
        let past = b.to_past();
        let counts: Vec<f64> = past.values().iter().map(|p| p.entries()).collect();
        assert_eq!(counts, vec![3.0, 2.0]);
    }
}
