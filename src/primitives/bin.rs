//! `Bin`: a dense, regularly-spaced histogram over `[low, high)`, with
//! dedicated `underflow`/`overflow`/`nanflow` sub-aggregators.
//!
//! `Bin` itself applies no selection — compose with `Select` for that
//! (`Histogram` is exactly `Select` wrapping `Bin(.., Count)`).

use serde_json::Value;

use crate::aggregator::{Past, Present};
use crate::error::{merge_names, Error};
use crate::json::{field, field_f64, obj, opt_name, with_name};
use crate::quantity::Quantity;

pub const TAG: &str = "Bin";

pub struct Binning<D> {
    quantity: Quantity<D>,
    num: usize,
    low: f64,
    high: f64,
    values: Vec<Present<D>>,
    underflow: Box<Present<D>>,
    overflow: Box<Present<D>>,
    nanflow: Box<Present<D>>,
}

impl<D> Binning<D> {
    pub fn create(
        num: usize,
        low: f64,
        high: f64,
        quantity: Quantity<D>,
        template: Present<D>,
    ) -> Result<Self, Error>
    where
        D: 'static,
    {
        if num == 0 {
            return Err(Error::Validation("Bin num must be >= 1".to_string()));
        }
        if !(low < high) {
            return Err(Error::Validation(format!("Bin requires low < high, got {low} and {high}")));
        }
        let values = (0..num).map(|_| template.zero()).collect();
        Ok(Binning {
            quantity,
            num,
            low,
            high,
            values,
            underflow: Box::new(template.zero()),
            overflow: Box::new(template.zero()),
            nanflow: Box::new(template.zero()),
        })
    }

    pub fn entries(&self) -> f64 {
        self.values.iter().map(|v| v.entries()).sum::<f64>()
            + self.underflow.entries()
            + self.overflow.entries()
            + self.nanflow.entries()
    }

    fn index_of(&self, q: f64) -> Option<usize> {
        let raw = (self.num as f64) * (q - self.low) / (self.high - self.low);
        let idx = raw.floor() as isize;
        if idx < 0 {
            return None;
        }
        let idx = idx as usize;
        if idx >= self.num {
            if idx == self.num && q < self.high {
                Some(self.num - 1)
            } else {
                None
            }
        } else {
            Some(idx)
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
        if q < self.low {
            return self.underflow.fill(datum, weight);
        }
        if q >= self.high {
            return self.overflow.fill(datum, weight);
        }
        match self.index_of(q) {
            Some(idx) => self.values[idx].fill(datum, weight),
            None => self.overflow.fill(datum, weight),
        }
    }

    pub fn zero(&self) -> Self
    where
        D: 'static,
    {
        Binning {
            quantity: self.quantity.clone(),
            num: self.num,
            low: self.low,
            high: self.high,
            values: self.values.iter().map(|v| v.zero()).collect(),
            underflow: Box::new(self.underflow.zero()),
            overflow: Box::new(self.overflow.zero()),
            nanflow: Box::new(self.nanflow.zero()),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error>
    where
        D: 'static,
    {
        merge_names(&self.quantity.name().map(str::to_string), &other.quantity.name().map(str::to_string))?;
        if self.num != other.num || self.low != other.low || self.high != other.high {
            return Err(Error::StructureMismatch(format!(
                "cannot merge Bin({}, {}, {}) with Bin({}, {}, {})",
                self.num, self.low, self.high, other.num, other.low, other.high
            )));
        }
        let values = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a.merge(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Binning {
            quantity: self.quantity.clone(),
            num: self.num,
            low: self.low,
            high: self.high,
            values,
            underflow: Box::new(self.underflow.merge(&other.underflow)?),
            overflow: Box::new(self.overflow.merge(&other.overflow)?),
            nanflow: Box::new(self.nanflow.merge(&other.nanflow)?),
        })
    }

    pub fn to_past(&self) -> Binned {
        Binned {
            name: self.quantity.name().map(str::to_string),
            low: self.low,
            high: self.high,
            values: self.values.iter().map(|v| v.to_past()).collect(),
            underflow: Box::new(self.underflow.to_past()),
            overflow: Box::new(self.overflow.to_past()),
            nanflow: Box::new(self.nanflow.to_past()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Binned {
    name: Option<String>,
    low: f64,
    high: f64,
    values: Vec<Past>,
    underflow: Box<Past>,
    overflow: Box<Past>,
    nanflow: Box<Past>,
}

impl Binned {
    pub fn ed(
        name: Option<String>,
        low: f64,
        high: f64,
        values: Vec<Past>,
        underflow: Past,
        overflow: Past,
        nanflow: Past,
    ) -> Result<Self, Error> {
        if values.is_empty() {
            return Err(Error::Validation("Bin num must be >= 1".to_string()));
        }
        if !(low < high) {
            return Err(Error::Validation(format!("Bin requires low < high, got {low} and {high}")));
        }
        Ok(Binned {
            name,
            low,
            high,
            values,
            underflow: Box::new(underflow),
            overflow: Box::new(overflow),
            nanflow: Box::new(nanflow),
        })
    }

    pub fn num(&self) -> usize {
        self.values.len()
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn values(&self) -> &[Past] {
        &self.values
    }

    pub fn underflow(&self) -> &Past {
        &self.underflow
    }

    pub fn overflow(&self) -> &Past {
        &self.overflow
    }

    pub fn nanflow(&self) -> &Past {
        &self.nanflow
    }

    pub fn entries(&self) -> f64 {
        self.values.iter().map(|v| v.entries()).sum::<f64>()
            + self.underflow.entries()
            + self.overflow.entries()
            + self.nanflow.entries()
    }

    pub fn zero(&self) -> Self {
        Binned {
            name: self.name.clone(),
            low: self.low,
            high: self.high,
            values: self.values.iter().map(|v| v.zero()).collect(),
            underflow: Box::new(self.underflow.zero()),
            overflow: Box::new(self.overflow.zero()),
            nanflow: Box::new(self.nanflow.zero()),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        if self.num() != other.num() || self.low != other.low || self.high != other.high {
            return Err(Error::StructureMismatch("Bin shapes do not match".to_string()));
        }
        let values = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a.merge(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Binned {
            name,
            low: self.low,
            high: self.high,
            values,
            underflow: Box::new(self.underflow.merge(&other.underflow)?),
            overflow: Box::new(self.overflow.merge(&other.overflow)?),
            nanflow: Box::new(self.nanflow.merge(&other.nanflow)?),
        })
    }

    pub fn children(&self) -> Vec<&Past> {
        let mut c: Vec<&Past> = self.values.iter().collect();
        c.push(&self.underflow);
        c.push(&self.overflow);
        c.push(&self.nanflow);
        c
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("low".to_string(), serde_json::json!(self.low));
        map.insert("high".to_string(), serde_json::json!(self.high));
        map.insert("entries".to_string(), serde_json::json!(self.entries()));
        let values_type = self.values.first().map(|p| p.factory_tag()).unwrap_or("");
        map.insert("values:type".to_string(), Value::String(values_type.to_string()));
        map.insert(
            "values".to_string(),
            Value::Array(self.values.iter().map(|v| v.to_json_fragment(false)).collect()),
        );
        map.insert(
            "underflow:type".to_string(),
            Value::String(self.underflow.factory_tag().to_string()),
        );
        map.insert("underflow".to_string(), self.underflow.to_json_fragment(false));
        map.insert(
            "overflow:type".to_string(),
            Value::String(self.overflow.factory_tag().to_string()),
        );
        map.insert("overflow".to_string(), self.overflow.to_json_fragment(false));
        map.insert(
            "nanflow:type".to_string(),
            Value::String(self.nanflow.factory_tag().to_string()),
        );
        map.insert("nanflow".to_string(), self.nanflow.to_json_fragment(false));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let low = field_f64(m, "low")?;
        let high = field_f64(m, "high")?;
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
        let underflow_tag = field(m, "underflow:type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"underflow:type\" is not a string".to_string()))?;
        let underflow = Past::from_json_fragment(underflow_tag, field(m, "underflow")?, None)?;
        let overflow_tag = field(m, "overflow:type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"overflow:type\" is not a string".to_string()))?;
        let overflow = Past::from_json_fragment(overflow_tag, field(m, "overflow")?, None)?;
        let nanflow_tag = field(m, "nanflow:type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"nanflow:type\" is not a string".to_string()))?;
        let nanflow = Past::from_json_fragment(nanflow_tag, field(m, "nanflow")?, None)?;
        let name = opt_name(m, name_from_parent)?;
        Self::ed(name, low, high, values, underflow, overflow, nanflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::count::Counting;

    #[test]
    fn routes_per_scenario_two() {
        let mut b: Binning<f64> =
            Binning::create(5, 0.0, 5.0, Quantity::new(|x: &f64| *x), Present::Count(Counting::create())).unwrap();
        for v in [0.5, 0.5, 2.5, 4.999, 5.0, -1.0, f64::NAN] {
            b.fill(&v, 1.0).unwrap();
        }
        let past = b.to_past();
        let values: Vec<f64> = past.values().iter().map(|p| p.entries()).collect();
        assert_eq!(values, vec![2.0, 0.0, 1.0, 0.0, 1.0]);
        assert_eq!(past.underflow().entries(), 1.0);
        assert_eq!(past.overflow().entries(), 1.0);
        assert_eq!(past.nanflow().entries(), 1.0);
        assert_eq!(past.entries(), 7.0);
    }

    #[test]
    fn rejects_invalid_bounds() {
        let r: Result<Binning<f64>, Error> =
            Binning::create(5, 5.0, 0.0, Quantity::new(|x: &f64| *x), Present::Count(Counting::create()));
        assert!(r.is_err());
    }
}
