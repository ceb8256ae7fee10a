//! `Branch`: a fixed-arity tuple of sub-aggregators, every one of which sees
//! every datum. Unlike `Stack`/`Partition`/`Label`, the subs need not share a
//! type, so each child carries its own `type`/`data` pair in the JSON.

use serde_json::Value;

use crate::aggregator::{Past, Present};
use crate::error::Error;
use crate::json::{field, field_f64, obj, with_name};

pub const TAG: &str = "Branch";

pub struct Branching<D> {
    entries: f64,
    subs: Vec<Present<D>>,
}

impl<D> Branching<D> {
    pub fn create(subs: Vec<Present<D>>) -> Result<Self, Error> {
        if subs.is_empty() {
            return Err(Error::Validation("Branch needs at least one sub-aggregator".to_string()));
        }
        Ok(Branching { entries: 0.0, subs })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn subs(&self) -> &[Present<D>] {
        &self.subs
    }

    pub fn fill(&mut self, datum: &D, weight: f64) -> Result<(), Error>
    where
        D: 'static,
    {
        if weight <= 0.0 {
            return Ok(());
        }
        for sub in &mut self.subs {
            sub.fill(datum, weight)?;
        }
        self.entries += weight;
        Ok(())
    }

    pub fn zero(&self) -> Self
    where
        D: 'static,
    {
        Branching { entries: 0.0, subs: self.subs.iter().map(|s| s.zero()).collect() }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error>
    where
        D: 'static,
    {
        if self.subs.len() != other.subs.len() {
            return Err(Error::StructureMismatch("Branch arity does not match".to_string()));
        }
        let subs = self
            .subs
            .iter()
            .zip(other.subs.iter())
            .map(|(a, b)| a.merge(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Branching { entries: self.entries + other.entries, subs })
    }

    pub fn to_past(&self) -> Branched {
        Branched { entries: self.entries, subs: self.subs.iter().map(|s| s.to_past()).collect() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Branched {
    entries: f64,
    subs: Vec<Past>,
}

impl Branched {
    pub fn ed(entries: f64, subs: Vec<Past>) -> Result<Self, Error> {
        if subs.is_empty() {
            return Err(Error::Validation("Branch needs at least one sub-aggregator".to_string()));
        }
        if entries < 0.0 {
            return Err(Error::Validation(format!("entries must be >= 0, got {entries}")));
        }
        Ok(Branched { entries, subs })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn subs(&self) -> &[Past] {
        &self.subs
    }

    pub fn zero(&self) -> Self {
        Branched { entries: 0.0, subs: self.subs.iter().map(|s| s.zero()).collect() }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        if self.subs.len() != other.subs.len() {
            return Err(Error::StructureMismatch("Branch arity does not match".to_string()));
        }
        let subs = self
            .subs
            .iter()
            .zip(other.subs.iter())
            .map(|(a, b)| a.merge(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Branched { entries: self.entries + other.entries, subs })
    }

    pub fn children(&self) -> Vec<&Past> {
        self.subs.iter().collect()
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), serde_json::json!(self.entries));
        let subs: Vec<Value> = self
            .subs
            .iter()
            .map(|s| serde_json::json!({ "type": s.factory_tag(), "data": s.to_json_fragment(false) }))
            .collect();
        map.insert("subs".to_string(), Value::Array(subs));
        with_name(map, &None, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, _name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let entries = field_f64(m, "entries")?;
        let subs_json = field(m, "subs")?
            .as_array()
            .ok_or_else(|| Error::JsonFormat("field \"subs\" is not an array".to_string()))?;
        let mut subs = Vec::with_capacity(subs_json.len());
        for s in subs_json {
            let so = obj(s)?;
            let tag = field(so, "type")?
                .as_str()
                .ok_or_else(|| Error::JsonFormat("field \"type\" is not a string".to_string()))?;
            subs.push(Past::from_json_fragment(tag, field(so, "data")?, None)?);
        }
        Self::ed(entries, subs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::count::Counting;
    use crate::primitives::sum::Summing;
    use crate::quantity::Quantity;

    #[test]
    fn every_sub_sees_every_datum() {
        let mut b: Branching<f64> = Branching::create(vec![
            Present::Count(Counting::create()),
            Present::Sum(Summing::create(Quantity::new(|x: &f64| *x))),
        ])
        .unwrap();
        for v in [1.0, 2.0, 3.0] {
            b.fill(&v, 1.0).unwrap();
        }
        let past = b.to_past();
        match (&past.subs()[0], &past.subs()[1]) {
            (Past::Count(c), Past::Sum(s)) => {
                assert_eq!(c.entries(), 3.0);
                assert_eq!(s.entries(), 3.0);
            }
            _ => panic!("unexpected variants"),
        }
    }

    #[test]
    fn mismatched_arity_rejected_on_merge() {
        let a: Branching<f64> = Branching::create(vec![Present::Count(Counting::create())]).unwrap();
        let b: Branching<f64> = Branching::create(vec![
            Present::Count(Counting::create()),
            Present::Count(Counting::create()),
        ])
        .unwrap();
        assert!(a.merge(&b).is_err());
    }
}
