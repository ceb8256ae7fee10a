//! `Limit`: wraps a sub-aggregator, dropping it once `entries` strictly
//! exceeds `capacity` (the strictly-greater reading of the capacity
//! boundary; entries exactly at capacity still keep the sub).

use serde_json::Value;

use crate::aggregator::{Past, Present};
use crate::error::Error;
use crate::json::{field, field_f64, obj, opt_name, with_name};

pub const TAG: &str = "Limit";

pub struct Limiting<D> {
    capacity: f64,
    entries: f64,
    sub: Box<Present<D>>,
    dropped: bool,
}

impl<D> Limiting<D> {
    pub fn create(capacity: f64, sub: Present<D>) -> Result<Self, Error> {
        if capacity < 0.0 {
            return Err(Error::Validation(format!("capacity must be >= 0, got {capacity}")));
        }
        Ok(Limiting { capacity, entries: 0.0, sub: Box::new(sub), dropped: false })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn fill(&mut self, datum: &D, weight: f64) -> Result<(), Error>
    where
        D: 'static,
    {
        if weight <= 0.0 {
            return Ok(());
        }
        if !self.dropped {
            self.sub.fill(datum, weight)?;
        }
        self.entries += weight;
        if self.entries > self.capacity {
            self.dropped = true;
        }
        Ok(())
    }

    pub fn zero(&self) -> Self
    where
        D: 'static,
    {
        Limiting { capacity: self.capacity, entries: 0.0, sub: Box::new(self.sub.zero()), dropped: false }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error>
    where
        D: 'static,
    {
        if self.capacity != other.capacity {
            return Err(Error::StructureMismatch(format!(
                "cannot merge Limit with capacity {} and {}",
                self.capacity, other.capacity
            )));
        }
        let entries = self.entries + other.entries;
        let dropped = self.dropped || other.dropped || entries > self.capacity;
        Ok(Limiting {
            capacity: self.capacity,
            entries,
            sub: Box::new(self.sub.merge(&other.sub)?),
            dropped,
        })
    }

    pub fn to_past(&self) -> Limited {
        Limited {
            entries: self.entries,
            capacity: self.capacity,
            sub: if self.dropped { None } else { Some(Box::new(self.sub.to_past())) },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Limited {
    entries: f64,
    capacity: f64,
    sub: Option<Box<Past>>,
}

impl Limited {
    pub fn ed(entries: f64, capacity: f64, sub: Option<Past>) -> Result<Self, Error> {
        if entries < 0.0 {
            return Err(Error::Validation(format!("entries must be >= 0, got {entries}")));
        }
        if capacity < 0.0 {
            return Err(Error::Validation(format!("capacity must be >= 0, got {capacity}")));
        }
        Ok(Limited { entries, capacity, sub: sub.map(Box::new) })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn is_dropped(&self) -> bool {
        self.sub.is_none()
    }

    pub fn sub(&self) -> Option<&Past> {
        self.sub.as_deref()
    }

    pub fn zero(&self) -> Self {
        Limited { entries: 0.0, capacity: self.capacity, sub: self.sub.as_ref().map(|s| Box::new(s.zero())) }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        if self.capacity != other.capacity {
            return Err(Error::StructureMismatch(format!(
                "cannot merge Limit with capacity {} and {}",
                self.capacity, other.capacity
            )));
        }
        let entries = self.entries + other.entries;
        let dropped = self.sub.is_none() || other.sub.is_none() || entries > self.capacity;
        let sub = if dropped {
            None
        } else {
            Some(Box::new(self.sub.as_ref().unwrap().merge(other.sub.as_ref().unwrap())?))
        };
        Ok(Limited { entries, capacity: self.capacity, sub })
    }

    pub fn children(&self) -> Vec<&Past> {
        self.sub.as_deref().into_iter().collect()
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), serde_json::json!(self.entries));
        map.insert("capacity".to_string(), serde_json::json!(self.capacity));
        if let Some(sub) = &self.sub {
            map.insert("type".to_string(), Value::String(sub.factory_tag().to_string()));
            map.insert("data".to_string(), sub.to_json_fragment(false));
        }
        with_name(map, &None, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let entries = field_f64(m, "entries")?;
        let capacity = field_f64(m, "capacity")?;
        let sub = match m.get("type") {
            Some(Value::String(tag)) => Some(Past::from_json_fragment(tag, field(m, "data")?, None)?),
            _ => None,
        };
        let _ = opt_name(m, name_from_parent)?;
        Self::ed(entries, capacity, sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::count::Counting;

    #[test]
    fn drops_sub_once_over_capacity() {
        let mut l: Limiting<i64> = Limiting::create(2.0, Present::Count(Counting::create())).unwrap();
        l.fill(&1, 1.0).unwrap();
        l.fill(&1, 1.0).unwrap();
        assert!(!l.to_past().is_dropped());
        l.fill(&1, 1.0).unwrap();
        assert!(l.to_past().is_dropped());
    }

    #[test]
    fn exactly_at_capacity_keeps_sub() {
        let mut l: Limiting<i64> = Limiting::create(2.0, Present::Count(Counting::create())).unwrap();
        l.fill(&1, 2.0).unwrap();
        assert!(!l.to_past().is_dropped());
    }
}
