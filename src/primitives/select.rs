//! `Select` (aka `Cut`): filters/reweights input before handing it to a
//! wrapped sub-aggregator. `Histogram` is defined elsewhere in this crate's
//! documentation as `Select ∘ Bin(.., Count)`, precisely so this composes.

use serde_json::Value;

use crate::aggregator::{Past, Present};
use crate::error::{merge_names, Error};
use crate::json::{field, field_f64, obj, opt_name, with_name};
use crate::quantity::Quantity;

pub const TAG: &str = "Select";

pub struct Selecting<D> {
    selection: Quantity<D>,
    entries: f64,
    sub: Box<Present<D>>,
}

impl<D> Selecting<D> {
    pub fn create(selection: Quantity<D>, sub: Present<D>) -> Self {
        Selecting { selection, entries: 0.0, sub: Box::new(sub) }
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
        let factor = self.selection.call(datum);
        let sub_weight = weight * factor;
        if sub_weight > 0.0 {
            self.sub.fill(datum, sub_weight)?;
        }
        self.entries += weight;
        Ok(())
    }

    pub fn zero(&self) -> Self
    where
        D: 'static,
    {
        Selecting { selection: self.selection.clone(), entries: 0.0, sub: Box::new(self.sub.zero()) }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error>
    where
        D: 'static,
    {
        merge_names(
            &self.selection.name().map(str::to_string),
            &other.selection.name().map(str::to_string),
        )?;
        Ok(Selecting {
            selection: self.selection.clone(),
            entries: self.entries + other.entries,
            sub: Box::new(self.sub.merge(&other.sub)?),
        })
    }

    pub fn to_past(&self) -> Selected {
        Selected {
            name: self.selection.name().map(str::to_string),
            entries: self.entries,
            sub: Box::new(self.sub.to_past()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Selected {
    name: Option<String>,
    entries: f64,
    sub: Box<Past>,
}

impl Selected {
    pub fn ed(name: Option<String>, entries: f64, sub: Past) -> Result<Self, Error> {
        if entries < 0.0 {
            return Err(Error::Validation(format!("entries must be >= 0, got {entries}")));
        }
        Ok(Selected { name, entries, sub: Box::new(sub) })
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn sub(&self) -> &Past {
        &self.sub
    }

    pub fn zero(&self) -> Self {
        Selected { name: self.name.clone(), entries: 0.0, sub: Box::new(self.sub.zero()) }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        Ok(Selected {
            name,
            entries: self.entries + other.entries,
            sub: Box::new(self.sub.merge(&other.sub)?),
        })
    }

    pub fn children(&self) -> Vec<&Past> {
        vec![&self.sub]
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), serde_json::json!(self.entries));
        map.insert("type".to_string(), Value::String(self.sub.factory_tag().to_string()));
        map.insert("data".to_string(), self.sub.to_json_fragment(false));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let entries = field_f64(m, "entries")?;
        let tag = field(m, "type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"type\" is not a string".to_string()))?;
        let sub = Past::from_json_fragment(tag, field(m, "data")?, None)?;
        let name = opt_name(m, name_from_parent)?;
        Self::ed(name, entries, sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::count::Counting;

    #[test]
    fn positive_selection_passes_through_reweighted() {
        let mut s: Selecting<i64> = Selecting::create(
            Quantity::new(|x: &i64| if *x > 0 { 1.0 } else { 0.0 }),
            Present::Count(Counting::create()),
        );
        s.fill(&5, 2.0).unwrap();
        s.fill(&-5, 2.0).unwrap();
        assert_eq!(s.entries(), 4.0);
        match s.to_past().sub() {
            Past::Count(c) => assert_eq!(c.entries(), 2.0),
            _ => panic!("expected Count"),
        }
    }
}
