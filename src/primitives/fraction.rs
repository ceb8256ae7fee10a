//! `Fraction`: numerator and denominator are structurally identical
//! sub-aggregators; the denominator sees every datum, the numerator sees it
//! reweighted by a selection function.

use serde_json::Value;

use crate::aggregator::{Past, Present};
use crate::error::{merge_names, Error};
use crate::json::{field, obj, opt_name, with_name};
use crate::quantity::Quantity;

pub const TAG: &str = "Fraction";

pub struct Fractioning<D> {
    selection: Quantity<D>,
    denominator: Box<Present<D>>,
    numerator: Box<Present<D>>,
}

impl<D> Fractioning<D> {
    pub fn create(selection: Quantity<D>, denominator: Present<D>, numerator: Present<D>) -> Self {
        Fractioning {
            selection,
            denominator: Box::new(denominator),
            numerator: Box::new(numerator),
        }
    }

    pub fn entries(&self) -> f64 {
        self.denominator.entries()
    }

    pub fn fill(&mut self, datum: &D, weight: f64) -> Result<(), Error>
    where
        D: 'static,
    {
        if weight <= 0.0 {
            return Ok(());
        }
        self.denominator.fill(datum, weight)?;
        let factor = self.selection.call(datum);
        let num_weight = weight * factor;
        if num_weight > 0.0 {
            self.numerator.fill(datum, num_weight)?;
        }
        Ok(())
    }

    pub fn zero(&self) -> Self
    where
        D: 'static,
    {
        Fractioning {
            selection: self.selection.clone(),
            denominator: Box::new(self.denominator.zero()),
            numerator: Box::new(self.numerator.zero()),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error>
    where
        D: 'static,
    {
        merge_names(
            &self.selection.name().map(str::to_string),
            &other.selection.name().map(str::to_string),
        )?;
        Ok(Fractioning {
            selection: self.selection.clone(),
            denominator: Box::new(self.denominator.merge(&other.denominator)?),
            numerator: Box::new(self.numerator.merge(&other.numerator)?),
        })
    }

    pub fn to_past(&self) -> Fractioned {
        Fractioned {
            name: self.selection.name().map(str::to_string),
            denominator: Box::new(self.denominator.to_past()),
            numerator: Box::new(self.numerator.to_past()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Fractioned {
    name: Option<String>,
    denominator: Box<Past>,
    numerator: Box<Past>,
}

impl Fractioned {
    pub fn ed(name: Option<String>, denominator: Past, numerator: Past) -> Result<Self, Error> {
        Ok(Fractioned { name, denominator: Box::new(denominator), numerator: Box::new(numerator) })
    }

    pub fn entries(&self) -> f64 {
        self.denominator.entries()
    }

    pub fn denominator(&self) -> &Past {
        &self.denominator
    }

    pub fn numerator(&self) -> &Past {
        &self.numerator
    }

    pub fn zero(&self) -> Self {
        Fractioned {
            name: self.name.clone(),
            denominator: Box::new(self.denominator.zero()),
            numerator: Box::new(self.numerator.zero()),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        let name = merge_names(&self.name, &other.name)?;
        Ok(Fractioned {
            name,
            denominator: Box::new(self.denominator.merge(&other.denominator)?),
            numerator: Box::new(self.numerator.merge(&other.numerator)?),
        })
    }

    pub fn children(&self) -> Vec<&Past> {
        vec![&self.denominator, &self.numerator]
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("entries".to_string(), serde_json::json!(self.entries()));
        map.insert(
            "denominator:type".to_string(),
            Value::String(self.denominator.factory_tag().to_string()),
        );
        map.insert("denominator".to_string(), self.denominator.to_json_fragment(false));
        map.insert(
            "numerator:type".to_string(),
            Value::String(self.numerator.factory_tag().to_string()),
        );
        map.insert("numerator".to_string(), self.numerator.to_json_fragment(false));
        with_name(map, &self.name, suppress_name)
    }

    pub fn from_json_fragment(data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        let m = obj(data)?;
        let denom_tag = field(m, "denominator:type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"denominator:type\" is not a string".to_string()))?;
        let denominator = Past::from_json_fragment(denom_tag, field(m, "denominator")?, None)?;
        let num_tag = field(m, "numerator:type")?
            .as_str()
            .ok_or_else(|| Error::JsonFormat("field \"numerator:type\" is not a string".to_string()))?;
        let numerator = Past::from_json_fragment(num_tag, field(m, "numerator")?, None)?;
        let name = opt_name(m, name_from_parent)?;
        Self::ed(name, denominator, numerator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::count::Counting;

    #[test]
    fn numerator_sees_reweighted_subset() {
        let mut f: Fractioning<i64> = Fractioning::create(
            Quantity::new(|x: &i64| if *x > 0 { 1.0 } else { 0.0 }),
            Present::Count(Counting::create()),
            Present::Count(Counting::create()),
        );
        for v in [1, -1, 2, -2] {
            f.fill(&v, 1.0).unwrap();
        }
        let past = f.to_past();
        assert_eq!(past.denominator().entries(), 4.0);
        assert_eq!(past.numerator().entries(), 2.0);
    }
}
