//! Quantity extractors: user-supplied `DATUM -> R` functions, optionally named
//! and memoized, shared by reference between a present-tense aggregator and
//! its zero/merge results.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;

/// A named, optionally-cached extractor from a datum to a value of type `R`.
///
/// `R` is `f64` for numeric quantities and selections, `String` for
/// categorical quantities (`Categorize`), and [`BagKey`] for `Bag`.
pub struct Extractor<D, R> {
    name: Option<String>,
    f: Arc<dyn Fn(&D) -> R + Send + Sync>,
    cache: Option<RefCell<Option<(usize, R)>>>,
}

impl<D, R> Extractor<D, R> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&D) -> R + Send + Sync + 'static,
    {
        Extractor {
            name: None,
            f: Arc::new(f),
            cache: None,
        }
    }

    /// Opt this extractor into last-input memoization (identity-based: the
    /// cache hits only when called again on the exact same datum address).
    pub fn cached(mut self) -> Self {
        self.cache = Some(RefCell::new(None));
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Naming is one-shot; re-naming an already-named quantity is an error.
    pub fn named(mut self, name: impl Into<String>) -> Result<Self, Error> {
        if self.name.is_some() {
            return Err(Error::NameConflict(
                "quantity is already named".to_string(),
            ));
        }
        self.name = Some(name.into());
        Ok(self)
    }
}

impl<D, R: Clone> Extractor<D, R> {
    pub fn call(&self, datum: &D) -> R {
        let Some(cache) = &self.cache else {
            return (self.f)(datum);
        };
        let ptr = datum as *const D as usize;
        if let Some((last_ptr, last_val)) = &*cache.borrow() {
            if *last_ptr == ptr {
                return last_val.clone();
            }
        }
        let val = (self.f)(datum);
        *cache.borrow_mut() = Some((ptr, val.clone()));
        val
    }
}

impl<D, R: Clone> Clone for Extractor<D, R> {
    fn clone(&self) -> Self {
        Extractor {
            name: self.name.clone(),
            f: Arc::clone(&self.f),
            cache: self.cache.as_ref().map(|c| RefCell::new(c.borrow().clone())),
        }
    }
}

impl<D, R> fmt::Debug for Extractor<D, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor").field("name", &self.name).finish()
    }
}

/// A numeric quantity, `DATUM -> f64`. NaN is a permitted output, routed by
/// binning containers to their `nanflow`.
pub type Quantity<D> = Extractor<D, f64>;

/// A categorical quantity, `DATUM -> String`, used by `Categorize`.
pub type CategoryQuantity<D> = Extractor<D, String>;

/// A `Bag` key quantity, `DATUM -> BagKey`.
pub type BagQuantity<D> = Extractor<D, BagKey>;

/// A key observed by `Bag`: a scalar, a string, or a fixed-length numeric
/// vector, all under one total order (numbers numerically, strings
/// lexicographically, vectors lexicographically componentwise).
#[derive(Clone, Debug, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub enum BagKey {
    Num(ordered_float::OrderedFloat<f64>),
    Str(String),
    Vector(Vec<ordered_float::OrderedFloat<f64>>),
}

impl BagKey {
    pub fn num(x: f64) -> Self {
        BagKey::Num(ordered_float::OrderedFloat(x))
    }

    pub fn vector(len_hint: Option<usize>, v: Vec<f64>) -> Result<Self, Error> {
        if let Some(n) = len_hint {
            if v.len() != n {
                return Err(Error::Validation(format!(
                    "bag vector key has length {} but bag is locked to length {}",
                    v.len(),
                    n
                )));
            }
        }
        Ok(BagKey::Vector(v.into_iter().map(ordered_float::OrderedFloat).collect()))
    }

    pub fn vector_len(&self) -> Option<usize> {
        match self {
            BagKey::Vector(v) => Some(v.len()),
            _ => None,
        }
    }
}

impl Eq for BagKey {}

impl Ord for BagKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // total order across variants: Num < Str < Vector, matching declaration order.
        self.partial_cmp(other)
            .expect("BagKey fields are all totally ordered")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_cache_hits_on_same_datum() {
        let calls = std::cell::Cell::new(0);
        let q: Quantity<i64> = Extractor::new(move |d: &i64| {
            calls.set(calls.get() + 1);
            *d as f64
        })
        .cached();
        let datum = 7i64;
        assert_eq!(q.call(&datum), 7.0);
        assert_eq!(q.call(&datum), 7.0);
    }

    #[test]
    fn naming_twice_is_an_error() {
        let q: Quantity<i64> = Extractor::new(|d: &i64| *d as f64);
        let q = q.named("x").unwrap();
        assert!(q.named("y").is_err());
    }

    #[test]
    fn bag_key_total_order() {
        let mut keys = vec![
            BagKey::Str("b".into()),
            BagKey::num(1.0),
            BagKey::Str("a".into()),
            BagKey::num(-1.0),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                BagKey::num(-1.0),
                BagKey::num(1.0),
                BagKey::Str("a".into()),
                BagKey::Str("b".into()),
            ]
        );
    }
}
