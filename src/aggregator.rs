//! The two sum types at the root of the aggregator algebra.
//!
//! `Past` is the non-generic, serializable, merge-only tree every primitive's
//! `to_json`/`from_json` ultimately produces or consumes. `Present<D>` is the
//! generic, fillable tree a driver builds and feeds data into; every
//! present-tense primitive bridges to its past-tense counterpart via
//! `to_past`, which is what makes `to_json(present) == to_json(to_past(present))`
//! hold by construction rather than by convention.

use serde_json::{json, Value};

use crate::error::Error;
use crate::primitives::absolute_err::{self, Errored};
use crate::primitives::adaptively_bin::{self, AdaptivelyBinned, AdaptivelyBinning};
use crate::primitives::average::{self, Averaged, Averaging};
use crate::primitives::bag::{self, Bagged, Bagging};
use crate::primitives::bin::{self, Binned, Binning};
use crate::primitives::branch::{self, Branched, Branching};
use crate::primitives::categorize::{self, Categorized, Categorizing};
use crate::primitives::centrally_bin::{self, CentrallyBinned, CentrallyBinning};
use crate::primitives::count::{self, Counted, Counting};
use crate::primitives::deviate::{self, Deviated, Deviating};
use crate::primitives::fraction::{self, Fractioned, Fractioning};
use crate::primitives::label::{self, Indexed, Indexing, Labeled, Labeling, UntypedLabeled, UntypedLabeling};
use crate::primitives::limit::{self, Limited, Limiting};
use crate::primitives::minmax::{self, Extreme, Extremized, Extremizing};
use crate::primitives::partition::{self, Partitioned, Partitioning};
use crate::primitives::quantile::{self, Quantiled, Quantiling};
use crate::primitives::select::{self, Selected, Selecting};
use crate::primitives::sparsely_bin::{self, SparselyBinned, SparselyBinning};
use crate::primitives::stack::{self, Stacked, Stacking};
use crate::primitives::sum::{self, Summed, Summing};

/// An immutable, serializable aggregator tree. Supports `merge` but not `fill`.
#[derive(Clone, Debug, PartialEq)]
pub enum Past {
    Count(Counted),
    Sum(Summed),
    Average(Averaged),
    Deviate(Deviated),
    AbsoluteErr(Errored),
    Minimize(Extremized),
    Maximize(Extremized),
    Quantile(Quantiled),
    Bag(Bagged),
    Bin(Binned),
    SparselyBin(SparselyBinned),
    CentrallyBin(CentrallyBinned),
    AdaptivelyBin(AdaptivelyBinned),
    Categorize(Categorized),
    Select(Selected),
    Limit(Limited),
    Fraction(Fractioned),
    Stack(Stacked),
    Partition(Partitioned),
    Label(Labeled),
    UntypedLabel(UntypedLabeled),
    Index(Indexed),
    Branch(Branched),
}

impl Past {
    pub fn factory_tag(&self) -> &'static str {
        match self {
            Past::Count(_) => count::TAG,
            Past::Sum(_) => sum::TAG,
            Past::Average(_) => average::TAG,
            Past::Deviate(_) => deviate::TAG,
            Past::AbsoluteErr(_) => absolute_err::TAG,
            Past::Minimize(_) => minmax::MINIMIZE_TAG,
            Past::Maximize(_) => minmax::MAXIMIZE_TAG,
            Past::Quantile(_) => quantile::TAG,
            Past::Bag(_) => bag::TAG,
            Past::Bin(_) => bin::TAG,
            Past::SparselyBin(_) => sparsely_bin::TAG,
            Past::CentrallyBin(_) => centrally_bin::TAG,
            Past::AdaptivelyBin(_) => adaptively_bin::TAG,
            Past::Categorize(_) => categorize::TAG,
            Past::Select(_) => select::TAG,
            Past::Limit(_) => limit::TAG,
            Past::Fraction(_) => fraction::TAG,
            Past::Stack(_) => stack::TAG,
            Past::Partition(_) => partition::TAG,
            Past::Label(_) => label::LABEL_TAG,
            Past::UntypedLabel(_) => label::UNTYPED_LABEL_TAG,
            Past::Index(_) => label::INDEX_TAG,
            Past::Branch(_) => branch::TAG,
        }
    }

    pub fn entries(&self) -> f64 {
        match self {
            Past::Count(a) => a.entries(),
            Past::Sum(a) => a.entries(),
            Past::Average(a) => a.entries(),
            Past::Deviate(a) => a.entries(),
            Past::AbsoluteErr(a) => a.entries(),
            Past::Minimize(a) => a.entries(),
            Past::Maximize(a) => a.entries(),
            Past::Quantile(a) => a.entries(),
            Past::Bag(a) => a.entries(),
            Past::Bin(a) => a.entries(),
            Past::SparselyBin(a) => a.entries(),
            Past::CentrallyBin(a) => a.entries(),
            Past::AdaptivelyBin(a) => a.entries(),
            Past::Categorize(a) => a.entries(),
            Past::Select(a) => a.entries(),
            Past::Limit(a) => a.entries(),
            Past::Fraction(a) => a.entries(),
            Past::Stack(a) => a.entries(),
            Past::Partition(a) => a.entries(),
            Past::Label(a) => a.entries(),
            Past::UntypedLabel(a) => a.entries(),
            Past::Index(a) => a.entries(),
            Past::Branch(a) => a.entries(),
        }
    }

    pub fn zero(&self) -> Self {
        match self {
            Past::Count(a) => Past::Count(a.zero()),
            Past::Sum(a) => Past::Sum(a.zero()),
            Past::Average(a) => Past::Average(a.zero()),
            Past::Deviate(a) => Past::Deviate(a.zero()),
            Past::AbsoluteErr(a) => Past::AbsoluteErr(a.zero()),
            Past::Minimize(a) => Past::Minimize(a.zero()),
            Past::Maximize(a) => Past::Maximize(a.zero()),
            Past::Quantile(a) => Past::Quantile(a.zero()),
            Past::Bag(a) => Past::Bag(a.zero()),
            Past::Bin(a) => Past::Bin(a.zero()),
            Past::SparselyBin(a) => Past::SparselyBin(a.zero()),
            Past::CentrallyBin(a) => Past::CentrallyBin(a.zero()),
            Past::AdaptivelyBin(a) => Past::AdaptivelyBin(a.zero()),
            Past::Categorize(a) => Past::Categorize(a.zero()),
            Past::Select(a) => Past::Select(a.zero()),
            Past::Limit(a) => Past::Limit(a.zero()),
            Past::Fraction(a) => Past::Fraction(a.zero()),
            Past::Stack(a) => Past::Stack(a.zero()),
            Past::Partition(a) => Past::Partition(a.zero()),
            Past::Label(a) => Past::Label(a.zero()),
            Past::UntypedLabel(a) => Past::UntypedLabel(a.zero()),
            Past::Index(a) => Past::Index(a.zero()),
            Past::Branch(a) => Past::Branch(a.zero()),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error> {
        match (self, other) {
            (Past::Count(a), Past::Count(b)) => Ok(Past::Count(a.merge(b)?)),
            (Past::Sum(a), Past::Sum(b)) => Ok(Past::Sum(a.merge(b)?)),
            (Past::Average(a), Past::Average(b)) => Ok(Past::Average(a.merge(b)?)),
            (Past::Deviate(a), Past::Deviate(b)) => Ok(Past::Deviate(a.merge(b)?)),
            (Past::AbsoluteErr(a), Past::AbsoluteErr(b)) => Ok(Past::AbsoluteErr(a.merge(b)?)),
            (Past::Minimize(a), Past::Minimize(b)) => Ok(Past::Minimize(a.merge(b)?)),
            (Past::Maximize(a), Past::Maximize(b)) => Ok(Past::Maximize(a.merge(b)?)),
            (Past::Quantile(a), Past::Quantile(b)) => Ok(Past::Quantile(a.merge(b)?)),
            (Past::Bag(a), Past::Bag(b)) => Ok(Past::Bag(a.merge(b)?)),
            (Past::Bin(a), Past::Bin(b)) => Ok(Past::Bin(a.merge(b)?)),
            (Past::SparselyBin(a), Past::SparselyBin(b)) => Ok(Past::SparselyBin(a.merge(b)?)),
            (Past::CentrallyBin(a), Past::CentrallyBin(b)) => Ok(Past::CentrallyBin(a.merge(b)?)),
            (Past::AdaptivelyBin(a), Past::AdaptivelyBin(b)) => Ok(Past::AdaptivelyBin(a.merge(b)?)),
            (Past::Categorize(a), Past::Categorize(b)) => Ok(Past::Categorize(a.merge(b)?)),
            (Past::Select(a), Past::Select(b)) => Ok(Past::Select(a.merge(b)?)),
            (Past::Limit(a), Past::Limit(b)) => Ok(Past::Limit(a.merge(b)?)),
            (Past::Fraction(a), Past::Fraction(b)) => Ok(Past::Fraction(a.merge(b)?)),
            (Past::Stack(a), Past::Stack(b)) => Ok(Past::Stack(a.merge(b)?)),
            (Past::Partition(a), Past::Partition(b)) => Ok(Past::Partition(a.merge(b)?)),
            (Past::Label(a), Past::Label(b)) => Ok(Past::Label(a.merge(b)?)),
            (Past::UntypedLabel(a), Past::UntypedLabel(b)) => Ok(Past::UntypedLabel(a.merge(b)?)),
            (Past::Index(a), Past::Index(b)) => Ok(Past::Index(a.merge(b)?)),
            (Past::Branch(a), Past::Branch(b)) => Ok(Past::Branch(a.merge(b)?)),
            (a, b) => Err(Error::StructureMismatch(format!(
                "cannot merge {} with {}",
                a.factory_tag(),
                b.factory_tag()
            ))),
        }
    }

    pub fn children(&self) -> Vec<&Past> {
        match self {
            Past::Bin(a) => a.children(),
            Past::SparselyBin(a) => a.children(),
            Past::CentrallyBin(a) => a.children(),
            Past::AdaptivelyBin(a) => a.children(),
            Past::Categorize(a) => a.children(),
            Past::Select(a) => a.children(),
            Past::Limit(a) => a.children(),
            Past::Fraction(a) => a.children(),
            Past::Stack(a) => a.children(),
            Past::Partition(a) => a.children(),
            Past::Label(a) => a.children(),
            Past::UntypedLabel(a) => a.children(),
            Past::Index(a) => a.children(),
            Past::Branch(a) => a.children(),
            _ => Vec::new(),
        }
    }

    pub fn to_json_fragment(&self, suppress_name: bool) -> Value {
        match self {
            Past::Count(a) => a.to_json_fragment(suppress_name),
            Past::Sum(a) => a.to_json_fragment(suppress_name),
            Past::Average(a) => a.to_json_fragment(suppress_name),
            Past::Deviate(a) => a.to_json_fragment(suppress_name),
            Past::AbsoluteErr(a) => a.to_json_fragment(suppress_name),
            Past::Minimize(a) => a.to_json_fragment(suppress_name),
            Past::Maximize(a) => a.to_json_fragment(suppress_name),
            Past::Quantile(a) => a.to_json_fragment(suppress_name),
            Past::Bag(a) => a.to_json_fragment(suppress_name),
            Past::Bin(a) => a.to_json_fragment(suppress_name),
            Past::SparselyBin(a) => a.to_json_fragment(suppress_name),
            Past::CentrallyBin(a) => a.to_json_fragment(suppress_name),
            Past::AdaptivelyBin(a) => a.to_json_fragment(suppress_name),
            Past::Categorize(a) => a.to_json_fragment(suppress_name),
            Past::Select(a) => a.to_json_fragment(suppress_name),
            Past::Limit(a) => a.to_json_fragment(suppress_name),
            Past::Fraction(a) => a.to_json_fragment(suppress_name),
            Past::Stack(a) => a.to_json_fragment(suppress_name),
            Past::Partition(a) => a.to_json_fragment(suppress_name),
            Past::Label(a) => a.to_json_fragment(suppress_name),
            Past::UntypedLabel(a) => a.to_json_fragment(suppress_name),
            Past::Index(a) => a.to_json_fragment(suppress_name),
            Past::Branch(a) => a.to_json_fragment(suppress_name),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ "type": self.factory_tag(), "data": self.to_json_fragment(false) })
    }

    pub fn from_json_fragment(tag: &str, data: &Value, name_from_parent: Option<String>) -> Result<Self, Error> {
        match tag {
            t if t == count::TAG => Ok(Past::Count(Counted::from_json_fragment(data, name_from_parent)?)),
            t if t == sum::TAG => Ok(Past::Sum(Summed::from_json_fragment(data, name_from_parent)?)),
            t if t == average::TAG => Ok(Past::Average(Averaged::from_json_fragment(data, name_from_parent)?)),
            t if t == deviate::TAG => Ok(Past::Deviate(Deviated::from_json_fragment(data, name_from_parent)?)),
            t if t == absolute_err::TAG => Ok(Past::AbsoluteErr(Errored::from_json_fragment(data, name_from_parent)?)),
            t if t == minmax::MINIMIZE_TAG => Ok(Past::Minimize(Extremized::from_json_fragment(
                Extreme::Min,
                data,
                name_from_parent,
            )?)),
            t if t == minmax::MAXIMIZE_TAG => Ok(Past::Maximize(Extremized::from_json_fragment(
                Extreme::Max,
                data,
                name_from_parent,
            )?)),
            t if t == quantile::TAG => Ok(Past::Quantile(Quantiled::from_json_fragment(data, name_from_parent)?)),
            t if t == bag::TAG => Ok(Past::Bag(Bagged::from_json_fragment(data, name_from_parent)?)),
            t if t == bin::TAG => Ok(Past::Bin(Binned::from_json_fragment(data, name_from_parent)?)),
            t if t == sparsely_bin::TAG => {
                Ok(Past::SparselyBin(SparselyBinned::from_json_fragment(data, name_from_parent)?))
            }
            t if t == centrally_bin::TAG => {
                Ok(Past::CentrallyBin(CentrallyBinned::from_json_fragment(data, name_from_parent)?))
            }
            t if t == adaptively_bin::TAG => {
                Ok(Past::AdaptivelyBin(AdaptivelyBinned::from_json_fragment(data, name_from_parent)?))
            }
            t if t == categorize::TAG => {
                Ok(Past::Categorize(Categorized::from_json_fragment(data, name_from_parent)?))
            }
            t if t == select::TAG => Ok(Past::Select(Selected::from_json_fragment(data, name_from_parent)?)),
            t if t == limit::TAG => Ok(Past::Limit(Limited::from_json_fragment(data, name_from_parent)?)),
            t if t == fraction::TAG => Ok(Past::Fraction(Fractioned::from_json_fragment(data, name_from_parent)?)),
            t if t == stack::TAG => Ok(Past::Stack(Stacked::from_json_fragment(data, name_from_parent)?)),
            t if t == partition::TAG => Ok(Past::Partition(Partitioned::from_json_fragment(data, name_from_parent)?)),
            t if t == label::LABEL_TAG => Ok(Past::Label(Labeled::from_json_fragment(data, name_from_parent)?)),
            t if t == label::UNTYPED_LABEL_TAG => {
                Ok(Past::UntypedLabel(UntypedLabeled::from_json_fragment(data, name_from_parent)?))
            }
            t if t == label::INDEX_TAG => Ok(Past::Index(Indexed::from_json_fragment(data, name_from_parent)?)),
            t if t == branch::TAG => Ok(Past::Branch(Branched::from_json_fragment(data, name_from_parent)?)),
            other => Err(Error::UnknownType(other.to_string())),
        }
    }
}

/// A mutable, fillable aggregator tree over datum type `D`.
pub enum Present<D> {
    Count(Counting),
    Sum(Summing<D>),
    Average(Averaging<D>),
    Deviate(Deviating<D>),
    AbsoluteErr(absolute_err::Deviating<D>),
    Minimize(Extremizing<D>),
    Maximize(Extremizing<D>),
    Quantile(Quantiling<D>),
    Bag(Bagging<D>),
    Bin(Binning<D>),
    SparselyBin(SparselyBinning<D>),
    CentrallyBin(CentrallyBinning<D>),
    AdaptivelyBin(AdaptivelyBinning<D>),
    Categorize(Categorizing<D>),
    Select(Selecting<D>),
    Limit(Limiting<D>),
    Fraction(Fractioning<D>),
    Stack(Stacking<D>),
    Partition(Partitioning<D>),
    Label(Labeling<D>),
    UntypedLabel(UntypedLabeling<D>),
    Index(Indexing<D>),
    Branch(Branching<D>),
}

impl<D> Present<D> {
    pub fn entries(&self) -> f64 {
        match self {
            Present::Count(a) => a.entries(),
            Present::Sum(a) => a.entries(),
            Present::Average(a) => a.entries(),
            Present::Deviate(a) => a.entries(),
            Present::AbsoluteErr(a) => a.entries(),
            Present::Minimize(a) => a.entries(),
            Present::Maximize(a) => a.entries(),
            Present::Quantile(a) => a.entries(),
            Present::Bag(a) => a.entries(),
            Present::Bin(a) => a.entries(),
            Present::SparselyBin(a) => a.entries(),
            Present::CentrallyBin(a) => a.entries(),
            Present::AdaptivelyBin(a) => a.entries(),
            Present::Categorize(a) => a.entries(),
            Present::Select(a) => a.entries(),
            Present::Limit(a) => a.entries(),
            Present::Fraction(a) => a.entries(),
            Present::Stack(a) => a.entries(),
            Present::Partition(a) => a.entries(),
            Present::Label(a) => a.entries(),
            Present::UntypedLabel(a) => a.entries(),
            Present::Index(a) => a.entries(),
            Present::Branch(a) => a.entries(),
        }
    }

    pub fn to_past(&self) -> Past {
        match self {
            Present::Count(a) => Past::Count(a.to_past()),
            Present::Sum(a) => Past::Sum(a.to_past()),
            Present::Average(a) => Past::Average(a.to_past()),
            Present::Deviate(a) => Past::Deviate(a.to_past()),
            Present::AbsoluteErr(a) => Past::AbsoluteErr(a.to_past()),
            Present::Minimize(a) => Past::Minimize(a.to_past()),
            Present::Maximize(a) => Past::Maximize(a.to_past()),
            Present::Quantile(a) => Past::Quantile(a.to_past()),
            Present::Bag(a) => Past::Bag(a.to_past()),
            Present::Bin(a) => Past::Bin(a.to_past()),
            Present::SparselyBin(a) => Past::SparselyBin(a.to_past()),
            Present::CentrallyBin(a) => Past::CentrallyBin(a.to_past()),
            Present::AdaptivelyBin(a) => Past::AdaptivelyBin(a.to_past()),
            Present::Categorize(a) => Past::Categorize(a.to_past()),
            Present::Select(a) => Past::Select(a.to_past()),
            Present::Limit(a) => Past::Limit(a.to_past()),
            Present::Fraction(a) => Past::Fraction(a.to_past()),
            Present::Stack(a) => Past::Stack(a.to_past()),
            Present::Partition(a) => Past::Partition(a.to_past()),
            Present::Label(a) => Past::Label(a.to_past()),
            Present::UntypedLabel(a) => Past::UntypedLabel(a.to_past()),
            Present::Index(a) => Past::Index(a.to_past()),
            Present::Branch(a) => Past::Branch(a.to_past()),
        }
    }

    pub fn to_json(&self) -> Value {
        self.to_past().to_json()
    }

    pub fn zero(&self) -> Self
    where
        D: 'static,
    {
        match self {
            Present::Count(a) => Present::Count(a.zero()),
            Present::Sum(a) => Present::Sum(a.zero()),
            Present::Average(a) => Present::Average(a.zero()),
            Present::Deviate(a) => Present::Deviate(a.zero()),
            Present::AbsoluteErr(a) => Present::AbsoluteErr(a.zero()),
            Present::Minimize(a) => Present::Minimize(a.zero()),
            Present::Maximize(a) => Present::Maximize(a.zero()),
            Present::Quantile(a) => Present::Quantile(a.zero()),
            Present::Bag(a) => Present::Bag(a.zero()),
            Present::Bin(a) => Present::Bin(a.zero()),
            Present::SparselyBin(a) => Present::SparselyBin(a.zero()),
            Present::CentrallyBin(a) => Present::CentrallyBin(a.zero()),
            Present::AdaptivelyBin(a) => Present::AdaptivelyBin(a.zero()),
            Present::Categorize(a) => Present::Categorize(a.zero()),
            Present::Select(a) => Present::Select(a.zero()),
            Present::Limit(a) => Present::Limit(a.zero()),
            Present::Fraction(a) => Present::Fraction(a.zero()),
            Present::Stack(a) => Present::Stack(a.zero()),
            Present::Partition(a) => Present::Partition(a.zero()),
            Present::Label(a) => Present::Label(a.zero()),
            Present::UntypedLabel(a) => Present::UntypedLabel(a.zero()),
            Present::Index(a) => Present::Index(a.zero()),
            Present::Branch(a) => Present::Branch(a.zero()),
        }
    }

    pub fn merge(&self, other: &Self) -> Result<Self, Error>
    where
        D: 'static,
    {
        match (self, other) {
            (Present::Count(a), Present::Count(b)) => Ok(Present::Count(a.merge(b)?)),
            (Present::Sum(a), Present::Sum(b)) => Ok(Present::Sum(a.merge(b)?)),
            (Present::Average(a), Present::Average(b)) => Ok(Present::Average(a.merge(b)?)),
            (Present::Deviate(a), Present::Deviate(b)) => Ok(Present::Deviate(a.merge(b)?)),
            (Present::AbsoluteErr(a), Present::AbsoluteErr(b)) => Ok(Present::AbsoluteErr(a.merge(b)?)),
            (Present::Minimize(a), Present::Minimize(b)) => Ok(Present::Minimize(a.merge(b)?)),
            (Present::Maximize(a), Present::Maximize(b)) => Ok(Present::Maximize(a.merge(b)?)),
            (Present::Quantile(a), Present::Quantile(b)) => Ok(Present::Quantile(a.merge(b)?)),
            (Present::Bag(a), Present::Bag(b)) => Ok(Present::Bag(a.merge(b)?)),
            (Present::Bin(a), Present::Bin(b)) => Ok(Present::Bin(a.merge(b)?)),
            (Present::SparselyBin(a), Present::SparselyBin(b)) => Ok(Present::SparselyBin(a.merge(b)?)),
            (Present::CentrallyBin(a), Present::CentrallyBin(b)) => Ok(Present::CentrallyBin(a.merge(b)?)),
            (Present::AdaptivelyBin(a), Present::AdaptivelyBin(b)) => Ok(Present::AdaptivelyBin(a.merge(b)?)),
            (Present::Categorize(a), Present::Categorize(b)) => Ok(Present::Categorize(a.merge(b)?)),
            (Present::Select(a), Present::Select(b)) => Ok(Present::Select(a.merge(b)?)),
            (Present::Limit(a), Present::Limit(b)) => Ok(Present::Limit(a.merge(b)?)),
            (Present::Fraction(a), Present::Fraction(b)) => Ok(Present::Fraction(a.merge(b)?)),
            (Present::Stack(a), Present::Stack(b)) => Ok(Present::Stack(a.merge(b)?)),
            (Present::Partition(a), Present::Partition(b)) => Ok(Present::Partition(a.merge(b)?)),
            (Present::Label(a), Present::Label(b)) => Ok(Present::Label(a.merge(b)?)),
            (Present::UntypedLabel(a), Present::UntypedLabel(b)) => Ok(Present::UntypedLabel(a.merge(b)?)),
            (Present::Index(a), Present::Index(b)) => Ok(Present::Index(a.merge(b)?)),
            (Present::Branch(a), Present::Branch(b)) => Ok(Present::Branch(a.merge(b)?)),
            _ => Err(Error::StructureMismatch(
                "cannot merge two differently-typed present-tense aggregators".to_string(),
            )),
        }
    }

    pub fn fill(&mut self, datum: &D, weight: f64) -> Result<(), Error>
    where
        D: 'static,
    {
        match self {
            Present::Count(a) => {
                a.fill(weight);
                Ok(())
            }
            Present::Sum(a) => {
                a.fill(datum, weight);
                Ok(())
            }
            Present::Average(a) => {
                a.fill(datum, weight);
                Ok(())
            }
            Present::Deviate(a) => {
                a.fill(datum, weight);
                Ok(())
            }
            Present::AbsoluteErr(a) => {
                a.fill(datum, weight);
                Ok(())
            }
            Present::Minimize(a) => {
                a.fill(datum, weight);
                Ok(())
            }
            Present::Maximize(a) => {
                a.fill(datum, weight);
                Ok(())
            }
            Present::Quantile(a) => {
                a.fill(datum, weight);
                Ok(())
            }
            Present::Bag(a) => a.fill(datum, weight),
            Present::Bin(a) => a.fill(datum, weight),
            Present::SparselyBin(a) => a.fill(datum, weight),
            Present::CentrallyBin(a) => a.fill(datum, weight),
            Present::AdaptivelyBin(a) => a.fill(datum, weight),
            Present::Categorize(a) => a.fill(datum, weight),
            Present::Select(a) => a.fill(datum, weight),
            Present::Limit(a) => a.fill(datum, weight),
            Present::Fraction(a) => a.fill(datum, weight),
            Present::Stack(a) => a.fill(datum, weight),
            Present::Partition(a) => a.fill(datum, weight),
            Present::Label(a) => a.fill(datum, weight),
            Present::UntypedLabel(a) => a.fill(datum, weight),
            Present::Index(a) => a.fill(datum, weight),
            Present::Branch(a) => a.fill(datum, weight),
        }
    }
}
