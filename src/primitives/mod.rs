//! The 23 built-in aggregator primitives, one module per factory tag
//! (`minmax` covers both `Minimize` and `Maximize`; `label` covers
//! `Label`, `UntypedLabel`, and `Index`).

pub mod absolute_err;
pub mod adaptively_bin;
pub mod average;
pub mod bag;
pub mod bin;
pub mod branch;
pub mod categorize;
pub mod centrally_bin;
pub mod count;
pub mod deviate;
pub mod fraction;
pub mod label;
pub mod limit;
pub mod minmax;
pub mod partition;
pub mod quantile;
pub mod select;
pub mod sparsely_bin;
pub mod stack;
pub mod sum;
