//! A declarative grammar of composable aggregation primitives.
//!
//! Every primitive is a monoid under `merge`/`zero`: build a [`Present`]
//! tree, `fill` it datum by datum, `merge` independently-filled shards, and
//! serialize to or from the tag/fragment JSON convention described in
//! [`aggregator`] and [`registry`]. The present (`fill`-capable) and past
//! (immutable, serializable) halves of each primitive are kept as separate
//! types so that `to_json(present) == to_json(to_past(present))` holds by
//! construction.

pub mod aggregator;
pub mod cluster;
mod error;
pub mod json;
pub mod primitives;
pub mod quantity;
pub mod registry;

pub use aggregator::{Past, Present};
pub use error::Error;
pub use quantity::{BagKey, BagQuantity, CategoryQuantity, Extractor, Quantity};
pub use registry::Factory;
