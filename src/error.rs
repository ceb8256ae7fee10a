//! Crate-wide error type.

use thiserror::Error;

/// Failure modes surfaced by aggregator construction, merging, and the JSON codec.
#[derive(Debug, Error)]
pub enum Error {
    /// Constructor-time parameter violation (non-positive bin count, `low >= high`, …).
    #[error("validation error: {0}")]
    Validation(String),

    /// Two aggregators were merged whose shapes or configuration disagree.
    #[error("structure mismatch: {0}")]
    StructureMismatch(String),

    /// A quantity was named twice, or two named quantities disagreed on merge.
    #[error("name conflict: {0}")]
    NameConflict(String),

    /// A JSON document's `"type"` tag has no registered factory.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// A JSON document did not have the shape a fragment reader expected.
    #[error("json format error: {0}")]
    JsonFormat(String),
}

/// Merge two optional quantity names, erroring if both are present and differ.
pub(crate) fn merge_names(
    a: &Option<String>,
    b: &Option<String>,
) -> Result<Option<String>, Error> {
    match (a, b) {
        (Some(x), Some(y)) if x != y => Err(Error::NameConflict(format!(
            "cannot merge differently named quantities: {x:?} vs {y:?}"
        ))),
        (Some(x), _) => Ok(Some(x.clone())),
        (None, Some(y)) => Ok(Some(y.clone())),
        (None, None) => Ok(None),
    }
}
