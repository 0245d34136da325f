//! Lowering errors and the internal fatal-error path.

use thiserror::Error;

/// Why a type or function could not be lowered.
///
/// Only features that are deliberately deferred surface as errors. Inputs
/// that no well-formed program produces, such as overlapping aggregate
/// fields, abort through [`fatal`] instead.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LoweringError {
    /// A lowering rule that is known but not supported.
    #[error("not implemented: {0}")]
    NotImplemented(String),
    /// A demangled tree does not have the shape of a type.
    #[error("malformed type tree: {0}")]
    MalformedTree(String),
    /// The metadata reader has no record of a type the lowering needs.
    #[error("no metadata for {0}")]
    MissingMetadata(String),
    /// The demangler rejected a type name.
    #[error(transparent)]
    Demangle(#[from] swm_demangle::DemangleError),
}

pub type Result<T, E = LoweringError> = std::result::Result<T, E>;

/// Builds a [`LoweringError::NotImplemented`] from format arguments.
macro_rules! not_implemented {
    ($($arg:tt)*) => {
        $crate::error::LoweringError::NotImplemented(format!($($arg)*))
    };
}

/// Builds a [`LoweringError::MalformedTree`] from format arguments.
macro_rules! malformed {
    ($($arg:tt)*) => {
        $crate::error::LoweringError::MalformedTree(format!($($arg)*))
    };
}

pub(crate) use {malformed, not_implemented};

/// Aborts on a violated lowering invariant.
#[cold]
#[track_caller]
pub fn fatal(message: &str) -> ! {
    tracing::error!(message, "fatal lowering invariant violation");
    panic!("{message}");
}
