//! Demangling errors and the internal fatal-error path.

use thiserror::Error;

/// Why a symbol could not be demangled.
///
/// Demangling never returns a partial tree: the first malformed byte,
/// unknown production or unsupported feature aborts the whole call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DemangleError {
    /// The input does not follow the mangling grammar.
    #[error("unexpected mangling: {0}")]
    Unexpected(String),
    /// The input is well formed but uses a production this crate does not
    /// handle.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

pub type Result<T, E = DemangleError> = std::result::Result<T, E>;

/// Builds a [`DemangleError::Unexpected`] from format arguments.
macro_rules! unexpected {
    ($($arg:tt)*) => {
        $crate::error::DemangleError::Unexpected(format!($($arg)*))
    };
}

pub(crate) use unexpected;

/// Aborts on a violated internal invariant.
///
/// Used for trees no demangler could have produced, such as remangling a
/// symbolic reference without a resolver.
#[cold]
#[track_caller]
pub fn fatal(message: &str) -> ! {
    tracing::error!(message, "fatal demangler invariant violation");
    panic!("{message}");
}
