//! Swift-style symbol demangling.
//!
//! This crate turns compiler-generated symbol names into [`Node`] trees and
//! back:
//! - [`demangler`]: parses `$s`-family symbols and bare type manglings
//! - [`remangler`]: serializes a tree back to its mangled spelling
//! - [`printer`]: renders a tree as human-readable text
//! - [`classify`]: cheap predicates over raw symbol strings
//! - [`context`]: trees for runtime context descriptor paths
//!
//! # Failure Model
//!
//! Malformed input is an ordinary [`DemangleError`]; no partial tree is ever
//! returned. Trees that no demangler could have produced are caller bugs
//! and abort through [`error::fatal`] when remangled.
//!
//! # Symbolic References
//!
//! Names read out of a binary may embed control bytes pointing at context
//! descriptors. Callers that can follow those pointers pass a
//! [`SymbolicResolver`] when demangling and a [`RemangleResolver`] when
//! remangling.

pub mod classify;
pub mod config;
pub mod context;
pub mod demangler;
pub mod error;
pub mod mangling;
pub mod node;
pub mod printer;
pub mod punycode;
pub mod remangler;
pub mod stack;
mod substitution;
pub mod symbolic;

pub use config::{DemangleOptions, PrintOptions};
pub use context::{build_demangling_for_context, mangled_name_length, ContextComponent};
pub use demangler::{
    demangle_symbol, demangle_symbol_with_resolver, demangle_type, demangle_type_with_resolver,
    Demangler,
};
pub use error::{DemangleError, Result};
pub use node::{
    Directness, FunctionSigSpecializationParamKind, MetadataState, Node, NodeKind, Payload,
    SymbolicReferenceKind, ValueWitnessKind,
};
pub use printer::print_node;
pub use remangler::{mangle, mangle_with_resolver};
pub use symbolic::{RemangleResolver, SymbolicReference, SymbolicResolver};
