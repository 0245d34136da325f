//! ABI lowering for demangled Swift-style types.
//!
//! Given a type tree from `swm_demangle` and a source of runtime metadata,
//! this crate answers how values of the type are laid out and passed:
//! - [`builder`]: demangled trees to [`AType`]s
//! - [`type_lowering`]: formal types to lowered types and conventions
//! - [`converter`]: lowered types to sizes, alignments and storage
//! - [`agg_lowering`]: aggregates to the scalar sequence the ABI passes
//! - [`signature`]: function types to machine signatures
//! - [`polymorphic`], [`fulfillment`]: where the generic context of a
//!   polymorphic function comes from
//!
//! # Failure Model
//!
//! Deferred features and unknown metadata are [`LoweringError`]s. Broken
//! internal invariants abort through [`error::fatal`], which logs the
//! message before panicking.
//!
//! # Tracing
//!
//! Set `RUST_LOG=swm_lower=debug` and call [`init_tracing`] to see every
//! converted type and expanded signature; `trace` adds fulfillment search.

pub mod agg_lowering;
pub mod builder;
pub mod config;
pub mod converter;
pub mod error;
pub mod fulfillment;
pub mod machine;
pub mod math;
pub mod metadata;
pub mod metadata_path;
pub mod native_schema;
pub mod polymorphic;
pub mod signature;
pub mod struct_layout;
pub mod type_info;
pub mod type_lowering;
pub mod types;

use std::sync::Once;

pub use agg_lowering::{FinishedAggLowering, SwiftAggLowering};
pub use builder::{FunctionSymbol, TypeBuilder};
pub use config::TargetConfig;
pub use converter::IrTypeConverter;
pub use error::{LoweringError, Result};
pub use fulfillment::{Fulfillment, FulfillmentKey, FulfillmentMap};
pub use machine::{MachineFunctionType, MachineType, ParamAttrs};
pub use metadata::{CompositeLayout, FieldLayout, MetadataReader, StaticMetadata};
pub use metadata_path::MetadataPath;
pub use native_schema::NativeConventionSchema;
pub use polymorphic::{expand_polymorphic_signature, PolymorphicConvention};
pub use signature::IrSignature;
pub use type_info::TypeInfo;
pub use type_lowering::SilTypeLowering;
pub use types::{AType, BuiltinTable, FunctionType, SilFunctionType};

static TRACING_INIT: Once = Once::new();

/// Installs a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
