//! Builtin types and the table that names them.

use std::fmt;
use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use swm_demangle::mangling::{
    BUILTIN_TYPE_NAME_BRIDGEOBJECT, BUILTIN_TYPE_NAME_FLOAT, BUILTIN_TYPE_NAME_INT,
    BUILTIN_TYPE_NAME_INTLITERAL, BUILTIN_TYPE_NAME_NATIVEOBJECT, BUILTIN_TYPE_NAME_PREFIX,
    BUILTIN_TYPE_NAME_RAWPOINTER,
    BUILTIN_TYPE_NAME_UNKNOWNOBJECT, BUILTIN_TYPE_NAME_UNSAFEVALUEBUFFER, BUILTIN_TYPE_NAME_VEC,
    BUILTIN_TYPE_NAME_WORD,
};

use super::TypeKind;

/// A type provided by the compiler rather than declared in source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    /// Fixed-width integer of the given bit width.
    Integer(u32),
    /// Arbitrary-precision literal value.
    IntegerLiteral,
    /// IEEE float of the given bit width.
    Float(u32),
    RawPointer,
    NativeObject,
    BridgeObject,
    UnknownObject,
    UnsafeValueBuffer,
    Vector { count: u32, element: Box<BuiltinType> },
}

impl BuiltinType {
    pub fn kind(&self) -> TypeKind {
        match self {
            BuiltinType::Integer(_) => TypeKind::BuiltinInteger,
            BuiltinType::IntegerLiteral => TypeKind::BuiltinIntegerLiteral,
            BuiltinType::Float(_) => TypeKind::BuiltinFloat,
            BuiltinType::RawPointer => TypeKind::BuiltinRawPointer,
            BuiltinType::NativeObject => TypeKind::BuiltinNativeObject,
            BuiltinType::BridgeObject => TypeKind::BuiltinBridgeObject,
            BuiltinType::UnknownObject => TypeKind::BuiltinUnknownObject,
            BuiltinType::UnsafeValueBuffer => TypeKind::BuiltinUnsafeValueBuffer,
            BuiltinType::Vector { .. } => TypeKind::BuiltinVector,
        }
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltinType::Integer(bits) => write!(f, "{BUILTIN_TYPE_NAME_INT}{bits}"),
            BuiltinType::IntegerLiteral => f.write_str(BUILTIN_TYPE_NAME_INTLITERAL),
            BuiltinType::Float(bits) => write!(f, "{BUILTIN_TYPE_NAME_FLOAT}{bits}"),
            BuiltinType::RawPointer => f.write_str(BUILTIN_TYPE_NAME_RAWPOINTER),
            BuiltinType::NativeObject => f.write_str(BUILTIN_TYPE_NAME_NATIVEOBJECT),
            BuiltinType::BridgeObject => f.write_str(BUILTIN_TYPE_NAME_BRIDGEOBJECT),
            BuiltinType::UnknownObject => f.write_str(BUILTIN_TYPE_NAME_UNKNOWNOBJECT),
            BuiltinType::UnsafeValueBuffer => f.write_str(BUILTIN_TYPE_NAME_UNSAFEVALUEBUFFER),
            BuiltinType::Vector { count, element } => {
                let element = element.to_string();
                let element = element.strip_prefix(BUILTIN_TYPE_NAME_PREFIX).unwrap_or(&element);
                write!(f, "{BUILTIN_TYPE_NAME_VEC}{count}x{element}")
            }
        }
    }
}

/// Maps `Builtin.*` names to [`BuiltinType`]s.
///
/// Common names are interned up front; other integer, float and vector
/// widths are parsed on lookup.
pub struct BuiltinTable {
    named: FxHashMap<&'static str, BuiltinType>,
}

impl BuiltinTable {
    fn new() -> Self {
        let mut named = FxHashMap::default();
        named.insert(BUILTIN_TYPE_NAME_INTLITERAL, BuiltinType::IntegerLiteral);
        named.insert(BUILTIN_TYPE_NAME_RAWPOINTER, BuiltinType::RawPointer);
        named.insert(BUILTIN_TYPE_NAME_NATIVEOBJECT, BuiltinType::NativeObject);
        named.insert(BUILTIN_TYPE_NAME_BRIDGEOBJECT, BuiltinType::BridgeObject);
        named.insert(BUILTIN_TYPE_NAME_UNKNOWNOBJECT, BuiltinType::UnknownObject);
        named.insert(
            BUILTIN_TYPE_NAME_UNSAFEVALUEBUFFER,
            BuiltinType::UnsafeValueBuffer,
        );
        // Only 64-bit targets are modeled, so a word is an Int64.
        named.insert(BUILTIN_TYPE_NAME_WORD, BuiltinType::Integer(64));
        for (name, bits) in [
            ("Builtin.Int1", 1),
            ("Builtin.Int8", 8),
            ("Builtin.Int16", 16),
            ("Builtin.Int32", 32),
            ("Builtin.Int64", 64),
        ] {
            named.insert(name, BuiltinType::Integer(bits));
        }
        for (name, bits) in [
            ("Builtin.FPIEEE32", 32),
            ("Builtin.FPIEEE64", 64),
        ] {
            named.insert(name, BuiltinType::Float(bits));
        }
        BuiltinTable { named }
    }

    /// The process-wide table.
    pub fn shared() -> &'static BuiltinTable {
        static TABLE: OnceLock<BuiltinTable> = OnceLock::new();
        TABLE.get_or_init(BuiltinTable::new)
    }

    /// The builtin spelled `name`, such as `Builtin.Int32`.
    pub fn lookup(&self, name: &str) -> Option<BuiltinType> {
        if let Some(builtin) = self.named.get(name) {
            return Some(builtin.clone());
        }
        if let Some(bits) = name.strip_prefix(BUILTIN_TYPE_NAME_INT) {
            return parse_width(bits).map(BuiltinType::Integer);
        }
        if let Some(bits) = name.strip_prefix(BUILTIN_TYPE_NAME_FLOAT) {
            return parse_width(bits).map(BuiltinType::Float);
        }
        let (count, element) = name.strip_prefix(BUILTIN_TYPE_NAME_VEC)?.split_once('x')?;
        let element = self.lookup(&format!("{BUILTIN_TYPE_NAME_PREFIX}{element}"))?;
        Some(BuiltinType::Vector {
            count: parse_width(count)?,
            element: Box::new(element),
        })
    }
}

fn parse_width(digits: &str) -> Option<u32> {
    digits.parse().ok().filter(|&width| width > 0)
}
