//! Demangler limits and printing options.

use bitflags::bitflags;

/// Limits and target facts used while demangling.
///
/// The defaults match the mangling scheme's own limits on a 64-bit target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DemangleOptions {
    /// Words remembered for word substitutions.
    pub max_words: usize,
    /// Largest repeat count accepted in a merged substitution.
    pub max_repeat_count: usize,
    /// Pointer size used to skip absolute symbolic references.
    pub pointer_size: usize,
}

impl Default for DemangleOptions {
    fn default() -> Self {
        DemangleOptions {
            max_words: 26,
            max_repeat_count: crate::mangling::MAX_REPEAT_COUNT,
            pointer_size: 8,
        }
    }
}

bitflags! {
    /// What the node printer includes when rendering a tree as text.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PrintOptions: u32 {
        /// `[T]`, `[K : V]` and `T?` instead of the bound generic spelling.
        const SYNTHESIZE_SUGAR_ON_TYPES = 1 << 0;
        /// Qualify with modules named `__lldb_expr_*`.
        const DISPLAY_DEBUGGER_GENERATED_MODULE = 1 << 1;
        /// Print the context of an entity, as in `main.foo`.
        const QUALIFY_ENTITIES = 1 << 2;
        const DISPLAY_EXTENSION_CONTEXTS = 1 << 3;
        const DISPLAY_UNMANGLED_SUFFIX = 1 << 4;
        const DISPLAY_MODULE_NAMES = 1 << 5;
        /// Spell out specialization parameters instead of `specialized`.
        const DISPLAY_GENERIC_SPECIALIZATIONS = 1 << 6;
        const DISPLAY_PROTOCOL_CONFORMANCES = 1 << 7;
        const DISPLAY_WHERE_CLAUSES = 1 << 8;
        /// Print the type of variables after a colon.
        const DISPLAY_ENTITY_TYPES = 1 << 9;
        const SHORTEN_PARTIAL_APPLY = 1 << 10;
        const SHORTEN_THUNK = 1 << 11;
        const SHORTEN_VALUE_WITNESS = 1 << 12;
        const SHORTEN_ARCHETYPE = 1 << 13;
        const SHOW_PRIVATE_DISCRIMINATORS = 1 << 14;
        const SHOW_FUNCTION_ARGUMENT_TYPES = 1 << 15;
    }
}

impl PrintOptions {
    /// Compact rendering: sugared types, no module names, short thunks.
    pub const SIMPLIFIED: PrintOptions = PrintOptions::SYNTHESIZE_SUGAR_ON_TYPES
        .union(PrintOptions::QUALIFY_ENTITIES)
        .union(PrintOptions::SHORTEN_PARTIAL_APPLY)
        .union(PrintOptions::SHORTEN_THUNK)
        .union(PrintOptions::SHORTEN_VALUE_WITNESS)
        .union(PrintOptions::SHORTEN_ARCHETYPE);
}

/// Full detail, matching the platform demangling tools.
impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions::DISPLAY_DEBUGGER_GENERATED_MODULE
            | PrintOptions::QUALIFY_ENTITIES
            | PrintOptions::DISPLAY_EXTENSION_CONTEXTS
            | PrintOptions::DISPLAY_UNMANGLED_SUFFIX
            | PrintOptions::DISPLAY_MODULE_NAMES
            | PrintOptions::DISPLAY_GENERIC_SPECIALIZATIONS
            | PrintOptions::DISPLAY_PROTOCOL_CONFORMANCES
            | PrintOptions::DISPLAY_WHERE_CLAUSES
            | PrintOptions::DISPLAY_ENTITY_TYPES
            | PrintOptions::SHOW_PRIVATE_DISCRIMINATORS
            | PrintOptions::SHOW_FUNCTION_ARGUMENT_TYPES
    }
}
