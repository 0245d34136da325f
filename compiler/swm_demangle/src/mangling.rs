//! Pieces of the mangling grammar shared by the demangler and the
//! remangler: prefixes, word substitutions, operator characters, standard
//! substitutions and substitution merging.

use crate::node::NodeKind;
use crate::punycode;

/// Recognized symbol prefixes, most specific first.
pub const MANGLING_PREFIXES: [&str; 5] = ["_T0", "$S", "_$S", "$s", "_$s"];

/// Prefix emitted by the remangler.
pub const MANGLING_PREFIX: &str = "$s";

/// The standard library module.
pub const STDLIB_NAME: &str = "Swift";
/// Module holding imported Objective-C declarations.
pub const MANGLING_MODULE_OBJC: &str = "__C";
/// Module holding declarations synthesized by the Clang importer.
pub const MANGLING_MODULE_CLANG_IMPORTER: &str = "__C_Synthesized";

pub const BUILTIN_TYPE_NAME_PREFIX: &str = "Builtin.";
pub const BUILTIN_TYPE_NAME_INT: &str = "Builtin.Int";
pub const BUILTIN_TYPE_NAME_INTLITERAL: &str = "Builtin.IntLiteral";
pub const BUILTIN_TYPE_NAME_FLOAT: &str = "Builtin.FPIEEE";
pub const BUILTIN_TYPE_NAME_NATIVEOBJECT: &str = "Builtin.NativeObject";
pub const BUILTIN_TYPE_NAME_BRIDGEOBJECT: &str = "Builtin.BridgeObject";
pub const BUILTIN_TYPE_NAME_RAWPOINTER: &str = "Builtin.RawPointer";
pub const BUILTIN_TYPE_NAME_UNSAFEVALUEBUFFER: &str = "Builtin.UnsafeValueBuffer";
pub const BUILTIN_TYPE_NAME_UNKNOWNOBJECT: &str = "Builtin.UnknownObject";
pub const BUILTIN_TYPE_NAME_VEC: &str = "Builtin.Vec";
pub const BUILTIN_TYPE_NAME_SILTOKEN: &str = "Builtin.SILToken";
pub const BUILTIN_TYPE_NAME_WORD: &str = "Builtin.Word";

/// Length of the recognized prefix of `name`, or 0.
pub fn mangling_prefix_length(name: &[u8]) -> usize {
    MANGLING_PREFIXES
        .iter()
        .find(|prefix| name.starts_with(prefix.as_bytes()))
        .map_or(0, |prefix| prefix.len())
}

// ── Words ───────────────────────────────────────────────────────

/// Whether `c` can begin a substitution word.
pub fn is_word_start(c: u8) -> bool {
    !c.is_ascii_digit() && c != b'_' && c != 0
}

/// Whether `c`, following `prev`, ends a substitution word.
pub fn is_word_end(c: u8, prev: u8) -> bool {
    c == b'_' || c == 0 || (!prev.is_ascii_uppercase() && c.is_ascii_uppercase())
}

/// A word recorded for later substitution, as a byte range of the mangled
/// buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubstitutionWord {
    pub start: usize,
    pub len: usize,
}

#[derive(Clone, Copy, Debug)]
struct WordReplacement {
    position: usize,
    word: Option<usize>,
}

/// Appends the mangling of `ident` to `buffer`.
///
/// Identifiers containing non-symbol characters are punycode encoded.
/// Otherwise words already recorded in `words` are replaced by letter
/// references and new words are recorded, up to `max_words`.
pub fn mangle_identifier(
    ident: &str,
    buffer: &mut String,
    words: &mut Vec<SubstitutionWord>,
    max_words: usize,
) {
    if punycode::needs_punycode(ident) {
        if let Some(encoded) = punycode::encode(ident, true) {
            buffer.push_str("00");
            buffer.push_str(&encoded.len().to_string());
            if encoded.starts_with(|c: char| c.is_ascii_digit() || c == '_') {
                buffer.push('_');
            }
            buffer.push_str(&encoded);
            return;
        }
    }

    let bytes = ident.as_bytes();
    let mut words_in_buffer = words.len();
    let mut replacements: Vec<WordReplacement> = Vec::new();

    let mut word_start: Option<usize> = None;
    for pos in 0..=bytes.len() {
        let c = bytes.get(pos).copied().unwrap_or(0);
        if let Some(start) = word_start {
            if is_word_end(c, bytes[pos - 1]) {
                let word = &bytes[start..pos];
                let in_buffer = words[..words_in_buffer]
                    .iter()
                    .position(|w| &buffer.as_bytes()[w.start..w.start + w.len] == word);
                let found = in_buffer.or_else(|| {
                    words[words_in_buffer..]
                        .iter()
                        .position(|w| &bytes[w.start..w.start + w.len] == word)
                        .map(|idx| idx + words_in_buffer)
                });
                if let Some(idx) = found {
                    replacements.push(WordReplacement {
                        position: start,
                        word: Some(idx),
                    });
                } else if word.len() >= 2 && words.len() < max_words {
                    // Relative to `ident` until the word is emitted.
                    words.push(SubstitutionWord {
                        start,
                        len: word.len(),
                    });
                }
                word_start = None;
            }
        }
        if word_start.is_none() && is_word_start(c) {
            word_start = Some(pos);
        }
    }

    if !replacements.is_empty() {
        buffer.push('0');
    }

    replacements.push(WordReplacement {
        position: bytes.len(),
        word: None,
    });

    let end = replacements.len();
    let mut position = 0;
    for (idx, replacement) in replacements.iter().enumerate() {
        if position < replacement.position {
            buffer.push_str(&(replacement.position - position).to_string());
            while position < replacement.position {
                if words_in_buffer < words.len() && words[words_in_buffer].start == position {
                    words[words_in_buffer].start = buffer.len();
                    words_in_buffer += 1;
                }
                buffer.push(char::from(bytes[position]));
                position += 1;
            }
        }
        if let Some(word) = replacement.word {
            position += words[word].len;
            // Word indices are bounded by the word limit.
            #[allow(clippy::cast_possible_truncation)]
            let letter = word as u8;
            if idx + 2 < end {
                buffer.push(char::from(b'a' + letter));
            } else {
                buffer.push(char::from(b'A' + letter));
                if position == bytes.len() {
                    buffer.push('0');
                }
            }
        }
    }
}

// ── Operators ───────────────────────────────────────────────────

/// Mangled letter for an operator character; other characters map to
/// themselves.
pub fn translate_operator_char(c: char) -> char {
    match c {
        '&' => 'a',
        '@' => 'c',
        '/' => 'd',
        '=' => 'e',
        '>' => 'g',
        '<' => 'l',
        '*' => 'm',
        '!' => 'n',
        '|' => 'o',
        '+' => 'p',
        '?' => 'q',
        '%' => 'r',
        '-' => 's',
        '~' => 't',
        '^' => 'x',
        '.' => 'z',
        _ => c,
    }
}

pub fn translate_operator(text: &str) -> String {
    text.chars().map(translate_operator_char).collect()
}

/// Inverse of [`translate_operator_char`] for lowercase letters.
pub fn operator_char_for_letter(c: char) -> Option<char> {
    const TABLE: &[u8; 26] = b"& @/= >    <*!|+?%-~   ^ .";
    if c.is_ascii_lowercase() {
        let op = TABLE[(c as usize) - ('a' as usize)];
        if op == b' ' {
            None
        } else {
            Some(char::from(op))
        }
    } else {
        Some(c)
    }
}

// ── Standard substitutions ──────────────────────────────────────

/// Standard library types and protocols with a one-letter `S` mangling.
const STANDARD_SUBSTITUTIONS: &[(u8, &str, NodeKind)] = &[
    (b'A', "AutoreleasingUnsafeMutablePointer", NodeKind::Structure),
    (b'a', "Array", NodeKind::Structure),
    (b'b', "Bool", NodeKind::Structure),
    (b'c', "UnicodeScalar", NodeKind::Structure),
    (b'D', "Dictionary", NodeKind::Structure),
    (b'd', "Double", NodeKind::Structure),
    (b'f', "Float", NodeKind::Structure),
    (b'h', "Set", NodeKind::Structure),
    (b'I', "DefaultIndices", NodeKind::Structure),
    (b'i', "Int", NodeKind::Structure),
    (b'J', "Character", NodeKind::Structure),
    (b'N', "ClosedRange", NodeKind::Structure),
    (b'n', "Range", NodeKind::Structure),
    (b'O', "ObjectIdentifier", NodeKind::Structure),
    (b'P', "UnsafePointer", NodeKind::Structure),
    (b'p', "UnsafeMutablePointer", NodeKind::Structure),
    (b'R', "UnsafeBufferPointer", NodeKind::Structure),
    (b'r', "UnsafeMutableBufferPointer", NodeKind::Structure),
    (b'S', "String", NodeKind::Structure),
    (b's', "Substring", NodeKind::Structure),
    (b'u', "UInt", NodeKind::Structure),
    (b'V', "UnsafeRawPointer", NodeKind::Structure),
    (b'v', "UnsafeMutableRawPointer", NodeKind::Structure),
    (b'W', "UnsafeRawBufferPointer", NodeKind::Structure),
    (b'w', "UnsafeMutableRawBufferPointer", NodeKind::Structure),
    (b'q', "Optional", NodeKind::Enum),
    (b'B', "BinaryFloatingPoint", NodeKind::Protocol),
    (b'E', "Encodable", NodeKind::Protocol),
    (b'e', "Decodable", NodeKind::Protocol),
    (b'F', "FloatingPoint", NodeKind::Protocol),
    (b'G', "RandomNumberGenerator", NodeKind::Protocol),
    (b'H', "Hashable", NodeKind::Protocol),
    (b'j', "Numeric", NodeKind::Protocol),
    (b'K', "BidirectionalCollection", NodeKind::Protocol),
    (b'k', "RandomAccessCollection", NodeKind::Protocol),
    (b'L', "Comparable", NodeKind::Protocol),
    (b'l', "Collection", NodeKind::Protocol),
    (b'M', "MutableCollection", NodeKind::Protocol),
    (b'm', "RangeReplaceableCollection", NodeKind::Protocol),
    (b'Q', "Equatable", NodeKind::Protocol),
    (b'T', "Sequence", NodeKind::Protocol),
    (b't', "IteratorProtocol", NodeKind::Protocol),
    (b'U', "UnsignedInteger", NodeKind::Protocol),
    (b'X', "RangeExpression", NodeKind::Protocol),
    (b'x', "Strideable", NodeKind::Protocol),
    (b'Y', "RawRepresentable", NodeKind::Protocol),
    (b'y', "StringProtocol", NodeKind::Protocol),
    (b'Z', "SignedInteger", NodeKind::Protocol),
    (b'z', "BinaryInteger", NodeKind::Protocol),
];

/// Letter of the standard substitution for a `Swift` type name.
pub fn standard_type_substitution(name: &str) -> Option<u8> {
    STANDARD_SUBSTITUTIONS
        .iter()
        .find(|(_, candidate, _)| *candidate == name)
        .map(|&(letter, _, _)| letter)
}

/// Name and node kind for a standard substitution letter.
pub fn standard_type_for_letter(letter: u8) -> Option<(&'static str, NodeKind)> {
    STANDARD_SUBSTITUTIONS
        .iter()
        .find(|(candidate, _, _)| *candidate == letter)
        .map(|&(_, name, kind)| (name, kind))
}

// ── Substitution merging ────────────────────────────────────────

/// Largest repeat count accepted in a merged substitution such as `A12B`.
pub const MAX_REPEAT_COUNT: usize = 2048;

/// Tracks the last emitted substitution so consecutive ones can be merged,
/// turning `AB` + `C` into `AbC` and `AB` + `B` into `A2B`.
#[derive(Clone, Debug, Default)]
pub struct SubstitutionMerging {
    last_position: usize,
    last_size: usize,
    last_count: usize,
    last_is_standard: bool,
}

impl SubstitutionMerging {
    pub fn clear(&mut self) {
        self.last_count = 0;
    }

    /// Merges `subst` into the previous substitution if it ends the buffer.
    ///
    /// On `false` the caller emits `A<subst>` or `S<subst>` itself.
    pub fn try_merge(&mut self, subst: u8, is_standard: bool, buffer: &mut String) -> bool {
        if self.last_count > 0
            && self.last_count < MAX_REPEAT_COUNT
            && buffer.len() == self.last_position + self.last_size
            && self.last_is_standard == is_standard
        {
            let last = buffer.as_bytes().last().copied().unwrap_or(0);
            if last != subst && !is_standard {
                self.last_position = buffer.len();
                self.last_count = 1;
                buffer.pop();
                buffer.push(char::from(last.to_ascii_lowercase()));
                buffer.push(char::from(subst));
                self.last_size = 1;
                return true;
            }
            if last == subst {
                self.last_count += 1;
                buffer.truncate(self.last_position);
                buffer.push_str(&self.last_count.to_string());
                buffer.push(char::from(subst));
                self.last_size = buffer.len() - self.last_position;
                return true;
            }
        }
        self.last_position = buffer.len() + 1;
        self.last_size = 1;
        self.last_count = 1;
        self.last_is_standard = is_standard;
        false
    }
}

// ── Misc ────────────────────────────────────────────────────────

/// Whether bound generic arguments of `kind` belong to the node itself
/// rather than to its parent context.
pub fn node_consumes_generic_args(kind: NodeKind) -> bool {
    !matches!(
        kind,
        NodeKind::Variable
            | NodeKind::Subscript
            | NodeKind::ImplicitClosure
            | NodeKind::ExplicitClosure
            | NodeKind::DefaultArgumentInitializer
            | NodeKind::Initializer
    )
}

/// Alphabetic name for a generic parameter: `A`, `B`, ..., `Z`, `AB`, with the
/// depth appended when non-zero.
pub fn generic_parameter_name(depth: u64, index: u64) -> String {
    let mut name = String::new();
    let mut char_index = index;
    loop {
        // Always below 26.
        #[allow(clippy::cast_possible_truncation)]
        name.push(char::from(b'A' + (char_index % 26) as u8));
        char_index /= 26;
        if char_index == 0 {
            break;
        }
    }
    if depth != 0 {
        name.push_str(&depth.to_string());
    }
    name
}

#[cfg(test)]
mod tests;
