//! Numbers, identifiers, substitutions and builtin types.

use super::{Demangler, Require};
use crate::error::Result;
use crate::mangling::{
    is_word_end, is_word_start, operator_char_for_letter, standard_type_for_letter,
    BUILTIN_TYPE_NAME_BRIDGEOBJECT, BUILTIN_TYPE_NAME_FLOAT, BUILTIN_TYPE_NAME_INT,
    BUILTIN_TYPE_NAME_INTLITERAL, BUILTIN_TYPE_NAME_NATIVEOBJECT, BUILTIN_TYPE_NAME_PREFIX,
    BUILTIN_TYPE_NAME_RAWPOINTER, BUILTIN_TYPE_NAME_SILTOKEN, BUILTIN_TYPE_NAME_UNKNOWNOBJECT,
    BUILTIN_TYPE_NAME_UNSAFEVALUEBUFFER, BUILTIN_TYPE_NAME_VEC, BUILTIN_TYPE_NAME_WORD,
    MANGLING_MODULE_CLANG_IMPORTER, MANGLING_MODULE_OBJC, STDLIB_NAME,
};
use crate::node::{Node, NodeKind};
use crate::punycode;

/// Upper bound for builtin integer, float and vector sizes.
const MAX_BUILTIN_TYPE_SIZE: usize = 4096;

impl Demangler<'_> {
    /// Reads a decimal number. `None` if no digit follows or on overflow.
    pub(super) fn demangle_natural(&mut self) -> Option<usize> {
        if !self.peek()?.is_ascii_digit() {
            return None;
        }
        let mut num: usize = 0;
        while let Some(c) = self.peek().filter(u8::is_ascii_digit) {
            num = num.checked_mul(10)?.checked_add(usize::from(c - b'0'))?;
            self.pos += 1;
        }
        Some(num)
    }

    /// Reads `_` as 0 or `<n>_` as `n + 1`.
    pub(super) fn demangle_index(&mut self) -> Result<usize> {
        if self.next_if(b'_') {
            return Ok(0);
        }
        let num = self.demangle_natural().require(self.pos)?;
        if self.next_if(b'_') {
            return num.checked_add(1).require(self.pos);
        }
        Err(self.failure())
    }

    /// [`Self::demangle_index`] shifted by one, for operators whose zero is
    /// spelled separately.
    pub(super) fn demangle_index_plus_one(&mut self) -> Result<usize> {
        let index = self.demangle_index()?;
        index.checked_add(1).require(self.pos)
    }

    pub(super) fn demangle_index_as_node(&mut self) -> Result<Node> {
        let index = self.demangle_index()?;
        Ok(Node::with_index(NodeKind::Number, index as u64))
    }

    // ── Substitutions ───────────────────────────────────────────────

    pub(super) fn demangle_multi_substitutions(&mut self) -> Result<Node> {
        let mut repeat_count: Option<usize> = None;
        loop {
            let c = self.next_char()?;
            if c == 0 {
                return Err(self.failure());
            }
            if c.is_ascii_lowercase() {
                let node = self.push_multi_substitutions(repeat_count, usize::from(c - b'a'))?;
                self.node_stack.push(node);
                repeat_count = None;
                continue;
            }
            if c.is_ascii_uppercase() {
                return self.push_multi_substitutions(repeat_count, usize::from(c - b'A'));
            }
            if c == b'_' {
                // The number was a large substitution index, not a repeat count.
                let idx = match repeat_count {
                    None => Some(26),
                    Some(n) => n.checked_add(27),
                };
                let node = idx.and_then(|idx| self.substitutions.get(idx).cloned());
                return node.require(self.pos);
            }
            self.push_back();
            repeat_count = Some(self.demangle_natural().require(self.pos)?);
        }
    }

    fn push_multi_substitutions(
        &mut self,
        repeat_count: Option<usize>,
        index: usize,
    ) -> Result<Node> {
        let repeat_count = repeat_count.unwrap_or(0);
        self.ensure(repeat_count <= self.options.max_repeat_count)?;
        let node = self.substitutions.get(index).cloned().require(self.pos)?;
        for _ in 1..repeat_count {
            self.node_stack.push(node.clone());
        }
        Ok(node)
    }

    pub(super) fn demangle_standard_substitution(&mut self) -> Result<Node> {
        match self.next_char()? {
            b'o' => Ok(Node::with_text(NodeKind::Module, MANGLING_MODULE_OBJC)),
            b'C' => Ok(Node::with_text(
                NodeKind::Module,
                MANGLING_MODULE_CLANG_IMPORTER,
            )),
            b'g' => {
                let wrapped = self.pop_kind(NodeKind::Type).require(self.pos)?;
                let optional = Node::ty(Node::with_children(
                    NodeKind::BoundGenericEnum,
                    vec![
                        stdlib_type(NodeKind::Enum, "Optional"),
                        Node::with_child(NodeKind::TypeList, wrapped),
                    ],
                ));
                self.add_substitution(optional.clone());
                Ok(optional)
            }
            _ => {
                self.push_back();
                let repeat_count = self.demangle_natural().unwrap_or(0);
                self.ensure(repeat_count <= self.options.max_repeat_count)?;
                let letter = self.next_char()?;
                let (name, kind) = standard_type_for_letter(letter).ok_or_else(|| self.failure())?;
                let node = stdlib_type(kind, name);
                for _ in 1..repeat_count {
                    self.node_stack.push(node.clone());
                }
                Ok(node)
            }
        }
    }

    // ── Identifiers ─────────────────────────────────────────────────

    pub(super) fn demangle_identifier(&mut self) -> Result<Node> {
        let mut has_word_substs = false;
        let mut is_punycoded = false;
        let c = self.peek().require(self.pos)?;
        self.ensure(c.is_ascii_digit())?;
        if c == b'0' {
            self.pos += 1;
            if self.next_if(b'0') {
                is_punycoded = true;
            } else {
                has_word_substs = true;
            }
        }

        let mut identifier = String::new();
        loop {
            while has_word_substs {
                let Some(c) = self.peek().filter(u8::is_ascii_alphabetic) else {
                    break;
                };
                self.pos += 1;
                let word_idx = if c.is_ascii_lowercase() {
                    usize::from(c - b'a')
                } else {
                    has_word_substs = false;
                    usize::from(c - b'A')
                };
                self.ensure(word_idx < self.options.max_words)?;
                let word = self.words.get(word_idx).require(self.pos)?;
                identifier.push_str(word);
            }
            if self.next_if(b'0') {
                break;
            }
            let num_chars = self.demangle_natural().require(self.pos)?;
            self.ensure(num_chars > 0)?;
            if is_punycoded {
                self.next_if(b'_');
            }
            let start = self.pos;
            let end = start.checked_add(num_chars).require(self.pos)?;
            let slice = self.slice_str(start, end)?;
            self.pos = end;
            if is_punycoded {
                let decoded = punycode::decode(slice).ok_or_else(|| self.failure())?;
                identifier.push_str(&decoded);
            } else {
                identifier.push_str(slice);
                self.record_words(slice);
            }
            if !has_word_substs {
                break;
            }
        }

        self.ensure(!identifier.is_empty())?;
        let ident = Node::with_text(NodeKind::Identifier, identifier);
        self.add_substitution(ident.clone());
        Ok(ident)
    }

    fn record_words(&mut self, slice: &str) {
        let bytes = slice.as_bytes();
        let mut word_start: Option<usize> = None;
        for idx in 0..=bytes.len() {
            let c = bytes.get(idx).copied().unwrap_or(0);
            if let Some(start) = word_start {
                if is_word_end(c, bytes[idx - 1]) {
                    if idx - start >= 2 && self.words.len() < self.options.max_words {
                        self.words.push(slice[start..idx].to_owned());
                    }
                    word_start = None;
                }
            }
            if word_start.is_none() && is_word_start(c) {
                word_start = Some(idx);
            }
        }
    }

    pub(super) fn demangle_operator_identifier(&mut self) -> Result<Node> {
        let ident = self.pop_kind(NodeKind::Identifier).require(self.pos)?;
        let mut op = String::with_capacity(ident.text().len());
        for c in ident.text().chars() {
            if !c.is_ascii() {
                op.push(c);
                continue;
            }
            self.ensure(c.is_ascii_lowercase())?;
            op.push(operator_char_for_letter(c).require(self.pos)?);
        }
        let kind = match self.next_char()? {
            b'i' => NodeKind::InfixOperator,
            b'p' => NodeKind::PrefixOperator,
            b'P' => NodeKind::PostfixOperator,
            _ => return Err(self.failure()),
        };
        Ok(Node::with_text(kind, op))
    }

    pub(super) fn demangle_local_identifier(&mut self) -> Result<Node> {
        if self.next_if(b'L') {
            let discriminator = self.pop_kind(NodeKind::Identifier).require(self.pos)?;
            let name = self.pop_if(NodeKind::is_decl_name).require(self.pos)?;
            return Ok(Node::with_children(
                NodeKind::PrivateDeclName,
                vec![discriminator, name],
            ));
        }
        if self.next_if(b'l') {
            let discriminator = self.pop_kind(NodeKind::Identifier).require(self.pos)?;
            return Ok(Node::with_child(NodeKind::PrivateDeclName, discriminator));
        }
        if let Some(c) = self
            .peek()
            .filter(|&c| matches!(c, b'a'..=b'j' | b'A'..=b'J'))
        {
            self.pos += 1;
            let kind = Node::with_text(NodeKind::Identifier, char::from(c).to_string());
            let name = self.pop().require(self.pos)?;
            return Ok(Node::with_children(
                NodeKind::RelatedEntityDeclName,
                vec![kind, name],
            ));
        }
        let discriminator = self.demangle_index_as_node()?;
        let name = self.pop_if(NodeKind::is_decl_name).require(self.pos)?;
        Ok(Node::with_children(
            NodeKind::LocalDeclName,
            vec![discriminator, name],
        ))
    }

    // ── Builtins ────────────────────────────────────────────────────

    pub(super) fn demangle_builtin_type(&mut self) -> Result<Node> {
        let name = match self.next_char()? {
            b'b' => BUILTIN_TYPE_NAME_BRIDGEOBJECT.to_owned(),
            b'B' => BUILTIN_TYPE_NAME_UNSAFEVALUEBUFFER.to_owned(),
            b'f' => {
                let size = self.demangle_builtin_size()?;
                format!("{BUILTIN_TYPE_NAME_FLOAT}{size}")
            }
            b'i' => {
                let size = self.demangle_builtin_size()?;
                format!("{BUILTIN_TYPE_NAME_INT}{size}")
            }
            b'I' => BUILTIN_TYPE_NAME_INTLITERAL.to_owned(),
            b'v' => {
                let elements = self.demangle_builtin_size()?;
                let element = self.pop_type_and_get_child()?;
                self.ensure(element.kind == NodeKind::BuiltinTypeName)?;
                let element_name = element
                    .text()
                    .strip_prefix(BUILTIN_TYPE_NAME_PREFIX)
                    .require(self.pos)?;
                format!("{BUILTIN_TYPE_NAME_VEC}{elements}x{element_name}")
            }
            b'O' => BUILTIN_TYPE_NAME_UNKNOWNOBJECT.to_owned(),
            b'o' => BUILTIN_TYPE_NAME_NATIVEOBJECT.to_owned(),
            b'p' => BUILTIN_TYPE_NAME_RAWPOINTER.to_owned(),
            b't' => BUILTIN_TYPE_NAME_SILTOKEN.to_owned(),
            b'w' => BUILTIN_TYPE_NAME_WORD.to_owned(),
            _ => return Err(self.failure()),
        };
        Ok(Node::ty(Node::with_text(NodeKind::BuiltinTypeName, name)))
    }

    fn demangle_builtin_size(&mut self) -> Result<usize> {
        let size = self.demangle_index()?.checked_sub(1).require(self.pos)?;
        self.ensure(size > 0 && size < MAX_BUILTIN_TYPE_SIZE)?;
        Ok(size)
    }
}

/// `Type(kind(Module "Swift", Identifier name))`.
fn stdlib_type(kind: NodeKind, name: &str) -> Node {
    Node::ty(Node::with_children(
        kind,
        vec![
            Node::with_text(NodeKind::Module, STDLIB_NAME),
            Node::with_text(NodeKind::Identifier, name),
        ],
    ))
}
