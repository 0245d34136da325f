//! Symbolic references embedded in mangled names.
//!
//! A mangled name emitted into a binary may contain control bytes that
//! point at a context descriptor or accessor function instead of spelling
//! the entity out. The demangler cannot follow those pointers itself; a
//! [`SymbolicResolver`] supplied by the caller turns each reference into a
//! tree. The remangler needs the inverse for symbolic-reference nodes, which
//! a [`RemangleResolver`] provides.

use crate::node::{Directness, Node, SymbolicReferenceKind};

/// One symbolic reference found in the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolicReference {
    pub kind: SymbolicReferenceKind,
    pub directness: Directness,
    /// Offset of the control byte in the mangled name.
    pub position: usize,
    /// Relative offset stored after the control byte.
    pub offset: i32,
}

impl SymbolicReference {
    /// Control-byte encodings understood by the demangler.
    pub fn from_control_byte(byte: u8) -> Option<(SymbolicReferenceKind, Directness)> {
        match byte {
            0x01 => Some((SymbolicReferenceKind::Context, Directness::Direct)),
            0x02 => Some((SymbolicReferenceKind::Context, Directness::Indirect)),
            0x09 => Some((
                SymbolicReferenceKind::AccessorFunctionReference,
                Directness::Direct,
            )),
            0x0A => Some((
                SymbolicReferenceKind::AccessorFunctionReference,
                Directness::Indirect,
            )),
            _ => None,
        }
    }

    /// Address the reference points at, relative to the start of the
    /// mangled name. Indirect references point at a pointer to the target.
    pub fn target(&self) -> i64 {
        // Mangled names are far shorter than i64::MAX.
        #[allow(clippy::cast_possible_wrap)]
        let position = self.position as i64;
        position + i64::from(self.offset)
    }
}

/// Resolves symbolic references while demangling.
///
/// Returning `None` aborts the demangling.
pub trait SymbolicResolver {
    fn resolve(&mut self, reference: &SymbolicReference) -> Option<Node>;
}

impl<F> SymbolicResolver for F
where
    F: FnMut(&SymbolicReference) -> Option<Node>,
{
    fn resolve(&mut self, reference: &SymbolicReference) -> Option<Node> {
        self(reference)
    }
}

/// Expands symbolic-reference nodes while remangling.
///
/// `reference` is the index payload of the symbolic-reference node.
pub trait RemangleResolver {
    fn resolve(&mut self, kind: SymbolicReferenceKind, reference: u64) -> Node;
}

impl<F> RemangleResolver for F
where
    F: FnMut(SymbolicReferenceKind, u64) -> Node,
{
    fn resolve(&mut self, kind: SymbolicReferenceKind, reference: u64) -> Node {
        self(kind, reference)
    }
}
