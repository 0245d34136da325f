//! Substitution table entries for the remangler.
//!
//! An entry is keyed by a structural hash of its node. Identifier entries
//! compare by text only, so an `Identifier` and an operator node whose
//! translated spelling matches are the same substitution.

use crate::mangling::translate_operator_char;
use crate::node::{Node, NodeKind, Payload};

#[derive(Clone, Debug)]
pub struct SubstitutionEntry {
    node: Node,
    hash: u64,
    treat_as_identifier: bool,
}

impl SubstitutionEntry {
    pub fn new(node: Node, treat_as_identifier: bool) -> Self {
        let mut hasher = EntryHasher {
            treat_as_identifier,
            hash: 0,
        };
        hasher.deep_hash(&node);
        SubstitutionEntry {
            node,
            hash: hasher.hash,
            treat_as_identifier,
        }
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }
}

impl PartialEq for SubstitutionEntry {
    fn eq(&self, other: &Self) -> bool {
        if self.hash != other.hash || self.treat_as_identifier != other.treat_as_identifier {
            return false;
        }
        if self.treat_as_identifier {
            identifier_equals(&self.node, &other.node)
        } else {
            deep_equals(&self.node, &other.node)
        }
    }
}

impl Eq for SubstitutionEntry {}

fn is_operator(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::InfixOperator | NodeKind::PrefixOperator | NodeKind::PostfixOperator
    )
}

/// Text of `node` as it is spelled in a mangled identifier.
fn mangled_chars(node: &Node) -> impl Iterator<Item = char> + '_ {
    let translate = is_operator(node.kind);
    node.text().chars().map(move |c| {
        if translate {
            translate_operator_char(c)
        } else {
            c
        }
    })
}

fn identifier_equals(lhs: &Node, rhs: &Node) -> bool {
    if lhs.text().chars().count() != rhs.text().chars().count() {
        return false;
    }
    if lhs.kind == rhs.kind {
        return lhs.text() == rhs.text();
    }
    mangled_chars(lhs).eq(mangled_chars(rhs))
}

fn deep_equals(lhs: &Node, rhs: &Node) -> bool {
    lhs.kind == rhs.kind
        && lhs.payload == rhs.payload
        && lhs.children.len() == rhs.children.len()
        && lhs
            .children
            .iter()
            .zip(&rhs.children)
            .all(|(l, r)| deep_equals(l, r))
}

struct EntryHasher {
    treat_as_identifier: bool,
    hash: u64,
}

impl EntryHasher {
    #[inline]
    fn combine(&mut self, value: u64) {
        self.hash = self.hash.wrapping_mul(33).wrapping_add(value);
    }

    fn deep_hash(&mut self, node: &Node) {
        if self.treat_as_identifier {
            self.combine(u64::from(NodeKind::Identifier.ordinal()));
            if is_operator(node.kind) {
                for c in mangled_chars(node) {
                    self.combine(u64::from(u32::from(c)));
                }
                return;
            }
        } else {
            self.combine(u64::from(node.kind.ordinal()));
        }
        match &node.payload {
            Payload::Index(index) => self.combine(*index),
            Payload::Text(text) => {
                for c in text.chars() {
                    self.combine(u64::from(u32::from(c)));
                }
            }
            Payload::None => {}
        }
        for child in &node.children {
            self.deep_hash(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(text: &str) -> Node {
        Node::with_text(NodeKind::Identifier, text)
    }

    #[test]
    fn identifier_matches_translated_operator() {
        let plain = SubstitutionEntry::new(ident("p"), true);
        let op = SubstitutionEntry::new(Node::with_text(NodeKind::InfixOperator, "+"), true);
        assert_eq!(plain.hash(), op.hash());
        assert!(plain == op);
    }

    #[test]
    fn identifier_mode_ignores_kind() {
        let module = SubstitutionEntry::new(Node::with_text(NodeKind::Module, "main"), true);
        assert!(module == SubstitutionEntry::new(ident("main"), true));
        assert!(module != SubstitutionEntry::new(ident("main"), false));
    }

    #[test]
    fn structural_mode_compares_kinds_and_children() {
        let foo = Node::with_children(
            NodeKind::Structure,
            vec![Node::with_text(NodeKind::Module, "main"), ident("Foo")],
        );
        let same = SubstitutionEntry::new(foo.clone(), false);
        assert!(same == SubstitutionEntry::new(foo.clone(), false));

        let class = SubstitutionEntry::new(foo.clone().changing_kind(NodeKind::Class), false);
        assert!(same != class);

        let mut longer = foo;
        longer.add_child(ident("x"));
        assert!(same != SubstitutionEntry::new(longer, false));
    }
}
