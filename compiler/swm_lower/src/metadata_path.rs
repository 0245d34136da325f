//! Paths from a metadata source to the metadata it can produce.
//!
//! A path is a sequence of loads and calls starting at a type metadata or
//! witness table the caller passed in. Fulfillment search keeps the
//! cheapest path per requirement, so every step carries an abstract cost.

use std::fmt;

use smallvec::SmallVec;

use crate::error::fatal;

/// Abstract cost of one runtime operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationCost {
    Free = 0,
    Arithmetic = 1,
    Load = 3,
    Call = 10,
}

impl OperationCost {
    pub fn value(self) -> u32 {
        self as u32
    }
}

/// One step of a [`MetadataPath`]. Indices are requirement or witness
/// table slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathComponent {
    /// Associated conformance at a witness index of a protocol.
    AssociatedConformance(usize),
    /// Inherited protocol at a witness index.
    OutOfLineBaseProtocol(usize),
    /// Witness table at a requirement index of a generic nominal type.
    NominalTypeArgumentConformance(usize),
    /// Type metadata at a requirement index of a generic nominal type.
    NominalTypeArgument(usize),
    /// Conditional conformance at an index of a conformance.
    ConditionalConformance(usize),
    /// A step that traps if it is ever followed.
    Impossible,
}

impl PathComponent {
    pub fn index(self) -> Option<usize> {
        match self {
            PathComponent::AssociatedConformance(index)
            | PathComponent::OutOfLineBaseProtocol(index)
            | PathComponent::NominalTypeArgumentConformance(index)
            | PathComponent::NominalTypeArgument(index)
            | PathComponent::ConditionalConformance(index) => Some(index),
            PathComponent::Impossible => None,
        }
    }

    pub fn cost(self) -> OperationCost {
        match self {
            PathComponent::OutOfLineBaseProtocol(_)
            | PathComponent::NominalTypeArgumentConformance(_)
            | PathComponent::NominalTypeArgument(_)
            | PathComponent::ConditionalConformance(_) => OperationCost::Load,
            PathComponent::AssociatedConformance(_) => OperationCost::Call,
            PathComponent::Impossible => fatal("cannot compute the cost of an impossible path"),
        }
    }
}

/// A path from one source metadata to another.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MetadataPath {
    components: SmallVec<[PathComponent; 4]>,
}

impl MetadataPath {
    pub fn new() -> Self {
        MetadataPath::default()
    }

    pub fn components(&self) -> &[PathComponent] {
        &self.components
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Sum of the component costs; the empty path is free.
    pub fn cost(&self) -> u32 {
        self.components
            .iter()
            .map(|component| component.cost().value())
            .sum()
    }

    pub fn add_impossible(&mut self) {
        self.components.push(PathComponent::Impossible);
    }

    pub fn add_nominal_type_argument(&mut self, index: usize) {
        self.components.push(PathComponent::NominalTypeArgument(index));
    }

    pub fn add_nominal_type_argument_conformance(&mut self, index: usize) {
        self.components
            .push(PathComponent::NominalTypeArgumentConformance(index));
    }

    pub fn add_inherited_protocol(&mut self, index: usize) {
        self.components.push(PathComponent::OutOfLineBaseProtocol(index));
    }

    pub fn add_associated_conformance(&mut self, index: usize) {
        self.components.push(PathComponent::AssociatedConformance(index));
    }

    pub fn add_conditional_conformance(&mut self, index: usize) {
        self.components.push(PathComponent::ConditionalConformance(index));
    }
}

impl fmt::Display for MetadataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("<source>");
        }
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            match component {
                PathComponent::AssociatedConformance(index) => {
                    write!(f, "assoc_conformance[{index}]")?;
                }
                PathComponent::OutOfLineBaseProtocol(index) => write!(f, "base_protocol[{index}]")?,
                PathComponent::NominalTypeArgumentConformance(index) => {
                    write!(f, "type_argument_conformance[{index}]")?;
                }
                PathComponent::NominalTypeArgument(index) => write!(f, "type_argument[{index}]")?,
                PathComponent::ConditionalConformance(index) => {
                    write!(f, "conditional_conformance[{index}]")?;
                }
                PathComponent::Impossible => f.write_str("impossible")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_path_is_free() {
        assert_eq!(MetadataPath::new().cost(), OperationCost::Free.value());
    }

    #[test]
    fn costs_add_up() {
        let mut path = MetadataPath::new();
        path.add_nominal_type_argument(0);
        path.add_nominal_type_argument_conformance(1);
        path.add_associated_conformance(2);
        assert_eq!(path.cost(), 3 + 3 + 10);
        assert_eq!(
            path.components().iter().map(|c| c.index()).collect::<Vec<_>>(),
            vec![Some(0), Some(1), Some(2)]
        );
        assert_eq!(
            path.to_string(),
            "type_argument[0] -> type_argument_conformance[1] -> assoc_conformance[2]"
        );
    }

    #[test]
    fn cost_ordering() {
        assert!(OperationCost::Free < OperationCost::Arithmetic);
        assert!(OperationCost::Arithmetic < OperationCost::Load);
        assert!(OperationCost::Load < OperationCost::Call);
    }

    #[test]
    #[should_panic(expected = "impossible path")]
    fn impossible_path_has_no_cost() {
        let mut path = MetadataPath::new();
        path.add_inherited_protocol(0);
        path.add_impossible();
        let _ = path.cost();
    }
}
