use crate::core::proxy::{AtomProxy, ChainProxy, ModelProxy, ResidueProxy};
use itertools::Itertools;
use std::fmt;

/// A predicate over the atoms of a structure.
///
/// `test` decides for single atoms. The residue, chain and model tests are
/// prefilters used by the hierarchical iterators: returning `false` promises that no
/// atom of that entity passes `test`, so the whole range is skipped. The defaults
/// never prune.
///
/// `string` is the canonical form of the selection. It keys the atom-set cache of a
/// structure, so two selections with the same string must select the same atoms.
pub trait Selection: Sync {
    fn string(&self) -> String;

    fn test(&self, atom: &AtomProxy<'_>) -> bool;

    fn residue_test(&self, _residue: &ResidueProxy<'_>) -> bool {
        true
    }

    fn chain_test(&self, _chain: &ChainProxy<'_>) -> bool {
        true
    }

    fn model_test(&self, _model: &ModelProxy<'_>) -> bool {
        true
    }
}

/// A selection backed by an atom predicate closure.
pub struct FnSelection<F> {
    string: String,
    test: F,
}

impl<F> FnSelection<F>
where
    F: Fn(&AtomProxy<'_>) -> bool + Sync,
{
    pub fn new(string: &str, test: F) -> Self {
        Self {
            string: string.to_string(),
            test,
        }
    }
}

impl<F> Selection for FnSelection<F>
where
    F: Fn(&AtomProxy<'_>) -> bool + Sync,
{
    fn string(&self) -> String {
        self.string.clone()
    }

    fn test(&self, atom: &AtomProxy<'_>) -> bool {
        (self.test)(atom)
    }
}

/// Composable atom selection.
///
/// The [`Display`](fmt::Display) form is the canonical selection string, e.g.
/// `(:A and .CA)` or `not [HOH]`.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomSelection {
    /// Every atom, `*`.
    All,
    /// Atoms of one model, `/0`.
    Model(usize),
    /// Atoms of chains with the given name, `:A`.
    Chain(String),
    /// Atoms of residues with the given name, `[ALA]`.
    ResidueName(String),
    /// Atoms of residues numbered in the inclusive range, `10-20`.
    ResidueNumbers(i32, i32),
    /// Atoms with the given name, `.CA`.
    AtomName(String),
    /// Atoms of the given element, `_C`.
    Element(String),
    /// Atoms with the given global indices, `@0,1,2`.
    Indices(Vec<usize>),
    Protein,
    Nucleic,
    Backbone,
    Sidechain,
    Hetero,
    Water,
    And(Vec<AtomSelection>),
    Or(Vec<AtomSelection>),
    Not(Box<AtomSelection>),
}

impl AtomSelection {
    pub fn and(self, other: AtomSelection) -> Self {
        match self {
            AtomSelection::And(mut parts) => {
                parts.push(other);
                AtomSelection::And(parts)
            }
            first => AtomSelection::And(vec![first, other]),
        }
    }

    pub fn or(self, other: AtomSelection) -> Self {
        match self {
            AtomSelection::Or(mut parts) => {
                parts.push(other);
                AtomSelection::Or(parts)
            }
            first => AtomSelection::Or(vec![first, other]),
        }
    }

    pub fn negate(self) -> Self {
        AtomSelection::Not(Box::new(self))
    }
}

impl fmt::Display for AtomSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomSelection::All => write!(f, "*"),
            AtomSelection::Model(index) => write!(f, "/{index}"),
            AtomSelection::Chain(name) => write!(f, ":{name}"),
            AtomSelection::ResidueName(name) => write!(f, "[{name}]"),
            AtomSelection::ResidueNumbers(start, end) => write!(f, "{start}-{end}"),
            AtomSelection::AtomName(name) => write!(f, ".{name}"),
            AtomSelection::Element(element) => write!(f, "_{element}"),
            AtomSelection::Indices(indices) => write!(f, "@{}", indices.iter().join(",")),
            AtomSelection::Protein => write!(f, "protein"),
            AtomSelection::Nucleic => write!(f, "nucleic"),
            AtomSelection::Backbone => write!(f, "backbone"),
            AtomSelection::Sidechain => write!(f, "sidechain"),
            AtomSelection::Hetero => write!(f, "hetero"),
            AtomSelection::Water => write!(f, "water"),
            AtomSelection::And(parts) => write!(f, "({})", parts.iter().join(" and ")),
            AtomSelection::Or(parts) => write!(f, "({})", parts.iter().join(" or ")),
            AtomSelection::Not(inner) => write!(f, "not {inner}"),
        }
    }
}

impl Selection for AtomSelection {
    fn string(&self) -> String {
        self.to_string()
    }

    fn test(&self, atom: &AtomProxy<'_>) -> bool {
        match self {
            AtomSelection::All => true,
            AtomSelection::Model(index) => atom.model_index() == *index,
            AtomSelection::Chain(name) => atom.chainname() == name,
            AtomSelection::ResidueName(name) => atom.resname().eq_ignore_ascii_case(name),
            AtomSelection::ResidueNumbers(start, end) => (*start..=*end).contains(&atom.resno()),
            AtomSelection::AtomName(name) => atom.atomname() == name,
            AtomSelection::Element(element) => atom.element().eq_ignore_ascii_case(element),
            AtomSelection::Indices(indices) => indices.contains(&atom.index),
            AtomSelection::Protein => atom.is_protein(),
            AtomSelection::Nucleic => atom.is_nucleic(),
            AtomSelection::Backbone => atom.is_backbone(),
            AtomSelection::Sidechain => atom.is_sidechain(),
            AtomSelection::Hetero => atom.is_hetero(),
            AtomSelection::Water => atom.is_water(),
            AtomSelection::And(parts) => parts.iter().all(|s| s.test(atom)),
            AtomSelection::Or(parts) => parts.iter().any(|s| s.test(atom)),
            AtomSelection::Not(inner) => !inner.test(atom),
        }
    }

    fn residue_test(&self, residue: &ResidueProxy<'_>) -> bool {
        match self {
            AtomSelection::Chain(name) => residue.chainname() == name,
            AtomSelection::ResidueName(name) => residue.resname().eq_ignore_ascii_case(name),
            AtomSelection::ResidueNumbers(start, end) => (*start..=*end).contains(&residue.resno()),
            AtomSelection::Protein => residue.is_protein(),
            AtomSelection::Nucleic => residue.is_nucleic(),
            AtomSelection::Backbone | AtomSelection::Sidechain => residue.is_polymer(),
            AtomSelection::Hetero => residue.is_hetero(),
            AtomSelection::Water => residue.is_water(),
            AtomSelection::And(parts) => parts.iter().all(|s| s.residue_test(residue)),
            AtomSelection::Or(parts) => parts.iter().any(|s| s.residue_test(residue)),
            _ => true,
        }
    }

    fn chain_test(&self, chain: &ChainProxy<'_>) -> bool {
        match self {
            AtomSelection::Model(index) => chain.model_index() == *index,
            AtomSelection::Chain(name) => chain.chainname() == name,
            AtomSelection::And(parts) => parts.iter().all(|s| s.chain_test(chain)),
            AtomSelection::Or(parts) => parts.iter().any(|s| s.chain_test(chain)),
            _ => true,
        }
    }

    fn model_test(&self, model: &ModelProxy<'_>) -> bool {
        match self {
            AtomSelection::Model(index) => model.index == *index,
            AtomSelection::And(parts) => parts.iter().all(|s| s.model_test(model)),
            AtomSelection::Or(parts) => parts.iter().any(|s| s.model_test(model)),
            _ => true,
        }
    }
}
