//! # Type Registries
//!
//! Interning of the per-atom and per-residue descriptors that repeat across a
//! structure. Stores keep only a 16-bit type id per row; the registries own one
//! descriptor per distinct content.
//!
//! ## Key Components
//!
//! - **[`AtomTypeRegistry`] / [`AtomType`]** - Atom name, element and radii
//! - **[`ResidueTypeRegistry`] / [`ResidueType`]** - Residue name, atom list, classification
//!   and lazily derived intra-residue topology (bond graph, rings, reference atoms)
//! - **[`constants`]** - Static residue and element tables
//! - **[`rings`]** - Depth-first ring membership search

pub mod atom_type;
pub mod constants;
pub mod residue_type;
pub mod rings;

pub use atom_type::{AtomType, AtomTypeRegistry};
pub use constants::{BackbonePosition, BackboneType, MoleculeType};
pub use residue_type::{BondGraph, ResidueBonds, ResidueType, ResidueTypeKey, ResidueTypeRegistry};
pub use rings::RingData;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TypeRegistryError {
    #[error("The {registry} type registry is full ({capacity} types)")]
    Full {
        registry: &'static str,
        capacity: usize,
    },
}
