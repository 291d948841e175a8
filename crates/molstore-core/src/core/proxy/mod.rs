//! # Proxies
//!
//! Lightweight cursors that pair a borrowed [`Structure`](crate::core::structure::Structure)
//! with a row index and expose the row as named, derived properties.
//!
//! ## Key Components
//!
//! - **[`AtomProxy`] / [`AtomProxyMut`]** - Atom columns, type-derived data, bonds through
//!   the adjacency index, the covalent connectivity test
//! - **[`ResidueProxy`]** - Atom range, residue type classification, backbone atoms and
//!   connectivity to neighboring residues
//! - **[`ChainProxy`] / [`ModelProxy`]** - Ranges, iteration and polymer segmentation
//! - **[`BondProxy`]** - Bond endpoints, reference atoms and multiple-bond offsets
//! - **[`Polymer`]** - A connected run of residues inside one chain
//!
//! Proxies are `Copy` and hold a shared borrow of the structure, so any number of them
//! can be alive at once. Cross-entity properties are derived through the parent index
//! and offset columns; nothing is cached in the proxy itself.

pub mod atom;
pub mod bond;
pub mod chain;
pub mod model;
pub mod polymer;
pub mod residue;

pub use atom::{AtomProxy, AtomProxyMut};
pub use bond::BondProxy;
pub use chain::ChainProxy;
pub use model::ModelProxy;
pub use polymer::{Polymer, PolymerAtom};
pub use residue::ResidueProxy;
