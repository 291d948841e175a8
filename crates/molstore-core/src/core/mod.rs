//! # Core Module
//!
//! The structure data model: storage, interning, row access and the owning structure.
//!
//! ## Architecture
//!
//! - **Column Storage** ([`store`]) - Growable parallel-column tables for every entity
//! - **Type Interning** ([`types`]) - Atom and residue type registries, element and residue
//!   tables, ring detection
//! - **Row Access** ([`proxy`]) - Borrowing cursors over atoms, residues, chains, models,
//!   bonds and polymers
//! - **Structures** ([`structure`]) - The owning container, its builder, bond calculation,
//!   selections and views
//! - **Geometry** ([`utils`]) - Bounding boxes, centroids and RMSD
//!
//! ## Key Capabilities
//!
//! - **Contiguous hierarchy** so every level iterates by index range in ascending order
//! - **Lazy per-type derived data** computed once per unique residue type
//! - **Automatic bonding** from covalent radii, residue templates and backbone linking

pub mod proxy;
pub mod store;
pub mod structure;
pub mod types;
pub mod utils;
