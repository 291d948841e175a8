//! # molstore
//!
//! A column-oriented molecular structure model with topology and spatial indexing.
//!
//! ## Architectural Philosophy
//!
//! Structures are stored as parallel columns per entity level (atoms, residues, chains,
//! models, bonds) and read through lightweight proxies. Repeated residue and atom
//! descriptors are interned once per unique type. Everything derived from the columns
//! (bond adjacency, spatial grid, selection results) lives in explicit indices that are
//! rebuilt when the underlying data changes.
//!
//! - **[`core`]: The Data Model.** Column stores, type registries, proxies and the owning
//!   [`Structure`](core::structure::Structure) with its builder, bond calculation,
//!   selections and bulk data extraction.
//!
//! - **[`index`]: The Query Layer.** Bitsets as the universal selection result, the bond
//!   adjacency index, the uniform spatial grid, the k-d tree and the contact search
//!   built on it.
//!
//! - **[`align`]: Rigid Superposition.** Optimal rotation and translation between two
//!   equally sized point sets, applicable to whole structures.
//!
//! - **[`config`]: Tunable Parameters.** Bonding and grid parameters loadable from TOML,
//!   and the contact search configuration.

pub mod align;
pub mod config;
pub mod core;
pub mod index;
