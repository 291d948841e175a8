//! # Index Module
//!
//! Derived lookup structures over a structure's atoms and bonds.
//!
//! ## Key Components
//!
//! - **[`BitSet`]** - Packed membership over atom or bond indices with range operations and
//!   set algebra; the result type of every selection
//! - **[`BondHash`]** - Per-atom list of incident bond indices in compressed form
//! - **[`SpatialHash`]** - Uniform grid over atom coordinates for radius queries
//! - **[`Kdtree`]** - Nearest and radius queries over an arbitrary indexed point set
//! - **[`Contact`]** - Proximity search between two structure views, and polar contact
//!   detection on top of it
//!
//! None of these indices track changes to the data they were built from. The bond hash
//! has to be rebuilt after bonds change, the spatial grid after coordinates change.

pub mod bitset;
pub mod bond_hash;
pub mod contact;
pub mod kdtree;
pub mod spatial_hash;

pub use bitset::BitSet;
pub use bond_hash::BondHash;
pub use contact::{Contact, ContactData, polar_backbone_contacts, polar_contacts};
pub use kdtree::{Kdtree, Metric, Neighbor};
pub use spatial_hash::SpatialHash;
