//! # Entity Stores
//!
//! Column-oriented storage for every entity of a structure. Each store is a struct of
//! parallel `Vec` columns sharing one row count, implementing [`ColumnStore`] for
//! growth, bulk copies and sorting.
//!
//! ## Key Components
//!
//! - **[`ColumnStore`]** - The shared store contract (capacity, growth, row copies, sort)
//! - **[`AtomStore`]** - Coordinates, B-factor, alternate location and per-atom type ids
//! - **[`ResidueStore`]** - Atom ranges, residue numbers, secondary structure codes
//! - **[`ChainStore`]** - Residue ranges and fixed-width chain names/ids
//! - **[`ModelStore`]** - Chain ranges
//! - **[`BondStore`]** - Bond endpoint pairs and bond orders
//!
//! The hierarchy is encoded through offset/count columns: a model owns a contiguous run
//! of chains, a chain a contiguous run of residues, a residue a contiguous run of atoms.
//! Child rows point back to their parent through an index column, so no proxy ever needs
//! to search for its parent.

pub mod atom;
pub mod bond;
pub mod chain;
pub mod column;
pub mod model;
pub mod residue;

pub use atom::AtomStore;
pub use bond::BondStore;
pub use chain::ChainStore;
pub use column::ColumnStore;
pub use model::ModelStore;
pub use residue::ResidueStore;

/// Width of the fixed chain name and chain id columns.
pub const FIXED_NAME_WIDTH: usize = 4;

/// Encodes a string into a zero-padded fixed-width column value.
///
/// Longer values are truncated at the last character boundary that fits.
pub fn encode_fixed(value: &str) -> [u8; FIXED_NAME_WIDTH] {
    let end = (0..=value.len().min(FIXED_NAME_WIDTH))
        .rev()
        .find(|&i| value.is_char_boundary(i))
        .unwrap_or(0);
    let mut out = [0u8; FIXED_NAME_WIDTH];
    out[..end].copy_from_slice(&value.as_bytes()[..end]);
    out
}

/// Decodes a fixed-width column value, stopping at the first zero byte.
pub fn decode_fixed(value: &[u8; FIXED_NAME_WIDTH]) -> &str {
    let end = value.iter().position(|&b| b == 0).unwrap_or(FIXED_NAME_WIDTH);
    std::str::from_utf8(&value[..end]).unwrap_or("")
}

/// Encodes an optional single-character code, using `0` for "not set".
pub fn encode_char(value: Option<char>) -> u8 {
    value.filter(char::is_ascii).map_or(0, |c| c as u8)
}

/// Decodes a single-character code column value.
pub fn decode_char(value: u8) -> Option<char> {
    (value != 0).then_some(value as char)
}
