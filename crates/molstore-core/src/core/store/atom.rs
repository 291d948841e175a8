use super::column::column_store;
use super::{decode_char, encode_char};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Per-atom columns of a structure.
///
/// The always-present columns carry the hierarchy link (`residue_index`), the interned
/// atom type and the coordinate record. Partial charges, explicit radii, formal charges
/// and aromaticity only exist for some inputs; they are optional columns that stay
/// `None` until a loader adds them, so consumers can check for their presence once
/// instead of per atom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomStore {
    pub count: usize,
    pub length: usize,
    pub residue_index: Vec<u32>,
    pub atom_type_id: Vec<u16>,
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    pub serial: Vec<i32>,
    pub bfactor: Vec<f32>,
    pub altloc: Vec<u8>,
    pub occupancy: Vec<f32>,
    pub partial_charge: Option<Vec<f32>>,
    pub radius: Option<Vec<f32>>,
    pub formal_charge: Option<Vec<i8>>,
    pub aromatic: Option<Vec<bool>>,
}

column_store!(
    AtomStore {
        residue_index,
        atom_type_id,
        x,
        y,
        z,
        serial,
        bfactor,
        altloc,
        occupancy,
    } optional {
        partial_charge,
        radius,
        formal_charge,
        aromatic,
    }
);

impl AtomStore {
    /// Returns the position of atom `i`.
    pub fn position(&self, i: usize) -> Point3<f32> {
        Point3::new(self.x[i], self.y[i], self.z[i])
    }

    /// Sets the position of atom `i`.
    pub fn set_position(&mut self, i: usize, position: &Point3<f32>) {
        self.x[i] = position.x;
        self.y[i] = position.y;
        self.z[i] = position.z;
    }

    pub fn altloc(&self, i: usize) -> Option<char> {
        decode_char(self.altloc[i])
    }

    pub fn set_altloc(&mut self, i: usize, code: Option<char>) {
        self.altloc[i] = encode_char(code);
    }

    pub fn has_partial_charge(&self) -> bool {
        self.partial_charge.is_some()
    }

    pub fn has_radius(&self) -> bool {
        self.radius.is_some()
    }

    pub fn has_formal_charge(&self) -> bool {
        self.formal_charge.is_some()
    }

    pub fn has_aromatic(&self) -> bool {
        self.aromatic.is_some()
    }

    /// Adds the partial charge column (zero-filled) if it is not present yet.
    pub fn add_partial_charge_field(&mut self) -> &mut Vec<f32> {
        let length = self.length;
        self.partial_charge.get_or_insert_with(|| vec![0.0; length])
    }

    /// Adds the explicit radius column (zero-filled) if it is not present yet.
    pub fn add_radius_field(&mut self) -> &mut Vec<f32> {
        let length = self.length;
        self.radius.get_or_insert_with(|| vec![0.0; length])
    }

    /// Adds the formal charge column (zero-filled) if it is not present yet.
    pub fn add_formal_charge_field(&mut self) -> &mut Vec<i8> {
        let length = self.length;
        self.formal_charge.get_or_insert_with(|| vec![0; length])
    }

    /// Adds the aromaticity column (all `false`) if it is not present yet.
    pub fn add_aromatic_field(&mut self) -> &mut Vec<bool> {
        let length = self.length;
        self.aromatic.get_or_insert_with(|| vec![false; length])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::ColumnStore;

    #[test]
    fn optional_columns_are_absent_until_added() {
        let mut store = AtomStore::new(4);
        assert!(!store.has_partial_charge());
        assert!(!store.has_aromatic());

        store.add_partial_charge_field()[1] = -0.5;
        assert!(store.has_partial_charge());
        assert_eq!(store.partial_charge.as_ref().map(Vec::len), Some(4));
        assert_eq!(store.partial_charge.as_ref().map(|c| c[1]), Some(-0.5));
    }

    #[test]
    fn adding_an_existing_optional_column_keeps_its_values() {
        let mut store = AtomStore::new(2);
        store.add_radius_field()[0] = 1.7;
        store.add_radius_field();
        assert_eq!(store.radius, Some(vec![1.7, 0.0]));
    }

    #[test]
    fn growth_extends_optional_columns() {
        let mut store = AtomStore::new(1);
        store.add_formal_charge_field()[0] = -1;
        store.set_count(1);
        store.grow_if_full();
        assert_eq!(store.length(), 256);
        assert_eq!(store.formal_charge.as_ref().map(Vec::len), Some(256));
        assert_eq!(store.formal_charge.as_ref().map(|c| c[0]), Some(-1));
    }

    #[test]
    fn position_accessors_use_xyz_columns() {
        let mut store = AtomStore::new(1);
        store.set_position(0, &Point3::new(1.0, 2.0, 3.0));
        assert_eq!((store.x[0], store.y[0], store.z[0]), (1.0, 2.0, 3.0));
        assert_eq!(store.position(0), Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn altloc_is_optional_character() {
        let mut store = AtomStore::new(1);
        assert_eq!(store.altloc(0), None);
        store.set_altloc(0, Some('A'));
        assert_eq!(store.altloc(0), Some('A'));
    }
}
