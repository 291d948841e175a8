use super::column::{ColumnStore, column_store};
use crate::core::proxy::AtomProxy;
use serde::{Deserialize, Serialize};

/// Flat list of bonds as `(atom_index1, atom_index2, bond_order)` rows.
///
/// The same schema is used for covalent bonds, backbone trace bonds and rung
/// pseudo-bonds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondStore {
    pub count: usize,
    pub length: usize,
    pub atom_index1: Vec<u32>,
    pub atom_index2: Vec<u32>,
    pub bond_order: Vec<i8>,
}

column_store!(BondStore {
    atom_index1,
    atom_index2,
    bond_order,
});

impl BondStore {
    /// Appends a bond, growing the store if needed.
    ///
    /// # Arguments
    ///
    /// * `atom_index1` - Global index of the first atom.
    /// * `atom_index2` - Global index of the second atom.
    /// * `bond_order` - Bond order, `1` for single bonds and pseudo-bonds.
    pub fn add_bond(&mut self, atom_index1: usize, atom_index2: usize, bond_order: i8) {
        self.grow_if_full();
        let i = self.count;
        self.atom_index1[i] = atom_index1 as u32;
        self.atom_index2[i] = atom_index2 as u32;
        self.bond_order[i] = bond_order;
        self.count += 1;
    }

    /// Appends a bond between two atoms only if they are geometrically connected.
    ///
    /// # Return
    ///
    /// Returns `true` if the bond was added.
    pub fn add_bond_if_connected(
        &mut self,
        atom1: &AtomProxy<'_>,
        atom2: &AtomProxy<'_>,
        bond_order: i8,
    ) -> bool {
        if atom1.connected_to(atom2) {
            self.add_bond(atom1.index, atom2.index, bond_order);
            true
        } else {
            false
        }
    }

    pub fn atom_indices(&self, i: usize) -> (usize, usize) {
        (self.atom_index1[i] as usize, self.atom_index2[i] as usize)
    }

    /// Iterates over the bonds in use as `(atom_index1, atom_index2, bond_order)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, i8)> + '_ {
        (0..self.count).map(|i| {
            (
                self.atom_index1[i] as usize,
                self.atom_index2[i] as usize,
                self.bond_order[i],
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::structure::test_utils::build_dipeptide;

    #[test]
    fn add_bond_grows_and_appends() {
        let mut store = BondStore::default();
        for i in 0..300 {
            store.add_bond(i, i + 1, 1);
        }
        assert_eq!(store.count(), 300);
        assert!(store.length() >= 300);
        assert_eq!(store.atom_indices(0), (0, 1));
        assert_eq!(store.atom_indices(299), (299, 300));
    }

    #[test]
    fn iter_yields_rows_in_order() {
        let mut store = BondStore::new(4);
        store.add_bond(0, 1, 1);
        store.add_bond(1, 2, 2);
        let rows: Vec<_> = store.iter().collect();
        assert_eq!(rows, vec![(0, 1, 1), (1, 2, 2)]);
    }

    #[test]
    fn sort_keeps_bond_columns_together() {
        let mut store = BondStore::new(3);
        store.add_bond(5, 6, 1);
        store.add_bond(1, 2, 3);
        store.add_bond(3, 4, 2);
        store.sort_by(|s, a, b| s.atom_index1[a].cmp(&s.atom_index1[b]));
        let rows: Vec<_> = store.iter().collect();
        assert_eq!(rows, vec![(1, 2, 3), (3, 4, 2), (5, 6, 1)]);
    }

    #[test]
    fn add_bond_if_connected_checks_geometry() {
        let structure = build_dipeptide();
        let mut store = BondStore::default();
        assert!(store.add_bond_if_connected(&structure.atom(1), &structure.atom(2), 1));
        assert!(!store.add_bond_if_connected(&structure.atom(0), &structure.atom(9), 1));
        assert_eq!(store.count(), 1);
        assert_eq!(store.iter().collect::<Vec<_>>(), vec![(1, 2, 1)]);
    }
}
