use crate::core::store::BondStore;
use tracing::{debug, instrument};

/// Per-atom lists of incident bond indices in compressed sparse row layout.
///
/// The bonds of atom `i` are `index_array[offset_array[i]..offset_array[i] + count_array[i]]`.
/// Every bond is listed under both of its atoms. The index is not maintained
/// incrementally: it has to be rebuilt after bonds are added or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct BondHash {
    pub count_array: Vec<u32>,
    pub offset_array: Vec<u32>,
    pub index_array: Vec<u32>,
}

impl BondHash {
    /// Builds the adjacency index of the bonds in `bond_store` over `atom_count` atoms.
    #[instrument(level = "debug", skip_all, name = "bond_hash_build")]
    pub fn new(bond_store: &BondStore, atom_count: usize) -> Self {
        let bond_count = bond_store.count;
        let mut count_array = vec![0u32; atom_count];
        let mut offset_array = vec![0u32; atom_count];
        let mut index_array = vec![u32::MAX; 2 * bond_count];

        for i in 0..bond_count {
            count_array[bond_store.atom_index1[i] as usize] += 1;
            count_array[bond_store.atom_index2[i] as usize] += 1;
        }

        let mut sum = 0;
        for (offset, &count) in offset_array.iter_mut().zip(&count_array) {
            *offset = sum;
            sum += count;
        }

        let mut cursor = offset_array.clone();
        for i in 0..bond_count {
            for atom in [bond_store.atom_index1[i], bond_store.atom_index2[i]] {
                let slot = &mut cursor[atom as usize];
                index_array[*slot as usize] = i as u32;
                *slot += 1;
            }
        }

        debug!(atoms = atom_count, bonds = bond_count, "Built bond adjacency index");

        Self {
            count_array,
            offset_array,
            index_array,
        }
    }

    /// Indices of the bonds incident to `atom`.
    pub fn bond_indices(&self, atom: usize) -> &[u32] {
        let offset = self.offset_array[atom] as usize;
        let count = self.count_array[atom] as usize;
        &self.index_array[offset..offset + count]
    }

    pub fn bond_count(&self, atom: usize) -> usize {
        self.count_array[atom] as usize
    }

    pub fn atom_count(&self) -> usize {
        self.count_array.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(bonds: &[(usize, usize)]) -> BondStore {
        let mut store = BondStore::default();
        for &(a, b) in bonds {
            store.add_bond(a, b, 1);
        }
        store
    }

    #[test]
    fn middle_atom_of_a_chain_lists_both_bonds() {
        let hash = BondHash::new(&store(&[(0, 1), (1, 2)]), 3);
        let mut middle = hash.bond_indices(1).to_vec();
        middle.sort_unstable();
        assert_eq!(middle, vec![0, 1]);
        assert_eq!(hash.bond_indices(0), &[0]);
        assert_eq!(hash.bond_indices(2), &[1]);
    }

    #[test]
    fn offsets_are_an_exclusive_prefix_sum() {
        let hash = BondHash::new(&store(&[(0, 1), (1, 2), (1, 3)]), 5);
        assert_eq!(hash.count_array, vec![1, 3, 1, 1, 0]);
        assert_eq!(hash.offset_array, vec![0, 1, 4, 5, 6]);
        assert_eq!(hash.index_array.len(), 6);
        assert!(hash.index_array.iter().all(|&i| i != u32::MAX));
    }

    #[test]
    fn unbonded_atoms_have_empty_lists() {
        let hash = BondHash::new(&store(&[(2, 3)]), 6);
        assert!(hash.bond_indices(0).is_empty());
        assert!(hash.bond_indices(5).is_empty());
        assert_eq!(hash.bond_count(3), 1);
    }
}
