use super::selection::Selection;
use super::{Structure, bond_set_in};
use crate::index::bitset::BitSet;
use nalgebra::Point3;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

fn selects_everything(selection: &dyn Selection) -> bool {
    matches!(selection.string().as_str(), "" | "*")
}

impl Structure {
    /// Evaluates a selection into a fresh atom set.
    ///
    /// No selection, an empty selection string and `*` select every atom.
    pub fn select(&self, selection: Option<&dyn Selection>) -> BitSet {
        let count = self.atom_store.count;
        match selection {
            Some(selection) if !selects_everything(selection) => {
                let mut atom_set = BitSet::new(count);
                self.each_atom(Some(selection), |atom| atom_set.set(atom.index));
                atom_set
            }
            _ => BitSet::filled(count),
        }
    }

    /// The atom set of a selection, memoized by the selection's canonical string.
    ///
    /// Without a selection the full atom set built by [`Structure::finalize_atoms`] is
    /// returned.
    pub fn atom_set(&mut self, selection: Option<&dyn Selection>) -> &BitSet {
        let Some(selection) = selection else {
            return &self.atom_set;
        };
        let key = selection.string();
        if !self.atom_set_cache.contains_key(&key) {
            let atom_set = self.select(Some(selection));
            debug!(selection = %key, atoms = atom_set.size(), "Cached atom set");
            self.atom_set_cache.insert(key.clone(), atom_set);
        }
        &self.atom_set_cache[&key]
    }

    /// The full atom set built by [`Structure::finalize_atoms`].
    pub fn atom_set_all(&self) -> &BitSet {
        &self.atom_set
    }

    /// Drops every memoized selection result.
    pub fn invalidate_atom_set_cache(&mut self) {
        self.atom_set_cache.clear();
    }

    /// Atoms within `radius` of any selected atom, the selected atoms included.
    ///
    /// Returns an empty set before the spatial grid is built.
    pub fn atom_set_within_selection(&self, selection: Option<&dyn Selection>, radius: f32) -> BitSet {
        let mut atom_set = BitSet::new(self.atom_store.count);
        let Some(spatial_hash) = self.spatial_hash.as_ref() else {
            return atom_set;
        };
        let selected = self.select(selection);

        #[cfg(feature = "parallel")]
        {
            let hits: Vec<Vec<usize>> = selected
                .to_vec()
                .par_iter()
                .map(|&i| spatial_hash.within(&self.atom_store.position(i), radius))
                .collect();
            for indices in &hits {
                atom_set.set_bits(indices);
            }
        }

        #[cfg(not(feature = "parallel"))]
        for i in selected.iter() {
            spatial_hash.each_within(&self.atom_store.position(i), radius, |j, _| {
                atom_set.set(j)
            });
        }

        atom_set
    }

    /// Atoms within `radius` of `point`.
    pub fn atom_set_within_point(&self, point: &Point3<f32>, radius: f32) -> BitSet {
        let mut atom_set = BitSet::new(self.atom_store.count);
        if let Some(spatial_hash) = self.spatial_hash.as_ref() {
            spatial_hash.each_within(point, radius, |j, _| atom_set.set(j));
        }
        atom_set
    }

    /// Every atom of each residue that contains a selected atom.
    pub fn atom_set_within_group(&self, selection: Option<&dyn Selection>) -> BitSet {
        let mut atom_set = BitSet::new(self.atom_store.count);
        let mut last_residue = None;
        for i in self.select(selection).iter() {
            let residue = self.atom(i).residue();
            if last_residue == Some(residue.index) {
                continue;
            }
            last_residue = Some(residue.index);
            if residue.atom_count() > 0 {
                atom_set.set_range(residue.atom_offset(), residue.atom_end() - 1);
            }
        }
        atom_set
    }

    /// Bonds with both atoms in the full atom set, as built by
    /// [`Structure::finalize_bonds`].
    pub fn bond_set(&self) -> &BitSet {
        &self.bond_set
    }

    /// Bonds of the covalent bond store with both atoms in `atom_set`.
    pub fn bond_set_for(&self, atom_set: &BitSet) -> BitSet {
        bond_set_in(&self.bond_store, atom_set)
    }

    /// Atoms that take part in a backbone bond, if backbone bonds were calculated.
    pub fn backbone_atom_set(&self) -> Option<&BitSet> {
        self.backbone_atom_set.as_ref()
    }

    /// Atoms that take part in a rung bond.
    pub fn rung_atom_set(&self) -> Option<&BitSet> {
        self.rung_atom_set.as_ref()
    }

    pub(crate) fn set_backbone_atom_set(&mut self, atom_set: BitSet) {
        self.backbone_atom_set = Some(atom_set);
    }

    pub(crate) fn set_rung_atom_set(&mut self, atom_set: BitSet) {
        self.rung_atom_set = Some(atom_set);
    }

    /// Backbone bonds with both atoms in the backbone atom set; all backbone bonds if
    /// there is no such set.
    pub fn backbone_bond_set(&self) -> BitSet {
        match self.backbone_atom_set.as_ref() {
            Some(atom_set) => bond_set_in(&self.backbone_bond_store, atom_set),
            None => BitSet::filled(self.backbone_bond_store.count),
        }
    }

    /// Rung bonds with both atoms in the rung atom set; all rung bonds if there is no
    /// such set.
    pub fn rung_bond_set(&self) -> BitSet {
        match self.rung_atom_set.as_ref() {
            Some(atom_set) => bond_set_in(&self.rung_bond_store, atom_set),
            None => BitSet::filled(self.rung_bond_store.count),
        }
    }
}
