use super::Structure;
use super::selection::Selection;
use crate::core::proxy::AtomProxy;
use crate::core::utils::geometry::BoundingBox;
use crate::index::bitset::BitSet;
use nalgebra::Point3;
use std::fmt;

/// A structure restricted to a subset of its atoms.
///
/// The view borrows the structure and owns the atom set it was created with, so it
/// stays valid as long as the structure is not mutated.
#[derive(Clone)]
pub struct StructureView<'a> {
    structure: &'a Structure,
    atom_set: BitSet,
}

impl<'a> StructureView<'a> {
    /// Restricts `structure` to the atoms passing `selection`; all atoms for `None`.
    pub fn new(structure: &'a Structure, selection: Option<&dyn Selection>) -> Self {
        Self {
            structure,
            atom_set: structure.select(selection),
        }
    }

    pub fn from_atom_set(structure: &'a Structure, atom_set: BitSet) -> Self {
        Self {
            structure,
            atom_set,
        }
    }

    pub fn structure(&self) -> &'a Structure {
        self.structure
    }

    pub fn atom_set(&self) -> &BitSet {
        &self.atom_set
    }

    pub fn atom_count(&self) -> usize {
        self.atom_set.size()
    }

    pub fn is_empty(&self) -> bool {
        self.atom_set.is_all_clear()
    }

    /// Bonds of the structure with both atoms in the view.
    pub fn bond_set(&self) -> BitSet {
        self.structure.bond_set_for(&self.atom_set)
    }

    pub fn atoms(&self) -> impl Iterator<Item = AtomProxy<'a>> + '_ {
        let structure = self.structure;
        self.atom_set.iter().map(move |i| structure.atom(i))
    }

    /// Calls `f` for every atom of the view that also passes `selection`.
    pub fn each_atom(&self, selection: Option<&dyn Selection>, mut f: impl FnMut(AtomProxy<'a>)) {
        for atom in self.atoms() {
            if selection.is_none_or(|s| s.test(&atom)) {
                f(atom);
            }
        }
    }

    /// Positions of the view's atoms paired with their structure-wide indices.
    pub fn positions(&self) -> impl Iterator<Item = (usize, Point3<f32>)> + '_ {
        let store = &self.structure.atom_store;
        self.atom_set.iter().map(move |i| (i, store.position(i)))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bounds = BoundingBox::empty();
        for (_, position) in self.positions() {
            bounds.expand_by_point(&position);
        }
        bounds
    }
}

impl fmt::Debug for StructureView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructureView")
            .field("structure", &self.structure.name)
            .field("atoms", &self.atom_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::structure::AtomSelection;
    use crate::core::structure::test_utils::build_dipeptide;

    #[test]
    fn view_restricts_atoms_and_bonds() {
        let structure = build_dipeptide();
        let gly = AtomSelection::ResidueName("GLY".to_string());
        let view = StructureView::new(&structure, Some(&gly));
        assert_eq!(view.atom_count(), 4);
        assert_eq!(view.atoms().map(|a| a.index).collect::<Vec<_>>(), vec![5, 6, 7, 8]);
        assert_eq!(view.bond_set().size(), 3);
        assert_eq!(view.bounding_box().max, Point3::new(4.13, 3.69, 0.0));
    }

    #[test]
    fn each_atom_applies_an_extra_selection() {
        let structure = build_dipeptide();
        let view = StructureView::new(&structure, None);
        let mut names = Vec::new();
        let ca = AtomSelection::AtomName("CA".to_string());
        view.each_atom(Some(&ca), |atom| names.push(atom.resname()));
        assert_eq!(names, vec!["ALA", "GLY"]);
        assert!(!view.is_empty());
    }
}
