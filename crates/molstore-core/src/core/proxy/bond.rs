use super::AtomProxy;
use crate::core::store::BondStore;
use crate::core::structure::Structure;
use nalgebra::Vector3;
use std::fmt;
use tracing::debug;

const COLINEAR_TOLERANCE: f32 = 1e-5;

/// Read-only cursor over one row of a bond store.
///
/// The store is usually the structure's covalent bond store, but backbone and rung
/// stores share the schema and can be viewed the same way.
#[derive(Clone, Copy)]
pub struct BondProxy<'a> {
    structure: &'a Structure,
    store: &'a BondStore,
    pub index: usize,
}

impl<'a> BondProxy<'a> {
    pub fn new(structure: &'a Structure, store: &'a BondStore, index: usize) -> Self {
        Self {
            structure,
            store,
            index,
        }
    }

    pub fn atom_index1(&self) -> usize {
        self.store.atom_index1[self.index] as usize
    }

    pub fn atom_index2(&self) -> usize {
        self.store.atom_index2[self.index] as usize
    }

    pub fn bond_order(&self) -> i8 {
        self.store.bond_order[self.index]
    }

    pub fn atom1(&self) -> AtomProxy<'a> {
        AtomProxy::new(self.structure, self.atom_index1())
    }

    pub fn atom2(&self) -> AtomProxy<'a> {
        AtomProxy::new(self.structure, self.atom_index2())
    }

    /// The endpoint that is not `atom_index`.
    pub fn other_atom_index(&self, atom_index: usize) -> usize {
        if atom_index == self.atom_index1() {
            self.atom_index2()
        } else {
            self.atom_index1()
        }
    }

    pub fn other_atom(&self, atom_index: usize) -> AtomProxy<'a> {
        AtomProxy::new(self.structure, self.other_atom_index(atom_index))
    }

    pub fn length(&self) -> f32 {
        self.atom1().distance_to(&self.atom2())
    }

    /// Global index of the third atom that fixes the plane of a multiple bond.
    ///
    /// Only bonds inside one residue have a reference atom; it comes from the residue
    /// type's bond template.
    pub fn reference_atom_index(&self) -> Option<usize> {
        let atom1 = self.atom1();
        let atom2 = self.atom2();
        if atom1.residue_index() != atom2.residue_index() {
            return None;
        }
        let offset = atom1.residue_atom_offset();
        let residue = atom1.residue();
        let reference = residue
            .bonded_residue_type()
            .bond_reference_atom_index(atom1.index - offset, atom2.index - offset);
        if reference.is_none() {
            debug!(
                bond = self.index,
                residue = %residue.qualified_name(false),
                "No reference atom for bond"
            );
        }
        reference.map(|i| i + offset)
    }

    /// Unit vector perpendicular to the bond along which the lines of a multiple bond
    /// are offset.
    ///
    /// The direction lies in the plane spanned by the bond and its reference atom. Without
    /// a reference atom the direction to the origin is used, and colinear cases fall back
    /// to the x and then the y axis.
    ///
    /// # Return
    ///
    /// A normalized vector orthogonal to the bond.
    pub fn calculate_shift_dir(&self) -> Vector3<f32> {
        let p1 = self.atom1().position();
        let p2 = self.atom2().position();
        let v12 = (p1 - p2).normalize();

        let mut v13 = match self.reference_atom_index() {
            Some(reference) => (p1 - AtomProxy::new(self.structure, reference).position()).normalize(),
            None => p1.coords.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::x),
        };

        let mut dp = v12.dot(&v13);
        if 1.0 - dp.abs() < COLINEAR_TOLERANCE {
            v13 = Vector3::x();
            dp = v12.dot(&v13);
            if 1.0 - dp.abs() < COLINEAR_TOLERANCE {
                v13 = Vector3::y();
                dp = v12.dot(&v13);
            }
        }

        (v13 - v12 * dp).normalize()
    }

    pub fn qualified_name(&self) -> String {
        format!("{}={}", self.atom_index1(), self.atom_index2())
    }
}

impl fmt::Debug for BondProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BondProxy")
            .field("index", &self.index)
            .field("atom_index1", &self.atom_index1())
            .field("atom_index2", &self.atom_index2())
            .field("bond_order", &self.bond_order())
            .finish()
    }
}
