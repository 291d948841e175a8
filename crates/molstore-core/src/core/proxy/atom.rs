use super::{BondProxy, ChainProxy, ModelProxy, ResidueProxy};
use crate::core::structure::Structure;
use crate::core::types::{AtomType, ResidueType};
use nalgebra::Point3;
use std::fmt;

/// Read-only cursor over one row of the atom store.
///
/// Everything beyond the atom's own columns is derived on access: the residue, chain
/// and model through the parent index columns, names and radii through the type
/// registries, bonds through the adjacency index.
#[derive(Clone, Copy)]
pub struct AtomProxy<'a> {
    structure: &'a Structure,
    pub index: usize,
}

impl<'a> AtomProxy<'a> {
    pub fn new(structure: &'a Structure, index: usize) -> Self {
        Self { structure, index }
    }

    pub fn structure(&self) -> &'a Structure {
        self.structure
    }

    pub fn residue_index(&self) -> usize {
        self.structure.atom_store.residue_index[self.index] as usize
    }

    pub fn chain_index(&self) -> usize {
        self.structure.residue_store.chain_index[self.residue_index()] as usize
    }

    pub fn model_index(&self) -> usize {
        self.structure.chain_store.model_index[self.chain_index()] as usize
    }

    pub fn residue(&self) -> ResidueProxy<'a> {
        ResidueProxy::new(self.structure, self.residue_index())
    }

    pub fn chain(&self) -> ChainProxy<'a> {
        ChainProxy::new(self.structure, self.chain_index())
    }

    pub fn model(&self) -> ModelProxy<'a> {
        ModelProxy::new(self.structure, self.model_index())
    }

    /// Index of the first atom of the residue this atom belongs to.
    pub fn residue_atom_offset(&self) -> usize {
        self.structure.residue_store.atom_offset[self.residue_index()] as usize
    }

    /// Position of this atom within its residue.
    pub fn local_index(&self) -> usize {
        self.index - self.residue_atom_offset()
    }

    pub fn atom_type(&self) -> &'a AtomType {
        self.structure
            .atom_map
            .get(self.structure.atom_store.atom_type_id[self.index])
    }

    pub fn residue_type(&self) -> &'a ResidueType {
        self.structure
            .residue_map
            .get(self.structure.residue_store.residue_type_id[self.residue_index()])
    }

    pub fn atomname(&self) -> &'a str {
        &self.atom_type().atomname
    }

    pub fn element(&self) -> &'a str {
        &self.atom_type().element
    }

    pub fn number(&self) -> u8 {
        self.atom_type().number
    }

    pub fn vdw(&self) -> f32 {
        self.atom_type().vdw
    }

    pub fn covalent(&self) -> f32 {
        self.atom_type().covalent
    }

    pub fn resname(&self) -> &'a str {
        &self.residue_type().resname
    }

    pub fn hetero(&self) -> bool {
        self.residue_type().hetero
    }

    pub fn resno(&self) -> i32 {
        self.structure.residue_store.resno[self.residue_index()]
    }

    pub fn sstruc(&self) -> Option<char> {
        self.structure.residue_store.sstruc(self.residue_index())
    }

    pub fn inscode(&self) -> Option<char> {
        self.structure.residue_store.inscode(self.residue_index())
    }

    pub fn chainname(&self) -> &'a str {
        self.structure.chain_store.chainname(self.chain_index())
    }

    pub fn chainid(&self) -> &'a str {
        self.structure.chain_store.chainid(self.chain_index())
    }

    pub fn x(&self) -> f32 {
        self.structure.atom_store.x[self.index]
    }

    pub fn y(&self) -> f32 {
        self.structure.atom_store.y[self.index]
    }

    pub fn z(&self) -> f32 {
        self.structure.atom_store.z[self.index]
    }

    pub fn position(&self) -> Point3<f32> {
        self.structure.atom_store.position(self.index)
    }

    pub fn serial(&self) -> i32 {
        self.structure.atom_store.serial[self.index]
    }

    pub fn bfactor(&self) -> f32 {
        self.structure.atom_store.bfactor[self.index]
    }

    pub fn occupancy(&self) -> f32 {
        self.structure.atom_store.occupancy[self.index]
    }

    pub fn altloc(&self) -> Option<char> {
        self.structure.atom_store.altloc(self.index)
    }

    pub fn partial_charge(&self) -> Option<f32> {
        self.structure.atom_store.partial_charge.as_ref().map(|c| c[self.index])
    }

    pub fn radius(&self) -> Option<f32> {
        self.structure.atom_store.radius.as_ref().map(|c| c[self.index])
    }

    pub fn formal_charge(&self) -> Option<i8> {
        self.structure.atom_store.formal_charge.as_ref().map(|c| c[self.index])
    }

    /// Writes the position into `array[offset..offset + 3]`.
    pub fn position_to_array(&self, array: &mut [f32], offset: usize) {
        let store = &self.structure.atom_store;
        array[offset] = store.x[self.index];
        array[offset + 1] = store.y[self.index];
        array[offset + 2] = store.z[self.index];
    }

    pub fn distance_to(&self, other: &AtomProxy<'_>) -> f32 {
        (self.position() - other.position()).norm()
    }

    /// Decides whether two atoms are covalently connected.
    ///
    /// Atoms in incompatible alternate locations are never connected. Coarse-grained
    /// beads are connected below a fixed cutoff distance. Otherwise the squared
    /// distance has to fall strictly inside the band
    /// `((r1 + r2 - lower)^2, (r1 + r2 + upper)^2)` around the sum of the covalent radii.
    ///
    /// # Arguments
    ///
    /// * `other` - The other atom; it may belong to another structure.
    ///
    /// # Return
    ///
    /// Returns `true` if the atoms are connected.
    pub fn connected_to(&self, other: &AtomProxy<'_>) -> bool {
        let altloc1 = self.structure.atom_store.altloc[self.index];
        let altloc2 = other.structure.atom_store.altloc[other.index];
        let blank = |code: u8| code == 0 || code == b' ';
        if !(blank(altloc1) || blank(altloc2) || altloc1 == altloc2) {
            return false;
        }

        let bonding = &self.structure.config.bonding;
        let dist_sq = (self.position() - other.position()).norm_squared();

        if dist_sq < bonding.cg_cutoff_squared() && self.is_cg() {
            return true;
        }
        if dist_sq.is_nan() {
            return false;
        }

        let d = self.covalent() + other.covalent();
        let upper = d + bonding.upper_tolerance;
        let lower = d - bonding.lower_tolerance;
        dist_sq < upper * upper && dist_sq > lower * lower
    }

    /// Calls `f` for every bond of this atom, using the adjacency index.
    ///
    /// Does nothing if the bonds of the structure have not been finalized.
    pub fn each_bond(&self, mut f: impl FnMut(BondProxy<'a>)) {
        let Some(bond_hash) = self.structure.bond_hash() else {
            return;
        };
        for &bond_index in bond_hash.bond_indices(self.index) {
            f(self.structure.bond(bond_index as usize));
        }
    }

    pub fn each_bonded_atom(&self, mut f: impl FnMut(AtomProxy<'a>)) {
        self.each_bond(|bond| f(bond.other_atom(self.index)));
    }

    pub fn bonded_atoms(&self) -> Vec<AtomProxy<'a>> {
        let mut atoms = Vec::new();
        self.each_bonded_atom(|atom| atoms.push(atom));
        atoms
    }

    pub fn has_bond_to(&self, other: &AtomProxy<'_>) -> bool {
        let mut found = false;
        self.each_bonded_atom(|atom| found |= atom.index == other.index);
        found
    }

    /// Number of bonded atoms with atomic number `number`.
    pub fn bond_to_element_count(&self, number: u8) -> usize {
        let mut count = 0;
        self.each_bonded_atom(|atom| {
            if atom.number() == number {
                count += 1;
            }
        });
        count
    }

    pub fn has_bond_to_element(&self, number: u8) -> bool {
        self.bond_to_element_count(number) > 0
    }

    pub fn is_bonded(&self) -> bool {
        self.structure
            .bond_hash()
            .is_some_and(|hash| hash.bond_count(self.index) > 0)
    }

    pub fn is_backbone(&self) -> bool {
        self.residue_type()
            .backbone_index_list
            .contains(&self.local_index())
    }

    pub fn is_polymer(&self) -> bool {
        self.residue().is_polymer()
    }

    pub fn is_sidechain(&self) -> bool {
        self.is_polymer() && !self.is_backbone()
    }

    pub fn is_cg(&self) -> bool {
        self.residue_type().is_cg()
    }

    pub fn is_trace(&self) -> bool {
        self.residue_type().trace_atom_index == Some(self.local_index())
    }

    pub fn is_hetero(&self) -> bool {
        self.hetero()
    }

    pub fn is_protein(&self) -> bool {
        self.residue().is_protein()
    }

    pub fn is_nucleic(&self) -> bool {
        self.residue().is_nucleic()
    }

    pub fn is_rna(&self) -> bool {
        self.residue().is_rna()
    }

    pub fn is_dna(&self) -> bool {
        self.residue().is_dna()
    }

    pub fn is_water(&self) -> bool {
        self.residue().is_water()
    }

    pub fn is_ion(&self) -> bool {
        self.residue().is_ion()
    }

    pub fn is_saccharide(&self) -> bool {
        self.residue().is_saccharide()
    }

    pub fn is_helix(&self) -> bool {
        self.residue().is_helix()
    }

    pub fn is_sheet(&self) -> bool {
        self.residue().is_sheet()
    }

    pub fn is_turn(&self) -> bool {
        self.residue().is_turn()
    }

    pub fn is_ring(&self) -> bool {
        self.residue()
            .rings()
            .flags
            .get(self.local_index())
            .copied()
            .unwrap_or(false)
    }

    /// Aromaticity from the explicit column if present, otherwise from ring planarity
    /// of the residue type.
    pub fn is_aromatic(&self) -> bool {
        if let Some(aromatic) = self.structure.atom_store.aromatic.as_ref() {
            return aromatic[self.index];
        }
        self.residue()
            .aromatic_atoms()
            .get(self.local_index())
            .copied()
            .unwrap_or(false)
    }

    /// A hydrogen not bonded to carbon.
    pub fn is_polar_hydrogen(&self) -> bool {
        self.number() == 1 && !self.has_bond_to_element(6)
    }

    pub fn is_metal(&self) -> bool {
        self.atom_type().is_metal()
    }

    pub fn is_nonmetal(&self) -> bool {
        self.atom_type().is_nonmetal()
    }

    pub fn is_metalloid(&self) -> bool {
        self.atom_type().is_metalloid()
    }

    pub fn is_halogen(&self) -> bool {
        self.atom_type().is_halogen()
    }

    pub fn is_noble_gas(&self) -> bool {
        self.atom_type().is_noble_gas()
    }

    pub fn is_transition_metal(&self) -> bool {
        self.atom_type().is_transition_metal()
    }

    /// Global indices of the atoms bonded to this one by the residue bond template.
    ///
    /// With `first_only` the scan stops at the first partner.
    pub fn residue_bonds(&self, first_only: bool) -> Vec<usize> {
        let residue = self.residue();
        let offset = residue.atom_offset();
        let local = self.index - offset;
        let bonds = residue.bonds();

        let forward = bonds
            .atom_indices1
            .iter()
            .zip(&bonds.atom_indices2)
            .filter(|&(&a, _)| a == local)
            .map(|(_, &b)| b + offset);
        let backward = bonds
            .atom_indices2
            .iter()
            .zip(&bonds.atom_indices1)
            .filter(|&(&b, _)| b == local)
            .map(|(_, &a)| a + offset);
        let partners = forward.chain(backward);

        if first_only {
            partners.take(1).collect()
        } else {
            partners.collect()
        }
    }

    /// Human readable name like `[ALA]12^A:B.CA%A/0`.
    ///
    /// The model index is only appended for multi-model structures.
    pub fn qualified_name(&self, no_resname: bool) -> String {
        let mut name = String::new();
        if !no_resname && !self.resname().is_empty() {
            name.push_str(&format!("[{}]", self.resname()));
        }
        name.push_str(&self.resno().to_string());
        if let Some(inscode) = self.inscode() {
            name.push_str(&format!("^{inscode}"));
        }
        if !self.chainname().is_empty() {
            name.push_str(&format!(":{}", self.chainname()));
        }
        if !self.atomname().is_empty() {
            name.push_str(&format!(".{}", self.atomname()));
        }
        if let Some(altloc) = self.altloc() {
            name.push_str(&format!("%{altloc}"));
        }
        if self.structure.model_store.count > 1 {
            name.push_str(&format!("/{}", self.model_index()));
        }
        name
    }
}

impl fmt::Debug for AtomProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomProxy")
            .field("index", &self.index)
            .field("name", &self.qualified_name(false))
            .finish()
    }
}

/// Mutable cursor over one row of the atom store.
///
/// Coordinate setters do not update the spatial index; call
/// [`Structure::refresh_position`] after a batch of edits.
pub struct AtomProxyMut<'a> {
    structure: &'a mut Structure,
    pub index: usize,
}

impl<'a> AtomProxyMut<'a> {
    pub fn new(structure: &'a mut Structure, index: usize) -> Self {
        Self { structure, index }
    }

    pub fn as_proxy(&self) -> AtomProxy<'_> {
        AtomProxy::new(self.structure, self.index)
    }

    pub fn set_position(&mut self, position: &Point3<f32>) {
        self.structure.atom_store.set_position(self.index, position);
    }

    /// Reads the position from `array[offset..offset + 3]`.
    pub fn position_from_array(&mut self, array: &[f32], offset: usize) {
        let position = Point3::new(array[offset], array[offset + 1], array[offset + 2]);
        self.set_position(&position);
    }

    pub fn translate(&mut self, delta: &nalgebra::Vector3<f32>) {
        let position = self.structure.atom_store.position(self.index) + delta;
        self.set_position(&position);
    }

    pub fn set_serial(&mut self, serial: i32) {
        self.structure.atom_store.serial[self.index] = serial;
    }

    pub fn set_bfactor(&mut self, bfactor: f32) {
        self.structure.atom_store.bfactor[self.index] = bfactor;
    }

    pub fn set_occupancy(&mut self, occupancy: f32) {
        self.structure.atom_store.occupancy[self.index] = occupancy;
    }

    pub fn set_altloc(&mut self, altloc: Option<char>) {
        self.structure.atom_store.set_altloc(self.index, altloc);
    }

    /// Sets the partial charge, adding the column if the structure has none yet.
    pub fn set_partial_charge(&mut self, charge: f32) {
        self.structure.atom_store.add_partial_charge_field()[self.index] = charge;
    }

    /// Sets the explicit radius, adding the column if the structure has none yet.
    pub fn set_radius(&mut self, radius: f32) {
        self.structure.atom_store.add_radius_field()[self.index] = radius;
    }

    /// Sets the formal charge, adding the column if the structure has none yet.
    pub fn set_formal_charge(&mut self, charge: i8) {
        self.structure.atom_store.add_formal_charge_field()[self.index] = charge;
    }

    /// Sets the aromaticity flag, adding the column if the structure has none yet.
    pub fn set_aromatic(&mut self, aromatic: bool) {
        self.structure.atom_store.add_aromatic_field()[self.index] = aromatic;
    }
}

#[cfg(test)]
mod tests {
    use crate::core::structure::test_utils::*;
    use nalgebra::Point3;

    mod connectivity {
        use super::*;

        #[test]
        fn atoms_at_the_covalent_radius_sum_are_connected() {
            // CA and C of ALA are 1.52 apart, twice the covalent radius of carbon
            let structure = build_dipeptide();
            assert!(structure.atom(1).connected_to(&structure.atom(2)));
            assert!(structure.atom(2).connected_to(&structure.atom(1)));
        }

        #[test]
        fn atoms_outside_the_tolerance_band_are_not_connected() {
            let mut structure = build_dipeptide();
            structure.atom_mut(2).set_position(&Point3::new(3.04, 0.0, 0.0));
            assert!(!structure.atom(1).connected_to(&structure.atom(2)));

            structure.atom_mut(2).set_position(&Point3::new(0.9, 0.0, 0.0));
            assert!(!structure.atom(1).connected_to(&structure.atom(2)));
        }

        #[test]
        fn incompatible_alternate_locations_are_never_connected() {
            let mut structure = build_dipeptide();
            structure.atom_store.set_altloc(1, Some('A'));
            structure.atom_store.set_altloc(2, Some('B'));
            assert!(!structure.atom(1).connected_to(&structure.atom(2)));

            structure.atom_store.set_altloc(2, Some('A'));
            assert!(structure.atom(1).connected_to(&structure.atom(2)));

            structure.atom_store.set_altloc(2, None);
            assert!(structure.atom(1).connected_to(&structure.atom(2)));
        }

        #[test]
        fn coarse_grained_beads_use_the_distance_cutoff() {
            let structure = build_structure(&[
                record("A", "ALA", 1, "CA", "C", [0.0, 0.0, 0.0]),
                record("A", "ALA", 2, "CA", "C", [3.8, 0.0, 0.0]),
                record("A", "ALA", 3, "CA", "C", [12.8, 0.0, 0.0]),
            ]);
            assert!(structure.atom(0).is_cg());
            assert!(structure.atom(0).connected_to(&structure.atom(1)));
            // 9 Angstrom is beyond the 8 Angstrom bead cutoff
            assert!(!structure.atom(1).connected_to(&structure.atom(2)));
        }
    }

    mod templates {
        use super::*;

        #[test]
        fn residue_bonds_lists_partners_from_both_template_columns() {
            let structure = build_dipeptide();
            // ALA template: N-CA, CA-C, CA-CB, C-O
            assert_eq!(structure.atom(1).residue_bonds(false), vec![2, 4, 0]);
            assert_eq!(structure.atom(3).residue_bonds(false), vec![2]);
            assert_eq!(structure.atom(0).residue_bonds(false), vec![1]);
            // GLY starts at atom 5
            assert_eq!(structure.atom(6).residue_bonds(false), vec![7, 5]);
        }

        #[test]
        fn residue_bonds_first_only_stops_at_the_first_partner() {
            let structure = build_dipeptide();
            assert_eq!(structure.atom(1).residue_bonds(true), vec![2]);
            assert_eq!(structure.atom(3).residue_bonds(true), vec![2]);
            assert!(structure.atom(9).residue_bonds(true).is_empty());
        }

        #[test]
        fn ring_atoms_are_flagged() {
            let mut records: Vec<AtomRecord> = ["C1", "C2", "C3", "C4", "C5", "C6"]
                .iter()
                .enumerate()
                .map(|(i, &name)| {
                    let angle = i as f32 * std::f32::consts::FRAC_PI_3;
                    record("A", "BNZ", 1, name, "C", [1.39 * angle.cos(), 1.39 * angle.sin(), 0.0])
                })
                .collect();
            records.push(record("A", "BNZ", 1, "C7", "C", [2.89, 0.0, 0.0]));
            let structure = build_structure(&records);

            assert!((0..6).all(|i| structure.atom(i).is_ring()));
            assert!(!structure.atom(6).is_ring());
            assert!(!build_dipeptide().atom(1).is_ring());
        }
    }

    #[test]
    fn qualified_name_includes_residue_chain_and_atom() {
        let structure = build_dipeptide();
        assert_eq!(structure.atom(6).qualified_name(false), "[GLY]2:A.CA");
        assert_eq!(structure.atom(6).qualified_name(true), "2:A.CA");
    }
}
