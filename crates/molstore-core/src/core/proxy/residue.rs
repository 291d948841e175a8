use super::{AtomProxy, ChainProxy, ModelProxy};
use crate::core::structure::Structure;
use crate::core::structure::bonds::calculate_residue_bonds;
use crate::core::structure::selection::Selection;
use crate::core::types::constants::AA1;
use crate::core::types::{
    BackbonePosition, BackboneType, MoleculeType, ResidueBonds, ResidueType, RingData,
};
use nalgebra::{Point3, Vector3};
use std::fmt;

const HELIX_CODES: [char; 3] = ['h', 'g', 'i'];
const SHEET_CODES: [char; 2] = ['e', 'b'];
const TURN_CODES: [char; 3] = ['s', 't', 'l'];

/// Read-only cursor over one row of the residue store.
#[derive(Clone, Copy)]
pub struct ResidueProxy<'a> {
    structure: &'a Structure,
    pub index: usize,
}

impl<'a> ResidueProxy<'a> {
    pub fn new(structure: &'a Structure, index: usize) -> Self {
        Self { structure, index }
    }

    pub fn structure(&self) -> &'a Structure {
        self.structure
    }

    pub fn chain_index(&self) -> usize {
        self.structure.residue_store.chain_index[self.index] as usize
    }

    pub fn model_index(&self) -> usize {
        self.structure.chain_store.model_index[self.chain_index()] as usize
    }

    pub fn chain(&self) -> ChainProxy<'a> {
        ChainProxy::new(self.structure, self.chain_index())
    }

    pub fn model(&self) -> ModelProxy<'a> {
        ModelProxy::new(self.structure, self.model_index())
    }

    pub fn atom_offset(&self) -> usize {
        self.structure.residue_store.atom_offset[self.index] as usize
    }

    pub fn atom_count(&self) -> usize {
        usize::from(self.structure.residue_store.atom_count[self.index])
    }

    /// One past the last atom of the residue.
    pub fn atom_end(&self) -> usize {
        self.atom_offset() + self.atom_count()
    }

    pub fn residue_type_id(&self) -> u16 {
        self.structure.residue_store.residue_type_id[self.index]
    }

    pub fn residue_type(&self) -> &'a ResidueType {
        self.structure.residue_map.get(self.residue_type_id())
    }

    pub fn resname(&self) -> &'a str {
        &self.residue_type().resname
    }

    pub fn hetero(&self) -> bool {
        self.residue_type().hetero
    }

    pub fn resno(&self) -> i32 {
        self.structure.residue_store.resno[self.index]
    }

    pub fn sstruc(&self) -> Option<char> {
        self.structure.residue_store.sstruc(self.index)
    }

    pub fn inscode(&self) -> Option<char> {
        self.structure.residue_store.inscode(self.index)
    }

    pub fn chainname(&self) -> &'a str {
        self.structure.chain_store.chainname(self.chain_index())
    }

    pub fn chainid(&self) -> &'a str {
        self.structure.chain_store.chainid(self.chain_index())
    }

    pub fn molecule_type(&self) -> MoleculeType {
        self.residue_type().molecule_type
    }

    pub fn backbone_type(&self) -> BackboneType {
        self.residue_type().backbone_type
    }

    pub fn backbone_start_type(&self) -> BackboneType {
        self.residue_type().backbone_start_type
    }

    pub fn backbone_end_type(&self) -> BackboneType {
        self.residue_type().backbone_end_type
    }

    pub fn backbone_type_at(&self, position: BackbonePosition) -> BackboneType {
        match position {
            BackbonePosition::End => self.backbone_end_type(),
            BackbonePosition::Middle => self.backbone_type(),
            BackbonePosition::Start => self.backbone_start_type(),
        }
    }

    fn global(&self, local: Option<usize>) -> Option<usize> {
        local.map(|i| i + self.atom_offset())
    }

    pub fn trace_atom_index(&self) -> Option<usize> {
        self.global(self.residue_type().trace_atom_index)
    }

    pub fn direction1_atom_index(&self) -> Option<usize> {
        self.global(self.residue_type().direction1_atom_index)
    }

    pub fn direction2_atom_index(&self) -> Option<usize> {
        self.global(self.residue_type().direction2_atom_index)
    }

    pub fn backbone_start_atom_index(&self) -> Option<usize> {
        self.global(self.residue_type().backbone_start_atom_index)
    }

    pub fn backbone_end_atom_index(&self) -> Option<usize> {
        self.global(self.residue_type().backbone_end_atom_index)
    }

    pub fn rung_end_atom_index(&self) -> Option<usize> {
        self.global(self.residue_type().rung_end_atom_index)
    }

    /// Global index of the first atom named like one of `names`.
    pub fn atom_index_by_name(&self, names: &[&str]) -> Option<usize> {
        self.global(self.residue_type().atom_index_by_name(names))
    }

    pub fn has_atom_with_name(&self, names: &[&str]) -> bool {
        self.residue_type().atom_index_by_name(names).is_some()
    }

    pub fn atom(&self, local: usize) -> AtomProxy<'a> {
        AtomProxy::new(self.structure, self.atom_offset() + local)
    }

    pub fn atoms(&self) -> impl Iterator<Item = AtomProxy<'a>> + use<'a> {
        let structure = self.structure;
        (self.atom_offset()..self.atom_end()).map(move |i| AtomProxy::new(structure, i))
    }

    pub fn each_atom(&self, selection: Option<&dyn Selection>, mut f: impl FnMut(AtomProxy<'a>)) {
        for atom in self.atoms() {
            if selection.is_none_or(|s| s.test(&atom)) {
                f(atom);
            }
        }
    }

    /// Mean position of the residue's atoms.
    pub fn position(&self) -> Point3<f32> {
        let count = self.atom_count();
        if count == 0 {
            return Point3::origin();
        }
        let sum = self
            .atoms()
            .fold(Vector3::zeros(), |acc, atom| acc + atom.position().coords);
        Point3::from(sum / count as f32)
    }

    /// Bond template of the residue type, computed from this residue's geometry if the
    /// type has none yet.
    pub fn bonds(&self) -> &'a ResidueBonds {
        self.residue_type()
            .bonds_or_init(|| calculate_residue_bonds(self))
    }

    /// The residue type, with its bond template computed first if needed.
    ///
    /// Rings, aromaticity and bond reference atoms are derived from the template.
    pub fn bonded_residue_type(&self) -> &'a ResidueType {
        let residue_type = self.residue_type();
        residue_type.bonds_or_init(|| calculate_residue_bonds(self));
        residue_type
    }

    pub fn rings(&self) -> &'a RingData {
        self.bonded_residue_type().rings()
    }

    /// Aromaticity flags of the residue type, computed from this residue's geometry on
    /// first use.
    pub fn aromatic_atoms(&self) -> &'a [bool] {
        let offset = self.atom_offset();
        let store = &self.structure.atom_store;
        self.bonded_residue_type()
            .aromatic_atoms_or_init(|i| store.position(offset + i))
    }

    pub fn is_protein(&self) -> bool {
        self.molecule_type() == MoleculeType::Protein
    }

    pub fn is_rna(&self) -> bool {
        self.molecule_type() == MoleculeType::Rna
    }

    pub fn is_dna(&self) -> bool {
        self.molecule_type() == MoleculeType::Dna
    }

    pub fn is_nucleic(&self) -> bool {
        self.is_rna() || self.is_dna()
    }

    pub fn is_polymer(&self) -> bool {
        self.is_protein() || self.is_nucleic()
    }

    pub fn is_water(&self) -> bool {
        self.molecule_type() == MoleculeType::Water
    }

    pub fn is_ion(&self) -> bool {
        self.molecule_type() == MoleculeType::Ion
    }

    pub fn is_saccharide(&self) -> bool {
        self.molecule_type() == MoleculeType::Saccharide
    }

    pub fn is_hetero(&self) -> bool {
        self.hetero()
    }

    pub fn is_cg(&self) -> bool {
        self.residue_type().is_cg()
    }

    pub fn is_standard_amino_acid(&self) -> bool {
        self.residue_type().is_standard_amino_acid()
    }

    pub fn is_standard_base(&self) -> bool {
        self.residue_type().is_standard_base()
    }

    pub fn is_helix(&self) -> bool {
        self.sstruc().is_some_and(|c| HELIX_CODES.contains(&c))
    }

    pub fn is_sheet(&self) -> bool {
        self.sstruc().is_some_and(|c| SHEET_CODES.contains(&c))
    }

    pub fn is_turn(&self) -> bool {
        self.sstruc().is_some_and(|c| TURN_CODES.contains(&c)) && self.is_protein()
    }

    /// One-letter amino acid code, `X` when unknown.
    pub fn resname1(&self) -> char {
        AA1.get(self.resname().to_uppercase().as_str())
            .copied()
            .unwrap_or('X')
    }

    /// Whether the backbone end atom of this residue is bonded to the backbone start
    /// atom of `next` by the geometric connectivity test.
    pub fn connected_to(&self, next: &ResidueProxy<'_>) -> bool {
        let (Some(end), Some(start)) = (
            self.backbone_end_atom_index(),
            next.backbone_start_atom_index(),
        ) else {
            return false;
        };
        let end = AtomProxy::new(self.structure, end);
        let start = AtomProxy::new(next.structure, start);
        end.connected_to(&start)
    }

    /// The following residue of the chain if it is connected to this one.
    ///
    /// For the last residue the first residue of the chain is tried, so cyclic
    /// polymers close.
    pub fn next_connected_residue(&self) -> Option<ResidueProxy<'a>> {
        let chain = self.chain();
        let next = if self.index + 1 < chain.residue_end() {
            self.index + 1
        } else {
            chain.residue_offset()
        };
        let next = ResidueProxy::new(self.structure, next);
        self.connected_to(&next).then_some(next)
    }

    /// The preceding residue of the chain if it is connected to this one, wrapping from
    /// the first residue to the last.
    pub fn previous_connected_residue(&self) -> Option<ResidueProxy<'a>> {
        let chain = self.chain();
        let previous = if self.index > chain.residue_offset() {
            self.index - 1
        } else {
            chain.residue_end().checked_sub(1)?
        };
        let previous = ResidueProxy::new(self.structure, previous);
        previous.connected_to(self).then_some(previous)
    }

    /// Human readable name like `[ALA]12^A:B/0`.
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
        if self.structure.model_store.count > 1 {
            name.push_str(&format!("/{}", self.model_index()));
        }
        name
    }
}

impl fmt::Debug for ResidueProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResidueProxy")
            .field("index", &self.index)
            .field("name", &self.qualified_name(false))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::structure::test_utils::*;
    use crate::core::types::BackboneType;

    #[test]
    fn consecutive_residues_are_connected_through_the_backbone() {
        let structure = build_structure(&build_polyglycine("A", 3));
        let first = structure.residue(0);
        let middle = structure.residue(1);
        let last = structure.residue(2);

        assert!(first.connected_to(&middle));
        assert!(!middle.connected_to(&first));
        assert_eq!(first.next_connected_residue().map(|r| r.index), Some(1));
        assert_eq!(middle.previous_connected_residue().map(|r| r.index), Some(0));
        // the chain is open, so the ends do not wrap around
        assert!(last.next_connected_residue().is_none());
        assert!(first.previous_connected_residue().is_none());
    }

    #[test]
    fn backbone_atoms_map_to_global_indices() {
        let structure = build_dipeptide();
        let gly = structure.residue(1);
        assert_eq!(gly.backbone_type(), BackboneType::Protein);
        assert_eq!(gly.trace_atom_index(), Some(6));
        assert_eq!(gly.backbone_start_atom_index(), Some(5));
        assert_eq!(gly.backbone_end_atom_index(), Some(7));
        assert_eq!(gly.atom_index_by_name(&["O"]), Some(8));
        assert!(gly.atom_index_by_name(&["CB"]).is_none());
    }

    #[test]
    fn classification_and_naming() {
        let structure = build_dipeptide();
        let ala = structure.residue(0);
        let water = structure.residue(2);
        assert!(ala.is_protein() && ala.is_polymer() && ala.is_standard_amino_acid());
        assert_eq!(ala.resname1(), 'A');
        assert!(water.is_water() && !water.is_polymer());
        assert_eq!(water.resname1(), 'X');
        assert_eq!(ala.qualified_name(false), "[ALA]1:A");
        assert_eq!(ala.atoms().map(|a| a.index).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn bonded_residue_type_carries_the_template() {
        let structure = build_dipeptide();
        let residue_type = structure.residue(0).bonded_residue_type();
        assert_eq!(residue_type.bonds().map(|b| b.len()), Some(4));
        assert!(structure.residue(0).rings().rings.is_empty());
    }
}
