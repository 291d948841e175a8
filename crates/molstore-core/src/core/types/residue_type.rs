use super::TypeRegistryError;
use super::atom_type::AtomTypeRegistry;
use super::constants::{
    AA1, BackbonePosition, BackboneType, CG_NUCLEIC_MAX_ATOMS, CG_PROTEIN_MAX_ATOMS,
    CHEM_COMP_DNA, CHEM_COMP_PROTEIN, CHEM_COMP_RNA, CHEM_COMP_SACCHARIDE, DNA_BASES, ION_NAMES,
    MoleculeType, NUCLEIC_BACKBONE_ATOM_NAMES, PROTEIN_BACKBONE_ATOM_NAMES, PURINE_BASES,
    RNA_BASES, SACCHARIDE_NAMES, WATER_NAMES, is_standard_amino_acid, is_standard_base,
};
use super::rings::{RingData, find_rings};
use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

const BACKBONE_ATTACHMENT_ATOMS: &[&str] = &["P", "O3'", "O3*"];
const RIBOSE_2_PRIME_ATOMS: &[&str] = &["O2'", "O2*", "F2'", "F2*"];

const AROMATIC_RING_ELEMENTS: [u8; 12] = [5, 6, 7, 8, 14, 15, 16, 32, 33, 50, 51, 83];
const AROMATIC_RING_PLANARITY_THRESHOLD: f32 = 0.05;

/// Intra-residue bond template with residue-local atom indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResidueBonds {
    pub atom_indices1: Vec<usize>,
    pub atom_indices2: Vec<usize>,
    pub bond_orders: Vec<i8>,
}

impl ResidueBonds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, atom_index1: usize, atom_index2: usize, bond_order: i8) {
        self.atom_indices1.push(atom_index1);
        self.atom_indices2.push(atom_index2);
        self.bond_orders.push(bond_order);
    }

    pub fn len(&self) -> usize {
        self.atom_indices1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atom_indices1.is_empty()
    }

    /// Index of the template bond between two local atoms, in either direction.
    pub fn bond_index(&self, atom_index1: usize, atom_index2: usize) -> Option<usize> {
        self.atom_indices1
            .iter()
            .zip(&self.atom_indices2)
            .position(|(&a, &b)| {
                (a == atom_index1 && b == atom_index2) || (a == atom_index2 && b == atom_index1)
            })
    }
}

/// Residue-local adjacency lists built from a bond template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondGraph {
    adjacency: Vec<Vec<usize>>,
}

impl BondGraph {
    pub fn new(atom_count: usize, atom_indices1: &[usize], atom_indices2: &[usize]) -> Self {
        let mut adjacency = vec![Vec::new(); atom_count];
        for (&a, &b) in atom_indices1.iter().zip(atom_indices2) {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
        Self { adjacency }
    }

    pub fn neighbors(&self, atom: usize) -> &[usize] {
        &self.adjacency[atom]
    }

    pub fn atom_count(&self) -> usize {
        self.adjacency.len()
    }
}

/// The content that identifies a residue type.
///
/// Two residues with equal keys share one [`ResidueType`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResidueTypeKey {
    pub resname: String,
    pub atom_type_ids: Vec<u16>,
    pub hetero: bool,
    pub chem_comp_type: String,
}

/// Shared descriptor of every residue with the same name, atom list and classification.
///
/// Classification (molecule type, backbone types and backbone atom indices) is derived
/// once at construction. Topology derived data (bond graph, rings, bond reference atoms,
/// aromaticity) is computed on first use from the bond template and cached until the
/// template is replaced with [`ResidueType::set_bonds`].
#[derive(Debug, Clone)]
pub struct ResidueType {
    pub resname: String,
    pub atom_type_ids: Vec<u16>,
    pub hetero: bool,
    pub chem_comp_type: String,
    /// Atom names in residue order, resolved from the atom types.
    pub atom_names: Vec<String>,
    /// Atomic numbers in residue order, resolved from the atom types.
    pub atom_numbers: Vec<u8>,
    pub molecule_type: MoleculeType,
    pub backbone_type: BackboneType,
    pub backbone_end_type: BackboneType,
    pub backbone_start_type: BackboneType,
    pub backbone_index_list: Vec<usize>,
    pub trace_atom_index: Option<usize>,
    pub direction1_atom_index: Option<usize>,
    pub direction2_atom_index: Option<usize>,
    pub backbone_start_atom_index: Option<usize>,
    pub backbone_end_atom_index: Option<usize>,
    pub rung_end_atom_index: Option<usize>,
    bonds: OnceLock<ResidueBonds>,
    bond_graph: OnceLock<BondGraph>,
    rings: OnceLock<RingData>,
    bond_reference_atoms: OnceLock<Vec<Option<usize>>>,
    aromatic_atoms: OnceLock<Vec<bool>>,
}

impl ResidueType {
    /// Creates a residue type and derives its classification.
    ///
    /// # Arguments
    ///
    /// * `key` - The identifying content of the residue type.
    /// * `atom_map` - The atom type registry the ids in `key` refer to.
    /// * `bonds` - An explicit bond template, if the input provides one.
    pub fn new(key: ResidueTypeKey, atom_map: &AtomTypeRegistry, bonds: Option<ResidueBonds>) -> Self {
        let (atom_names, atom_numbers) = key
            .atom_type_ids
            .iter()
            .map(|&id| {
                let atom_type = atom_map.get(id);
                (atom_type.atomname.clone(), atom_type.number)
            })
            .unzip();

        let mut residue_type = Self {
            resname: key.resname,
            atom_type_ids: key.atom_type_ids,
            hetero: key.hetero,
            chem_comp_type: key.chem_comp_type,
            atom_names,
            atom_numbers,
            molecule_type: MoleculeType::Unknown,
            backbone_type: BackboneType::Unknown,
            backbone_end_type: BackboneType::Unknown,
            backbone_start_type: BackboneType::Unknown,
            backbone_index_list: Vec::new(),
            trace_atom_index: None,
            direction1_atom_index: None,
            direction2_atom_index: None,
            backbone_start_atom_index: None,
            backbone_end_atom_index: None,
            rung_end_atom_index: None,
            bonds: bonds.map(OnceLock::from).unwrap_or_default(),
            bond_graph: OnceLock::new(),
            rings: OnceLock::new(),
            bond_reference_atoms: OnceLock::new(),
            aromatic_atoms: OnceLock::new(),
        };

        residue_type.molecule_type = residue_type.classify_molecule();
        residue_type.backbone_type = residue_type.classify_backbone(BackbonePosition::Middle);
        residue_type.backbone_end_type = residue_type.classify_backbone(BackbonePosition::End);
        residue_type.backbone_start_type = residue_type.classify_backbone(BackbonePosition::Start);
        residue_type.backbone_index_list = residue_type.collect_backbone_indices();

        let atoms = residue_type.backbone_type.atoms();
        residue_type.trace_atom_index = residue_type.atom_index_by_name(atoms.trace);
        residue_type.direction1_atom_index = residue_type.atom_index_by_name(atoms.direction1);
        residue_type.direction2_atom_index = residue_type.atom_index_by_name(atoms.direction2);
        residue_type.backbone_start_atom_index = residue_type
            .atom_index_by_name(residue_type.backbone_start_type.atoms().backbone_start);
        residue_type.backbone_end_atom_index = residue_type
            .atom_index_by_name(residue_type.backbone_end_type.atoms().backbone_end);
        residue_type.rung_end_atom_index = if PURINE_BASES.contains(residue_type.resname.as_str()) {
            residue_type.atom_index_by_name(&["N1"])
        } else {
            residue_type.atom_index_by_name(&["N3"])
        };

        residue_type
    }

    pub fn atom_count(&self) -> usize {
        self.atom_type_ids.len()
    }

    /// Returns the first atom whose name is one of `names`.
    pub fn atom_index_by_name(&self, names: &[&str]) -> Option<usize> {
        if names.is_empty() {
            return None;
        }
        self.atom_names
            .iter()
            .position(|name| names.contains(&name.as_str()))
    }

    /// Checks that every non-empty group of alternatives matches at least one atom.
    pub fn has_atom_with_name(&self, groups: &[&[&str]]) -> bool {
        groups
            .iter()
            .filter(|names| !names.is_empty())
            .all(|names| self.atom_index_by_name(names).is_some())
    }

    pub fn is_protein(&self) -> bool {
        if !self.chem_comp_type.is_empty() {
            return CHEM_COMP_PROTEIN.contains(self.chem_comp_type.as_str());
        }
        self.has_atom_with_name(&[&["CA"], &["C"], &["N"]]) || AA1.contains_key(self.resname.as_str())
    }

    pub fn is_rna(&self) -> bool {
        if !self.chem_comp_type.is_empty() {
            return CHEM_COMP_RNA.contains(self.chem_comp_type.as_str());
        }
        if self.hetero {
            return false;
        }
        self.has_atom_with_name(&[BACKBONE_ATTACHMENT_ATOMS, &["C4'", "C4*"], RIBOSE_2_PRIME_ATOMS])
            || (RNA_BASES.contains(self.resname.as_str())
                && self.has_atom_with_name(&[RIBOSE_2_PRIME_ATOMS]))
    }

    pub fn is_dna(&self) -> bool {
        if !self.chem_comp_type.is_empty() {
            return CHEM_COMP_DNA.contains(self.chem_comp_type.as_str());
        }
        if self.hetero {
            return false;
        }
        (self.has_atom_with_name(&[BACKBONE_ATTACHMENT_ATOMS, &["C3'", "C3*"]])
            && !self.has_atom_with_name(&[RIBOSE_2_PRIME_ATOMS]))
            || DNA_BASES.contains(self.resname.as_str())
    }

    pub fn is_nucleic(&self) -> bool {
        self.is_rna() || self.is_dna()
    }

    pub fn is_water(&self) -> bool {
        WATER_NAMES.contains(self.resname.as_str())
    }

    pub fn is_ion(&self) -> bool {
        ION_NAMES.contains(self.resname.as_str())
    }

    pub fn is_saccharide(&self) -> bool {
        if !self.chem_comp_type.is_empty() {
            return CHEM_COMP_SACCHARIDE.contains(self.chem_comp_type.as_str());
        }
        SACCHARIDE_NAMES.contains(self.resname.as_str())
    }

    pub fn is_standard_amino_acid(&self) -> bool {
        is_standard_amino_acid(&self.resname)
    }

    pub fn is_standard_base(&self) -> bool {
        is_standard_base(&self.resname)
    }

    pub fn is_cg(&self) -> bool {
        self.backbone_type.is_cg()
    }

    fn classify_molecule(&self) -> MoleculeType {
        if self.is_protein() {
            MoleculeType::Protein
        } else if self.is_rna() {
            MoleculeType::Rna
        } else if self.is_dna() {
            MoleculeType::Dna
        } else if self.is_water() {
            MoleculeType::Water
        } else if self.is_ion() {
            MoleculeType::Ion
        } else if self.is_saccharide() {
            MoleculeType::Saccharide
        } else {
            MoleculeType::Unknown
        }
    }

    fn has_backbone_atoms(&self, position: BackbonePosition, backbone_type: BackboneType) -> bool {
        let atoms = backbone_type.atoms();
        let terminal: &[&str] = match position {
            BackbonePosition::End => atoms.backbone_end,
            BackbonePosition::Middle => &[],
            BackbonePosition::Start => atoms.backbone_start,
        };
        self.has_atom_with_name(&[atoms.trace, terminal, atoms.direction1, atoms.direction2])
    }

    /// Derives the backbone type this residue provides at a polymer position.
    pub fn classify_backbone(&self, position: BackbonePosition) -> BackboneType {
        let count = self.atom_count();
        let candidates = [
            (BackboneType::Protein, self.is_protein()),
            (BackboneType::Rna, self.is_rna()),
            (BackboneType::Dna, self.is_dna()),
            (BackboneType::CgProtein, count <= CG_PROTEIN_MAX_ATOMS && self.is_protein()),
            (BackboneType::CgRna, count <= CG_NUCLEIC_MAX_ATOMS && self.is_rna()),
            (BackboneType::CgDna, count <= CG_NUCLEIC_MAX_ATOMS && self.is_dna()),
        ];
        candidates
            .into_iter()
            .find(|&(backbone_type, applies)| {
                applies && self.has_backbone_atoms(position, backbone_type)
            })
            .map_or(BackboneType::Unknown, |(backbone_type, _)| backbone_type)
    }

    fn collect_backbone_indices(&self) -> Vec<usize> {
        let names = match self.molecule_type {
            MoleculeType::Protein => &PROTEIN_BACKBONE_ATOM_NAMES,
            MoleculeType::Rna | MoleculeType::Dna => &NUCLEIC_BACKBONE_ATOM_NAMES,
            _ => return Vec::new(),
        };
        self.atom_names
            .iter()
            .enumerate()
            .filter(|(_, name)| names.contains(name.as_str()))
            .map(|(i, _)| i)
            .collect()
    }

    /// The bond template, if one was supplied or has been computed.
    pub fn bonds(&self) -> Option<&ResidueBonds> {
        self.bonds.get()
    }

    /// Returns the bond template, computing it with `init` on first use.
    pub fn bonds_or_init(&self, init: impl FnOnce() -> ResidueBonds) -> &ResidueBonds {
        self.bonds.get_or_init(init)
    }

    /// Replaces the bond template and drops every cache derived from it.
    pub fn set_bonds(&mut self, bonds: ResidueBonds) {
        self.bonds = OnceLock::from(bonds);
        self.bond_graph = OnceLock::new();
        self.rings = OnceLock::new();
        self.bond_reference_atoms = OnceLock::new();
        self.aromatic_atoms = OnceLock::new();
    }

    /// Mutable access to the bond orders of the template.
    pub fn bond_orders_mut(&mut self) -> Option<&mut Vec<i8>> {
        self.bond_reference_atoms = OnceLock::new();
        self.bonds.get_mut().map(|bonds| &mut bonds.bond_orders)
    }

    pub fn bond_graph(&self) -> &BondGraph {
        self.bond_graph.get_or_init(|| match self.bonds.get() {
            Some(bonds) => BondGraph::new(self.atom_count(), &bonds.atom_indices1, &bonds.atom_indices2),
            None => BondGraph::new(self.atom_count(), &[], &[]),
        })
    }

    pub fn rings(&self) -> &RingData {
        self.rings.get_or_init(|| find_rings(self.bond_graph()))
    }

    pub fn bond_index(&self, atom_index1: usize, atom_index2: usize) -> Option<usize> {
        self.bonds.get()?.bond_index(atom_index1, atom_index2)
    }

    /// Reference atom for drawing the multiple bond between two local atoms.
    pub fn bond_reference_atom_index(&self, atom_index1: usize, atom_index2: usize) -> Option<usize> {
        let bond_index = self.bond_index(atom_index1, atom_index2)?;
        self.bond_reference_atoms
            .get_or_init(|| self.assign_bond_reference_atoms())
            .get(bond_index)
            .copied()
            .flatten()
    }

    fn assign_bond_reference_atoms(&self) -> Vec<Option<usize>> {
        let Some(bonds) = self.bonds.get() else {
            return Vec::new();
        };
        let graph = self.bond_graph();
        let rings = self.rings();

        (0..bonds.len())
            .map(|i| {
                if bonds.bond_orders[i] <= 1 {
                    return None;
                }
                let ai1 = bonds.atom_indices1[i];
                let ai2 = bonds.atom_indices2[i];
                let ref_ring = rings.shared_ring(ai1, ai2);
                let pick = |center: usize, other: usize| {
                    graph.neighbors(center).iter().copied().find(|&ai3| {
                        ai3 != other && ref_ring.is_none_or(|ring| ring.contains(&ai3))
                    })
                };
                if graph.neighbors(ai1).len() > 1 {
                    pick(ai1, ai2)
                } else if graph.neighbors(ai2).len() > 1 {
                    pick(ai2, ai1)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Aromaticity flags per atom, computed on first use from ring planarity.
    ///
    /// `position` maps a residue-local atom index to its coordinates in the residue
    /// instance used for the computation.
    pub fn aromatic_atoms_or_init(&self, position: impl Fn(usize) -> Point3<f32>) -> &[bool] {
        self.aromatic_atoms.get_or_init(|| {
            let mut flags = vec![false; self.atom_count()];
            for ring in &self.rings().rings {
                let elements_ok = ring
                    .iter()
                    .all(|&i| AROMATIC_RING_ELEMENTS.contains(&self.atom_numbers[i]));
                if elements_ok && is_planar(ring.iter().map(|&i| position(i))) {
                    for &i in ring {
                        flags[i] = true;
                    }
                }
            }
            flags
        })
    }
}

fn is_planar(points: impl Iterator<Item = Point3<f32>>) -> bool {
    let points: Vec<Point3<f32>> = points.collect();
    if points.len() < 3 {
        return false;
    }
    let centroid = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / points.len() as f32;
    let covariance = points.iter().fold(Matrix3::zeros(), |acc, p| {
        let d = p.coords - centroid;
        acc + d * d.transpose()
    });
    let eigen = covariance.symmetric_eigen();
    let normal = eigen.eigenvectors.column(eigen.eigenvalues.imin()).into_owned();
    let (min, max) = points
        .iter()
        .map(|p| (p.coords - centroid).dot(&normal))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| (lo.min(d), hi.max(d)));
    (max - min) / 2.0 < AROMATIC_RING_PLANARITY_THRESHOLD
}

/// Interning table for residue types.
#[derive(Debug, Clone, Default)]
pub struct ResidueTypeRegistry {
    types: Vec<ResidueType>,
    index: HashMap<ResidueTypeKey, u16>,
}

impl ResidueTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of the residue type with the given content, creating it if needed.
    ///
    /// `bonds` is only used when a new type is created.
    pub fn add(
        &mut self,
        key: ResidueTypeKey,
        atom_map: &AtomTypeRegistry,
        bonds: Option<ResidueBonds>,
    ) -> Result<u16, TypeRegistryError> {
        if let Some(&id) = self.index.get(&key) {
            return Ok(id);
        }
        let id = u16::try_from(self.types.len()).map_err(|_| TypeRegistryError::Full {
            registry: "residue",
            capacity: usize::from(u16::MAX) + 1,
        })?;
        self.types.push(ResidueType::new(key.clone(), atom_map, bonds));
        self.index.insert(key, id);
        Ok(id)
    }

    pub fn get(&self, id: u16) -> &ResidueType {
        &self.types[usize::from(id)]
    }

    pub fn get_mut(&mut self, id: u16) -> &mut ResidueType {
        &mut self.types[usize::from(id)]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResidueType> {
        self.types.iter()
    }
}
