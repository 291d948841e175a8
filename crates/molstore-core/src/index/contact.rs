use super::bitset::BitSet;
use super::kdtree::{Kdtree, Metric};
use crate::config::ContactConfig;
use crate::core::proxy::AtomProxy;
use crate::core::store::BondStore;
use crate::core::structure::{FnSelection, Structure, StructureView};
use nalgebra::Vector3;
use phf::{Map, phf_map};
use std::ptr;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

static DONORS: Map<&'static str, &'static [&'static str]> = phf_map! {
    "ARG" => &["NE", "NH1", "NH2"],
    "ASN" => &["ND2"],
    "GLN" => &["NE2"],
    "HIS" => &["ND1", "NE2"],
    "LYS" => &["NZ"],
    "SER" => &["OG"],
    "THR" => &["OG1"],
    "TRP" => &["NE1"],
    "TYR" => &["OH"],
};

static ACCEPTORS: Map<&'static str, &'static [&'static str]> = phf_map! {
    "ASN" => &["OD1"],
    "ASP" => &["OD1", "OD2"],
    "GLN" => &["OE1"],
    "GLU" => &["OE1", "OE2"],
    "HIS" => &["ND1", "NE2"],
    "SER" => &["OG"],
    "THR" => &["OG1"],
    "TYR" => &["OH"],
};

/// Result of a contact search.
#[derive(Debug, Clone)]
pub struct ContactData {
    /// Atoms of either view that take part in at least one contact.
    pub atom_set: BitSet,
    /// Contacts that passed all filters; every contact of `bond_store` initially.
    pub bond_set: BitSet,
    /// One row per contact, from the view 1 atom to the view 2 atom, with order 1.
    pub bond_store: BondStore,
    /// Distance of each contact in the configured metric.
    pub distances: Vec<f32>,
}

/// Proximity search between two structure views.
///
/// A k-d tree is built over the atoms of the second view once; every atom of the first
/// view is then queried against it. When both views belong to the same structure,
/// pairs within one residue are not reported.
pub struct Contact<'a> {
    view1: StructureView<'a>,
    view2: StructureView<'a>,
    tree: Kdtree,
}

impl<'a> Contact<'a> {
    #[instrument(skip_all, name = "contact_new")]
    pub fn new(view1: StructureView<'a>, view2: StructureView<'a>) -> Self {
        let tree = Kdtree::new(view2.positions(), Metric::SquaredEuclidean);
        debug!(
            atoms1 = view1.atom_count(),
            atoms2 = view2.atom_count(),
            "Indexed contact partner"
        );
        Self { view1, view2, tree }
    }

    pub fn view1(&self) -> &StructureView<'a> {
        &self.view1
    }

    pub fn view2(&self) -> &StructureView<'a> {
        &self.view2
    }

    fn neighbors(&self, index1: usize, config: &ContactConfig, same_structure: bool) -> Vec<(usize, f32)> {
        let structure1 = self.view1.structure();
        let structure2 = self.view2.structure();
        let atom1 = structure1.atom(index1);
        let max_count = config.max_neighbors.unwrap_or(usize::MAX);
        let max_sq = config.max_distance * config.max_distance;
        let min_sq = config.min_distance.map(|d| d * d);

        let mut found: Vec<(usize, f32)> = self
            .tree
            .nearest(&atom1.position(), max_count, max_sq)
            .into_iter()
            .filter(|n| {
                !(same_structure && structure2.atom(n.index).residue_index() == atom1.residue_index())
            })
            .filter(|n| min_sq.is_none_or(|min_sq| n.distance > min_sq))
            .map(|n| {
                let distance = match config.metric {
                    Metric::SquaredEuclidean => n.distance,
                    Metric::Euclidean => n.distance.sqrt(),
                };
                (n.index, distance)
            })
            .collect();
        found.sort_unstable_by_key(|&(index, _)| index);
        found
    }

    /// Finds all pairs of a view 1 atom and a view 2 atom within the configured distance.
    ///
    /// Contacts are ordered by the view 1 atom and then by the view 2 atom.
    #[instrument(skip_all, name = "contact_within")]
    pub fn within(&self, config: &ContactConfig) -> ContactData {
        let structure1 = self.view1.structure();
        let structure2 = self.view2.structure();
        let same_structure = ptr::eq(structure1, structure2);
        let indices = self.view1.atom_set().to_vec();

        #[cfg(feature = "parallel")]
        let found: Vec<Vec<(usize, f32)>> = indices
            .par_iter()
            .map(|&i| self.neighbors(i, config, same_structure))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let found: Vec<Vec<(usize, f32)>> = indices
            .iter()
            .map(|&i| self.neighbors(i, config, same_structure))
            .collect();

        let mut atom_set = BitSet::new(structure1.atom_count().max(structure2.atom_count()));
        let mut bond_store = BondStore::default();
        let mut distances = Vec::new();
        for (&index1, neighbors) in indices.iter().zip(&found) {
            if neighbors.is_empty() {
                continue;
            }
            atom_set.set(index1);
            for &(index2, distance) in neighbors {
                atom_set.set(index2);
                bond_store.add_bond(index1, index2, 1);
                distances.push(distance);
            }
        }

        let bond_set = BitSet::filled(bond_store.count);
        info!(
            contacts = bond_store.count,
            atoms = atom_set.size(),
            max_distance = config.max_distance,
            "Found contacts"
        );
        ContactData {
            atom_set,
            bond_set,
            bond_store,
            distances,
        }
    }
}

fn in_table(table: &Map<&'static str, &'static [&'static str]>, atom: &AtomProxy<'_>) -> bool {
    table
        .get(atom.resname())
        .is_some_and(|names| names.contains(&atom.atomname()))
}

fn is_donor(atom: &AtomProxy<'_>) -> bool {
    in_table(&DONORS, atom) || is_backbone_n(atom)
}

fn is_acceptor(atom: &AtomProxy<'_>) -> bool {
    in_table(&ACCEPTORS, atom) || is_backbone_o(atom)
}

fn angle_degrees(v1: &Vector3<f32>, v2: &Vector3<f32>) -> f32 {
    v1.angle(v2).to_degrees()
}

/// Angle between the bisector of a backbone nitrogen's C(prev)-N and CA-N bonds and the
/// direction towards `partner`.
///
/// `None` if the residue has no CA or no connected previous residue with a C atom.
fn backbone_n_angle(n: &AtomProxy<'_>, partner: &AtomProxy<'_>) -> Option<f32> {
    let structure = n.structure();
    let residue = n.residue();
    let ca = structure.atom(residue.atom_index_by_name(&["CA"])?);
    let c = structure.atom(residue.previous_connected_residue()?.atom_index_by_name(&["C"])?);
    let bisector = ((n.position() - c.position()) + (n.position() - ca.position())) * 0.5;
    Some(angle_degrees(&bisector, &(partner.position() - n.position())))
}

type AtomTest = fn(&AtomProxy<'_>) -> bool;

fn is_backbone_n(atom: &AtomProxy<'_>) -> bool {
    atom.atomname() == "N" && atom.is_protein()
}

fn is_backbone_o(atom: &AtomProxy<'_>) -> bool {
    atom.atomname() == "O" && atom.is_protein()
}

fn contacts_between(structure: &Structure, donor: AtomTest, acceptor: AtomTest, max_distance: f32) -> ContactData {
    let donors = FnSelection::new("donors", donor);
    let acceptors = FnSelection::new("acceptors", acceptor);
    let config = ContactConfig {
        max_distance,
        min_distance: None,
        max_neighbors: None,
        metric: Metric::Euclidean,
    };
    debug!(structure = %structure.name, "Searching polar contacts");
    Contact::new(
        StructureView::new(structure, Some(&donors)),
        StructureView::new(structure, Some(&acceptors)),
    )
    .within(&config)
}

/// Hydrogen-bond-like contacts between donor and acceptor atoms of standard residues.
///
/// Backbone N to backbone O contacts are dropped. Contacts of a backbone nitrogen are
/// kept only if the partner lies within `max_angle` degrees of the N-H direction, and
/// contacts of a tyrosine OH only if the CZ-OH-partner geometry is within `max_angle`.
#[instrument(skip_all, name = "polar_contacts")]
pub fn polar_contacts(structure: &Structure, max_distance: f32, max_angle: f32) -> ContactData {
    let mut data = contacts_between(structure, is_donor, is_acceptor, max_distance);

    for i in 0..data.bond_store.count {
        let (a1, a2) = data.bond_store.atom_indices(i);
        let atom1 = structure.atom(a1);
        let atom2 = structure.atom(a2);
        let (name1, name2) = (atom1.atomname(), atom2.atomname());

        if (name1 == "O" && name2 == "N") || (name1 == "N" && name2 == "O") {
            data.bond_set.clear(i);
        } else if name1 == "N" || name2 == "N" {
            let (n, partner) = if name1 == "N" { (atom1, atom2) } else { (atom2, atom1) };
            if backbone_n_angle(&n, &partner).is_some_and(|angle| angle > max_angle) {
                data.bond_set.clear(i);
            }
        } else if (name1 == "OH" && atom1.resname() == "TYR") || (name2 == "OH" && atom2.resname() == "TYR") {
            let (o, partner) = if name1 == "OH" { (atom1, atom2) } else { (atom2, atom1) };
            let within_angle = o.residue().atom_index_by_name(&["CZ"]).is_some_and(|cz| {
                let cz = structure.atom(cz).position();
                angle_degrees(&(cz - o.position()), &(cz - partner.position())) < max_angle
            });
            if !within_angle {
                data.bond_set.clear(i);
            }
        }
    }

    info!(
        contacts = data.bond_set.size(),
        candidates = data.bond_store.count,
        "Filtered polar contacts"
    );
    data
}

/// Backbone N to backbone O contacts of proteins that satisfy the N-H direction angle.
#[instrument(skip_all, name = "polar_backbone_contacts")]
pub fn polar_backbone_contacts(structure: &Structure, max_distance: f32, max_angle: f32) -> ContactData {
    let mut data = contacts_between(structure, is_backbone_n, is_backbone_o, max_distance);

    for i in 0..data.bond_store.count {
        let (a1, a2) = data.bond_store.atom_indices(i);
        let n = structure.atom(a1);
        let o = structure.atom(a2);
        if backbone_n_angle(&n, &o).is_some_and(|angle| angle > max_angle) {
            data.bond_set.clear(i);
        }
    }

    info!(contacts = data.bond_set.size(), "Filtered backbone contacts");
    data
}
