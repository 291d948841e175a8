use super::Structure;
use crate::core::proxy::ResidueProxy;
use crate::core::store::ColumnStore;
use crate::core::types::BackboneType;
use crate::core::types::ResidueBonds;
use crate::core::types::constants::bond_order_from_table;
use crate::index::bitset::BitSet;
use crate::index::bond_hash::BondHash;
use crate::index::kdtree::{Kdtree, Metric};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

const CG_NEIGHBOR_RADIUS: f32 = 1.2;
const NEIGHBOR_RADIUS: f32 = 2.3;

/// Derives the bond template of a residue from its geometry.
///
/// Every atom pair passing the connectivity test becomes a bond, ordered by the first
/// and then the second residue-local atom index. Bond orders come from the table of
/// standard residues. Residues above the configured atom limit get no bonds; residues
/// above the k-d tree threshold only test pairs found within the covalent search radius.
///
/// # Arguments
///
/// * `residue` - The residue instance whose coordinates are used.
///
/// # Return
///
/// The bond template with residue-local atom indices.
pub fn calculate_residue_bonds(residue: &ResidueProxy<'_>) -> ResidueBonds {
    let structure = residue.structure();
    let bonding = &structure.config.bonding;
    let count = residue.atom_count();
    let offset = residue.atom_offset();
    let end = residue.atom_end();
    let resname = residue.resname();
    let mut bonds = ResidueBonds::new();

    if count > bonding.max_residue_atoms {
        warn!(
            residue = %residue.qualified_name(false),
            atoms = count,
            limit = bonding.max_residue_atoms,
            "Residue too large for automatic bonding"
        );
        return bonds;
    }

    let mut add = |i: usize, j: usize| {
        let order = bond_order_from_table(
            resname,
            structure.atom(i).atomname(),
            structure.atom(j).atomname(),
        );
        bonds.push(i - offset, j - offset, order);
    };

    if count > bonding.kdtree_threshold {
        let tree = Kdtree::new(
            residue.atoms().map(|atom| (atom.index, atom.position())),
            Metric::SquaredEuclidean,
        );
        let radius = if residue.is_cg() {
            CG_NEIGHBOR_RADIUS
        } else {
            NEIGHBOR_RADIUS
        };
        for atom1 in residue.atoms() {
            let max_distance = atom1.covalent() + radius + bonding.upper_tolerance;
            let neighbors = tree.nearest(&atom1.position(), usize::MAX, max_distance * max_distance);
            for index2 in neighbors.iter().map(|n| n.index).filter(|&j| j > atom1.index).sorted_unstable() {
                if atom1.connected_to(&structure.atom(index2)) {
                    add(atom1.index, index2);
                }
            }
        }
    } else {
        for i in offset..end {
            let atom1 = structure.atom(i);
            for j in i + 1..end {
                if atom1.connected_to(&structure.atom(j)) {
                    add(i, j);
                }
            }
        }
    }

    debug!(
        residue = %residue.qualified_name(false),
        bonds = bonds.len(),
        "Calculated residue bond template"
    );
    bonds
}

/// Residues bonded to their surroundings by distance: no polymer backbone and not water.
fn is_hetero_group(residue: &ResidueProxy<'_>) -> bool {
    residue.backbone_type() == BackboneType::Unknown && !residue.is_water()
}

impl Structure {
    /// Calculates intra- and inter-residue bonds from geometry.
    #[instrument(skip_all, name = "calculate_bonds")]
    pub fn calculate_bonds(&mut self) {
        self.calculate_bonds_within(false);
        self.calculate_bonds_between(false, false);
    }

    /// Adds the bonds of every residue's template and the rung bonds of nucleotides.
    ///
    /// Template bonds that already exist in the bond store are not added again; their
    /// stored order replaces the order in the residue type's template instead.
    ///
    /// # Arguments
    ///
    /// * `only_add_rung` - Only add rung bonds, leaving covalent bonds untouched.
    #[instrument(skip_all, name = "calculate_bonds_within")]
    pub fn calculate_bonds_within(&mut self, only_add_rung: bool) {
        let atom_count = self.atom_store.count;
        let max_atoms = self.config.bonding.max_residue_atoms;

        let existing: HashMap<(usize, usize), usize> = self
            .bond_store
            .iter()
            .enumerate()
            .flat_map(|(i, (a1, a2, _))| [((a1, a2), i), ((a2, a1), i)])
            .collect();

        let mut new_bonds = Vec::new();
        let mut order_overrides = Vec::new();
        let mut rung_bonds = Vec::new();
        let mut rung_atom_set = BitSet::new(atom_count);
        let mut skipped = 0usize;

        for residue in self.residues() {
            if residue.atom_count() > max_atoms {
                warn!(
                    residue = %residue.qualified_name(false),
                    atoms = residue.atom_count(),
                    "Skipping residue for intra-residue bonding"
                );
                skipped += 1;
                continue;
            }

            if !only_add_rung {
                let offset = residue.atom_offset();
                let bonds = residue.bonds();
                for k in 0..bonds.len() {
                    let a1 = bonds.atom_indices1[k] + offset;
                    let a2 = bonds.atom_indices2[k] + offset;
                    match existing.get(&(a1, a2)) {
                        Some(&bond) => order_overrides.push((
                            residue.residue_type_id(),
                            k,
                            self.bond_store.bond_order[bond],
                        )),
                        None => new_bonds.push((a1, a2, bonds.bond_orders[k])),
                    }
                }
            }

            if let (Some(trace), Some(rung_end)) =
                (residue.trace_atom_index(), residue.rung_end_atom_index())
            {
                rung_bonds.push((trace, rung_end));
                rung_atom_set.set(trace);
                rung_atom_set.set(rung_end);
            }
        }

        for (type_id, k, order) in order_overrides {
            if let Some(orders) = self.residue_map.get_mut(type_id).bond_orders_mut() {
                orders[k] = order;
            }
        }
        for &(a1, a2, order) in &new_bonds {
            self.bond_store.add_bond(a1, a2, order);
        }
        for &(a1, a2) in &rung_bonds {
            self.rung_bond_store.add_bond(a1, a2, 1);
        }
        self.set_rung_atom_set(rung_atom_set);

        info!(
            bonds = new_bonds.len(),
            rung_bonds = rung_bonds.len(),
            skipped_residues = skipped,
            "Calculated intra-residue bonds"
        );
    }

    /// Adds bonds between residues.
    ///
    /// Consecutive residues with the same known backbone type are linked from the backbone
    /// end atom of the first to the backbone start atom of the second, and their trace
    /// atoms get a backbone bond. The last and first residue of every chain with at least
    /// three residues are tried as well, closing cyclic polymers. Atoms of hetero groups
    /// are bonded to atoms of other residues of the same model found within the hetero
    /// search radius.
    ///
    /// # Arguments
    ///
    /// * `only_add_backbone` - Only add backbone bonds, no covalent bonds.
    /// * `use_existing_bonds` - Treat residues as linked if their backbone atoms are
    ///   already bonded in the bond store, regardless of geometry.
    #[instrument(skip_all, name = "calculate_bonds_between")]
    pub fn calculate_bonds_between(&mut self, only_add_backbone: bool, use_existing_bonds: bool) {
        let atom_count = self.atom_store.count;
        let existing = use_existing_bonds.then(|| BondHash::new(&self.bond_store, atom_count));

        let mut bonds = Vec::new();
        let mut backbone_bonds = Vec::new();
        let mut backbone_atom_set = BitSet::new(atom_count);

        let mut link = |rp1: &ResidueProxy<'_>, rp2: &ResidueProxy<'_>| {
            let backbone_type = rp1.backbone_type();
            if backbone_type == BackboneType::Unknown || backbone_type != rp2.backbone_type() {
                return;
            }
            let (Some(end), Some(start)) =
                (rp1.backbone_end_atom_index(), rp2.backbone_start_atom_index())
            else {
                return;
            };
            let bonded = existing.as_ref().is_some_and(|hash| {
                hash.bond_indices(end).iter().any(|&b| {
                    let (a1, a2) = self.bond_store.atom_indices(b as usize);
                    (a1 == end && a2 == start) || (a1 == start && a2 == end)
                })
            });
            if !bonded && !self.atom(end).connected_to(&self.atom(start)) {
                return;
            }
            if !only_add_backbone && !bonded {
                bonds.push((end, start));
            }
            if let (Some(trace1), Some(trace2)) = (rp1.trace_atom_index(), rp2.trace_atom_index()) {
                backbone_bonds.push((trace1, trace2));
                backbone_atom_set.set(trace1);
                backbone_atom_set.set(trace2);
            }
        };

        for (rp1, rp2) in self.residues().tuple_windows() {
            link(&rp1, &rp2);
        }
        for chain in self.chains() {
            if chain.residue_count() >= 3 {
                let first = self.residue(chain.residue_offset());
                let last = self.residue(chain.residue_end() - 1);
                link(&last, &first);
            }
        }

        let linked = bonds.len();
        if !only_add_backbone {
            match self.spatial_hash() {
                Some(spatial_hash) => {
                    let radius = self.config.bonding.hetero_search_radius;
                    for residue in self.residues().filter(is_hetero_group) {
                        for atom in residue.atoms().filter(|atom| !atom.is_metal()) {
                            spatial_hash.each_within(&atom.position(), radius, |j, _| {
                                let other = self.atom(j);
                                if other.residue_index() == atom.residue_index()
                                    || other.model_index() != atom.model_index()
                                    || other.is_metal()
                                {
                                    return;
                                }
                                if j < atom.index && is_hetero_group(&other.residue()) {
                                    return;
                                }
                                if atom.connected_to(&other) {
                                    bonds.push((atom.index, j));
                                }
                            });
                        }
                    }
                }
                None => debug!("No spatial grid, skipping hetero group bonds"),
            }
        }

        for &(a1, a2) in &bonds {
            self.bond_store.add_bond(a1, a2, 1);
        }
        for &(a1, a2) in &backbone_bonds {
            self.backbone_bond_store.add_bond(a1, a2, 1);
        }
        self.set_backbone_atom_set(backbone_atom_set);

        info!(
            linked = linked,
            hetero = bonds.len() - linked,
            backbone_bonds = backbone_bonds.len(),
            "Calculated inter-residue bonds"
        );
    }

    /// Gives every residue type without a bond template the intra-residue bonds of its
    /// first residue in the bond store.
    #[instrument(skip_all, name = "assign_residue_type_bonds")]
    pub fn assign_residue_type_bonds(&mut self) {
        let local_hash;
        let bond_hash = match self.bond_hash.as_ref() {
            Some(hash) => hash,
            None => {
                local_hash = BondHash::new(&self.bond_store, self.atom_store.count);
                &local_hash
            }
        };

        let mut templates: HashMap<u16, ResidueBonds> = HashMap::new();
        for residue in self.residues() {
            let type_id = residue.residue_type_id();
            if residue.residue_type().bonds().is_some() || templates.contains_key(&type_id) {
                continue;
            }
            let offset = residue.atom_offset();
            let range = offset..residue.atom_end();
            let mut seen = HashSet::new();
            let mut bonds = ResidueBonds::new();
            for atom in range.clone() {
                for &bond in bond_hash.bond_indices(atom) {
                    let bond = bond as usize;
                    let (a1, a2) = self.bond_store.atom_indices(bond);
                    if !range.contains(&a1) || !range.contains(&a2) {
                        continue;
                    }
                    let key = (a1.min(a2), a1.max(a2));
                    if seen.insert(key) {
                        bonds.push(key.0 - offset, key.1 - offset, self.bond_store.bond_order[bond]);
                    }
                }
            }
            templates.insert(type_id, bonds);
        }

        let assigned = templates.len();
        for (type_id, bonds) in templates {
            self.residue_map.get_mut(type_id).set_bonds(bonds);
        }
        debug!(residue_types = assigned, "Assigned residue type bonds");
    }

    /// Removes every bond and the derived bond state, keeping atoms untouched.
    pub fn clear_bonds(&mut self) {
        self.bond_store.clear();
        self.backbone_bond_store.clear();
        self.rung_bond_store.clear();
        self.bond_hash = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::structure::test_utils::*;

    fn bond_pairs(structure: &Structure) -> Vec<(usize, usize)> {
        structure
            .bond_store
            .iter()
            .map(|(a1, a2, _)| (a1.min(a2), a1.max(a2)))
            .sorted()
            .collect()
    }

    mod residue_templates {
        use super::*;

        #[test]
        fn all_pairs_template_matches_geometry() {
            let structure = build_dipeptide();
            let bonds = structure.residue(0).bonds();
            let pairs: Vec<(usize, usize)> = bonds
                .atom_indices1
                .iter()
                .copied()
                .zip(bonds.atom_indices2.iter().copied())
                .collect();
            assert_eq!(pairs, vec![(0, 1), (1, 2), (1, 4), (2, 3)]);
            // C=O of a standard amino acid is a double bond
            assert_eq!(bonds.bond_orders, vec![1, 1, 1, 2]);
        }

        fn large_ligand(z: impl Fn(usize) -> f32) -> Structure {
            let records = build_polyglycine("A", 20)
                .into_iter()
                .enumerate()
                .map(|(i, mut r)| {
                    r.resname = "LIG";
                    r.resno = 1;
                    r.position[2] = z(i);
                    r
                })
                .collect::<Vec<_>>();
            build_structure(&records)
        }

        fn all_pairs(structure: &Structure) -> Vec<(usize, usize)> {
            let count = structure.residue(0).atom_count();
            let mut pairs = Vec::new();
            for i in 0..count {
                for j in i + 1..count {
                    if structure.atom(i).connected_to(&structure.atom(j)) {
                        pairs.push((i, j));
                    }
                }
            }
            pairs
        }

        fn template_pairs(bonds: &ResidueBonds) -> Vec<(usize, usize)> {
            bonds
                .atom_indices1
                .iter()
                .copied()
                .zip(bonds.atom_indices2.iter().copied())
                .collect()
        }

        #[test]
        fn kdtree_path_finds_the_same_bonds_as_all_pairs() {
            let structure = large_ligand(|i| (i % 7) as f32 * 0.01);
            assert_eq!(structure.residue_count(), 1);
            assert!(structure.residue(0).atom_count() > structure.config.bonding.kdtree_threshold);

            let via_tree = calculate_residue_bonds(&structure.residue(0));
            let brute = all_pairs(&structure);
            assert!(!brute.is_empty());
            assert_eq!(template_pairs(&via_tree), brute);
        }

        #[test]
        fn planar_residue_above_the_threshold_is_bonded() {
            let structure = large_ligand(|_| 0.0);
            let bonds = calculate_residue_bonds(&structure.residue(0));
            assert_eq!(template_pairs(&bonds), all_pairs(&structure));
            assert_eq!(structure.bond_store.count, bonds.len());
        }
    }

    mod between_residues {
        use super::*;

        #[test]
        fn peptide_bond_and_backbone_bond_are_added() {
            let structure = build_dipeptide();
            assert_eq!(
                bond_pairs(&structure),
                vec![(0, 1), (1, 2), (1, 4), (2, 3), (2, 5), (5, 6), (6, 7), (7, 8)]
            );
            assert_eq!(structure.backbone_bond_store.count, 1);
            assert_eq!(structure.backbone_bond_store.atom_indices(0), (1, 6));
            let backbone = structure.backbone_atom_set().unwrap();
            assert_eq!(backbone.to_vec(), vec![1, 6]);
        }

        #[test]
        fn distant_residues_are_not_linked() {
            let mut records = build_polyglycine("A", 2);
            for r in records.iter_mut().skip(4) {
                r.position[0] += 20.0;
            }
            let structure = build_structure(&records);
            assert_eq!(structure.backbone_bond_store.count, 0);
            assert_eq!(structure.bond_count(), 6);
        }

        #[test]
        fn hetero_groups_bond_to_neighbors_once() {
            let mut records = build_polyglycine("A", 3);
            // a ligand carbon 1.5 Angstrom from the first CA
            records.push(record("A", "LIG", 10, "C1", "C", [0.0, -1.5, 0.0]));
            records.push(record("A", "LIG", 10, "C2", "C", [0.0, -3.0, 0.0]));
            let structure = build_structure(&records);
            let pairs = bond_pairs(&structure);
            assert!(pairs.contains(&(1, 12)));
            assert!(pairs.contains(&(12, 13)));
            assert_eq!(pairs.iter().filter(|&&p| p == (1, 12)).count(), 1);
        }

        #[test]
        fn existing_bonds_link_residues_without_geometry() {
            let mut records = build_polyglycine("A", 2);
            for r in records.iter_mut().skip(4) {
                r.position[0] += 20.0;
            }
            let mut structure = build_structure(&records);
            structure.bond_store.add_bond(2, 4, 1);
            structure.calculate_bonds_between(true, true);
            assert_eq!(structure.backbone_bond_store.count, 1);
            assert_eq!(structure.backbone_bond_store.atom_indices(0), (1, 5));
        }
    }

    mod type_bonds {
        use super::*;
        use crate::core::types::{ResidueTypeKey, ResidueTypeRegistry};

        #[test]
        fn residue_types_take_bonds_from_the_store() {
            let mut structure = build_structure(&build_polyglycine("A", 2));
            structure.clear_bonds();
            structure.bond_store.add_bond(1, 0, 1);
            structure.bond_store.add_bond(0, 1, 1);
            structure.bond_store.add_bond(2, 3, 2);
            structure.finalize_bonds();

            let key = ResidueTypeKey {
                resname: "GLY".to_string(),
                atom_type_ids: structure.residue_map.get(0).atom_type_ids.clone(),
                hetero: false,
                chem_comp_type: String::new(),
            };
            let mut registry = ResidueTypeRegistry::new();
            registry.add(key, &structure.atom_map, None).unwrap();
            structure.residue_map = registry;
            assert!(structure.residue_map.get(0).bonds().is_none());

            structure.assign_residue_type_bonds();
            let bonds = structure.residue_map.get(0).bonds().unwrap();
            assert_eq!(bonds.atom_indices1, vec![0, 2]);
            assert_eq!(bonds.atom_indices2, vec![1, 3]);
            assert_eq!(bonds.bond_orders, vec![1, 2]);
        }
    }
}
