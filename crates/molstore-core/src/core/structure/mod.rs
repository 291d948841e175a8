//! # Structure
//!
//! The owning container of one molecular structure: the entity stores, the type
//! registries, the derived indices and the cached atom and bond sets.
//!
//! ## Key Components
//!
//! - **[`Structure`]** - Stores, registries, index build phases, iteration and queries
//! - **[`StructureBuilder`]** - Derives the model/chain/residue hierarchy from a flat
//!   stream of atom records and finalizes the structure
//! - **[`bonds`]** - Automatic intra- and inter-residue bond calculation
//! - **[`selection`]** - The [`Selection`] predicate interface and [`AtomSelection`]
//! - **[`data`]** - Bulk per-atom and per-bond attribute extraction
//! - **[`StructureView`]** - A structure restricted to a subset of its atoms
//!
//! A structure goes through two phases. While it is built, rows are appended to the
//! stores. [`Structure::finalize_atoms`] and [`Structure::finalize_bonds`] then build the
//! spatial grid, the bond adjacency index and the default atom and bond sets. Any later
//! change of coordinates requires [`Structure::refresh_position`]; any change of bonds
//! requires another [`Structure::finalize_bonds`].

pub mod bonds;
pub mod builder;
pub mod data;
pub mod selection;
pub mod view;

mod sets;

pub use builder::{AtomSite, StructureBuilder};
pub use data::{
    AtomData, AtomDataParams, BondData, BondDataParams, BondSource, DataFields, MultipleBond,
    RadiusParams, RadiusType,
};
pub use selection::{AtomSelection, FnSelection, Selection};
pub use view::StructureView;

use crate::config::StructureConfig;
use crate::core::proxy::{AtomProxy, AtomProxyMut, BondProxy, ChainProxy, ModelProxy, Polymer, ResidueProxy};
use crate::core::store::{
    AtomStore, BondStore, ChainStore, ColumnStore, ModelStore, ResidueStore,
};
use crate::core::types::{AtomTypeRegistry, ResidueTypeRegistry, TypeRegistryError};
use crate::core::utils::geometry::BoundingBox;
use crate::index::bitset::BitSet;
use crate::index::bond_hash::BondHash;
use crate::index::spatial_hash::SpatialHash;
use nalgebra::Point3;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("Residue {residue} has more than {max} atoms")]
    ResidueTooLarge { residue: String, max: usize },
    #[error("Atom index {index} is out of range for a structure with {count} atoms")]
    AtomIndexOutOfRange { index: usize, count: usize },
    #[error("Position array has {actual} values, expected {expected}")]
    PositionLength { expected: usize, actual: usize },
    #[error("Type registry error: {0}")]
    TypeRegistry(#[from] TypeRegistryError),
}

/// A molecular structure stored column-wise.
///
/// The stores and registries are public so loaders and tools can work on the raw
/// columns. The derived state (indices, default sets and the selection cache) is only
/// reachable through methods, because it has to be rebuilt or invalidated whenever the
/// underlying columns change.
pub struct Structure {
    pub name: String,
    pub config: StructureConfig,

    pub atom_store: AtomStore,
    pub residue_store: ResidueStore,
    pub chain_store: ChainStore,
    pub model_store: ModelStore,
    pub bond_store: BondStore,
    pub backbone_bond_store: BondStore,
    pub rung_bond_store: BondStore,

    pub atom_map: AtomTypeRegistry,
    pub residue_map: ResidueTypeRegistry,

    atom_set: BitSet,
    bond_set: BitSet,
    backbone_atom_set: Option<BitSet>,
    rung_atom_set: Option<BitSet>,
    atom_set_cache: HashMap<String, BitSet>,

    bond_hash: Option<BondHash>,
    spatial_hash: Option<SpatialHash>,
    bounds: BoundingBox,
    center: Point3<f32>,
}

impl Structure {
    pub fn new(name: &str, config: StructureConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
            atom_store: AtomStore::default(),
            residue_store: ResidueStore::default(),
            chain_store: ChainStore::default(),
            model_store: ModelStore::default(),
            bond_store: BondStore::default(),
            backbone_bond_store: BondStore::default(),
            rung_bond_store: BondStore::default(),
            atom_map: AtomTypeRegistry::new(),
            residue_map: ResidueTypeRegistry::new(),
            atom_set: BitSet::new(0),
            bond_set: BitSet::new(0),
            backbone_atom_set: None,
            rung_atom_set: None,
            atom_set_cache: HashMap::new(),
            bond_hash: None,
            spatial_hash: None,
            bounds: BoundingBox::empty(),
            center: Point3::origin(),
        }
    }

    pub fn atom_count(&self) -> usize {
        self.atom_store.count
    }

    pub fn bond_count(&self) -> usize {
        self.bond_store.count
    }

    pub fn residue_count(&self) -> usize {
        self.residue_store.count
    }

    pub fn chain_count(&self) -> usize {
        self.chain_store.count
    }

    pub fn model_count(&self) -> usize {
        self.model_store.count
    }

    pub fn atom(&self, index: usize) -> AtomProxy<'_> {
        AtomProxy::new(self, index)
    }

    pub fn atom_mut(&mut self, index: usize) -> AtomProxyMut<'_> {
        AtomProxyMut::new(self, index)
    }

    pub fn residue(&self, index: usize) -> ResidueProxy<'_> {
        ResidueProxy::new(self, index)
    }

    pub fn chain(&self, index: usize) -> ChainProxy<'_> {
        ChainProxy::new(self, index)
    }

    pub fn model(&self, index: usize) -> ModelProxy<'_> {
        ModelProxy::new(self, index)
    }

    pub fn bond(&self, index: usize) -> BondProxy<'_> {
        BondProxy::new(self, &self.bond_store, index)
    }

    pub fn backbone_bond(&self, index: usize) -> BondProxy<'_> {
        BondProxy::new(self, &self.backbone_bond_store, index)
    }

    pub fn rung_bond(&self, index: usize) -> BondProxy<'_> {
        BondProxy::new(self, &self.rung_bond_store, index)
    }

    pub fn atoms(&self) -> impl Iterator<Item = AtomProxy<'_>> {
        (0..self.atom_store.count).map(move |i| AtomProxy::new(self, i))
    }

    pub fn residues(&self) -> impl Iterator<Item = ResidueProxy<'_>> {
        (0..self.residue_store.count).map(move |i| ResidueProxy::new(self, i))
    }

    pub fn chains(&self) -> impl Iterator<Item = ChainProxy<'_>> {
        (0..self.chain_store.count).map(move |i| ChainProxy::new(self, i))
    }

    pub fn models(&self) -> impl Iterator<Item = ModelProxy<'_>> {
        (0..self.model_store.count).map(move |i| ModelProxy::new(self, i))
    }

    pub fn bonds(&self) -> impl Iterator<Item = BondProxy<'_>> {
        (0..self.bond_store.count).map(move |i| self.bond(i))
    }

    /// The bond adjacency index, available after [`Structure::finalize_bonds`].
    pub fn bond_hash(&self) -> Option<&BondHash> {
        self.bond_hash.as_ref()
    }

    /// The spatial grid, available after [`Structure::finalize_atoms`].
    pub fn spatial_hash(&self) -> Option<&SpatialHash> {
        self.spatial_hash.as_ref()
    }

    /// Center of the bounding box computed by the last atom finalization.
    pub fn center(&self) -> Point3<f32> {
        self.center
    }

    /// Builds the per-atom derived state: the full atom set, bounding box, center and
    /// spatial grid.
    #[instrument(skip_all, name = "finalize_atoms")]
    pub fn finalize_atoms(&mut self) {
        self.atom_set = BitSet::filled(self.atom_store.count);
        self.atom_set_cache.clear();
        self.refresh_position();
        info!(
            atoms = self.atom_store.count,
            residues = self.residue_store.count,
            chains = self.chain_store.count,
            models = self.model_store.count,
            "Finalized atoms"
        );
    }

    /// Builds the per-bond derived state: the default bond set and the adjacency index.
    #[instrument(skip_all, name = "finalize_bonds")]
    pub fn finalize_bonds(&mut self) {
        let atom_count = self.atom_store.count;
        self.bond_set = bond_set_in(&self.bond_store, &self.atom_set);
        self.bond_hash = Some(BondHash::new(&self.bond_store, atom_count));
        self.atom_set_cache.clear();
        if self.rung_atom_set.is_none() {
            self.rung_atom_set = Some(BitSet::new(atom_count));
        }
        info!(
            bonds = self.bond_store.count,
            backbone_bonds = self.backbone_bond_store.count,
            rung_bonds = self.rung_bond_store.count,
            "Finalized bonds"
        );
    }

    /// Recomputes bounding box, center and spatial grid from the current coordinates.
    #[instrument(skip_all, name = "refresh_position")]
    pub fn refresh_position(&mut self) {
        self.bounds = self.bounding_box(None);
        self.center = self.bounds.center();
        self.spatial_hash = Some(SpatialHash::from_atom_store(
            &self.atom_store,
            &self.bounds,
            self.config.spatial.cell_exponent,
        ));
    }

    /// Calls `f` for every selected atom in ascending index order.
    ///
    /// Model, chain and residue prefilter tests of the selection prune whole ranges
    /// before atoms are tested.
    pub fn each_atom<'s>(&'s self, selection: Option<&dyn Selection>, mut f: impl FnMut(AtomProxy<'s>)) {
        match selection {
            Some(selection) => {
                for model in self.models() {
                    if selection.model_test(&model) {
                        model.each_atom(Some(selection), &mut f);
                    }
                }
            }
            None => self.atoms().for_each(f),
        }
    }

    /// Calls `f` for every residue passing the selection's prefilter tests.
    pub fn each_residue<'s>(
        &'s self,
        selection: Option<&dyn Selection>,
        mut f: impl FnMut(ResidueProxy<'s>),
    ) {
        match selection {
            Some(selection) => {
                for model in self.models() {
                    if selection.model_test(&model) {
                        model.each_residue(Some(selection), &mut f);
                    }
                }
            }
            None => self.residues().for_each(f),
        }
    }

    pub fn each_chain<'s>(&'s self, selection: Option<&dyn Selection>, mut f: impl FnMut(ChainProxy<'s>)) {
        match selection {
            Some(selection) => {
                for model in self.models() {
                    if selection.model_test(&model) {
                        model.each_chain(Some(selection), &mut f);
                    }
                }
            }
            None => self.chains().for_each(f),
        }
    }

    pub fn each_model<'s>(&'s self, selection: Option<&dyn Selection>, mut f: impl FnMut(ModelProxy<'s>)) {
        for model in self.models() {
            if selection.is_none_or(|s| s.model_test(&model)) {
                f(model);
            }
        }
    }

    pub fn each_polymer<'s>(&'s self, selection: Option<&dyn Selection>, mut f: impl FnMut(Polymer<'s>)) {
        for model in self.models() {
            if selection.is_none_or(|s| s.model_test(&model)) {
                model.each_polymer(selection, &mut f);
            }
        }
    }

    /// Calls `f` for every bond whose two atoms are both selected.
    pub fn each_bond<'s>(&'s self, selection: Option<&dyn Selection>, mut f: impl FnMut(BondProxy<'s>)) {
        match selection {
            Some(_) => {
                let bond_set = bond_set_in(&self.bond_store, &self.select(selection));
                for index in bond_set.iter() {
                    f(self.bond(index));
                }
            }
            None => self.bonds().for_each(f),
        }
    }

    /// Calls `f` with every window of `n` consecutive residues of the structure.
    pub fn each_residue_n<'s>(&'s self, n: usize, mut f: impl FnMut(&[ResidueProxy<'s>])) {
        if n == 0 {
            return;
        }
        let residues: Vec<ResidueProxy<'s>> = self.residues().collect();
        for window in residues.windows(n) {
            f(window);
        }
    }

    /// Bounding box of the selected atoms, empty if none is selected.
    pub fn bounding_box(&self, selection: Option<&dyn Selection>) -> BoundingBox {
        let mut bounds = BoundingBox::empty();
        self.each_atom(selection, |atom| bounds.expand_by_point(&atom.position()));
        bounds
    }

    /// Center of the selected atoms' bounding box, or the stored center without a
    /// selection.
    pub fn atom_center(&self, selection: Option<&dyn Selection>) -> Point3<f32> {
        match selection {
            Some(_) => self.bounding_box(selection).center(),
            None => self.center,
        }
    }

    /// Whether the structure carries real coordinates.
    ///
    /// Structures where every coordinate is zero have none, except when every model
    /// consists of a single atom.
    pub fn has_coords(&self) -> bool {
        let n = self.atom_store.count;
        let non_zero = |column: &[f32]| column[..n].iter().any(|&v| v != 0.0);
        non_zero(&self.atom_store.x)
            || non_zero(&self.atom_store.y)
            || non_zero(&self.atom_store.z)
            || (self.model_store.count > 0 && n == self.model_store.count)
    }

    /// One-letter codes of the selected residues, taken at their trace atoms.
    pub fn sequence(&self, selection: Option<&dyn Selection>) -> String {
        let mut sequence = String::new();
        self.each_atom(selection, |atom| {
            let residue = atom.residue();
            if residue.trace_atom_index() == Some(atom.index) {
                sequence.push(residue.resname1());
            }
        });
        sequence
    }

    pub fn atom_indices(&self, selection: Option<&dyn Selection>) -> Vec<usize> {
        let mut indices = Vec::new();
        self.each_atom(selection, |atom| indices.push(atom.index));
        indices
    }

    /// Number of distinct names among the selected chains that have residues.
    pub fn chainname_count(&self, selection: Option<&dyn Selection>) -> usize {
        let mut names = HashSet::new();
        self.each_chain(selection, |chain| {
            if chain.residue_count() > 0 {
                names.insert(chain.chainname());
            }
        });
        names.len()
    }

    /// Overwrites all coordinates from a flat `[x0, y0, z0, x1, ...]` array.
    ///
    /// The spatial grid is not rebuilt; call [`Structure::refresh_position`] afterwards.
    pub fn update_position(&mut self, position: &[f32]) -> Result<(), StructureError> {
        let expected = self.atom_store.count * 3;
        if position.len() != expected {
            return Err(StructureError::PositionLength {
                expected,
                actual: position.len(),
            });
        }
        for i in 0..self.atom_store.count {
            self.atom_mut(i).position_from_array(position, i * 3);
        }
        self.invalidate_atom_set_cache();
        debug!(atoms = self.atom_store.count, "Updated positions");
        Ok(())
    }

    /// Releases every store and derived index.
    pub fn dispose(&mut self) {
        self.atom_store.dispose();
        self.residue_store.dispose();
        self.chain_store.dispose();
        self.model_store.dispose();
        self.bond_store.dispose();
        self.backbone_bond_store.dispose();
        self.rung_bond_store.dispose();
        self.atom_set = BitSet::new(0);
        self.bond_set = BitSet::new(0);
        self.backbone_atom_set = None;
        self.rung_atom_set = None;
        self.atom_set_cache.clear();
        self.bond_hash = None;
        self.spatial_hash = None;
    }
}

/// Bonds of `store` whose two atoms are both in `atom_set`.
pub(crate) fn bond_set_in(store: &BondStore, atom_set: &BitSet) -> BitSet {
    if atom_set.is_all_set() {
        return BitSet::filled(store.count);
    }
    if atom_set.is_all_clear() {
        return BitSet::new(store.count);
    }
    let mut bond_set = BitSet::new(store.count);
    for (i, (a1, a2, _)) in store.iter().enumerate() {
        if atom_set.get(a1) && atom_set.get(a2) {
            bond_set.set(i);
        }
    }
    bond_set
}

impl fmt::Debug for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Structure")
            .field("name", &self.name)
            .field("atoms", &self.atom_store.count)
            .field("residues", &self.residue_store.count)
            .field("chains", &self.chain_store.count)
            .field("models", &self.model_store.count)
            .field("bonds", &self.bond_store.count)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

    pub struct AtomRecord {
        pub chain: &'static str,
        pub resname: &'static str,
        pub resno: i32,
        pub atomname: &'static str,
        pub element: &'static str,
        pub position: [f32; 3],
    }

    pub fn record(
        chain: &'static str,
        resname: &'static str,
        resno: i32,
        atomname: &'static str,
        element: &'static str,
        position: [f32; 3],
    ) -> AtomRecord {
        AtomRecord {
            chain,
            resname,
            resno,
            atomname,
            element,
            position,
        }
    }

    pub fn build_structure(records: &[AtomRecord]) -> Structure {
        let mut builder = StructureBuilder::new("test", StructureConfig::default());
        for (serial, r) in records.iter().enumerate() {
            builder
                .add_atom(&AtomSite {
                    chainname: r.chain,
                    resname: r.resname,
                    resno: r.resno,
                    hetero: r.resname == "HOH",
                    atomname: r.atomname,
                    element: r.element,
                    position: Point3::new(r.position[0], r.position[1], r.position[2]),
                    serial: serial as i32 + 1,
                    occupancy: 1.0,
                    ..Default::default()
                })
                .unwrap();
        }
        builder.finalize().unwrap()
    }

    /// Two residues with ideal backbone geometry followed by a water.
    ///
    /// Atoms: 0 N, 1 CA, 2 C, 3 O, 4 CB (ALA 1); 5 N, 6 CA, 7 C, 8 O (GLY 2); 9 O (HOH 3).
    pub fn build_dipeptide() -> Structure {
        build_structure(&[
            record("A", "ALA", 1, "N", "N", [0.000, 1.430, 0.000]),
            record("A", "ALA", 1, "CA", "C", [0.000, 0.000, 0.000]),
            record("A", "ALA", 1, "C", "C", [1.520, 0.000, 0.000]),
            record("A", "ALA", 1, "O", "O", [2.140, -1.060, 0.000]),
            record("A", "ALA", 1, "CB", "C", [-0.530, -0.770, -1.200]),
            record("A", "GLY", 2, "N", "N", [2.170, 1.160, 0.000]),
            record("A", "GLY", 2, "CA", "C", [3.620, 1.290, 0.000]),
            record("A", "GLY", 2, "C", "C", [4.130, 2.720, 0.000]),
            record("A", "GLY", 2, "O", "O", [3.380, 3.690, 0.000]),
            record("A", "HOH", 3, "O", "O", [10.000, 10.000, 10.000]),
        ])
    }

    /// A straight chain of `n` glycines spaced 3.8 Angstrom apart along x.
    pub fn build_polyglycine(chain: &'static str, n: usize) -> Vec<AtomRecord> {
        let mut records = Vec::new();
        for i in 0..n {
            let x = i as f32 * 3.8;
            let resno = i as i32 + 1;
            records.push(record(chain, "GLY", resno, "N", "N", [x - 1.0, 0.7, 0.0]));
            records.push(record(chain, "GLY", resno, "CA", "C", [x, 0.0, 0.0]));
            records.push(record(chain, "GLY", resno, "C", "C", [x + 1.5, 0.5, 0.0]));
            records.push(record(chain, "GLY", resno, "O", "O", [x + 1.3, 1.7, 0.0]));
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use super::*;

    mod hierarchy {
        use super::*;

        #[test]
        fn builder_derives_contiguous_ranges() {
            let structure = build_dipeptide();
            assert_eq!(structure.model_count(), 1);
            assert_eq!(structure.chain_count(), 1);
            assert_eq!(structure.residue_count(), 3);
            assert_eq!(structure.atom_count(), 10);

            let mut expected_offset = 0;
            for residue in structure.residues() {
                assert_eq!(residue.atom_offset(), expected_offset);
                expected_offset += residue.atom_count();
            }
            assert_eq!(expected_offset, structure.atom_count());

            let chain = structure.chain(0);
            assert_eq!(chain.residue_offset(), 0);
            assert_eq!(chain.residue_count(), 3);
            assert_eq!(chain.atom_count(), 10);
            assert_eq!(structure.model(0).atom_count(), 10);
        }

        #[test]
        fn atoms_resolve_their_parents() {
            let structure = build_dipeptide();
            let atom = structure.atom(6);
            assert_eq!(atom.atomname(), "CA");
            assert_eq!(atom.resname(), "GLY");
            assert_eq!(atom.resno(), 2);
            assert_eq!(atom.chainname(), "A");
            assert_eq!(atom.residue_index(), 1);
            assert_eq!(atom.model_index(), 0);
            assert_eq!(atom.qualified_name(false), "[GLY]2:A.CA");
        }

        #[test]
        fn identical_residues_share_a_type() {
            let structure = build_structure(&build_polyglycine("A", 4));
            let ids: Vec<u16> = structure.residues().map(|r| r.residue_type_id()).collect();
            assert!(ids.iter().all(|&id| id == ids[0]));
            assert_eq!(structure.residue_map.len(), 1);
        }
    }

    mod iteration {
        use super::*;

        #[test]
        fn each_atom_visits_selected_atoms_in_order() {
            let structure = build_dipeptide();
            let selection = AtomSelection::AtomName("CA".to_string());
            let mut visited = Vec::new();
            structure.each_atom(Some(&selection), |atom| visited.push(atom.index));
            assert_eq!(visited, vec![1, 6]);
        }

        #[test]
        fn each_residue_n_yields_sliding_windows() {
            let structure = build_dipeptide();
            let mut windows = Vec::new();
            structure.each_residue_n(2, |w| windows.push((w[0].index, w[1].index)));
            assert_eq!(windows, vec![(0, 1), (1, 2)]);
        }

        #[test]
        fn each_bond_respects_selection() {
            let structure = build_dipeptide();
            let selection = AtomSelection::ResidueName("GLY".to_string());
            let mut count = 0;
            structure.each_bond(Some(&selection), |bond| {
                assert_eq!(bond.atom1().resname(), "GLY");
                assert_eq!(bond.atom2().resname(), "GLY");
                count += 1;
            });
            assert_eq!(count, 3);
        }
    }

    mod queries {
        use super::*;

        #[test]
        fn sequence_uses_trace_atoms() {
            let structure = build_dipeptide();
            assert_eq!(structure.sequence(None), "AG");
        }

        #[test]
        fn has_coords_detects_all_zero_structures() {
            let mut structure = build_dipeptide();
            assert!(structure.has_coords());
            let zeros = vec![0.0; structure.atom_count() * 3];
            structure.update_position(&zeros).unwrap();
            assert!(!structure.has_coords());
        }

        #[test]
        fn update_position_rejects_wrong_length() {
            let mut structure = build_dipeptide();
            let result = structure.update_position(&[0.0; 3]);
            assert!(matches!(
                result,
                Err(StructureError::PositionLength {
                    expected: 30,
                    actual: 3
                })
            ));
        }

        #[test]
        fn refresh_position_rebuilds_the_grid() {
            let mut structure = build_dipeptide();
            let mut position = vec![0.0; structure.atom_count() * 3];
            for i in 0..structure.atom_count() {
                structure.atom(i).position_to_array(&mut position, i * 3);
            }
            for value in position.iter_mut() {
                *value += 100.0;
            }
            structure.update_position(&position).unwrap();
            structure.refresh_position();
            let found = structure.atom_set_within_point(&Point3::new(110.0, 110.0, 110.0), 0.5);
            assert_eq!(found.to_vec(), vec![9]);
        }

        #[test]
        fn bounding_box_and_chain_counts() {
            let structure = build_dipeptide();
            let bounds = structure.bounding_box(None);
            assert_eq!(bounds.max, Point3::new(10.0, 10.0, 10.0));
            assert_eq!(bounds.min.y, -1.06);
            assert_eq!(structure.chainname_count(None), 1);
            let water = AtomSelection::Water;
            assert_eq!(structure.atom_center(Some(&water)), Point3::new(10.0, 10.0, 10.0));
        }

        #[test]
        fn dispose_releases_everything() {
            let mut structure = build_dipeptide();
            structure.dispose();
            assert_eq!(structure.atom_count(), 0);
            assert_eq!(structure.bond_count(), 0);
            assert!(structure.bond_hash().is_none());
        }
    }
}
