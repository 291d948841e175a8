use super::{AtomProxy, ResidueProxy};
use crate::core::structure::Structure;
use crate::core::structure::selection::Selection;
use crate::core::types::{BackbonePosition, BackboneType, MoleculeType};

/// Atom role looked up per residue by [`Polymer::atom_index_by_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolymerAtom<'n> {
    Trace,
    Direction1,
    Direction2,
    /// The first atom with one of the given names.
    Named(&'n [&'n str]),
}

/// A run of consecutive, connected residues of one chain sharing a backbone type.
///
/// Both residue indices are inclusive.
#[derive(Debug, Clone, Copy)]
pub struct Polymer<'a> {
    structure: &'a Structure,
    pub residue_index_start: usize,
    pub residue_index_end: usize,
    pub residue_count: usize,
    pub is_prev_connected: bool,
    pub is_next_connected: bool,
    pub is_next_next_connected: bool,
    pub is_cyclic: bool,
}

impl<'a> Polymer<'a> {
    pub fn new(structure: &'a Structure, residue_index_start: usize, residue_index_end: usize) -> Self {
        let start = ResidueProxy::new(structure, residue_index_start);
        let end = ResidueProxy::new(structure, residue_index_end);
        let next = end.next_connected_residue();

        Self {
            structure,
            residue_index_start,
            residue_index_end,
            residue_count: residue_index_end - residue_index_start + 1,
            is_prev_connected: start.previous_connected_residue().is_some(),
            is_next_connected: next.is_some(),
            is_next_next_connected: next.is_some_and(|r| r.next_connected_residue().is_some()),
            is_cyclic: end.connected_to(&start),
        }
    }

    fn first_residue(&self) -> ResidueProxy<'a> {
        ResidueProxy::new(self.structure, self.residue_index_start)
    }

    pub fn chain_index(&self) -> usize {
        self.first_residue().chain_index()
    }

    pub fn model_index(&self) -> usize {
        self.first_residue().model_index()
    }

    pub fn chainname(&self) -> &'a str {
        self.first_residue().chainname()
    }

    pub fn is_protein(&self) -> bool {
        self.first_residue().is_protein()
    }

    pub fn is_nucleic(&self) -> bool {
        self.first_residue().is_nucleic()
    }

    pub fn is_cg(&self) -> bool {
        self.first_residue().is_cg()
    }

    pub fn molecule_type(&self) -> MoleculeType {
        self.first_residue().molecule_type()
    }

    pub fn backbone_type(&self, position: BackbonePosition) -> BackboneType {
        self.first_residue().backbone_type_at(position)
    }

    /// Global index of an atom role in the residue at polymer position `index`.
    ///
    /// Positions `-1` and `residue_count` address the neighbors of the polymer. They wrap
    /// around for cyclic polymers and are clamped to the terminal residues when the
    /// polymer is not connected on that side.
    pub fn atom_index_by_type(&self, index: isize, atom: PolymerAtom<'_>) -> Option<usize> {
        let count = self.residue_count as isize;
        let mut index = index;
        if self.is_cyclic {
            if index == -1 {
                index = count - 1;
            } else if index == count {
                index = 0;
            }
        } else {
            if index == -1 && !self.is_prev_connected {
                index += 1;
            }
            if index == count && !self.is_next_next_connected {
                index -= 1;
            }
        }

        let residue_index = usize::try_from(self.residue_index_start as isize + index).ok()?;
        if residue_index >= self.structure.residue_store.count {
            return None;
        }
        let residue = ResidueProxy::new(self.structure, residue_index);
        match atom {
            PolymerAtom::Trace => residue.trace_atom_index(),
            PolymerAtom::Direction1 => residue.direction1_atom_index(),
            PolymerAtom::Direction2 => residue.direction2_atom_index(),
            PolymerAtom::Named(names) => residue.atom_index_by_name(names),
        }
    }

    pub fn residues(&self) -> impl Iterator<Item = ResidueProxy<'a>> + use<'a> {
        let structure = self.structure;
        (self.residue_index_start..=self.residue_index_end)
            .map(move |i| ResidueProxy::new(structure, i))
    }

    pub fn each_residue(&self, mut f: impl FnMut(ResidueProxy<'a>)) {
        self.residues().for_each(&mut f);
    }

    pub fn each_atom(&self, selection: Option<&dyn Selection>, mut f: impl FnMut(AtomProxy<'a>)) {
        for residue in self.residues() {
            residue.each_atom(selection, &mut f);
        }
    }

    /// Calls `f` with every window of `n` consecutive role atoms along the polymer.
    ///
    /// Residues without the role contribute `None`.
    pub fn each_atom_n(&self, n: usize, atom: PolymerAtom<'_>, mut f: impl FnMut(&[Option<usize>])) {
        if n == 0 || n > self.residue_count {
            return;
        }
        let indices: Vec<Option<usize>> = (0..self.residue_count)
            .map(|i| self.atom_index_by_type(i as isize, atom))
            .collect();
        for window in indices.windows(n) {
            f(window);
        }
    }

    pub fn qualified_name(&self) -> String {
        let start = self.first_residue();
        let end = ResidueProxy::new(self.structure, self.residue_index_end);
        format!("{}-{}", start.qualified_name(false), end.qualified_name(false))
    }
}
