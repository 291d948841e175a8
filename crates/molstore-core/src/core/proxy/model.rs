use super::{AtomProxy, ChainProxy, Polymer, ResidueProxy};
use crate::core::structure::Structure;
use crate::core::structure::selection::Selection;
use std::fmt;

/// Read-only cursor over one row of the model store.
#[derive(Clone, Copy)]
pub struct ModelProxy<'a> {
    structure: &'a Structure,
    pub index: usize,
}

impl<'a> ModelProxy<'a> {
    pub fn new(structure: &'a Structure, index: usize) -> Self {
        Self { structure, index }
    }

    pub fn structure(&self) -> &'a Structure {
        self.structure
    }

    pub fn chain_offset(&self) -> usize {
        self.structure.model_store.chain_offset[self.index] as usize
    }

    pub fn chain_count(&self) -> usize {
        self.structure.model_store.chain_count[self.index] as usize
    }

    /// One past the last chain of the model.
    pub fn chain_end(&self) -> usize {
        self.chain_offset() + self.chain_count()
    }

    pub fn residue_offset(&self) -> usize {
        if self.chain_count() == 0 {
            return 0;
        }
        self.structure.chain_store.residue_offset[self.chain_offset()] as usize
    }

    /// One past the last residue of the model.
    pub fn residue_end(&self) -> usize {
        match self.chain_count() {
            0 => 0,
            _ => ChainProxy::new(self.structure, self.chain_end() - 1).residue_end(),
        }
    }

    pub fn residue_count(&self) -> usize {
        self.residue_end() - self.residue_offset()
    }

    pub fn atom_offset(&self) -> usize {
        match self.chain_count() {
            0 => 0,
            _ => ChainProxy::new(self.structure, self.chain_offset()).atom_offset(),
        }
    }

    /// One past the last atom of the model.
    pub fn atom_end(&self) -> usize {
        match self.chain_count() {
            0 => 0,
            _ => ChainProxy::new(self.structure, self.chain_end() - 1).atom_end(),
        }
    }

    pub fn atom_count(&self) -> usize {
        self.atom_end() - self.atom_offset()
    }

    pub fn chains(&self) -> impl Iterator<Item = ChainProxy<'a>> + use<'a> {
        let structure = self.structure;
        (self.chain_offset()..self.chain_end()).map(move |i| ChainProxy::new(structure, i))
    }

    pub fn residues(&self) -> impl Iterator<Item = ResidueProxy<'a>> + use<'a> {
        let structure = self.structure;
        (self.residue_offset()..self.residue_end()).map(move |i| ResidueProxy::new(structure, i))
    }

    pub fn atoms(&self) -> impl Iterator<Item = AtomProxy<'a>> + use<'a> {
        let structure = self.structure;
        (self.atom_offset()..self.atom_end()).map(move |i| AtomProxy::new(structure, i))
    }

    pub fn each_chain(&self, selection: Option<&dyn Selection>, mut f: impl FnMut(ChainProxy<'a>)) {
        for chain in self.chains() {
            if selection.is_none_or(|s| s.chain_test(&chain)) {
                f(chain);
            }
        }
    }

    pub fn each_residue(
        &self,
        selection: Option<&dyn Selection>,
        mut f: impl FnMut(ResidueProxy<'a>),
    ) {
        match selection {
            Some(selection) => {
                for chain in self.chains() {
                    if selection.chain_test(&chain) {
                        chain.each_residue(Some(selection), &mut f);
                    }
                }
            }
            None => self.residues().for_each(f),
        }
    }

    pub fn each_atom(&self, selection: Option<&dyn Selection>, mut f: impl FnMut(AtomProxy<'a>)) {
        match selection {
            Some(selection) => {
                for chain in self.chains() {
                    if selection.chain_test(&chain) {
                        chain.each_atom(Some(selection), &mut f);
                    }
                }
            }
            None => self.atoms().for_each(f),
        }
    }

    pub fn each_polymer(&self, selection: Option<&dyn Selection>, mut f: impl FnMut(Polymer<'a>)) {
        for chain in self.chains() {
            if selection.is_none_or(|s| s.chain_test(&chain)) {
                chain.each_polymer(selection, &mut f);
            }
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("/{}", self.index)
    }
}

impl fmt::Debug for ModelProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelProxy")
            .field("index", &self.index)
            .field("chain_count", &self.chain_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::structure::test_utils::*;

    #[test]
    fn model_spans_all_chains() {
        let mut records = build_polyglycine("A", 3);
        records.extend(build_polyglycine("B", 4).into_iter().map(|mut r| {
            r.position[1] += 10.0;
            r
        }));
        let structure = build_structure(&records);
        let model = structure.model(0);

        assert_eq!(model.chain_count(), 2);
        assert_eq!(model.residue_count(), 7);
        assert_eq!(model.atom_count(), 28);
        assert_eq!(model.chains().map(|c| c.chainname()).collect::<Vec<_>>(), vec!["A", "B"]);

        let mut polymers = Vec::new();
        model.each_polymer(None, |p| polymers.push((p.chainname(), p.residue_count)));
        assert_eq!(polymers, vec![("A", 3), ("B", 4)]);
    }
}
