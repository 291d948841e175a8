use super::{AtomProxy, ModelProxy, Polymer, ResidueProxy};
use crate::core::structure::Structure;
use crate::core::structure::selection::Selection;
use crate::core::types::BackboneType;
use std::fmt;

/// Read-only cursor over one row of the chain store.
#[derive(Clone, Copy)]
pub struct ChainProxy<'a> {
    structure: &'a Structure,
    pub index: usize,
}

impl<'a> ChainProxy<'a> {
    pub fn new(structure: &'a Structure, index: usize) -> Self {
        Self { structure, index }
    }

    pub fn structure(&self) -> &'a Structure {
        self.structure
    }

    pub fn model_index(&self) -> usize {
        self.structure.chain_store.model_index[self.index] as usize
    }

    pub fn model(&self) -> ModelProxy<'a> {
        ModelProxy::new(self.structure, self.model_index())
    }

    pub fn residue_offset(&self) -> usize {
        self.structure.chain_store.residue_offset[self.index] as usize
    }

    pub fn residue_count(&self) -> usize {
        self.structure.chain_store.residue_count[self.index] as usize
    }

    /// One past the last residue of the chain.
    pub fn residue_end(&self) -> usize {
        self.residue_offset() + self.residue_count()
    }

    pub fn atom_offset(&self) -> usize {
        if self.residue_count() == 0 {
            return 0;
        }
        self.structure.residue_store.atom_offset[self.residue_offset()] as usize
    }

    /// One past the last atom of the chain.
    pub fn atom_end(&self) -> usize {
        match self.residue_count() {
            0 => 0,
            _ => ResidueProxy::new(self.structure, self.residue_end() - 1).atom_end(),
        }
    }

    pub fn atom_count(&self) -> usize {
        self.atom_end() - self.atom_offset()
    }

    pub fn chainname(&self) -> &'a str {
        self.structure.chain_store.chainname(self.index)
    }

    pub fn chainid(&self) -> &'a str {
        self.structure.chain_store.chainid(self.index)
    }

    pub fn residues(&self) -> impl Iterator<Item = ResidueProxy<'a>> + use<'a> {
        let structure = self.structure;
        (self.residue_offset()..self.residue_end()).map(move |i| ResidueProxy::new(structure, i))
    }

    pub fn atoms(&self) -> impl Iterator<Item = AtomProxy<'a>> + use<'a> {
        let structure = self.structure;
        (self.atom_offset()..self.atom_end()).map(move |i| AtomProxy::new(structure, i))
    }

    pub fn each_residue(
        &self,
        selection: Option<&dyn Selection>,
        mut f: impl FnMut(ResidueProxy<'a>),
    ) {
        for residue in self.residues() {
            if selection.is_none_or(|s| s.residue_test(&residue)) {
                f(residue);
            }
        }
    }

    pub fn each_atom(&self, selection: Option<&dyn Selection>, mut f: impl FnMut(AtomProxy<'a>)) {
        match selection {
            Some(selection) => {
                for residue in self.residues() {
                    if selection.residue_test(&residue) {
                        residue.each_atom(Some(selection), &mut f);
                    }
                }
            }
            None => self.atoms().for_each(f),
        }
    }

    /// Splits the chain into polymers: maximal runs of consecutive residues with the
    /// same known backbone type whose backbone end and start atoms are connected.
    ///
    /// Only runs of at least three residues are reported. A residue failing the
    /// selection's residue test ends the current run.
    pub fn each_polymer(&self, selection: Option<&dyn Selection>, mut f: impl FnMut(Polymer<'a>)) {
        let offset = self.residue_offset();
        let end = self.residue_end();
        if end <= offset {
            return;
        }

        let mut start = offset;
        let mut next = offset;
        let mut first = true;
        let mut rp2 = ResidueProxy::new(self.structure, offset);

        for i in offset + 1..end {
            let rp1 = rp2;
            rp2 = ResidueProxy::new(self.structure, i);

            let type1 = if first {
                rp1.backbone_end_type()
            } else {
                rp1.backbone_type()
            };
            let type2 = rp2.backbone_type();

            if first {
                start = rp1.index;
                first = false;
            }
            next = rp2.index;

            if type1 == BackboneType::Unknown || type1 != type2 {
                if type1 != BackboneType::Unknown && rp1.index - start > 1 {
                    f(Polymer::new(self.structure, start, rp1.index));
                }
                start = next;
                continue;
            }

            let selected = selection
                .is_none_or(|s| s.residue_test(&rp1) && s.residue_test(&rp2));
            if !rp1.connected_to(&rp2) || !selected {
                if rp1.index - start > 1 {
                    f(Polymer::new(self.structure, start, rp1.index));
                }
                start = next;
            }
        }

        if next - start > 1
            && ResidueProxy::new(self.structure, start).backbone_end_type() != BackboneType::Unknown
        {
            f(Polymer::new(self.structure, start, next));
        }
    }

    pub fn polymers(&self, selection: Option<&dyn Selection>) -> Vec<Polymer<'a>> {
        let mut polymers = Vec::new();
        self.each_polymer(selection, |polymer| polymers.push(polymer));
        polymers
    }

    pub fn qualified_name(&self) -> String {
        let mut name = format!(":{}", self.chainname());
        if self.structure.model_store.count > 1 {
            name.push_str(&format!("/{}", self.model_index()));
        }
        name
    }
}

impl fmt::Debug for ChainProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainProxy")
            .field("index", &self.index)
            .field("name", &self.qualified_name())
            .finish()
    }
}
