use super::{Structure, StructureError};
use crate::config::StructureConfig;
use crate::core::store::ColumnStore;
use crate::core::types::ResidueTypeKey;
use nalgebra::Point3;
use std::collections::HashMap;
use tracing::{info, instrument};

/// One atom record of a flat atom stream, as produced by a file parser.
#[derive(Debug, Clone, Copy)]
pub struct AtomSite<'s> {
    pub model: usize,
    pub chainname: &'s str,
    /// Unique chain identifier; falls back to `chainname` when empty.
    pub chainid: &'s str,
    pub resname: &'s str,
    pub resno: i32,
    pub hetero: bool,
    pub sstruc: Option<char>,
    pub inscode: Option<char>,
    pub atomname: &'s str,
    /// Element symbol; guessed from the atom name when empty.
    pub element: &'s str,
    pub position: Point3<f32>,
    pub serial: i32,
    pub bfactor: f32,
    pub altloc: Option<char>,
    pub occupancy: f32,
}

impl Default for AtomSite<'_> {
    fn default() -> Self {
        Self {
            model: 0,
            chainname: "",
            chainid: "",
            resname: "",
            resno: 0,
            hetero: false,
            sstruc: None,
            inscode: None,
            atomname: "",
            element: "",
            position: Point3::origin(),
            serial: 0,
            bfactor: 0.0,
            altloc: None,
            occupancy: 1.0,
        }
    }
}

/// The residue currently being filled, used to detect hierarchy boundaries.
struct CurrentResidue {
    model: usize,
    chainid: String,
    resname: String,
    resno: i32,
    inscode: Option<char>,
    hetero: bool,
}

/// Derives the model/chain/residue hierarchy of a structure from a flat atom stream.
///
/// Atoms must arrive grouped: a change of model starts a new model, chain and residue;
/// a change of chain id starts a new chain and residue; a change of residue number,
/// residue name or insertion code starts a new residue. Residue types are interned when
/// a residue is complete.
pub struct StructureBuilder {
    structure: Structure,
    current: Option<CurrentResidue>,
    chem_comp_types: HashMap<String, String>,
}

impl StructureBuilder {
    pub fn new(name: &str, config: StructureConfig) -> Self {
        Self {
            structure: Structure::new(name, config),
            current: None,
            chem_comp_types: HashMap::new(),
        }
    }

    /// Sets the chemical component type (e.g. `L-PEPTIDE LINKING`) of a residue name,
    /// used to classify residues that are not in the standard tables.
    pub fn with_chem_comp_type(mut self, resname: &str, chem_comp_type: &str) -> Self {
        self.chem_comp_types
            .insert(resname.to_string(), chem_comp_type.to_string());
        self
    }

    /// Number of atoms added so far.
    pub fn atom_count(&self) -> usize {
        self.structure.atom_store.count
    }

    /// Appends one atom, opening a new model, chain or residue as needed.
    ///
    /// # Arguments
    ///
    /// * `site` - The atom record.
    ///
    /// # Return
    ///
    /// The index of the new atom.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::ResidueTooLarge`] if the residue would exceed the
    /// capacity of the atom count column, or [`StructureError::TypeRegistry`] if a type
    /// registry is full.
    pub fn add_atom(&mut self, site: &AtomSite<'_>) -> Result<usize, StructureError> {
        let chainid = if site.chainid.is_empty() {
            site.chainname
        } else {
            site.chainid
        };

        let (add_model, add_chain, add_residue) = match &self.current {
            None => (true, true, true),
            Some(current) if current.model != site.model => (true, true, true),
            Some(current) if current.chainid != chainid => (false, true, true),
            Some(current)
                if current.resno != site.resno
                    || current.resname != site.resname
                    || current.inscode != site.inscode =>
            {
                (false, false, true)
            }
            Some(_) => (false, false, false),
        };

        if add_residue {
            if let Some(previous) = self.current.take() {
                let ri = self.structure.residue_store.count - 1;
                self.intern_residue_type(ri, &previous.resname, previous.hetero)?;
            }
        }

        let s = &mut self.structure;

        if add_model {
            let mi = s.model_store.count;
            s.model_store.grow_if_full();
            s.model_store.chain_offset[mi] = s.chain_store.count as u32;
            s.model_store.chain_count[mi] = 0;
            s.model_store.count += 1;
        }

        if add_chain {
            let ci = s.chain_store.count;
            let mi = s.model_store.count - 1;
            s.chain_store.grow_if_full();
            s.chain_store.set_chainname(ci, site.chainname);
            s.chain_store.set_chainid(ci, chainid);
            s.chain_store.model_index[ci] = mi as u32;
            s.chain_store.residue_offset[ci] = s.residue_store.count as u32;
            s.chain_store.residue_count[ci] = 0;
            s.chain_store.count += 1;
            s.model_store.chain_count[mi] += 1;
        }

        if add_residue {
            let ri = s.residue_store.count;
            let ci = s.chain_store.count - 1;
            s.residue_store.grow_if_full();
            s.residue_store.chain_index[ri] = ci as u32;
            s.residue_store.atom_offset[ri] = s.atom_store.count as u32;
            s.residue_store.atom_count[ri] = 0;
            s.residue_store.residue_type_id[ri] = 0;
            s.residue_store.resno[ri] = site.resno;
            s.residue_store.set_sstruc(ri, site.sstruc);
            s.residue_store.set_inscode(ri, site.inscode);
            s.residue_store.count += 1;
            s.chain_store.residue_count[ci] += 1;
            self.current = Some(CurrentResidue {
                model: site.model,
                chainid: chainid.to_string(),
                resname: site.resname.to_string(),
                resno: site.resno,
                inscode: site.inscode,
                hetero: site.hetero,
            });
        }

        let s = &mut self.structure;
        let ri = s.residue_store.count - 1;
        let atom_count = s.residue_store.atom_count[ri];
        if atom_count == u16::MAX {
            return Err(StructureError::ResidueTooLarge {
                residue: format!("[{}]{}", site.resname, site.resno),
                max: usize::from(u16::MAX),
            });
        }

        let atom_type_id = s.atom_map.add(site.atomname, site.element)?;
        let ai = s.atom_store.count;
        s.atom_store.grow_if_full();
        s.atom_store.residue_index[ai] = ri as u32;
        s.atom_store.atom_type_id[ai] = atom_type_id;
        s.atom_store.set_position(ai, &site.position);
        s.atom_store.serial[ai] = site.serial;
        s.atom_store.bfactor[ai] = site.bfactor;
        s.atom_store.set_altloc(ai, site.altloc);
        s.atom_store.occupancy[ai] = site.occupancy;
        s.atom_store.count += 1;
        s.residue_store.atom_count[ri] = atom_count + 1;

        Ok(ai)
    }

    /// Adds an explicit bond, e.g. from a connectivity record.
    ///
    /// Structures with explicit bonds keep them as the covalent bonds; only backbone
    /// and rung bonds are derived on [`StructureBuilder::finalize`].
    pub fn add_bond(
        &mut self,
        atom_index1: usize,
        atom_index2: usize,
        bond_order: i8,
    ) -> Result<(), StructureError> {
        let count = self.structure.atom_store.count;
        for index in [atom_index1, atom_index2] {
            if index >= count {
                return Err(StructureError::AtomIndexOutOfRange { index, count });
            }
        }
        self.structure
            .bond_store
            .add_bond(atom_index1, atom_index2, bond_order);
        Ok(())
    }

    /// Completes the hierarchy and builds the derived indices and bonds.
    ///
    /// Without explicit bonds, covalent bonds are calculated from geometry. With
    /// explicit bonds, the residue types take their bond templates from them.
    #[instrument(skip_all, name = "structure_builder_finalize")]
    pub fn finalize(mut self) -> Result<Structure, StructureError> {
        if let Some(previous) = self.current.take() {
            let ri = self.structure.residue_store.count - 1;
            self.intern_residue_type(ri, &previous.resname, previous.hetero)?;
        }

        let mut structure = self.structure;
        let explicit_bonds = structure.bond_store.count > 0;
        structure.finalize_atoms();
        if explicit_bonds {
            structure.calculate_bonds_within(true);
            structure.calculate_bonds_between(true, true);
            structure.finalize_bonds();
            structure.assign_residue_type_bonds();
        } else {
            structure.calculate_bonds();
            structure.finalize_bonds();
        }

        info!(
            name = %structure.name,
            atoms = structure.atom_count(),
            residues = structure.residue_count(),
            residue_types = structure.residue_map.len(),
            atom_types = structure.atom_map.len(),
            explicit_bonds = explicit_bonds,
            "Built structure"
        );
        Ok(structure)
    }

    fn intern_residue_type(
        &mut self,
        ri: usize,
        resname: &str,
        hetero: bool,
    ) -> Result<(), StructureError> {
        let s = &mut self.structure;
        let offset = s.residue_store.atom_offset[ri] as usize;
        let count = usize::from(s.residue_store.atom_count[ri]);
        let key = ResidueTypeKey {
            resname: resname.to_string(),
            atom_type_ids: s.atom_store.atom_type_id[offset..offset + count].to_vec(),
            hetero,
            chem_comp_type: self
                .chem_comp_types
                .get(resname)
                .cloned()
                .unwrap_or_default(),
        };
        s.residue_store.residue_type_id[ri] = s.residue_map.add(key, &s.atom_map, None)?;
        Ok(())
    }
}
