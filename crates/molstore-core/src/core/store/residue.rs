use super::column::column_store;
use super::{decode_char, encode_char};
use serde::{Deserialize, Serialize};

/// Residues of a structure, each owning a contiguous run of atoms.
///
/// Secondary structure (`sstruc`) and insertion codes (`inscode`) are single
/// character codes, `0` meaning "not set".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidueStore {
    pub count: usize,
    pub length: usize,
    pub chain_index: Vec<u32>,
    pub atom_offset: Vec<u32>,
    pub atom_count: Vec<u16>,
    pub residue_type_id: Vec<u16>,
    pub resno: Vec<i32>,
    pub sstruc: Vec<u8>,
    pub inscode: Vec<u8>,
}

column_store!(ResidueStore {
    chain_index,
    atom_offset,
    atom_count,
    residue_type_id,
    resno,
    sstruc,
    inscode,
});

impl ResidueStore {
    pub fn sstruc(&self, i: usize) -> Option<char> {
        decode_char(self.sstruc[i])
    }

    pub fn set_sstruc(&mut self, i: usize, code: Option<char>) {
        self.sstruc[i] = encode_char(code);
    }

    pub fn inscode(&self, i: usize) -> Option<char> {
        decode_char(self.inscode[i])
    }

    pub fn set_inscode(&mut self, i: usize, code: Option<char>) {
        self.inscode[i] = encode_char(code);
    }
}
