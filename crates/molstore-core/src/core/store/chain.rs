use super::column::column_store;
use super::{FIXED_NAME_WIDTH, decode_fixed, encode_fixed};
use serde::{Deserialize, Serialize};

/// Chains of a structure, each owning a contiguous run of residues.
///
/// Chain names (author naming) and chain ids (label naming) are stored as
/// zero-padded fixed-width byte columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStore {
    pub count: usize,
    pub length: usize,
    pub model_index: Vec<u32>,
    pub residue_offset: Vec<u32>,
    pub residue_count: Vec<u32>,
    pub chainname: Vec<[u8; FIXED_NAME_WIDTH]>,
    pub chainid: Vec<[u8; FIXED_NAME_WIDTH]>,
}

column_store!(ChainStore {
    model_index,
    residue_offset,
    residue_count,
    chainname,
    chainid,
});

impl ChainStore {
    pub fn chainname(&self, i: usize) -> &str {
        decode_fixed(&self.chainname[i])
    }

    pub fn set_chainname(&mut self, i: usize, name: &str) {
        self.chainname[i] = encode_fixed(name);
    }

    pub fn chainid(&self, i: usize) -> &str {
        decode_fixed(&self.chainid[i])
    }

    pub fn set_chainid(&mut self, i: usize, id: &str) {
        self.chainid[i] = encode_fixed(id);
    }
}
