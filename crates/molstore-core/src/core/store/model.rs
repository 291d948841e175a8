use super::column::column_store;
use serde::{Deserialize, Serialize};

/// Models of a structure, each owning a contiguous run of chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStore {
    pub count: usize,
    pub length: usize,
    pub chain_offset: Vec<u32>,
    pub chain_count: Vec<u32>,
}

column_store!(ModelStore {
    chain_offset,
    chain_count,
});
