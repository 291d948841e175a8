use super::TypeRegistryError;
use super::constants::{covalent_radius, element_number, guess_element, vdw_radius};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Shared descriptor of every atom with the same name and element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomType {
    /// The atom name (e.g., "CA", "N", "O5'").
    pub atomname: String,
    /// Upper-case element symbol, empty if unknown.
    pub element: String,
    /// Atomic number, `0` if the element is unknown.
    pub number: u8,
    /// Van der Waals radius in Angstroms.
    pub vdw: f32,
    /// Covalent radius in Angstroms.
    pub covalent: f32,
}

impl AtomType {
    /// Creates an atom type, guessing the element from the atom name if none is given.
    ///
    /// # Arguments
    ///
    /// * `atomname` - The atom name.
    /// * `element` - The element symbol (any case), or an empty string.
    pub fn new(atomname: &str, element: &str) -> Self {
        let element = match element.trim() {
            "" => guess_element(atomname),
            symbol => symbol.to_ascii_uppercase(),
        };
        Self {
            atomname: atomname.to_string(),
            number: element_number(&element),
            vdw: vdw_radius(&element),
            covalent: covalent_radius(&element),
            element,
        }
    }

    pub fn is_hydrogen(&self) -> bool {
        self.number == 1
    }

    pub fn is_carbon(&self) -> bool {
        self.number == 6
    }

    pub fn is_nitrogen(&self) -> bool {
        self.number == 7
    }

    pub fn is_oxygen(&self) -> bool {
        self.number == 8
    }

    pub fn is_sulfur(&self) -> bool {
        self.number == 16
    }

    pub fn is_alkali_metal(&self) -> bool {
        matches!(self.number, 3 | 11 | 19 | 37 | 55 | 87)
    }

    pub fn is_alkaline_earth_metal(&self) -> bool {
        matches!(self.number, 4 | 12 | 20 | 38 | 56 | 88)
    }

    pub fn is_transition_metal(&self) -> bool {
        matches!(self.number, 21..=30 | 39..=48 | 72..=80 | 104..=112)
    }

    pub fn is_post_transition_metal(&self) -> bool {
        matches!(self.number, 13 | 31 | 49 | 50 | 81..=84 | 113..=116)
    }

    pub fn is_lanthanide(&self) -> bool {
        matches!(self.number, 57..=71)
    }

    pub fn is_actinide(&self) -> bool {
        matches!(self.number, 89..=103)
    }

    pub fn is_metalloid(&self) -> bool {
        matches!(self.number, 5 | 14 | 32 | 33 | 51 | 52 | 85)
    }

    pub fn is_halogen(&self) -> bool {
        matches!(self.number, 9 | 17 | 35 | 53 | 117)
    }

    pub fn is_noble_gas(&self) -> bool {
        matches!(self.number, 2 | 10 | 18 | 36 | 54 | 86 | 118)
    }

    pub fn is_metal(&self) -> bool {
        self.is_alkali_metal()
            || self.is_alkaline_earth_metal()
            || self.is_transition_metal()
            || self.is_post_transition_metal()
            || self.is_lanthanide()
            || self.is_actinide()
    }

    pub fn is_nonmetal(&self) -> bool {
        self.number != 0 && !self.is_metal() && !self.is_metalloid()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AtomTypeKey {
    atomname: String,
    element: String,
}

/// Interning table for atom types.
#[derive(Debug, Clone, Default)]
pub struct AtomTypeRegistry {
    types: Vec<AtomType>,
    index: HashMap<AtomTypeKey, u16>,
}

impl AtomTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of the atom type with the given name and element, creating it if needed.
    pub fn add(&mut self, atomname: &str, element: &str) -> Result<u16, TypeRegistryError> {
        let key = AtomTypeKey {
            atomname: atomname.to_string(),
            element: element.trim().to_ascii_uppercase(),
        };
        if let Some(&id) = self.index.get(&key) {
            return Ok(id);
        }
        let id = u16::try_from(self.types.len()).map_err(|_| TypeRegistryError::Full {
            registry: "atom",
            capacity: usize::from(u16::MAX) + 1,
        })?;
        self.types.push(AtomType::new(atomname, element));
        self.index.insert(key, id);
        Ok(id)
    }

    pub fn get(&self, id: u16) -> &AtomType {
        &self.types[usize::from(id)]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AtomType> {
        self.types.iter()
    }
}
