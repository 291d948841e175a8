//! Static residue, atom and element tables used for residue classification,
//! backbone detection and bond guessing.

use phf::{Map, Set, phf_map, phf_set};
use serde::{Deserialize, Serialize};

/// Broad chemical classification of a residue type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MoleculeType {
    #[default]
    Unknown,
    Water,
    Ion,
    Protein,
    Rna,
    Dna,
    Saccharide,
}

/// Kind of polymer backbone a residue type provides at a given chain position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BackboneType {
    #[default]
    Unknown,
    Protein,
    Rna,
    Dna,
    CgProtein,
    CgRna,
    CgDna,
}

impl BackboneType {
    /// Coarse-grained backbone types describe one bead per residue.
    pub fn is_cg(self) -> bool {
        matches!(
            self,
            BackboneType::CgProtein | BackboneType::CgRna | BackboneType::CgDna
        )
    }

    /// Atom name alternatives for every role of this backbone type.
    pub fn atoms(self) -> &'static BackboneAtoms {
        match self {
            BackboneType::Unknown => &UNKNOWN_BACKBONE_ATOMS,
            BackboneType::Protein => &PROTEIN_BACKBONE_ATOMS,
            BackboneType::Rna => &RNA_BACKBONE_ATOMS,
            BackboneType::Dna => &DNA_BACKBONE_ATOMS,
            BackboneType::CgProtein => &CG_PROTEIN_BACKBONE_ATOMS,
            BackboneType::CgRna => &CG_RNA_BACKBONE_ATOMS,
            BackboneType::CgDna => &CG_DNA_BACKBONE_ATOMS,
        }
    }
}

/// Position of a residue within a polymer, used when deriving backbone types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackbonePosition {
    /// The last residue of a polymer; needs the backbone end atom.
    End,
    /// An interior residue.
    Middle,
    /// The first residue of a polymer; needs the backbone start atom.
    Start,
}

/// Atom name alternatives for the backbone roles of one backbone type.
///
/// An empty slice means the role is not defined for the type and is skipped by
/// presence checks.
#[derive(Debug)]
pub struct BackboneAtoms {
    pub trace: &'static [&'static str],
    pub direction1: &'static [&'static str],
    pub direction2: &'static [&'static str],
    pub backbone_start: &'static [&'static str],
    pub backbone_end: &'static [&'static str],
}

static UNKNOWN_BACKBONE_ATOMS: BackboneAtoms = BackboneAtoms {
    trace: &[],
    direction1: &[],
    direction2: &[],
    backbone_start: &[],
    backbone_end: &[],
};

static PROTEIN_BACKBONE_ATOMS: BackboneAtoms = BackboneAtoms {
    trace: &["CA"],
    direction1: &["C"],
    direction2: &["O", "OC1", "O1", "OX1", "OXT"],
    backbone_start: &["N"],
    backbone_end: &["C"],
};

static RNA_BACKBONE_ATOMS: BackboneAtoms = BackboneAtoms {
    trace: &["C4'", "C4*"],
    direction1: &["C1'", "C1*"],
    direction2: &["C3'", "C3*"],
    backbone_start: &["P"],
    backbone_end: &["O3'", "O3*"],
};

static DNA_BACKBONE_ATOMS: BackboneAtoms = BackboneAtoms {
    trace: &["C3'", "C3*"],
    direction1: &["C2'", "C2*"],
    direction2: &["O4'", "O4*"],
    backbone_start: &["P"],
    backbone_end: &["O3'", "O3*"],
};

static CG_PROTEIN_BACKBONE_ATOMS: BackboneAtoms = BackboneAtoms {
    trace: &["CA", "BB"],
    direction1: &[],
    direction2: &[],
    backbone_start: &["CA", "BB"],
    backbone_end: &["CA", "BB"],
};

static CG_RNA_BACKBONE_ATOMS: BackboneAtoms = BackboneAtoms {
    trace: &["C4'", "C4*", "P"],
    direction1: &[],
    direction2: &[],
    backbone_start: &["C4'", "C4*", "P"],
    backbone_end: &["C4'", "C4*", "P"],
};

// C2' is the trace bead of the Martini force field
static CG_DNA_BACKBONE_ATOMS: BackboneAtoms = BackboneAtoms {
    trace: &["C3'", "C3*", "C2'", "P"],
    direction1: &[],
    direction2: &[],
    backbone_start: &["C3'", "C3*", "C2'", "P"],
    backbone_end: &["C3'", "C3*", "C2'", "P"],
};

/// Maximum atom count of a coarse-grained protein residue.
pub const CG_PROTEIN_MAX_ATOMS: usize = 6;
/// Maximum atom count of a coarse-grained nucleic acid residue.
pub const CG_NUCLEIC_MAX_ATOMS: usize = 10;

pub const DEFAULT_VDW_RADIUS: f32 = 2.0;
pub const DEFAULT_COVALENT_RADIUS: f32 = 1.6;

pub static CHEM_COMP_PROTEIN: Set<&'static str> = phf_set! {
    "D-BETA-PEPTIDE, C-GAMMA LINKING", "D-GAMMA-PEPTIDE, C-DELTA LINKING",
    "D-PEPTIDE COOH CARBOXY TERMINUS", "D-PEPTIDE NH3 AMINO TERMINUS", "D-PEPTIDE LINKING",
    "L-BETA-PEPTIDE, C-GAMMA LINKING", "L-GAMMA-PEPTIDE, C-DELTA LINKING",
    "L-PEPTIDE COOH CARBOXY TERMINUS", "L-PEPTIDE NH3 AMINO TERMINUS", "L-PEPTIDE LINKING",
    "PEPTIDE LINKING", "PEPTIDE-LIKE",
};

pub static CHEM_COMP_RNA: Set<&'static str> = phf_set! {
    "RNA OH 3 PRIME TERMINUS", "RNA OH 5 PRIME TERMINUS", "RNA LINKING",
};

pub static CHEM_COMP_DNA: Set<&'static str> = phf_set! {
    "DNA OH 3 PRIME TERMINUS", "DNA OH 5 PRIME TERMINUS", "DNA LINKING",
    "L-DNA LINKING", "L-RNA LINKING",
};

pub static CHEM_COMP_SACCHARIDE: Set<&'static str> = phf_set! {
    "D-SACCHARIDE", "D-SACCHARIDE 1,4 AND 1,4 LINKING", "D-SACCHARIDE 1,4 AND 1,6 LINKING",
    "L-SACCHARIDE", "L-SACCHARIDE 1,4 AND 1,4 LINKING", "L-SACCHARIDE 1,4 AND 1,6 LINKING",
    "SACCHARIDE",
};

/// One-letter codes of the standard amino acids, keyed by three-letter residue name.
///
/// The key set doubles as the list of standard amino acid names.
pub static AA1: Map<&'static str, char> = phf_map! {
    "HIS" => 'H', "ARG" => 'R', "LYS" => 'K', "ILE" => 'I', "PHE" => 'F',
    "LEU" => 'L', "TRP" => 'W', "ALA" => 'A', "MET" => 'M', "PRO" => 'P',
    "CYS" => 'C', "ASN" => 'N', "VAL" => 'V', "GLY" => 'G', "SER" => 'S',
    "GLN" => 'Q', "TYR" => 'Y', "ASP" => 'D', "GLU" => 'E', "THR" => 'T',
    "ASH" => 'D', "GLH" => 'E', "UNK" => 'X',
};

pub static RNA_BASES: Set<&'static str> = phf_set! { "A", "C", "T", "G", "U" };

pub static DNA_BASES: Set<&'static str> = phf_set! {
    "DA", "DC", "DT", "DG", "DU", "TCY", "MCY", "5CM",
};

pub static PURINE_BASES: Set<&'static str> = phf_set! { "A", "G", "DA", "DG" };

pub static WATER_NAMES: Set<&'static str> = phf_set! {
    "SOL", "WAT", "HOH", "H2O", "W", "DOD", "D3O", "TIP3", "TIP4",
};

pub static PROTEIN_BACKBONE_ATOM_NAMES: Set<&'static str> = phf_set! {
    "CA", "C", "N", "O", "O1", "O2", "OC1", "OC2", "OX1", "OXT", "H", "H1", "H2", "H3", "HA", "BB",
};

pub static NUCLEIC_BACKBONE_ATOM_NAMES: Set<&'static str> = phf_set! {
    "P", "O3'", "O5'", "C5'", "C4'", "C3'", "OP1", "OP2", "O3*", "O5*", "C5*", "C4*", "C3*",
};

/// Double bonds of standard residues, keyed by `resname|atom1|atom2` with the atom
/// names in lexical order.
pub static BOND_ORDERS: Map<&'static str, i8> = phf_map! {
    "HIS|CD2|CG" => 2, "HIS|CE1|ND1" => 2, "ARG|CZ|NH2" => 2, "PHE|CE1|CZ" => 2,
    "PHE|CD2|CE2" => 2, "PHE|CD1|CG" => 2, "TRP|CD1|CG" => 2, "TRP|CD2|CE2" => 2,
    "TRP|CE3|CZ3" => 2, "TRP|CH2|CZ2" => 2, "ASN|CG|OD1" => 2, "GLN|CD|OE1" => 2,
    "TYR|CD1|CG" => 2, "TYR|CD2|CE2" => 2, "TYR|CE1|CZ" => 2, "ASP|CG|OD1" => 2,
    "GLU|CD|OE1" => 2,
    "G|C8|N7" => 2, "G|C4|C5" => 2, "G|C2|N3" => 2, "G|C6|O6" => 2, "C|C4|N3" => 2,
    "C|C5|C6" => 2, "C|C2|O2" => 2, "A|C2|N3" => 2, "A|C6|N1" => 2, "A|C4|C5" => 2,
    "A|C8|N7" => 2, "U|C5|C6" => 2, "U|C2|O2" => 2, "U|C4|O4" => 2,
    "DG|C8|N7" => 2, "DG|C4|C5" => 2, "DG|C2|N3" => 2, "DG|C6|O6" => 2, "DC|C4|N3" => 2,
    "DC|C5|C6" => 2, "DC|C2|O2" => 2, "DA|C2|N3" => 2, "DA|C6|N1" => 2, "DA|C4|C5" => 2,
    "DA|C8|N7" => 2, "DT|C5|C6" => 2, "DT|C2|O2" => 2, "DT|C4|O4" => 2,
};

pub fn is_standard_amino_acid(resname: &str) -> bool {
    AA1.contains_key(resname)
}

pub fn is_standard_base(resname: &str) -> bool {
    RNA_BASES.contains(resname) || DNA_BASES.contains(resname)
}

/// Looks up the order of an intra-residue bond of a standard residue, defaulting to 1.
pub fn bond_order_from_table(resname: &str, atomname1: &str, atomname2: &str) -> i8 {
    let (first, second) = if atomname1 < atomname2 {
        (atomname1, atomname2)
    } else {
        (atomname2, atomname1)
    };
    if is_standard_amino_acid(resname) && first == "C" && second == "O" {
        return 2;
    }
    if is_standard_base(resname) && first == "OP1" && second == "P" {
        return 2;
    }
    BOND_ORDERS
        .get(format!("{resname}|{first}|{second}").as_str())
        .copied()
        .unwrap_or(1)
}

pub fn vdw_radius(element: &str) -> f32 {
    VDW_RADII.get(element).copied().unwrap_or(DEFAULT_VDW_RADIUS)
}

pub fn covalent_radius(element: &str) -> f32 {
    COVALENT_RADII
        .get(element)
        .copied()
        .unwrap_or(DEFAULT_COVALENT_RADIUS)
}

/// Atomic number of an element symbol, `0` if unknown.
pub fn element_number(element: &str) -> u8 {
    ELEMENT_NUMBERS.get(element).copied().unwrap_or(0)
}

/// Guesses an element symbol from a PDB-style atom name.
///
/// Up to two leading digits are dropped. Two-letter names keep `NA`, `CL` and `FE`,
/// otherwise the first letter is used if it is one of the common organic elements.
/// Returns an empty string when nothing can be guessed.
pub fn guess_element(atomname: &str) -> String {
    let upper = atomname.trim().to_ascii_uppercase();
    let mut name = upper.as_str();
    for _ in 0..2 {
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            name = &name[1..];
        }
    }
    const ORGANIC: [char; 6] = ['H', 'C', 'O', 'N', 'S', 'P'];
    let first_is_organic = name.starts_with(ORGANIC);
    match name.len() {
        0 => String::new(),
        1 => name.to_string(),
        2 if matches!(name, "NA" | "CL" | "FE") => name.to_string(),
        _ if first_is_organic => name[..1].to_string(),
        _ => String::new(),
    }
}

/// Van der Waals radii in Angstrom, keyed by upper-case element symbol.
pub static VDW_RADII: Map<&'static str, f32> = phf_map! {
    "H" => 1.1, "HE" => 1.4, "LI" => 1.81, "BE" => 1.53, "B" => 1.92, "C" => 1.7, "N" => 1.55,
    "O" => 1.52, "F" => 1.47, "NE" => 1.54, "NA" => 2.27, "MG" => 1.73, "AL" => 1.84,
    "SI" => 2.1, "P" => 1.8, "S" => 1.8, "CL" => 1.75, "AR" => 1.88, "K" => 2.75, "CA" => 2.31,
    "SC" => 2.3, "TI" => 2.15, "V" => 2.05, "CR" => 2.05, "MN" => 2.05, "FE" => 2.05,
    "CO" => 2.0, "NI" => 2.0, "CU" => 2.0, "ZN" => 2.1, "GA" => 1.87, "GE" => 2.11,
    "AS" => 1.85, "SE" => 1.9, "BR" => 1.83, "KR" => 2.02, "RB" => 3.03, "SR" => 2.49,
    "Y" => 2.4, "ZR" => 2.3, "NB" => 2.15, "MO" => 2.1, "TC" => 2.05, "RU" => 2.05, "RH" => 2.0,
    "PD" => 2.05, "AG" => 2.1, "CD" => 2.2, "IN" => 2.2, "SN" => 1.93, "SB" => 2.17,
    "TE" => 2.06, "I" => 1.98, "XE" => 2.16, "CS" => 3.43, "BA" => 2.68, "LA" => 2.5,
    "CE" => 2.48, "PR" => 2.47, "ND" => 2.45, "PM" => 2.43, "SM" => 2.42, "EU" => 2.4,
    "GD" => 2.38, "TB" => 2.37, "DY" => 2.35, "HO" => 2.33, "ER" => 2.32, "TM" => 2.3,
    "YB" => 2.28, "LU" => 2.27, "HF" => 2.25, "TA" => 2.2, "W" => 2.1, "RE" => 2.05,
    "OS" => 2.0, "IR" => 2.0, "PT" => 2.05, "AU" => 2.1, "HG" => 2.05, "TL" => 1.96,
    "PB" => 2.02, "BI" => 2.07, "PO" => 1.97, "AT" => 2.02, "RN" => 2.2, "FR" => 3.48,
    "RA" => 2.83, "AC" => 2.0, "TH" => 2.4, "PA" => 2.0, "U" => 2.3, "NP" => 2.0, "PU" => 2.0,
    "AM" => 2.0, "CM" => 2.0, "BK" => 2.0, "CF" => 2.0, "ES" => 2.0, "FM" => 2.0, "MD" => 2.0,
    "NO" => 2.0, "LR" => 2.0, "RF" => 2.0, "DB" => 2.0, "SG" => 2.0, "BH" => 2.0, "HS" => 2.0,
    "MT" => 2.0, "DS" => 2.0, "RG" => 2.0, "CN" => 2.0, "UUT" => 2.0, "FL" => 2.0, "UUP" => 2.0,
    "LV" => 2.0, "UUH" => 2.0,
};

/// Covalent radii in Angstrom, keyed by upper-case element symbol.
pub static COVALENT_RADII: Map<&'static str, f32> = phf_map! {
    "H" => 0.31, "HE" => 0.28, "LI" => 1.28, "BE" => 0.96, "B" => 0.84, "C" => 0.76,
    "N" => 0.71, "O" => 0.66, "F" => 0.57, "NE" => 0.58, "NA" => 1.66, "MG" => 1.41,
    "AL" => 1.21, "SI" => 1.11, "P" => 1.07, "S" => 1.05, "CL" => 1.02, "AR" => 1.06,
    "K" => 2.03, "CA" => 1.76, "SC" => 1.7, "TI" => 1.6, "V" => 1.53, "CR" => 1.39,
    "MN" => 1.39, "FE" => 1.32, "CO" => 1.26, "NI" => 1.24, "CU" => 1.32, "ZN" => 1.22,
    "GA" => 1.22, "GE" => 1.2, "AS" => 1.19, "SE" => 1.2, "BR" => 1.2, "KR" => 1.16,
    "RB" => 2.2, "SR" => 1.95, "Y" => 1.9, "ZR" => 1.75, "NB" => 1.64, "MO" => 1.54,
    "TC" => 1.47, "RU" => 1.46, "RH" => 1.42, "PD" => 1.39, "AG" => 1.45, "CD" => 1.44,
    "IN" => 1.42, "SN" => 1.39, "SB" => 1.39, "TE" => 1.38, "I" => 1.39, "XE" => 1.4,
    "CS" => 2.44, "BA" => 2.15, "LA" => 2.07, "CE" => 2.04, "PR" => 2.03, "ND" => 2.01,
    "PM" => 1.99, "SM" => 1.98, "EU" => 1.98, "GD" => 1.96, "TB" => 1.94, "DY" => 1.92,
    "HO" => 1.92, "ER" => 1.89, "TM" => 1.9, "YB" => 1.87, "LU" => 1.87, "HF" => 1.75,
    "TA" => 1.7, "W" => 1.62, "RE" => 1.51, "OS" => 1.44, "IR" => 1.41, "PT" => 1.36,
    "AU" => 1.36, "HG" => 1.32, "TL" => 1.45, "PB" => 1.46, "BI" => 1.48, "PO" => 1.4,
    "AT" => 1.5, "RN" => 1.5, "FR" => 2.6, "RA" => 2.21, "AC" => 2.15, "TH" => 2.06,
    "PA" => 2.0, "U" => 1.96, "NP" => 1.9, "PU" => 1.87, "AM" => 1.8, "CM" => 1.69, "BK" => 1.6,
    "CF" => 1.6, "ES" => 1.6, "FM" => 1.6, "MD" => 1.6, "NO" => 1.6, "LR" => 1.6, "RF" => 1.6,
    "DB" => 1.6, "SG" => 1.6, "BH" => 1.6, "HS" => 1.6, "MT" => 1.6, "DS" => 1.6, "RG" => 1.6,
    "CN" => 1.6, "UUT" => 1.6, "FL" => 1.6, "UUP" => 1.6, "LV" => 1.6, "UUH" => 1.6,
};

/// Atomic numbers keyed by upper-case element symbol.
pub static ELEMENT_NUMBERS: Map<&'static str, u8> = phf_map! {
    "H" => 1, "HE" => 2, "LI" => 3, "BE" => 4, "B" => 5, "C" => 6, "N" => 7, "O" => 8, "F" => 9,
    "NE" => 10, "NA" => 11, "MG" => 12, "AL" => 13, "SI" => 14, "P" => 15, "S" => 16,
    "CL" => 17, "AR" => 18, "K" => 19, "CA" => 20, "SC" => 21, "TI" => 22, "V" => 23,
    "CR" => 24, "MN" => 25, "FE" => 26, "CO" => 27, "NI" => 28, "CU" => 29, "ZN" => 30,
    "GA" => 31, "GE" => 32, "AS" => 33, "SE" => 34, "BR" => 35, "KR" => 36, "RB" => 37,
    "SR" => 38, "Y" => 39, "ZR" => 40, "NB" => 41, "MO" => 42, "TC" => 43, "RU" => 44,
    "RH" => 45, "PD" => 46, "AG" => 47, "CD" => 48, "IN" => 49, "SN" => 50, "SB" => 51,
    "TE" => 52, "I" => 53, "XE" => 54, "CS" => 55, "BA" => 56, "LA" => 57, "CE" => 58,
    "PR" => 59, "ND" => 60, "PM" => 61, "SM" => 62, "EU" => 63, "GD" => 64, "TB" => 65,
    "DY" => 66, "HO" => 67, "ER" => 68, "TM" => 69, "YB" => 70, "LU" => 71, "HF" => 72,
    "TA" => 73, "W" => 74, "RE" => 75, "OS" => 76, "IR" => 77, "PT" => 78, "AU" => 79,
    "HG" => 80, "TL" => 81, "PB" => 82, "BI" => 83, "PO" => 84, "AT" => 85, "RN" => 86,
    "FR" => 87, "RA" => 88, "AC" => 89, "TH" => 90, "PA" => 91, "U" => 92, "NP" => 93,
    "PU" => 94, "AM" => 95, "CM" => 96, "BK" => 97, "CF" => 98, "ES" => 99, "FM" => 100,
    "MD" => 101, "NO" => 102, "LR" => 103, "RF" => 104, "DB" => 105, "SG" => 106, "BH" => 107,
    "HS" => 108, "MT" => 109, "DS" => 110, "RG" => 111, "CN" => 112, "NH" => 113, "FL" => 114,
    "MC" => 115, "LV" => 116, "TS" => 117, "OG" => 118,
};

/// Residue names of ions.
pub static ION_NAMES: Set<&'static str> = phf_set! {
    "118", "119", "1AL", "1CU", "2FK", "2HP", "2OF", "3CO", "3MT", "3NI", "3OF", "3P8", "4MO",
    "4PU", "543", "6MO", "ACT", "AG", "AL", "ALF", "AM", "ATH", "AU", "AU3", "AUC", "AZI", "BA",
    "BCT", "BEF", "BF4", "BO4", "BR", "BS3", "BSY", "CA", "CAC", "CD", "CD1", "CD3", "CD5",
    "CE", "CHT", "CL", "CO", "CO3", "CO5", "CON", "CR", "CS", "CSB", "CU", "CU1", "CU3", "CUA",
    "CUZ", "CYN", "DME", "DMI", "DSC", "DTI", "DY", "E4N", "EDR", "EMC", "ER3", "EU", "EU3",
    "F", "FE", "FE2", "FPO", "GA", "GD3", "GEP", "HAI", "HG", "HGC", "IN", "IOD", "IR", "IR3",
    "IRI", "IUM", "K", "KO4", "LA", "LCO", "LCP", "LI", "LU", "MAC", "MG", "MH2", "MH3", "MLI",
    "MLT", "MMC", "MN", "MN3", "MN5", "MN6", "MO1", "MO2", "MO3", "MO4", "MO5", "MO6", "MOO",
    "MOS", "MOW", "MW1", "MW2", "MW3", "NA", "NA2", "NA5", "NA6", "NAO", "NAW", "NCO", "NET",
    "NH4", "NI", "NI1", "NI2", "NI3", "NO2", "NO3", "NRU", "O4M", "OAA", "OC1", "OC2", "OC3",
    "OC4", "OC5", "OC6", "OC7", "OC8", "OCL", "OCM", "OCN", "OCO", "OF1", "OF2", "OF3", "OH",
    "OS", "OS4", "OXL", "PB", "PBM", "PD", "PDV", "PER", "PI", "PO3", "PO4", "PR", "PT", "PT4",
    "PTN", "RB", "RH3", "RHD", "RU", "SB", "SCN", "SE4", "SEK", "SM", "SMO", "SO3", "SO4", "SR",
    "T1A", "TB", "TBA", "TCN", "TEA", "TH", "THE", "TL", "TMA", "TRA", "UNX", "V", "VN3", "VO4",
    "W", "WO5", "Y1", "YB", "YB2", "YH", "YT3", "ZCM", "ZN", "ZN2", "ZN3", "ZNO", "ZO3", "OHX",
};

/// Residue names of saccharides.
pub static SACCHARIDE_NAMES: Set<&'static str> = phf_set! {
    "045", "0AT", "0BD", "0MK", "0NZ", "0TS", "0V4", "0XY", "0YT", "10M", "147", "149", "14T",
    "15L", "16G", "18T", "18Y", "1AR", "1BW", "1GL", "1GN", "1JB", "1LL", "1NA", "1S3", "26M",
    "26Q", "26R", "26V", "26W", "26Y", "27C", "289", "291", "293", "2DG", "2F8", "2FG", "2FL",
    "2FP", "2GL", "2M4", "2M5", "32O", "34V", "3CM", "3DO", "3DY", "3FM", "3LR", "3MF", "3MG",
    "3SA", "3ZW", "46D", "46M", "46Z", "48Z", "4CQ", "4GC", "4NN", "50A", "5DI", "5GF", "5MM",
    "5RP", "5SA", "5SP", "64K", "6PG", "6SA", "7JZ", "7SA", "A1Q", "A2G", "AAB", "AAL", "AAO",
    "ABC", "ABD", "ABE", "ABF", "ABL", "ACG", "ACI", "ACR", "ACX", "ADA", "ADG", "ADR", "AF1",
    "AFD", "AFL", "AFO", "AFP", "AFR", "AGC", "AGH", "AGL", "AHR", "AIG", "ALL", "ALX", "AMU",
    "AOG", "AOS", "ARA", "ARB", "ARE", "ARI", "ASG", "ASO", "AXP", "AXR", "B0D", "B16", "B2G",
    "B4G", "B6D", "B8D", "B9D", "BBK", "BCD", "BDG", "BDP", "BDR", "BEM", "BFP", "BGC", "BGL",
    "BGP", "BGS", "BHG", "BMA", "BMX", "BNG", "BNX", "BOG", "BRI", "BXF", "BXP", "BXX", "BXY",
    "C3X", "C4X", "C5X", "CAP", "CBI", "CBK", "CBS", "CDR", "CEG", "CGF", "CHO", "CR1", "CR6",
    "CRA", "CT3", "CTO", "CTR", "CTT", "D6G", "DAF", "DAG", "DDA", "DDB", "DDL", "DEL", "DFR",
    "DFX", "DG0", "DGC", "DGD", "DGM", "DGS", "DIG", "DLF", "DLG", "DMU", "DNO", "DOM", "DP5",
    "DQQ", "DQR", "DR2", "DR3", "DR4", "DRI", "DSR", "DT6", "DVC", "E4P", "E5G", "EAG", "EBG",
    "EBQ", "EGA", "EJT", "EPG", "ERE", "ERI", "F1P", "F1X", "F6P", "FBP", "FCA", "FCB", "FCT",
    "FDP", "FDQ", "FFC", "FIX", "FMO", "FRU", "FSI", "FU4", "FUB", "FUC", "FUD", "FUL", "FXP",
    "G16", "G1P", "G2F", "G3I", "G4D", "G4S", "G6D", "G6P", "G6S", "GAC", "GAD", "GAL", "GC1",
    "GC4", "GCD", "GCN", "GCO", "GCS", "GCT", "GCU", "GCV", "GCW", "GCX", "GE1", "GFG", "GFP",
    "GIV", "GL0", "GL2", "GL5", "GL6", "GL7", "GL9", "GLA", "GLB", "GLC", "GLD", "GLF", "GLG",
    "GLO", "GLP", "GLS", "GLT", "GLW", "GMH", "GN1", "GNX", "GP1", "GP4", "GPH", "GPM", "GQ1",
    "GQ2", "GQ4", "GS1", "GS4", "GSA", "GSD", "GTE", "GTH", "GTK", "GTR", "GTZ", "GU0", "GU1",
    "GU2", "GU3", "GU4", "GU5", "GU6", "GU8", "GU9", "GUF", "GUP", "GUZ", "GYP", "GYV", "H2P",
    "HDL", "HMS", "HS2", "HSD", "HSG", "HSH", "HSJ", "HSQ", "HSR", "HSU", "HSX", "HSY", "HSZ",
    "IAB", "IDG", "IDR", "IDS", "IDT", "IDU", "IDX", "IDY", "IMK", "IN1", "IPT", "ISL", "KBG",
    "KD2", "KDA", "KDM", "KDO", "KFN", "KO1", "KO2", "KTU", "L6S", "LAG", "LAI", "LAK", "LAO",
    "LAT", "LB2", "LBT", "LCN", "LDY", "LGC", "LGU", "LM2", "LMT", "LMU", "LOG", "LOX", "LPK",
    "LSM", "LTM", "LVZ", "LXB", "LXZ", "M1F", "M3M", "M6P", "M8C", "MA1", "MA2", "MA3", "MAB",
    "MAG", "MAL", "MAN", "MAT", "MAV", "MAW", "MBG", "MCU", "MDA", "MDM", "MDP", "MFA", "MFB",
    "MFU", "MG5", "MGA", "MGL", "MLB", "MMA", "MMN", "MN0", "MRP", "MTT", "MUG", "MVP", "MXY",
    "N1L", "N9S", "NAA", "NAG", "NBG", "NDG", "NED", "NG1", "NG6", "NGA", "NGB", "NGC", "NGE",
    "NGF", "NGL", "NGS", "NGY", "NHF", "NM6", "NM9", "NTF", "NTO", "NTP", "NXD", "NYT", "OPG",
    "OPM", "ORP", "OX2", "P3M", "P53", "P6P", "PA5", "PNA", "PNG", "PNW", "PRP", "PSJ", "PSV",
    "PTQ", "QDK", "QPS", "QV4", "R1P", "R1X", "R2B", "R5P", "RAA", "RAE", "RAF", "RAM", "RAO",
    "RAT", "RB5", "RBL", "RCD", "RDP", "REL", "RER", "RF5", "RG1", "RGG", "RHA", "RIB", "RIP",
    "RNS", "RNT", "ROB", "ROR", "RPA", "RST", "RUB", "RUU", "RZM", "S6P", "S7P", "SA0", "SCR",
    "SDD", "SF6", "SF9", "SG4", "SG5", "SG6", "SG7", "SGA", "SGC", "SGD", "SGN", "SGS", "SHB",
    "SHG", "SI3", "SIO", "SOE", "SOL", "SSG", "SUC", "SUP", "SUS", "T6P", "T6T", "TAG", "TCB",
    "TDG", "TGK", "TGY", "TH1", "TIA", "TM5", "TM6", "TM9", "TMR", "TMX", "TOA", "TOC", "TRE",
    "TYV", "UCD", "UDC", "VG1", "X0X", "X1X", "X2F", "X4S", "X5S", "X6X", "XBP", "XDN", "XDP",
    "XIF", "XIM", "XLF", "XLS", "XMM", "XUL", "XXR", "XYP", "XYS", "YO5", "Z3Q", "Z6J", "Z9M",
    "ZDC", "ZDM",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guess_element_handles_common_atom_names() {
        assert_eq!(guess_element("CA"), "C");
        assert_eq!(guess_element(" N  "), "N");
        assert_eq!(guess_element("1HB2"), "H");
        assert_eq!(guess_element("12HG"), "H");
        assert_eq!(guess_element("FE"), "FE");
        assert_eq!(guess_element("Cl"), "CL");
        assert_eq!(guess_element("O"), "O");
        assert_eq!(guess_element("ZN1"), "");
        assert_eq!(guess_element(""), "");
    }

    #[test]
    fn bond_order_table_is_order_independent() {
        assert_eq!(bond_order_from_table("PHE", "CG", "CD1"), 2);
        assert_eq!(bond_order_from_table("PHE", "CD1", "CG"), 2);
        assert_eq!(bond_order_from_table("PHE", "CA", "CB"), 1);
    }

    #[test]
    fn bond_order_table_knows_carbonyl_and_phosphate() {
        assert_eq!(bond_order_from_table("GLY", "O", "C"), 2);
        assert_eq!(bond_order_from_table("LIG", "O", "C"), 1);
        assert_eq!(bond_order_from_table("DA", "P", "OP1"), 2);
    }

    #[test]
    fn radii_fall_back_to_defaults() {
        assert_eq!(covalent_radius("C"), 0.76);
        assert_eq!(covalent_radius("XX"), DEFAULT_COVALENT_RADIUS);
        assert_eq!(vdw_radius("N"), 1.55);
        assert_eq!(vdw_radius(""), DEFAULT_VDW_RADIUS);
    }

    #[test]
    fn element_numbers_cover_the_periodic_table() {
        assert_eq!(element_number("H"), 1);
        assert_eq!(element_number("FE"), 26);
        assert_eq!(element_number("OG"), 118);
        assert_eq!(element_number("?"), 0);
    }

    #[test]
    fn cg_backbone_types_are_flagged() {
        assert!(BackboneType::CgRna.is_cg());
        assert!(!BackboneType::Protein.is_cg());
        assert!(BackboneType::Unknown.atoms().trace.is_empty());
        assert_eq!(BackboneType::Protein.atoms().backbone_start, &["N"]);
    }
}
