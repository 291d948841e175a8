use super::Structure;
use crate::core::proxy::{AtomProxy, BondProxy};
use crate::core::store::BondStore;
use crate::index::bitset::BitSet;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Source of a per-atom radius.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum RadiusType {
    #[default]
    Vdw,
    Covalent,
    /// The explicit radius column; van der Waals radius where the column is absent.
    Explicit,
    /// The B-factor; 1.0 where it is zero.
    BFactor,
    /// The same radius for every atom.
    Size(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusParams {
    pub radius_type: RadiusType,
    pub scale: f32,
}

impl Default for RadiusParams {
    fn default() -> Self {
        Self {
            radius_type: RadiusType::Vdw,
            scale: 1.0,
        }
    }
}

impl RadiusParams {
    pub fn atom_radius(&self, atom: &AtomProxy<'_>) -> f32 {
        let radius = match self.radius_type {
            RadiusType::Vdw => atom.vdw(),
            RadiusType::Covalent => atom.covalent(),
            RadiusType::Explicit => atom.radius().unwrap_or_else(|| atom.vdw()),
            RadiusType::BFactor => {
                let bfactor = atom.bfactor();
                if bfactor == 0.0 { 1.0 } else { bfactor }
            }
            RadiusType::Size(size) => size,
        };
        radius * self.scale
    }
}

/// Which output arrays to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFields {
    pub position: bool,
    pub picking: bool,
    pub radius: bool,
    pub index: bool,
}

impl Default for DataFields {
    fn default() -> Self {
        Self {
            position: true,
            picking: true,
            radius: true,
            index: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AtomDataParams<'a> {
    /// Atoms to extract; the full atom set when `None`.
    pub atom_set: Option<&'a BitSet>,
    pub fields: DataFields,
    pub radius: RadiusParams,
}

/// Per-atom attribute arrays, one slot per atom of the atom set in ascending order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomData {
    /// Flat `[x0, y0, z0, x1, ...]` coordinates.
    pub position: Option<Vec<f32>>,
    pub picking: Option<Vec<u32>>,
    pub radius: Option<Vec<f32>>,
    pub index: Option<Vec<u32>>,
}

/// How bonds with an order above one are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MultipleBond {
    /// One slot per bond.
    #[default]
    Off,
    /// One slot per bond order, arranged symmetrically around the bond axis.
    Symmetric,
    /// The bond itself plus thinner, shortened slots offset to one side.
    Offset,
}

/// Bond store the bond data is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BondSource {
    #[default]
    Covalent,
    Backbone,
    Rung,
}

#[derive(Debug, Clone, Copy)]
pub struct BondDataParams<'a> {
    /// Bonds to extract; the default bond set of the source when `None`.
    pub bond_set: Option<&'a BitSet>,
    pub source: BondSource,
    pub multiple_bond: MultipleBond,
    pub bond_scale: f32,
    pub bond_spacing: f32,
    pub radius: RadiusParams,
    /// Also fill the radius of the second atom of each bond.
    pub radius2: bool,
    pub fields: DataFields,
}

impl Default for BondDataParams<'_> {
    fn default() -> Self {
        Self {
            bond_set: None,
            source: BondSource::Covalent,
            multiple_bond: MultipleBond::Off,
            bond_scale: 0.4,
            bond_spacing: 1.0,
            radius: RadiusParams::default(),
            radius2: false,
            fields: DataFields::default(),
        }
    }
}

/// Per-bond attribute arrays.
///
/// With multiple bonds enabled, a bond of order `n` occupies `n` consecutive slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondData {
    pub position1: Option<Vec<f32>>,
    pub position2: Option<Vec<f32>>,
    pub picking: Option<Vec<u32>>,
    pub radius: Option<Vec<f32>>,
    pub radius2: Option<Vec<f32>>,
}

fn write_point(array: &mut [f32], offset: usize, point: &Point3<f32>) {
    array[offset] = point.x;
    array[offset + 1] = point.y;
    array[offset + 2] = point.z;
}

fn fill_multi_radius(array: &mut [f32], i: usize, order: usize, is_offset: bool, bond_scale: f32) {
    let divisor = if is_offset { 1.0 } else { 0.5 * order as f32 };
    let multi_radius = array[i] * bond_scale / divisor;
    for j in usize::from(is_offset)..order {
        array[i + j] = multi_radius;
    }
}

impl Structure {
    /// Extracts per-atom attributes for every atom of the atom set, in ascending order.
    pub fn atom_data(&self, params: &AtomDataParams<'_>) -> AtomData {
        let atom_set = params.atom_set.unwrap_or(&self.atom_set);
        let count = atom_set.size();
        let fields = params.fields;

        let mut position = fields.position.then(|| vec![0.0; count * 3]);
        let mut picking = fields.picking.then(|| vec![0; count]);
        let mut radius = fields.radius.then(|| vec![0.0; count]);
        let mut index = fields.index.then(|| vec![0; count]);

        atom_set.for_each(|idx, i| {
            let atom = self.atom(idx);
            if let Some(position) = position.as_mut() {
                atom.position_to_array(position, i * 3);
            }
            if let Some(picking) = picking.as_mut() {
                picking[i] = idx as u32;
            }
            if let Some(radius) = radius.as_mut() {
                radius[i] = params.radius.atom_radius(&atom);
            }
            if let Some(index) = index.as_mut() {
                index[i] = idx as u32;
            }
        });

        debug!(atoms = count, "Extracted atom data");
        AtomData {
            position,
            picking,
            radius,
            index,
        }
    }

    /// Atom data of the atoms that take part in backbone bonds.
    pub fn backbone_atom_data(&self, params: &AtomDataParams<'_>) -> AtomData {
        let atom_set = params.atom_set.or(self.backbone_atom_set.as_ref());
        self.atom_data(&AtomDataParams { atom_set, ..*params })
    }

    /// Atom data of the atoms that take part in rung bonds.
    pub fn rung_atom_data(&self, params: &AtomDataParams<'_>) -> AtomData {
        let atom_set = params.atom_set.or(self.rung_atom_set.as_ref());
        self.atom_data(&AtomDataParams { atom_set, ..*params })
    }

    /// Extracts per-bond attributes for every bond of the bond set, in ascending order.
    ///
    /// With [`MultipleBond::Symmetric`], a double bond is drawn as two slots shifted to
    /// either side of the bond axis and a triple bond as the axis plus two shifted slots.
    /// With [`MultipleBond::Offset`], the first slot is the bond axis at full radius and
    /// the following slots are shifted to one side and shortened at both ends. Higher
    /// orders in symmetric mode only fill their first slot.
    pub fn bond_data(&self, params: &BondDataParams<'_>) -> BondData {
        let store: &BondStore = match params.source {
            BondSource::Covalent => &self.bond_store,
            BondSource::Backbone => &self.backbone_bond_store,
            BondSource::Rung => &self.rung_bond_store,
        };
        let default_set;
        let bond_set = match (params.bond_set, params.source) {
            (Some(bond_set), _) => bond_set,
            (None, BondSource::Covalent) => &self.bond_set,
            (None, BondSource::Backbone) => {
                default_set = self.backbone_bond_set();
                &default_set
            }
            (None, BondSource::Rung) => {
                default_set = self.rung_bond_set();
                &default_set
            }
        };

        let is_multi = params.multiple_bond != MultipleBond::Off;
        let is_offset = params.multiple_bond == MultipleBond::Offset;
        let slots = |index: usize| -> usize {
            if is_multi {
                store.bond_order[index].max(1) as usize
            } else {
                1
            }
        };
        let count: usize = bond_set.iter().map(slots).sum();
        let fields = params.fields;

        let mut position1 = fields.position.then(|| vec![0.0; count * 3]);
        let mut position2 = fields.position.then(|| vec![0.0; count * 3]);
        let mut picking = fields.picking.then(|| vec![0; count]);
        let mut radius = fields.radius.then(|| vec![0.0; count]);
        let mut radius2 = (fields.radius && params.radius2).then(|| vec![0.0; count]);

        let mut i = 0;
        for index in bond_set.iter() {
            let bond = BondProxy::new(self, store, index);
            let atom1 = bond.atom1();
            let atom2 = bond.atom2();
            let order = slots(index);
            let i3 = i * 3;

            if let (Some(position1), Some(position2)) = (position1.as_mut(), position2.as_mut()) {
                let p1 = atom1.position();
                let p2 = atom2.position();
                let mut slot = |n: usize, start: Point3<f32>, end: Point3<f32>| {
                    write_point(position1, i3 + n * 3, &start);
                    write_point(position2, i3 + n * 3, &end);
                };
                if is_multi && order > 1 {
                    let atom_radius = params.radius.atom_radius(&atom1);
                    let shift_dir = bond.calculate_shift_dir();
                    if is_offset {
                        let abs_offset = 2.0 * params.bond_spacing * atom_radius;
                        let shift: Vector3<f32> = -shift_dir * abs_offset;
                        let shortening = (p2 - p1) * (abs_offset / 1.88).max(0.1);
                        slot(0, p1, p2);
                        slot(1, p1 + shift + shortening, p2 + shift - shortening);
                        if order >= 3 {
                            slot(2, p1 - shift + shortening, p2 - shift - shortening);
                        }
                    } else {
                        let shift = shift_dir * ((params.bond_spacing - params.bond_scale) * atom_radius);
                        match order {
                            2 => {
                                slot(0, p1 + shift, p2 + shift);
                                slot(1, p1 - shift, p2 - shift);
                            }
                            3 => {
                                slot(0, p1, p2);
                                slot(1, p1 + shift, p2 + shift);
                                slot(2, p1 - shift, p2 - shift);
                            }
                            _ => slot(0, p1, p2),
                        }
                    }
                } else {
                    slot(0, p1, p2);
                }
            }

            if let Some(picking) = picking.as_mut() {
                picking[i..i + order].fill(index as u32);
            }
            if let Some(radius) = radius.as_mut() {
                radius[i] = params.radius.atom_radius(&atom1);
                if order > 1 {
                    fill_multi_radius(radius, i, order, is_offset, params.bond_scale);
                }
            }
            if let Some(radius2) = radius2.as_mut() {
                radius2[i] = params.radius.atom_radius(&atom2);
                if order > 1 {
                    fill_multi_radius(radius2, i, order, is_offset, params.bond_scale);
                }
            }
            i += order;
        }

        debug!(bonds = bond_set.size(), slots = count, "Extracted bond data");
        BondData {
            position1,
            position2,
            picking,
            radius,
            radius2,
        }
    }

    /// Bond data of the backbone bond store.
    pub fn backbone_bond_data(&self, params: &BondDataParams<'_>) -> BondData {
        self.bond_data(&BondDataParams {
            source: BondSource::Backbone,
            ..*params
        })
    }

    /// Bond data of the rung bond store.
    pub fn rung_bond_data(&self, params: &BondDataParams<'_>) -> BondData {
        self.bond_data(&BondDataParams {
            source: BondSource::Rung,
            ..*params
        })
    }
}
