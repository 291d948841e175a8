use crate::core::structure::{Selection, Structure};
use crate::core::utils::geometry::{calculate_rmsd, centroid};
use nalgebra::{Matrix3, Point3, Rotation3, Vector3};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error, PartialEq)]
pub enum SuperpositionError {
    #[error("Point sets differ in length: {len1} and {len2}")]
    LengthMismatch { len1: usize, len2: usize },
    #[error("Cannot superpose empty point sets")]
    Empty,
    #[error("Singular value decomposition of the covariance matrix failed")]
    Svd,
}

/// Optimal rigid transform mapping one point set onto another of the same size.
///
/// The rotation minimizes the RMSD between the centered sets. Reflections are never
/// returned: when the fit would mirror the first set, the smallest singular direction is
/// flipped so the result stays a proper rotation.
#[derive(Debug, Clone)]
pub struct Superposition {
    rotation: Rotation3<f64>,
    mean1: Point3<f64>,
    mean2: Point3<f64>,
    rmsd: f64,
    reflection_corrected: bool,
}

impl Superposition {
    /// Fits `coords1` onto `coords2`.
    ///
    /// # Arguments
    ///
    /// * `coords1` - The points to be moved.
    /// * `coords2` - The reference points, paired with `coords1` by position.
    ///
    /// # Errors
    ///
    /// Returns [`SuperpositionError::LengthMismatch`] if the sets differ in size,
    /// [`SuperpositionError::Empty`] if they are empty.
    #[instrument(skip_all, name = "superposition")]
    pub fn new(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Result<Self, SuperpositionError> {
        if coords1.len() != coords2.len() {
            return Err(SuperpositionError::LengthMismatch {
                len1: coords1.len(),
                len2: coords2.len(),
            });
        }
        let (Some(mean1), Some(mean2)) = (centroid(coords1), centroid(coords2)) else {
            return Err(SuperpositionError::Empty);
        };

        let h = coords1
            .iter()
            .zip(coords2)
            .fold(Matrix3::zeros(), |acc, (p1, p2)| {
                acc + (p2 - mean2) * (p1 - mean1).transpose()
            });

        let svd = h.svd(true, true);
        let (u, v_t) = svd.u.zip(svd.v_t).ok_or(SuperpositionError::Svd)?;

        let mut correction = Matrix3::identity();
        let reflection_corrected = (u * v_t).determinant() < 0.0;
        if reflection_corrected {
            warn!("Fit is a reflection, flipping the smallest singular direction");
            correction[(2, 2)] = -1.0;
        }
        let rotation = Rotation3::from_matrix_unchecked(u * correction * v_t);

        let mut superposition = Self {
            rotation,
            mean1,
            mean2,
            rmsd: 0.0,
            reflection_corrected,
        };
        let moved: Vec<Point3<f64>> = coords1.iter().map(|p| superposition.transform_point(p)).collect();
        superposition.rmsd = calculate_rmsd(&moved, coords2).unwrap_or(0.0);

        info!(
            points = coords1.len(),
            rmsd = superposition.rmsd,
            "Superposed point sets"
        );
        Ok(superposition)
    }

    /// Fits the selected atoms of `structure1` onto the selected atoms of `structure2`,
    /// paired in ascending index order.
    pub fn from_structures(
        structure1: &Structure,
        structure2: &Structure,
        selection: Option<&dyn Selection>,
    ) -> Result<Self, SuperpositionError> {
        let coords1 = selected_coords(structure1, selection);
        let coords2 = selected_coords(structure2, selection);
        Self::new(&coords1, &coords2)
    }

    pub fn rotation(&self) -> &Rotation3<f64> {
        &self.rotation
    }

    /// Translation applied after the rotation about the origin.
    pub fn translation(&self) -> Vector3<f64> {
        self.mean2.coords - self.rotation * self.mean1.coords
    }

    /// RMSD between the transformed first set and the second set.
    pub fn rmsd(&self) -> f64 {
        self.rmsd
    }

    pub fn is_reflection_corrected(&self) -> bool {
        self.reflection_corrected
    }

    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.mean2 + self.rotation * (point - self.mean1)
    }

    /// Applies the transform to `points` in place.
    pub fn transform(&self, points: &mut [Point3<f64>]) {
        for point in points.iter_mut() {
            *point = self.transform_point(point);
        }
    }

    /// Applies the transform to every atom of `structure` and rebuilds its spatial grid.
    pub fn transform_structure(&self, structure: &mut Structure) {
        let count = structure.atom_count();
        for i in 0..count {
            let position = structure.atom_store.position(i).cast::<f64>();
            let moved = self.transform_point(&position).cast::<f32>();
            structure.atom_store.set_position(i, &moved);
        }
        structure.invalidate_atom_set_cache();
        structure.refresh_position();
        debug!(atoms = count, "Transformed structure");
    }
}

fn selected_coords(structure: &Structure, selection: Option<&dyn Selection>) -> Vec<Point3<f64>> {
    let mut coords = Vec::new();
    structure.each_atom(selection, |atom| coords.push(atom.position().cast::<f64>()));
    coords
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::structure::AtomSelection;
    use crate::core::structure::test_utils::build_dipeptide;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const TOLERANCE: f64 = 1e-9;

    fn random_points(rng: &mut StdRng, n: usize) -> Vec<Point3<f64>> {
        (0..n)
            .map(|_| {
                Point3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                )
            })
            .collect()
    }

    mod fitting {
        use super::*;

        #[test]
        fn pure_translation_has_no_rotation() {
            let from = vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ];
            let to: Vec<_> = from.iter().map(|p| p + Vector3::new(10.0, 20.0, 30.0)).collect();
            let fit = Superposition::new(&from, &to).unwrap();
            assert!((fit.rotation().matrix() - Matrix3::identity()).abs().max() < TOLERANCE);
            assert!((fit.translation() - Vector3::new(10.0, 20.0, 30.0)).norm() < TOLERANCE);
            assert!(!fit.is_reflection_corrected());
        }

        #[test]
        fn random_rigid_transforms_are_recovered() {
            let mut rng = StdRng::seed_from_u64(7);
            for _ in 0..10 {
                let points = random_points(&mut rng, 20);
                let rotation = Rotation3::from_euler_angles(
                    rng.gen_range(-3.0..3.0),
                    rng.gen_range(-1.5..1.5),
                    rng.gen_range(-3.0..3.0),
                );
                let translation = Vector3::new(
                    rng.gen_range(-50.0..50.0),
                    rng.gen_range(-50.0..50.0),
                    rng.gen_range(-50.0..50.0),
                );
                let moved: Vec<_> = points.iter().map(|p| rotation * p + translation).collect();

                let fit = Superposition::new(&points, &moved).unwrap();
                assert!((fit.rotation().matrix() - rotation.matrix()).abs().max() < 1e-9);
                assert!((fit.translation() - translation).norm() < 1e-6);
                assert!(fit.rmsd() < 1e-6);

                let mut transformed = points.clone();
                fit.transform(&mut transformed);
                for (a, b) in transformed.iter().zip(&moved) {
                    assert!((a - b).norm() < 1e-6);
                }
            }
        }

        #[test]
        fn mirror_image_yields_a_proper_rotation() {
            let mut rng = StdRng::seed_from_u64(11);
            let points = random_points(&mut rng, 12);
            let mirrored: Vec<_> = points.iter().map(|p| Point3::new(p.x, p.y, -p.z)).collect();
            let fit = Superposition::new(&points, &mirrored).unwrap();
            assert!(fit.is_reflection_corrected());
            assert!((fit.rotation().matrix().determinant() - 1.0).abs() < 1e-9);
            assert!(fit.rmsd() > 0.0);
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn length_mismatch_is_rejected() {
            let a = vec![Point3::origin(); 3];
            let b = vec![Point3::origin(); 2];
            assert_eq!(
                Superposition::new(&a, &b).unwrap_err(),
                SuperpositionError::LengthMismatch { len1: 3, len2: 2 }
            );
        }

        #[test]
        fn empty_sets_are_rejected() {
            assert_eq!(Superposition::new(&[], &[]).unwrap_err(), SuperpositionError::Empty);
        }
    }

    mod structures {
        use super::*;

        #[test]
        fn transform_structure_moves_atoms_and_grid() {
            let mut mobile = build_dipeptide();
            let mut target = build_dipeptide();
            let shifted: Vec<f32> = (0..target.atom_count())
                .flat_map(|i| {
                    let p = target.atom(i).position();
                    [p.x + 20.0, p.y - 5.0, p.z + 3.0]
                })
                .collect();
            target.update_position(&shifted).unwrap();
            target.refresh_position();

            let backbone = AtomSelection::Backbone;
            let fit = Superposition::from_structures(&mobile, &target, Some(&backbone)).unwrap();
            assert!(fit.rmsd() < 1e-4);

            fit.transform_structure(&mut mobile);
            for i in 0..mobile.atom_count() {
                let d = (mobile.atom(i).position() - target.atom(i).position()).norm();
                assert!(d < 1e-3, "atom {i} is {d} away");
            }
            let water = mobile.atom_set_within_point(&Point3::new(30.0, 5.0, 13.0), 0.1);
            assert_eq!(water.to_vec(), vec![9]);
        }

        #[test]
        fn differently_sized_selections_are_rejected() {
            let structure = build_dipeptide();
            let other = build_dipeptide();
            let ca = AtomSelection::AtomName("CA".to_string());
            let fit = Superposition::from_structures(&structure, &other, Some(&ca)).unwrap();
            assert!(fit.rmsd() < TOLERANCE);

            let coords1 = selected_coords(&structure, Some(&ca));
            let coords2 = selected_coords(&other, None);
            assert!(matches!(
                Superposition::new(&coords1, &coords2),
                Err(SuperpositionError::LengthMismatch { len1: 2, len2: 10 })
            ));
        }
    }
}
