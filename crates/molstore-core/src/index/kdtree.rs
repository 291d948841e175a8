use itertools::Itertools;
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Distance reported by k-d tree queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Metric {
    SquaredEuclidean,
    #[default]
    Euclidean,
}

/// One result of a k-d tree query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// The index the point was inserted with.
    pub index: usize,
    /// Distance to the query point in the tree's [`Metric`].
    pub distance: f32,
}

/// Items per kiddo leaf bucket; a full leaf cannot split when all of its items share
/// the split coordinate.
const BUCKET_SIZE: usize = 32;

enum Backend {
    Tree(KdTree<f32, 3>),
    Linear(Vec<(u64, [f32; 3])>),
}

/// Three-dimensional k-d tree over indexed points.
///
/// Each point carries the index it was inserted with, typically the global atom index,
/// so queries over a subset of atoms still report structure-wide indices.
///
/// Point sets where a full bucket of points shares a coordinate on some axis
/// (planar depictions, unset coordinates) cannot be split by kiddo and are scanned
/// linearly instead.
pub struct Kdtree {
    backend: Backend,
    metric: Metric,
    len: usize,
}

impl Kdtree {
    #[instrument(level = "debug", skip_all, name = "kdtree_build")]
    pub fn new(points: impl IntoIterator<Item = (usize, Point3<f32>)>, metric: Metric) -> Self {
        let points: Vec<(u64, [f32; 3])> = points
            .into_iter()
            .map(|(index, p)| (index as u64, [p.x, p.y, p.z]))
            .collect();
        let len = points.len();

        let backend = if is_degenerate(&points) {
            debug!(points = len, "Coordinates too degenerate for a k-d tree, using a linear scan");
            Backend::Linear(points)
        } else {
            let mut tree: KdTree<f32, 3> = KdTree::with_capacity(len);
            for (index, point) in &points {
                tree.add(point, *index);
            }
            Backend::Tree(tree)
        };
        debug!(points = len, ?metric, "Built k-d tree");
        Self { backend, metric, len }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Finds up to `max_count` points within `max_distance` of `point`.
    ///
    /// `max_distance` is given in the tree's metric. When more than `max_count` points
    /// qualify, the nearest ones are kept. The result is not sorted by distance.
    pub fn nearest(&self, point: &Point3<f32>, max_count: usize, max_distance: f32) -> Vec<Neighbor> {
        if max_count == 0 || self.len == 0 || max_distance < 0.0 {
            return Vec::new();
        }
        let radius_sq = match self.metric {
            Metric::SquaredEuclidean => max_distance,
            Metric::Euclidean => max_distance * max_distance,
        };
        let query = [point.x, point.y, point.z];
        let mut found: Vec<(f32, u64)> = match &self.backend {
            Backend::Tree(tree) => tree
                .within_unsorted::<SquaredEuclidean>(&query, radius_sq)
                .into_iter()
                .map(|n| (n.distance, n.item))
                .collect(),
            Backend::Linear(points) => points
                .iter()
                .filter_map(|&(index, p)| {
                    let d2 = (0..3).map(|k| (p[k] - query[k]) * (p[k] - query[k])).sum::<f32>();
                    (d2 <= radius_sq).then_some((d2, index))
                })
                .collect(),
        };

        if found.len() > max_count {
            found.select_nth_unstable_by(max_count - 1, |a, b| a.0.total_cmp(&b.0));
            found.truncate(max_count);
        }

        found
            .into_iter()
            .map(|(d2, index)| Neighbor {
                index: index as usize,
                distance: match self.metric {
                    Metric::SquaredEuclidean => d2,
                    Metric::Euclidean => d2.sqrt(),
                },
            })
            .collect()
    }

    /// All points within `max_distance` of `point`, sorted by ascending distance.
    pub fn within_sorted(&self, point: &Point3<f32>, max_distance: f32) -> Vec<Neighbor> {
        let mut found = self.nearest(point, usize::MAX, max_distance);
        found.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        found
    }
}

/// Whether any axis value is shared by enough points to fill a leaf bucket.
fn is_degenerate(points: &[(u64, [f32; 3])]) -> bool {
    points.len() >= BUCKET_SIZE
        && (0..3).any(|axis| {
            points
                .iter()
                .map(|(_, p)| (p[axis] + 0.0).to_bits())
                .counts()
                .into_values()
                .any(|count| count >= BUCKET_SIZE)
        })
}

impl std::fmt::Debug for Kdtree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kdtree")
            .field("len", &self.len)
            .field("metric", &self.metric)
            .field("linear", &matches!(self.backend, Backend::Linear(_)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn line_tree(metric: Metric) -> Kdtree {
        // points at x = 0, 1, 2, ... 9 carrying indices 100..110
        Kdtree::new(
            (0..10).map(|i| (100 + i, Point3::new(i as f32, 0.0, 0.0))),
            metric,
        )
    }

    fn sorted_indices(neighbors: &[Neighbor]) -> Vec<usize> {
        let mut indices: Vec<usize> = neighbors.iter().map(|n| n.index).collect();
        indices.sort_unstable();
        indices
    }

    #[test]
    fn nearest_reports_inserted_indices_and_euclidean_distances() {
        let tree = line_tree(Metric::Euclidean);
        let found = tree.within_sorted(&Point3::new(0.0, 0.0, 0.0), 2.5);
        assert_eq!(sorted_indices(&found), vec![100, 101, 102]);
        assert_eq!(found[2].index, 102);
        assert!((found[2].distance - 2.0).abs() < 1e-6);
    }

    #[test]
    fn squared_metric_interprets_distance_as_squared() {
        let tree = line_tree(Metric::SquaredEuclidean);
        let found = tree.within_sorted(&Point3::new(0.0, 0.0, 0.0), 5.0);
        assert_eq!(sorted_indices(&found), vec![100, 101, 102]);
        assert!((found[2].distance - 4.0).abs() < 1e-6);
    }

    #[test]
    fn max_count_keeps_the_nearest_points() {
        let tree = line_tree(Metric::Euclidean);
        let found = tree.nearest(&Point3::new(4.2, 0.0, 0.0), 3, 100.0);
        assert_eq!(sorted_indices(&found), vec![103, 104, 105]);
    }

    #[test]
    fn empty_tree_and_zero_count_return_nothing() {
        let tree = Kdtree::new(std::iter::empty(), Metric::Euclidean);
        assert!(tree.is_empty());
        assert!(tree.nearest(&Point3::origin(), 5, 10.0).is_empty());
        assert!(line_tree(Metric::Euclidean).nearest(&Point3::origin(), 0, 10.0).is_empty());
    }

    #[test]
    fn planar_points_are_queried_without_splitting_on_a_shared_axis() {
        let grid: Vec<Point3<f32>> = (0..100)
            .map(|i| Point3::new((i % 10) as f32 * 1.4, (i / 10) as f32 * 1.4, 0.0))
            .collect();
        let tree = Kdtree::new(grid.iter().copied().enumerate(), Metric::Euclidean);
        assert_eq!(tree.len(), 100);

        let found = tree.within_sorted(&grid[55], 1.5);
        assert_eq!(sorted_indices(&found), vec![45, 54, 55, 56, 65]);
        assert_eq!(found[0].index, 55);
        assert_eq!(tree.nearest(&grid[0], 2, 10.0).len(), 2);
    }

    #[test]
    fn identical_points_are_all_reported() {
        let tree = Kdtree::new((0..50).map(|i| (i, Point3::origin())), Metric::SquaredEuclidean);
        assert_eq!(tree.nearest(&Point3::origin(), usize::MAX, 0.0).len(), 50);
        assert!(tree.nearest(&Point3::new(1.0, 0.0, 0.0), usize::MAX, 0.5).is_empty());
    }

    #[test]
    fn degeneracy_check_counts_per_axis_values() {
        let shared_z: Vec<(u64, [f32; 3])> = (0..32).map(|i| (i, [i as f32, i as f32, 0.0])).collect();
        assert!(is_degenerate(&shared_z));
        assert!(!is_degenerate(&shared_z[..31]));
        let distinct: Vec<(u64, [f32; 3])> =
            (0..100).map(|i| (i, [i as f32, 0.5 * i as f32, -(i as f32)])).collect();
        assert!(!is_degenerate(&distinct));
    }

    #[test]
    fn matches_brute_force_on_random_points() {
        let mut rng = StdRng::seed_from_u64(11);
        let points: Vec<Point3<f32>> = (0..500)
            .map(|_| {
                Point3::new(
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                )
            })
            .collect();
        let tree = Kdtree::new(points.iter().copied().enumerate(), Metric::Euclidean);

        for _ in 0..20 {
            let center = Point3::new(
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
            );
            let radius: f32 = rng.gen_range(1.0..8.0);
            let expected: Vec<usize> = points
                .iter()
                .enumerate()
                .filter(|(_, p)| (*p - center).norm_squared() <= radius * radius)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(sorted_indices(&tree.nearest(&center, usize::MAX, radius)), expected);
        }
    }
}
