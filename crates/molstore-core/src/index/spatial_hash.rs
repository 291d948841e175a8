use crate::core::store::AtomStore;
use crate::core::utils::geometry::BoundingBox;
use nalgebra::Point3;
use tracing::{debug, instrument};

/// Uniform grid over point coordinates for radius queries.
///
/// Cells are `2^exp` Angstrom wide and addressed by the shifted integer offsets of a
/// coordinate from the bounding box minimum. Only non-empty cells get a bucket; the
/// members of every bucket are stored contiguously in `bucket_array`.
///
/// The grid keeps its own copy of the coordinates and has to be rebuilt when they change.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    exp: u32,
    min: Point3<f32>,
    bounds: [i32; 3],
    grid: Vec<u32>,
    bucket_count: Vec<u32>,
    bucket_offset: Vec<u32>,
    bucket_array: Vec<u32>,
    x: Vec<f32>,
    y: Vec<f32>,
    z: Vec<f32>,
}

impl SpatialHash {
    /// Builds the grid over the points `(x[i], y[i], z[i])`.
    ///
    /// # Arguments
    ///
    /// * `x`, `y`, `z` - Coordinate columns of equal length.
    /// * `bounding_box` - A box covering every point. Points outside it are clamped
    ///   into the border cells.
    /// * `exp` - Cell size exponent; cells are `2^exp` wide.
    #[instrument(level = "debug", skip_all, name = "spatial_hash_build")]
    pub fn new(x: &[f32], y: &[f32], z: &[f32], bounding_box: &BoundingBox, exp: u32) -> Self {
        let count = x.len().min(y.len()).min(z.len());
        let mut hash = Self {
            exp,
            min: bounding_box.min,
            bounds: [0; 3],
            grid: Vec::new(),
            bucket_count: Vec::new(),
            bucket_offset: Vec::new(),
            bucket_array: vec![0; count],
            x: x[..count].to_vec(),
            y: y[..count].to_vec(),
            z: z[..count].to_vec(),
        };
        if count == 0 || bounding_box.is_empty() {
            hash.min = Point3::origin();
            return hash;
        }

        let extent = bounding_box.max - bounding_box.min;
        hash.bounds = [
            hash.shift(extent.x) + 1,
            hash.shift(extent.y) + 1,
            hash.shift(extent.z) + 1,
        ];
        let cell_count = hash.bounds.iter().map(|&b| b as usize).product();

        let mut grid = vec![0u32; cell_count];
        let mut cell_of_point = Vec::with_capacity(count);
        let mut bucket_total = 0usize;
        for i in 0..count {
            let cell = hash.cell_index(hash.clamped_cell(x[i], y[i], z[i]));
            grid[cell] += 1;
            if grid[cell] == 1 {
                bucket_total += 1;
            }
            cell_of_point.push(cell);
        }

        // Replace the per-cell histogram by 1-based bucket ids.
        let mut bucket_count = Vec::with_capacity(bucket_total);
        for slot in grid.iter_mut().filter(|c| **c > 0) {
            bucket_count.push(*slot);
            *slot = bucket_count.len() as u32;
        }

        let mut bucket_offset = vec![0u32; bucket_total];
        for k in 1..bucket_total {
            bucket_offset[k] = bucket_offset[k - 1] + bucket_count[k - 1];
        }

        let mut bucket_fill = vec![0u32; bucket_total];
        for (i, &cell) in cell_of_point.iter().enumerate() {
            let k = grid[cell] as usize - 1;
            hash.bucket_array[(bucket_offset[k] + bucket_fill[k]) as usize] = i as u32;
            bucket_fill[k] += 1;
        }

        debug!(
            points = count,
            buckets = bucket_total,
            cells = cell_count,
            "Built spatial hash"
        );

        hash.grid = grid;
        hash.bucket_count = bucket_count;
        hash.bucket_offset = bucket_offset;
        hash
    }

    /// Builds the grid over the atoms in use of an atom store.
    pub fn from_atom_store(store: &AtomStore, bounding_box: &BoundingBox, exp: u32) -> Self {
        let n = store.count;
        Self::new(&store.x[..n], &store.y[..n], &store.z[..n], bounding_box, exp)
    }

    fn shift(&self, offset: f32) -> i32 {
        (offset as i32) >> self.exp
    }

    fn clamped_cell(&self, x: f32, y: f32, z: f32) -> [i32; 3] {
        let cell = [
            self.shift(x - self.min.x),
            self.shift(y - self.min.y),
            self.shift(z - self.min.z),
        ];
        [
            cell[0].clamp(0, self.bounds[0] - 1),
            cell[1].clamp(0, self.bounds[1] - 1),
            cell[2].clamp(0, self.bounds[2] - 1),
        ]
    }

    fn cell_index(&self, [ix, iy, iz]: [i32; 3]) -> usize {
        ((ix * self.bounds[1] + iy) * self.bounds[2] + iz) as usize
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Indices of all points within `radius` of `center`.
    pub fn within(&self, center: &Point3<f32>, radius: f32) -> Vec<usize> {
        let mut result = Vec::new();
        self.each_within(center, radius, |index, _| result.push(index));
        result
    }

    /// Calls `callback(index, squared_distance)` for every point within `radius` of `center`.
    ///
    /// Only the cells overlapping the axis-aligned cube around `center` are scanned;
    /// candidates are filtered on the exact squared distance.
    pub fn each_within(&self, center: &Point3<f32>, radius: f32, mut callback: impl FnMut(usize, f32)) {
        if self.grid.is_empty() {
            return;
        }
        let radius_sq = radius * radius;

        let lo = |c: f32, min: f32| self.shift(c - radius - min).max(0);
        let hi = |c: f32, min: f32, bound: i32| (self.shift(c + radius - min) + 1).min(bound);
        let (lo_x, lo_y, lo_z) = (
            lo(center.x, self.min.x),
            lo(center.y, self.min.y),
            lo(center.z, self.min.z),
        );
        let (hi_x, hi_y, hi_z) = (
            hi(center.x, self.min.x, self.bounds[0]),
            hi(center.y, self.min.y, self.bounds[1]),
            hi(center.z, self.min.z, self.bounds[2]),
        );

        for ix in lo_x..hi_x {
            for iy in lo_y..hi_y {
                for iz in lo_z..hi_z {
                    let bucket = self.grid[self.cell_index([ix, iy, iz])];
                    if bucket == 0 {
                        continue;
                    }
                    let k = bucket as usize - 1;
                    let offset = self.bucket_offset[k] as usize;
                    let end = offset + self.bucket_count[k] as usize;
                    for &atom in &self.bucket_array[offset..end] {
                        let i = atom as usize;
                        let dx = self.x[i] - center.x;
                        let dy = self.y[i] - center.y;
                        let dz = self.z[i] - center.z;
                        let d_sq = dx * dx + dy * dy + dz * dz;
                        if d_sq <= radius_sq {
                            callback(i, d_sq);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn columns(points: &[Point3<f32>]) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        (
            points.iter().map(|p| p.x).collect(),
            points.iter().map(|p| p.y).collect(),
            points.iter().map(|p| p.z).collect(),
        )
    }

    fn brute_force(points: &[Point3<f32>], center: &Point3<f32>, radius: f32) -> Vec<usize> {
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| (*p - center).norm_squared() <= radius * radius)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn within_finds_points_at_known_distances() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 2.5, 0.0),
            Point3::new(0.0, 0.0, 9.0),
            Point3::new(20.0, 20.0, 20.0),
        ];
        let (x, y, z) = columns(&points);
        let hash = SpatialHash::new(&x, &y, &z, &BoundingBox::from_points(&points), 3);

        let mut found = hash.within(&Point3::origin(), 2.5);
        found.sort_unstable();
        assert_eq!(found, vec![0, 1, 2]);

        let mut found = hash.within(&Point3::origin(), 9.0);
        found.sort_unstable();
        assert_eq!(found, vec![0, 1, 2, 3]);

        assert_eq!(hash.within(&Point3::new(20.0, 20.0, 20.0), 0.1), vec![4]);
    }

    #[test]
    fn each_within_reports_squared_distances() {
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 4.0, 0.0)];
        let (x, y, z) = columns(&points);
        let hash = SpatialHash::new(&x, &y, &z, &BoundingBox::from_points(&points), 3);
        let mut seen = Vec::new();
        hash.each_within(&Point3::origin(), 5.0, |i, d_sq| seen.push((i, d_sq)));
        seen.sort_by_key(|&(i, _)| i);
        assert_eq!(seen, vec![(0, 0.0), (1, 25.0)]);
    }

    #[test]
    fn matches_brute_force_on_random_points() {
        let mut rng = StdRng::seed_from_u64(7);
        let points: Vec<Point3<f32>> = (0..2000)
            .map(|_| {
                Point3::new(
                    rng.gen_range(-40.0..40.0),
                    rng.gen_range(-10.0..60.0),
                    rng.gen_range(0.0..25.0),
                )
            })
            .collect();
        let (x, y, z) = columns(&points);
        let hash = SpatialHash::new(&x, &y, &z, &BoundingBox::from_points(&points), 3);

        for _ in 0..50 {
            let center = points[rng.gen_range(0..points.len())];
            let radius = rng.gen_range(0.5..12.0);
            let mut found = hash.within(&center, radius);
            found.sort_unstable();
            assert_eq!(found, brute_force(&points, &center, radius));
        }
    }

    #[test]
    fn empty_input_returns_nothing() {
        let hash = SpatialHash::new(&[], &[], &[], &BoundingBox::empty(), 3);
        assert!(hash.is_empty());
        assert!(hash.within(&Point3::origin(), 100.0).is_empty());
    }

    #[test]
    fn query_far_outside_the_box_is_empty() {
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)];
        let (x, y, z) = columns(&points);
        let hash = SpatialHash::new(&x, &y, &z, &BoundingBox::from_points(&points), 3);
        assert!(hash.within(&Point3::new(-100.0, -100.0, -100.0), 5.0).is_empty());
        assert!(hash.within(&Point3::new(100.0, 100.0, 100.0), 5.0).is_empty());
    }
}
