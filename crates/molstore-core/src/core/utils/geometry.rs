use nalgebra::{Point3, Vector3};

/// Axis-aligned box spanned by a set of points.
///
/// An empty box has `min` at `+inf` and `max` at `-inf`, so that expanding it by a
/// point yields the degenerate box at that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f32>>) -> Self {
        let mut bounding_box = Self::empty();
        for point in points {
            bounding_box.expand_by_point(point);
        }
        bounding_box
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn expand_by_point(&mut self, point: &Point3<f32>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    pub fn center(&self) -> Point3<f32> {
        if self.is_empty() {
            return Point3::origin();
        }
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        if self.is_empty() {
            return Vector3::zeros();
        }
        self.max - self.min
    }

    pub fn contains_point(&self, point: &Point3<f32>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_expands_to_points() {
        let mut bounding_box = BoundingBox::empty();
        assert!(bounding_box.is_empty());
        bounding_box.expand_by_point(&Point3::new(1.0, -2.0, 3.0));
        bounding_box.expand_by_point(&Point3::new(-1.0, 2.0, 5.0));
        assert!(!bounding_box.is_empty());
        assert_eq!(bounding_box.min, Point3::new(-1.0, -2.0, 3.0));
        assert_eq!(bounding_box.max, Point3::new(1.0, 2.0, 5.0));
        assert_eq!(bounding_box.center(), Point3::new(0.0, 0.0, 4.0));
        assert!(bounding_box.contains_point(&Point3::new(0.0, 0.0, 4.0)));
        assert!(!bounding_box.contains_point(&Point3::new(0.0, 0.0, 6.0)));
    }

    #[test]
    fn empty_box_has_origin_center_and_zero_size() {
        let bounding_box = BoundingBox::default();
        assert_eq!(bounding_box.center(), Point3::origin());
        assert_eq!(bounding_box.size(), Vector3::zeros());
    }

    #[test]
    fn rmsd_of_shifted_points() {
        let a = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        let b = [Point3::new(0.0, 0.0, 2.0), Point3::new(1.0, 0.0, 2.0)];
        assert!((calculate_rmsd(&a, &b).unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(calculate_rmsd(&a, &b[..1]), None);
        assert_eq!(calculate_rmsd(&[], &[]), None);
    }

    #[test]
    fn centroid_is_mean_position() {
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, 6.0)];
        assert_eq!(centroid(&points), Some(Point3::new(1.0, 2.0, 3.0)));
        assert_eq!(centroid(&[]), None);
    }
}
