use crate::error::{GeometryError, Result};
use crate::math::polygon_2d::{classify_point, signed_area, ContourSide};
use crate::math::{Point2, Point3, Vector3, TOLERANCE};

use super::Plane;

/// A closed, planar polyline loop.
///
/// The closing segment from the last vertex back to the first is implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveLoop {
    points: Vec<Point3>,
}

impl CurveLoop {
    /// Creates a loop from its vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than three vertices are given or the loop
    /// encloses no area.
    pub fn new(points: Vec<Point3>) -> Result<Self> {
        if points.len() < 3 {
            return Err(GeometryError::Degenerate(format!(
                "curve loop needs at least 3 vertices, got {}",
                points.len()
            ))
            .into());
        }
        let curve_loop = Self { points };
        curve_loop.newell_normal()?;
        Ok(curve_loop)
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Unit normal of the loop by Newell's method; follows the winding.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop is degenerate.
    pub fn newell_normal(&self) -> Result<Vector3> {
        let n = self.points.len();
        let mut normal = Vector3::zeros();
        for i in 0..n {
            let curr = &self.points[i];
            let next = &self.points[(i + 1) % n];
            normal.x += (curr.y - next.y) * (curr.z + next.z);
            normal.y += (curr.z - next.z) * (curr.x + next.x);
            normal.z += (curr.x - next.x) * (curr.y + next.y);
        }
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::Degenerate("curve loop encloses no area".into()).into());
        }
        Ok(normal / len)
    }

    /// Enclosed area (always non-negative).
    #[must_use]
    pub fn area(&self) -> f64 {
        match self.plane() {
            Ok(plane) => signed_area(&self.to_2d(&plane)).abs(),
            Err(_) => 0.0,
        }
    }

    /// The plane through the first vertex, oriented by the loop's winding.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop is degenerate.
    pub fn plane(&self) -> Result<Plane> {
        Plane::from_normal(self.points[0], self.newell_normal()?)
    }

    /// Projects the loop onto a plane's 2D coordinates.
    #[must_use]
    pub fn to_2d(&self, plane: &Plane) -> Vec<Point2> {
        self.points.iter().map(|p| plane.project_2d(p)).collect()
    }

    /// The same loop traversed in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// Classifies a coplanar point against the loop.
    ///
    /// Points farther than `tolerance` from the loop's plane are outside.
    #[must_use]
    pub fn classify(&self, point: &Point3, tolerance: f64) -> ContourSide {
        let Ok(plane) = self.plane() else {
            return ContourSide::Outside;
        };
        if plane.signed_distance(point).abs() > tolerance {
            return ContourSide::Outside;
        }
        classify_point(&plane.project_2d(point), &self.to_2d(&plane), tolerance)
    }

    /// Returns `true` if the point lies inside or on the loop.
    #[must_use]
    pub fn contains_point(&self, point: &Point3, tolerance: f64) -> bool {
        self.classify(point, tolerance) != ContourSide::Outside
    }

    /// Returns `true` if every vertex of `other` is strictly inside this loop.
    #[must_use]
    pub fn strictly_contains_loop(&self, other: &CurveLoop, tolerance: f64) -> bool {
        other
            .points
            .iter()
            .all(|p| self.classify(p, tolerance) == ContourSide::Inside)
    }

    /// Returns `true` if both loops visit the same vertices in the same cyclic
    /// order, allowing a different start vertex.
    #[must_use]
    pub fn approx_eq(&self, other: &CurveLoop, tolerance: f64) -> bool {
        let n = self.points.len();
        if n != other.points.len() {
            return false;
        }
        (0..n).any(|shift| {
            (0..n).all(|i| (self.points[i] - other.points[(i + shift) % n]).norm() <= tolerance)
        })
    }
}
