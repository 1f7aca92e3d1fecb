use crate::math::polygon_2d::ContourSide;
use crate::math::{Point3, Vector3};

use super::{CurveLoop, Plane};

/// A bounded planar region: one outer loop and zero or more hole loops.
///
/// The plane's normal is the outward normal of the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarSurface {
    plane: Plane,
    outer: CurveLoop,
    inners: Vec<CurveLoop>,
}

impl PlanarSurface {
    #[must_use]
    pub fn new(plane: Plane, outer: CurveLoop, inners: Vec<CurveLoop>) -> Self {
        Self {
            plane,
            outer,
            inners,
        }
    }

    #[must_use]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        self.plane.normal()
    }

    #[must_use]
    pub fn outer(&self) -> &CurveLoop {
        &self.outer
    }

    #[must_use]
    pub fn inners(&self) -> &[CurveLoop] {
        &self.inners
    }

    /// Net area: outer area minus hole areas.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.outer.area() - self.inners.iter().map(CurveLoop::area).sum::<f64>()
    }

    /// Returns `true` if the point lies inside the outer loop and outside
    /// every hole.
    #[must_use]
    pub fn contains_point(&self, point: &Point3, tolerance: f64) -> bool {
        self.outer.contains_point(point, tolerance)
            && !self
                .inners
                .iter()
                .any(|hole| hole.classify(point, tolerance) == ContourSide::Inside)
    }

    /// Returns `true` if every vertex of `candidate` is strictly inside the
    /// outer loop.
    #[must_use]
    pub fn strictly_contains_loop(&self, candidate: &CurveLoop, tolerance: f64) -> bool {
        self.outer.strictly_contains_loop(candidate, tolerance)
    }

    /// Same plane orientation and same outer loop, within `tolerance`.
    #[must_use]
    pub fn approx_eq(&self, other: &PlanarSurface, tolerance: f64) -> bool {
        (self.normal() - other.normal()).norm() <= tolerance && self.outer.approx_eq(&other.outer, tolerance)
    }
}
