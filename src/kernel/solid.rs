use crate::error::{GeometryError, KernelError, Result};
use crate::geometry::Plane;
use crate::math::polygon_2d::{is_valid_contour, simplify_contour};
use crate::math::{Point2, Point3, Vector3, TOLERANCE};

use super::overlay::{total_area, Region};

/// Two slab boundaries closer than this are the same height.
pub(crate) const Z_TOLERANCE: f64 = 1e-9;

/// Directions whose |cos| is within this of 1 are parallel.
pub(crate) const PARALLEL_TOLERANCE: f64 = 1e-9;

/// The kind of surface swept by a solid's profile edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lateral {
    /// Each profile edge sweeps a planar side face.
    Ruled,
    /// Each profile contour sweeps one smooth, non-planar side face.
    Smooth,
}

/// A horizontal layer of a solid: regions extruded between two heights.
#[derive(Debug, Clone, PartialEq)]
pub struct Slab {
    pub(crate) bottom: f64,
    pub(crate) top: f64,
    pub(crate) regions: Vec<Region>,
}

impl Slab {
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    #[must_use]
    pub fn top(&self) -> f64 {
        self.top
    }

    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    fn contains_height(&self, z: f64) -> bool {
        z > self.bottom && z < self.top
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3,
    pub max: Point3,
}

/// A boundary-represented volume in layered-prism form.
///
/// Geometry lives in a local frame: each slab extrudes a set of 2D regions
/// along the frame normal between two heights. Slabs are sorted by height
/// and never overlap. An empty slab list is the empty solid.
#[derive(Debug, Clone, PartialEq)]
pub struct Solid {
    frame: Plane,
    slabs: Vec<Slab>,
    lateral: Lateral,
}

impl Solid {
    /// Extrudes a profile given in `frame` coordinates by `depth` along the
    /// frame normal. A negative depth extrudes backwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile encloses no area or the depth is zero.
    pub fn extrusion(frame: Plane, outer: &[Point2], holes: &[Vec<Point2>], depth: f64) -> Result<Self> {
        Self::prism(frame, outer, holes, depth, Lateral::Ruled)
    }

    /// Creates a world-axis-aligned box from two corners.
    ///
    /// # Errors
    ///
    /// Returns an error if the box has no volume.
    pub fn cuboid(min: Point3, max: Point3) -> Result<Self> {
        let frame = Plane::new(Point3::new(0.0, 0.0, min.z), Vector3::x(), Vector3::y())?;
        let outer = rectangle(min.x, min.y, max.x, max.y);
        Self::extrusion(frame, &outer, &[], max.z - min.z)
    }

    /// Creates a box spanning `min..max` in a frame's local coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the box has no volume.
    pub fn block(frame: &Plane, min: Point3, max: Point3) -> Result<Self> {
        let origin = frame.lift(0.0, 0.0, min.z);
        let base = Plane::new(origin, *frame.u_dir(), *frame.v_dir())?;
        let outer = rectangle(min.x, min.y, max.x, max.y);
        Self::extrusion(base, &outer, &[], max.z - min.z)
    }

    /// Creates a circular cylinder whose side is a single smooth face.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is zero-length, or the radius or height
    /// is not positive.
    pub fn cylinder(base_center: Point3, axis: Vector3, radius: f64, height: f64) -> Result<Self> {
        const SEGMENTS: usize = 48;
        if radius <= TOLERANCE {
            return Err(GeometryError::Degenerate("cylinder radius must be positive".into()).into());
        }
        let frame = Plane::from_normal(base_center, axis)?;
        #[allow(clippy::cast_precision_loss)]
        let outer: Vec<Point2> = (0..SEGMENTS)
            .map(|i| {
                let angle = std::f64::consts::TAU * i as f64 / SEGMENTS as f64;
                Point2::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        Self::prism(frame, &outer, &[], height, Lateral::Smooth)
    }

    pub(crate) fn from_parts(frame: Plane, slabs: Vec<Slab>, lateral: Lateral) -> Self {
        Self {
            frame,
            slabs,
            lateral,
        }
    }

    fn prism(frame: Plane, outer: &[Point2], holes: &[Vec<Point2>], depth: f64, lateral: Lateral) -> Result<Self> {
        let outer = simplify_contour(outer, TOLERANCE);
        if !is_valid_contour(&outer) {
            return Err(GeometryError::Degenerate("profile encloses no area".into()).into());
        }
        if depth.abs() <= TOLERANCE {
            return Err(GeometryError::Degenerate("extrusion depth must be non-zero".into()).into());
        }
        let holes: Vec<Vec<Point2>> = holes.iter().filter(|h| is_valid_contour(h)).cloned().collect();
        Ok(Self {
            frame,
            slabs: vec![Slab {
                bottom: depth.min(0.0),
                top: depth.max(0.0),
                regions: vec![Region::new(&outer, &holes)],
            }],
            lateral,
        })
    }

    #[must_use]
    pub fn frame(&self) -> &Plane {
        &self.frame
    }

    #[must_use]
    pub fn slabs(&self) -> &[Slab] {
        &self.slabs
    }

    #[must_use]
    pub fn lateral(&self) -> Lateral {
        self.lateral
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slabs.is_empty()
    }

    /// Enclosed volume.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.slabs
            .iter()
            .map(|s| (s.top - s.bottom) * total_area(&s.regions))
            .sum()
    }

    /// World-space bounding box, or `None` for the empty solid.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        let mut result: Option<Aabb> = None;
        for slab in &self.slabs {
            for region in &slab.regions {
                for p in region.outer() {
                    for z in [slab.bottom, slab.top] {
                        let w = self.frame.lift(p.x, p.y, z);
                        result = Some(match result {
                            None => Aabb { min: w, max: w },
                            Some(b) => Aabb {
                                min: b.min.inf(&w),
                                max: b.max.sup(&w),
                            },
                        });
                    }
                }
            }
        }
        result
    }

    /// Regions of the slab spanning height `z`, if any.
    pub(crate) fn regions_at(&self, z: f64) -> Option<&[Region]> {
        self.slabs
            .iter()
            .find(|s| s.contains_height(z))
            .map(|s| s.regions.as_slice())
    }

    /// Re-expresses this solid in `target`'s frame.
    ///
    /// Succeeds when the frame normals are parallel or antiparallel, or when
    /// this solid is a box with an edge parallel to `target`'s normal.
    #[must_use]
    pub fn rebased(&self, target: &Plane) -> Option<Solid> {
        let along = self.frame.normal().dot(target.normal());
        if along.abs() >= 1.0 - PARALLEL_TOLERANCE {
            return Some(self.rebase_parallel(target, along.signum()));
        }
        let aligned = self.as_box_along(target.normal())?;
        let along = aligned.frame.normal().dot(target.normal());
        Some(aligned.rebase_parallel(target, along.signum()))
    }

    fn rebase_parallel(&self, target: &Plane, sign: f64) -> Solid {
        let offset = target.signed_distance(self.frame.origin());
        let map = |p: &Point2| target.project_2d(&self.frame.lift(p.x, p.y, 0.0));
        let mut slabs: Vec<Slab> = self
            .slabs
            .iter()
            .map(|s| {
                let a = offset + sign * s.bottom;
                let b = offset + sign * s.top;
                Slab {
                    bottom: a.min(b),
                    top: a.max(b),
                    regions: s.regions.iter().map(|r| r.map_points(map)).collect(),
                }
            })
            .collect();
        if sign < 0.0 {
            slabs.reverse();
        }
        Solid {
            frame: target.clone(),
            slabs,
            lateral: self.lateral,
        }
    }

    /// Re-extrudes a box-shaped solid along whichever of its edges is
    /// parallel to `axis`.
    fn as_box_along(&self, axis: &Vector3) -> Option<Solid> {
        let (origin, edges) = self.box_corners()?;
        let [e1, e2, e3] = edges;
        let unit = axis.normalize();
        let along = edges
            .iter()
            .position(|e| (e.normalize().dot(&unit)).abs() >= 1.0 - PARALLEL_TOLERANCE)?;
        let (a, b) = match along {
            0 => (e2, e3),
            1 => (e3, e1),
            _ => (e1, e2),
        };
        let height = edges[along];
        let frame = Plane::new(origin, a, b).ok()?;
        let depth = height.dot(frame.normal());
        Solid::extrusion(frame, &rectangle(0.0, 0.0, a.norm(), b.norm()), &[], depth).ok()
    }

    /// World corner and edge vectors of a solid that is a single rectangular
    /// prism without holes.
    fn box_corners(&self) -> Option<(Point3, [Vector3; 3])> {
        if self.lateral != Lateral::Ruled {
            return None;
        }
        let [slab] = self.slabs.as_slice() else {
            return None;
        };
        let [region] = slab.regions.as_slice() else {
            return None;
        };
        if !region.holes().is_empty() {
            return None;
        }
        let outer = simplify_contour(region.outer(), 1e-9);
        let [p0, p1, p2, p3] = outer.as_slice() else {
            return None;
        };
        let d1 = p1 - p0;
        let d2 = p3 - p0;
        let scale = d1.norm() * d2.norm();
        if d1.dot(&d2).abs() > 1e-9 * scale || ((p0 + d1 + d2) - p2).norm() > 1e-7 {
            return None;
        }
        let origin = self.frame.lift(p0.x, p0.y, slab.bottom);
        Some((
            origin,
            [
                self.frame.lift_direction(d1.x, d1.y, 0.0),
                self.frame.lift_direction(d2.x, d2.y, 0.0),
                self.frame.normal() * (slab.top - slab.bottom),
            ],
        ))
    }
}

/// Rejects solids the prism kernel cannot operate on.
pub(crate) fn require_ruled(solid: &Solid, operation: &str) -> Result<()> {
    if solid.lateral == Lateral::Smooth {
        return Err(KernelError::Unsupported(format!("{operation} on a solid with a curved lateral surface")).into());
    }
    Ok(())
}

/// Counter-clockwise rectangle contour.
pub(crate) fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
    let (x0, x1) = (x0.min(x1), x0.max(x1));
    let (y0, y1) = (y0.min(y1), y0.max(y1));
    vec![
        Point2::new(x0, y0),
        Point2::new(x1, y0),
        Point2::new(x1, y1),
        Point2::new(x0, y1),
    ]
}
