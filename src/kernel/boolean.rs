use crate::error::{GeometryError, KernelError, Result};
use crate::math::{Point2, Point3, Vector2, Vector3, TOLERANCE};

use super::overlay::{self, Region};
use super::solid::{require_ruled, Lateral, Slab, Solid, PARALLEL_TOLERANCE, Z_TOLERANCE};

/// A closed half-space: the points `p` with `(p - origin)·normal <= 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfSpace {
    origin: Point3,
    normal: Vector3,
}

impl HalfSpace {
    /// Creates a half-space bounded by the plane through `origin` with the
    /// given outward `normal`.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero-length.
    pub fn new(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            normal: normal / len,
        })
    }

    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns `true` if the point lies in the half-space.
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        (point - self.origin).dot(&self.normal) <= TOLERANCE
    }
}

/// Computes `a − b`, consuming `a`.
///
/// The result is expressed in `a`'s frame when possible, otherwise in the
/// frame of `a` re-extruded along `b`'s axis.
pub(crate) fn difference(a: Solid, b: &Solid) -> Result<Solid> {
    require_ruled(&a, "boolean difference")?;
    require_ruled(b, "boolean difference")?;
    if a.is_empty() || b.is_empty() {
        return Ok(a);
    }

    let (a, b) = if let Some(b_local) = b.rebased(a.frame()) {
        (a, b_local)
    } else if let Some(a_local) = a.rebased(b.frame()) {
        (a_local, b.clone())
    } else {
        return Err(KernelError::Unsupported(
            "boolean difference of solids with unrelated extrusion axes".into(),
        )
        .into());
    };

    let mut heights: Vec<f64> = a
        .slabs()
        .iter()
        .chain(b.slabs())
        .flat_map(|s| [s.bottom(), s.top()])
        .collect();
    heights.sort_by(f64::total_cmp);
    heights.dedup_by(|x, y| (*x - *y).abs() <= Z_TOLERANCE);

    let mut slabs: Vec<Slab> = Vec::new();
    for pair in heights.windows(2) {
        let (bottom, top) = (pair[0], pair[1]);
        let mid = 0.5 * (bottom + top);
        let Some(a_regions) = a.regions_at(mid) else {
            continue;
        };
        let regions = match b.regions_at(mid) {
            Some(b_regions) => overlay::difference(a_regions, b_regions),
            None => a_regions.to_vec(),
        };
        if regions.is_empty() {
            continue;
        }
        push_merged(&mut slabs, Slab { bottom, top, regions });
    }

    Ok(Solid::from_parts(a.frame().clone(), slabs, Lateral::Ruled))
}

/// Appends a slab, fusing it with the previous one when they touch and
/// carry the same regions.
pub(crate) fn push_merged(slabs: &mut Vec<Slab>, slab: Slab) {
    if let Some(last) = slabs.last_mut() {
        if (last.top - slab.bottom).abs() <= Z_TOLERANCE && overlay::same_coverage(&last.regions, &slab.regions) {
            last.top = slab.top;
            return;
        }
    }
    slabs.push(slab);
}

/// Intersects a solid with a half-space, consuming the solid.
///
/// Supports half-space planes perpendicular or parallel to the solid's axis.
pub(crate) fn intersect_half_space(solid: Solid, half_space: &HalfSpace) -> Result<Solid> {
    if solid.is_empty() {
        return Ok(solid);
    }
    let frame = solid.frame().clone();
    let along = half_space.normal().dot(frame.normal());
    let offset = (frame.origin() - half_space.origin()).dot(half_space.normal());

    if along.abs() >= 1.0 - PARALLEL_TOLERANCE {
        // offset + z * along <= 0
        let limit = -offset / along;
        let slabs = solid
            .slabs()
            .iter()
            .filter_map(|s| {
                let (bottom, top) = if along > 0.0 {
                    (s.bottom(), s.top().min(limit))
                } else {
                    (s.bottom().max(limit), s.top())
                };
                (top - bottom > Z_TOLERANCE).then(|| Slab {
                    bottom,
                    top,
                    regions: s.regions().to_vec(),
                })
            })
            .collect();
        return Ok(Solid::from_parts(frame, slabs, solid.lateral()));
    }

    if along.abs() > PARALLEL_TOLERANCE {
        return Err(KernelError::Unsupported("half-space plane oblique to the solid axis".into()).into());
    }
    require_ruled(&solid, "half-space clipping")?;

    // offset + (x, y)·dir <= 0
    let local = frame.project_direction(half_space.normal());
    let dir = Vector2::new(local.x, local.y).normalize();
    let keep = [half_plane_region(&solid, &dir, offset)];
    let mut slabs: Vec<Slab> = Vec::new();
    for s in solid.slabs() {
        let regions = overlay::intersection(s.regions(), &keep);
        if !regions.is_empty() {
            push_merged(
                &mut slabs,
                Slab {
                    bottom: s.bottom(),
                    top: s.top(),
                    regions,
                },
            );
        }
    }
    Ok(Solid::from_parts(frame, slabs, Lateral::Ruled))
}

/// A rectangle large enough to stand in for the half-plane
/// `offset + p·dir <= 0` over the solid's extent.
fn half_plane_region(solid: &Solid, dir: &Vector2, offset: f64) -> Region {
    let contours = solid
        .slabs()
        .iter()
        .flat_map(|s| s.regions().iter().map(Region::outer));
    let (min, max) = crate::math::polygon_2d::bounds(contours)
        .unwrap_or((Point2::origin(), Point2::origin()));
    let center = Point2::from((min.coords + max.coords) * 0.5);
    let distance = offset + center.coords.dot(dir);
    let on_line = center - dir * distance;
    let reach = (max - min).norm() + distance.abs() + 1.0;
    let tangent = Vector2::new(-dir.y, dir.x);

    let corners = [
        on_line + tangent * reach,
        on_line - tangent * reach,
        on_line - tangent * reach - dir * (2.0 * reach),
        on_line + tangent * reach - dir * (2.0 * reach),
    ];
    Region::new(&corners, &[])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use super::super::solid::rectangle;
    use crate::geometry::Plane;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn through_hole_difference() {
        let wall = Solid::cuboid(p(0.0, 0.0, 0.0), p(10.0, 0.3, 3.0)).unwrap();
        let window = Solid::cuboid(p(2.0, -1.0, 1.0), p(4.0, 1.0, 2.0)).unwrap();
        let result = difference(wall, &window).unwrap();
        assert_relative_eq!(result.volume(), 9.0 - 0.6, epsilon = 1e-6);
    }

    #[test]
    fn partial_depth_difference_creates_layers() {
        let slab = Solid::cuboid(p(0.0, 0.0, 0.0), p(4.0, 4.0, 1.0)).unwrap();
        let pocket = Solid::cuboid(p(1.0, 1.0, 0.5), p(2.0, 2.0, 2.0)).unwrap();
        let result = difference(slab, &pocket).unwrap();
        assert_eq!(result.slabs().len(), 2);
        assert_relative_eq!(result.volume(), 16.0 - 0.5, epsilon = 1e-6);
    }

    #[test]
    fn difference_with_perpendicular_box_is_rebased() {
        // Profile in XZ extruded along +Y: a wall lying in the XZ plane.
        let frame = Plane::new(p(0.0, 0.0, 0.0), Vector3::x(), Vector3::z()).unwrap();
        let outer = rectangle(0.0, 0.0, 6.0, 3.0);
        let wall = Solid::extrusion(frame, &outer, &[], -0.2).unwrap();
        let door = Solid::cuboid(p(1.0, -1.0, 0.0), p(2.0, 1.0, 2.0)).unwrap();
        let result = difference(wall, &door).unwrap();
        assert_relative_eq!(result.volume(), 0.2 * (18.0 - 2.0), epsilon = 1e-6);
    }

    #[test]
    fn disjoint_difference_keeps_original() {
        let a = Solid::cuboid(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let b = Solid::cuboid(p(5.0, 5.0, 5.0), p(6.0, 6.0, 6.0)).unwrap();
        let result = difference(a.clone(), &b).unwrap();
        assert_relative_eq!(result.volume(), a.volume(), epsilon = 1e-9);
    }

    #[test]
    fn full_cover_leaves_empty_solid() {
        let a = Solid::cuboid(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let b = Solid::cuboid(p(-1.0, -1.0, -1.0), p(2.0, 2.0, 2.0)).unwrap();
        assert!(difference(a, &b).unwrap().is_empty());
    }

    #[test]
    fn curved_operands_are_unsupported() {
        let a = Solid::cuboid(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let c = Solid::cylinder(p(0.5, 0.5, 0.0), Vector3::z(), 0.2, 1.0).unwrap();
        assert!(difference(a, &c).is_err());
    }

    #[test]
    fn half_space_along_axis_clips_height() {
        let a = Solid::cuboid(p(0.0, 0.0, 0.0), p(2.0, 2.0, 4.0)).unwrap();
        let keep_below = HalfSpace::new(p(0.0, 0.0, 1.0), Vector3::z()).unwrap();
        let clipped = intersect_half_space(a.clone(), &keep_below).unwrap();
        assert_relative_eq!(clipped.volume(), 4.0, epsilon = 1e-9);

        let keep_above = HalfSpace::new(p(0.0, 0.0, 1.0), -Vector3::z()).unwrap();
        let clipped = intersect_half_space(a, &keep_above).unwrap();
        assert_relative_eq!(clipped.volume(), 12.0, epsilon = 1e-9);
    }

    #[test]
    fn half_space_across_axis_clips_profile() {
        let a = Solid::cuboid(p(0.0, 0.0, 0.0), p(4.0, 2.0, 1.0)).unwrap();
        let half = HalfSpace::new(p(1.0, 0.0, 0.0), Vector3::x()).unwrap();
        let clipped = intersect_half_space(a, &half).unwrap();
        assert_relative_eq!(clipped.volume(), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn oblique_half_space_is_unsupported() {
        let a = Solid::cuboid(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let half = HalfSpace::new(p(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 1.0)).unwrap();
        assert!(intersect_half_space(a, &half).is_err());
    }
}
