use crate::error::Result;
use crate::geometry::{CurveLoop, Plane};
use crate::math::polygon_2d::is_valid_contour;
use crate::math::{Point2, Point3, Vector2, Vector3};

use super::overlay::{self, Region};
use super::solid::{rectangle, Lateral, Solid, Z_TOLERANCE};

/// Side edges closer than this in direction and offset share a plane.
const SHEET_TOLERANCE: f64 = 1e-9;

/// A bounded face of a solid.
#[derive(Debug, Clone, PartialEq)]
pub enum Face {
    /// A face lying in a single plane.
    Planar(PlanarFace),
    /// A smooth, non-planar face.
    Curved(CurvedFace),
}

impl Face {
    /// Returns the planar face, or `None` for curved faces.
    #[must_use]
    pub fn as_planar(&self) -> Option<&PlanarFace> {
        match self {
            Face::Planar(face) => Some(face),
            Face::Curved(_) => None,
        }
    }

    #[must_use]
    pub fn is_planar(&self) -> bool {
        matches!(self, Face::Planar(_))
    }
}

/// A planar face with its outward normal and boundary loops.
///
/// The first loop is the outer boundary; any further loops are holes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarFace {
    plane: Plane,
    loops: Vec<CurveLoop>,
}

impl PlanarFace {
    #[must_use]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Outward unit normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        self.plane.normal()
    }

    /// A point on the face.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        self.plane.origin()
    }

    #[must_use]
    pub fn loops(&self) -> &[CurveLoop] {
        &self.loops
    }
}

/// A smooth lateral face swept by one profile contour.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvedFace {
    axis: Vector3,
    boundaries: Vec<CurveLoop>,
}

impl CurvedFace {
    /// Sweep direction of the face.
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    /// Bottom and top boundary loops.
    #[must_use]
    pub fn boundaries(&self) -> &[CurveLoop] {
        &self.boundaries
    }
}

/// Enumerates the boundary faces of a solid.
///
/// Caps are the exposed parts of each slab's top and bottom; a cap hidden by
/// a touching neighbour slab is omitted. Lateral faces follow the solid's
/// [`Lateral`] kind.
pub(crate) fn enumerate_faces(solid: &Solid) -> Result<Vec<Face>> {
    let frame = solid.frame();
    let slabs = solid.slabs();
    let mut faces = Vec::new();

    if solid.lateral() == Lateral::Ruled {
        lateral_planar_faces(solid, &mut faces)?;
    }

    for (i, slab) in slabs.iter().enumerate() {
        if solid.lateral() == Lateral::Smooth {
            for contour in slab.regions().iter().flat_map(Region::contours) {
                let bottom = lift_contour(frame, contour, slab.bottom())?;
                let top = lift_contour(frame, contour, slab.top())?;
                faces.push(Face::Curved(CurvedFace {
                    axis: *frame.normal(),
                    boundaries: vec![bottom, top],
                }));
            }
        }

        let above = slabs
            .get(i + 1)
            .filter(|next| (next.bottom() - slab.top()).abs() <= Z_TOLERANCE);
        let top_exposed = match above {
            Some(next) => overlay::difference(slab.regions(), next.regions()),
            None => slab.regions().to_vec(),
        };
        for region in &top_exposed {
            faces.push(cap_face(frame, region, slab.top(), false)?);
        }

        let below = i
            .checked_sub(1)
            .and_then(|j| slabs.get(j))
            .filter(|prev| (slab.bottom() - prev.top()).abs() <= Z_TOLERANCE);
        let bottom_exposed = match below {
            Some(prev) => overlay::difference(slab.regions(), prev.regions()),
            None => slab.regions().to_vec(),
        };
        for region in &bottom_exposed {
            faces.push(cap_face(frame, region, slab.bottom(), true)?);
        }
    }

    Ok(faces)
}

/// Edges of a ruled solid lying on one vertical plane, as rectangles in
/// `(s, z)` coordinates where `s` runs along the edge direction.
struct Sheet {
    normal: Vector2,
    offset: f64,
    pieces: Vec<Region>,
}

/// Planar side faces, normal pointing away from material.
///
/// Coplanar pieces from different slabs and contours are merged, so a side
/// face is never split at slab boundaries.
fn lateral_planar_faces(solid: &Solid, faces: &mut Vec<Face>) -> Result<()> {
    let mut sheets: Vec<Sheet> = Vec::new();
    for slab in solid.slabs() {
        for contour in slab.regions().iter().flat_map(Region::contours) {
            let n = contour.len();
            for i in 0..n {
                let a = contour[i];
                let b = contour[(i + 1) % n];
                let d = b - a;
                let len = d.norm();
                if len <= Z_TOLERANCE {
                    continue;
                }
                // Material lies left of each edge for both outer (CCW) and hole (CW) contours.
                let dir = d / len;
                let normal = Vector2::new(dir.y, -dir.x);
                let offset = normal.dot(&a.coords);
                let (s0, s1) = (dir.dot(&a.coords), dir.dot(&b.coords));
                let piece = Region::new(&rectangle(s0, slab.bottom(), s1, slab.top()), &[]);

                let found = sheets.iter_mut().find(|sheet| {
                    (sheet.normal - normal).norm() <= SHEET_TOLERANCE
                        && (sheet.offset - offset).abs() <= SHEET_TOLERANCE
                });
                match found {
                    Some(sheet) => sheet.pieces.push(piece),
                    None => sheets.push(Sheet {
                        normal,
                        offset,
                        pieces: vec![piece],
                    }),
                }
            }
        }
    }

    let frame = solid.frame();
    for sheet in sheets {
        let tangent = Vector2::new(-sheet.normal.y, sheet.normal.x);
        let base = sheet.normal * sheet.offset;
        let normal = frame.lift_direction(sheet.normal.x, sheet.normal.y, 0.0);
        for region in overlay::union(&sheet.pieces) {
            let mut loops = Vec::with_capacity(1 + region.holes().len());
            for contour in region.contours() {
                let points = contour
                    .iter()
                    .map(|q| {
                        let plan = base + tangent * q.x;
                        frame.lift(plan.x, plan.y, q.y)
                    })
                    .collect();
                loops.push(CurveLoop::new(points)?);
            }
            let Some(origin) = loops.first().map(|l| l.points()[0]) else {
                continue;
            };
            faces.push(Face::Planar(PlanarFace {
                plane: Plane::from_normal(origin, normal)?,
                loops,
            }));
        }
    }
    Ok(())
}

fn cap_face(frame: &Plane, region: &Region, z: f64, downward: bool) -> Result<Face> {
    let mut loops = Vec::with_capacity(1 + region.holes().len());
    for contour in region.contours() {
        if !is_valid_contour(contour) {
            continue;
        }
        let lifted = lift_contour(frame, contour, z)?;
        loops.push(if downward { lifted.reversed() } else { lifted });
    }
    let normal = if downward { -frame.normal() } else { *frame.normal() };
    let origin = loops
        .first()
        .map_or_else(|| frame.lift(0.0, 0.0, z), |l| l.points()[0]);
    Ok(Face::Planar(PlanarFace {
        plane: Plane::from_normal(origin, normal)?,
        loops,
    }))
}

fn lift_contour(frame: &Plane, contour: &[Point2], z: f64) -> Result<CurveLoop> {
    CurveLoop::new(contour.iter().map(|p| frame.lift(p.x, p.y, z)).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernel::boolean::difference;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn planar(faces: &[Face]) -> Vec<&PlanarFace> {
        faces.iter().filter_map(Face::as_planar).collect()
    }

    #[test]
    fn box_has_six_outward_faces() {
        let solid = Solid::cuboid(p(0.0, 0.0, 0.0), p(2.0, 2.0, 3.0)).unwrap();
        let faces = enumerate_faces(&solid).unwrap();
        assert_eq!(faces.len(), 6);
        let centroid = p(1.0, 1.0, 1.5);
        for face in planar(&faces) {
            let outward = face.origin() - centroid;
            assert!(face.normal().dot(&outward) > 0.0, "inward normal {:?}", face.normal());
            let winding = face.loops()[0].newell_normal().unwrap();
            assert_relative_eq!(winding, *face.normal(), epsilon = 1e-9);
        }
    }

    #[test]
    fn through_hole_adds_hole_loops_and_side_faces() {
        let slab = Solid::cuboid(p(0.0, 0.0, 0.0), p(10.0, 10.0, 1.0)).unwrap();
        let shaft = Solid::cuboid(p(4.0, 4.0, -1.0), p(6.0, 6.0, 2.0)).unwrap();
        let solid = difference(slab, &shaft).unwrap();
        let faces = enumerate_faces(&solid).unwrap();
        // 2 caps + 4 outer sides + 4 shaft sides
        assert_eq!(faces.len(), 10);
        let top = planar(&faces)
            .into_iter()
            .find(|f| f.normal().z > 0.5)
            .unwrap();
        assert_eq!(top.loops().len(), 2);
    }

    #[test]
    fn stepped_solid_exposes_partial_caps() {
        let block = Solid::cuboid(p(0.0, 0.0, 0.0), p(4.0, 2.0, 2.0)).unwrap();
        let notch = Solid::cuboid(p(2.0, -1.0, 1.0), p(5.0, 3.0, 3.0)).unwrap();
        let solid = difference(block, &notch).unwrap();
        let faces = enumerate_faces(&solid).unwrap();
        let up: Vec<_> = planar(&faces)
            .into_iter()
            .filter(|f| f.normal().z > 0.5)
            .collect();
        assert_eq!(up.len(), 2);
        let mut heights: Vec<f64> = up.iter().map(|f| f.origin().z).collect();
        heights.sort_by(f64::total_cmp);
        assert_relative_eq!(heights[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(heights[1], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn coplanar_side_pieces_merge_across_slabs() {
        let block = Solid::cuboid(p(0.0, 0.0, 0.0), p(4.0, 2.0, 2.0)).unwrap();
        let notch = Solid::cuboid(p(2.0, -1.0, 1.0), p(5.0, 3.0, 3.0)).unwrap();
        let solid = difference(block, &notch).unwrap();
        let faces = enumerate_faces(&solid).unwrap();
        let front: Vec<_> = planar(&faces)
            .into_iter()
            .filter(|f| f.normal().y < -0.5)
            .collect();
        assert_eq!(front.len(), 1);
        assert_eq!(front[0].loops().len(), 1);
        assert_eq!(front[0].loops()[0].len(), 6);
        assert_relative_eq!(front[0].loops()[0].area(), 6.0, epsilon = 1e-9);
        let winding = front[0].loops()[0].newell_normal().unwrap();
        assert_relative_eq!(winding, *front[0].normal(), epsilon = 1e-9);
    }

    #[test]
    fn cylinder_side_is_curved() {
        let solid = Solid::cylinder(p(0.0, 0.0, 0.0), Vector3::z(), 1.0, 2.0).unwrap();
        let faces = enumerate_faces(&solid).unwrap();
        assert_eq!(faces.len(), 3);
        assert_eq!(faces.iter().filter(|f| f.is_planar()).count(), 2);

        let Some(Face::Curved(side)) = faces.iter().find(|f| !f.is_planar()) else {
            panic!("cylinder has no curved face");
        };
        assert_eq!(side.boundaries().len(), 2);
        let heights: Vec<f64> = side.boundaries().iter().map(|b| b.points()[0].z).collect();
        assert_relative_eq!(heights[0].min(heights[1]), 0.0, epsilon = 1e-9);
        assert_relative_eq!(heights[0].max(heights[1]), 2.0, epsilon = 1e-9);
    }
}
