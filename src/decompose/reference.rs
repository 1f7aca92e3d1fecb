use crate::error::{GeometryError, Result};
use crate::kernel::{HalfSpace, PlanarFace};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{HalfSpacePolicy, Tolerances};

/// The plane a decomposition reports its boundary in.
///
/// Faces are selected whose outward normal matches `normal` and which lie
/// at signed distance `offset` from `origin` along it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePlane {
    origin: Point3,
    normal: Vector3,
    offset: f64,
}

impl ReferencePlane {
    /// # Errors
    ///
    /// Returns an error if `normal` is zero-length.
    pub fn new(origin: Point3, normal: Vector3, offset: f64) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            normal: normal / len,
            offset,
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

    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// A point on the expected face.
    #[must_use]
    pub fn face_point(&self) -> Point3 {
        self.origin + self.normal * self.offset
    }

    /// Returns `true` if the face faces the reference direction and lies at
    /// the reference offset.
    #[must_use]
    pub fn matches(&self, face: &PlanarFace, tolerances: &Tolerances) -> bool {
        if face.normal().angle(&self.normal) > tolerances.angle {
            return false;
        }
        let distance = (face.origin() - self.origin).dot(&self.normal);
        (distance - self.offset).abs() <= tolerances.distance
    }

    /// The half-space a policy clips the baseline solid with, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the half-space cannot be built.
    pub fn half_space(&self, policy: HalfSpacePolicy) -> Result<Option<HalfSpace>> {
        match policy {
            HalfSpacePolicy::Disabled => Ok(None),
            HalfSpacePolicy::ReferenceSide { depth } => {
                let origin = self.face_point() - self.normal * depth;
                HalfSpace::new(origin, -self.normal).map(Some)
            }
        }
    }
}
