use crate::error::{GeometryError, Result};
use crate::math::{Point2, Point3, Vector3, TOLERANCE};

/// An oriented plane with an orthonormal local frame.
///
/// Local coordinates `(x, y, z)` of a world point `P` are
/// `((P - origin)·u, (P - origin)·v, (P - origin)·normal)`, so `z` is the
/// signed distance from the plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl Plane {
    /// Creates a plane from an origin and two in-plane directions.
    ///
    /// `v_dir` is re-orthogonalized against `u_dir`; the normal is `u × v`.
    ///
    /// # Errors
    ///
    /// Returns an error if a direction is zero-length or the two are parallel.
    pub fn new(origin: Point3, u_dir: Vector3, v_dir: Vector3) -> Result<Self> {
        let u_len = u_dir.norm();
        if u_len < TOLERANCE || v_dir.norm() < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let u_dir = u_dir / u_len;

        let normal = u_dir.cross(&v_dir);
        let normal_len = normal.norm();
        if normal_len < TOLERANCE {
            return Err(GeometryError::Degenerate("plane directions are parallel".into()).into());
        }
        let normal = normal / normal_len;
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Creates a plane from an origin and a normal vector.
    ///
    /// The in-plane directions are chosen automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;

        let reference = if normal.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let u_dir = reference.cross(&normal).normalize();
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// The world XY plane through the origin.
    #[must_use]
    pub fn world_xy() -> Self {
        Self {
            origin: Point3::origin(),
            u_dir: Vector3::x(),
            v_dir: Vector3::y(),
            normal: Vector3::z(),
        }
    }

    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    #[must_use]
    pub fn u_dir(&self) -> &Vector3 {
        &self.u_dir
    }

    #[must_use]
    pub fn v_dir(&self) -> &Vector3 {
        &self.v_dir
    }

    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Signed distance of `point` from the plane along its normal.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    /// Expresses a world point in the plane's local frame.
    #[must_use]
    pub fn project(&self, point: &Point3) -> Point3 {
        let d = point - self.origin;
        Point3::new(d.dot(&self.u_dir), d.dot(&self.v_dir), d.dot(&self.normal))
    }

    /// Projects a world point onto the plane's 2D coordinates.
    #[must_use]
    pub fn project_2d(&self, point: &Point3) -> Point2 {
        let local = self.project(point);
        Point2::new(local.x, local.y)
    }

    /// Converts local coordinates back to a world point.
    #[must_use]
    pub fn lift(&self, x: f64, y: f64, z: f64) -> Point3 {
        self.origin + self.u_dir * x + self.v_dir * y + self.normal * z
    }

    /// Converts a world direction into the local frame.
    #[must_use]
    pub fn project_direction(&self, dir: &Vector3) -> Vector3 {
        Vector3::new(dir.dot(&self.u_dir), dir.dot(&self.v_dir), dir.dot(&self.normal))
    }

    /// Converts a local direction into world space.
    #[must_use]
    pub fn lift_direction(&self, x: f64, y: f64, z: f64) -> Vector3 {
        self.u_dir * x + self.v_dir * y + self.normal * z
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn from_normal_builds_orthonormal_frame() {
        let plane = Plane::from_normal(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, 5.0)).unwrap();
        assert_relative_eq!(plane.normal().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.u_dir().dot(plane.normal()), 0.0, epsilon = 1e-12);
        assert_relative_eq!(plane.v_dir().dot(plane.u_dir()), 0.0, epsilon = 1e-12);
        assert_relative_eq!(plane.u_dir().cross(plane.v_dir()), *plane.normal(), epsilon = 1e-12);
    }

    #[test]
    fn project_and_lift_round_trip() {
        let plane = Plane::from_normal(Point3::new(0.5, 0.0, 0.0), Vector3::new(1.0, 1.0, 0.0)).unwrap();
        let world = Point3::new(3.0, -1.0, 2.0);
        let local = plane.project(&world);
        assert_relative_eq!(plane.lift(local.x, local.y, local.z), world, epsilon = 1e-12);
        assert_relative_eq!(plane.signed_distance(&world), local.z, epsilon = 1e-12);
    }

    #[test]
    fn new_reorthogonalizes_v() {
        let plane = Plane::new(Point3::origin(), Vector3::x(), Vector3::new(1.0, 1.0, 0.0)).unwrap();
        assert_relative_eq!(*plane.v_dir(), Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(*plane.normal(), Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn degenerate_planes_are_rejected() {
        assert!(Plane::from_normal(Point3::origin(), Vector3::zeros()).is_err());
        assert!(Plane::new(Point3::origin(), Vector3::x(), Vector3::x() * 2.0).is_err());
    }
}
