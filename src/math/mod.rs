pub mod polygon_2d;

/// 2D point type, used for profile coordinates in a solid's local frame.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for degenerate-input checks.
pub const TOLERANCE: f64 = 1e-10;

/// Regions with an area below this are treated as empty after a 2D boolean.
pub const AREA_TOLERANCE: f64 = 1e-9;
