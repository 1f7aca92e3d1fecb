mod curve_loop;
mod planar_surface;
mod plane;
mod surface_map;

pub use curve_loop::CurveLoop;
pub use planar_surface::PlanarSurface;
pub use plane::Plane;
pub use surface_map::{SurfaceEntry, SurfaceMap};
