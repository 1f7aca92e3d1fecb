//! Geometry kernel adapter.
//!
//! [`GeometryKernel`] is the seam between the decomposition engine and the
//! solid modeler. [`PrismKernel`] implements it over layered prisms.

mod boolean;
mod face;
mod nest;
mod overlay;
mod solid;
mod split;

pub use boolean::HalfSpace;
pub use face::{CurvedFace, Face, PlanarFace};
pub use overlay::Region;
pub use solid::{Aabb, Lateral, Slab, Solid};

use crate::document::{Document, ElementHandle};
use crate::error::Result;
use crate::geometry::CurveLoop;

/// Solid-modeling operations the decomposition engine relies on.
///
/// Operations that take a [`Solid`] by value consume it; clone first if the
/// original is still needed.
pub trait GeometryKernel {
    /// The regenerated solids of a live element.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale or the document has not been
    /// regenerated since its last edit.
    fn solids(&self, document: &Document, element: ElementHandle) -> Result<Vec<Solid>>;

    /// Computes `a − b`.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel cannot evaluate the difference.
    fn boolean_difference(&self, a: Solid, b: &Solid) -> Result<Solid>;

    /// Keeps the part of `solid` inside `half_space`.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel cannot evaluate the intersection.
    fn intersect_half_space(&self, solid: Solid, half_space: &HalfSpace) -> Result<Solid>;

    /// Splits a solid into its maximal connected volumes.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid is invalid.
    fn split_into_maximal_volumes(&self, solid: Solid) -> Result<Vec<Solid>>;

    /// Enumerates the boundary faces of a solid.
    ///
    /// # Errors
    ///
    /// Returns an error if a face boundary is degenerate.
    fn faces(&self, solid: &Solid) -> Result<Vec<Face>>;

    /// Boundary loops of a planar face.
    fn edge_loops(&self, face: &PlanarFace) -> Vec<CurveLoop>;

    /// Groups coplanar loops into `[outer, holes...]` lists.
    fn sort_and_nest_loops(&self, loops: Vec<CurveLoop>) -> Vec<Vec<CurveLoop>>;
}

/// In-process kernel over layered prisms.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrismKernel;

impl GeometryKernel for PrismKernel {
    fn solids(&self, document: &Document, element: ElementHandle) -> Result<Vec<Solid>> {
        document.solids(element)
    }

    fn boolean_difference(&self, a: Solid, b: &Solid) -> Result<Solid> {
        boolean::difference(a, b)
    }

    fn intersect_half_space(&self, solid: Solid, half_space: &HalfSpace) -> Result<Solid> {
        boolean::intersect_half_space(solid, half_space)
    }

    fn split_into_maximal_volumes(&self, solid: Solid) -> Result<Vec<Solid>> {
        split::split_into_volumes(solid)
    }

    fn faces(&self, solid: &Solid) -> Result<Vec<Face>> {
        face::enumerate_faces(solid)
    }

    fn edge_loops(&self, face: &PlanarFace) -> Vec<CurveLoop> {
        face.loops().to_vec()
    }

    fn sort_and_nest_loops(&self, loops: Vec<CurveLoop>) -> Vec<Vec<CurveLoop>> {
        nest::sort_and_nest(loops)
    }
}

/// Computes `a − b` with the prism kernel's own evaluator.
///
/// Used by the document to regenerate element geometry.
pub(crate) fn subtract(a: Solid, b: &Solid) -> Result<Solid> {
    boolean::difference(a, b)
}
