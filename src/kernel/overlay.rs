//! Region booleans in a solid's local 2D frame, backed by `i_overlay`.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;

use crate::math::polygon_2d::{ensure_ccw, ensure_cw, is_valid_contour, signed_area, simplify_contour};
use crate::math::{Point2, AREA_TOLERANCE};

/// Collinearity threshold applied to contours coming back from the overlay.
const SIMPLIFY_EPSILON: f64 = 1e-9;

/// A connected planar region: an outer contour and its holes.
///
/// The outer contour is counter-clockwise and holes are clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    outer: Vec<Point2>,
    holes: Vec<Vec<Point2>>,
}

impl Region {
    /// Creates a region, normalizing contour windings.
    #[must_use]
    pub fn new(outer: &[Point2], holes: &[Vec<Point2>]) -> Self {
        Self {
            outer: ensure_ccw(outer),
            holes: holes.iter().map(|h| ensure_cw(h)).collect(),
        }
    }

    #[must_use]
    pub fn outer(&self) -> &[Point2] {
        &self.outer
    }

    #[must_use]
    pub fn holes(&self) -> &[Vec<Point2>] {
        &self.holes
    }

    /// All contours, outer first.
    pub fn contours(&self) -> impl Iterator<Item = &[Point2]> {
        std::iter::once(self.outer.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    /// Net enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        signed_area(&self.outer).abs() - self.holes.iter().map(|h| signed_area(h).abs()).sum::<f64>()
    }

    /// Applies a 2D point map to every vertex, re-normalizing windings.
    #[must_use]
    pub fn map_points(&self, f: impl Fn(&Point2) -> Point2) -> Self {
        let outer: Vec<Point2> = self.outer.iter().map(&f).collect();
        let holes: Vec<Vec<Point2>> = self
            .holes
            .iter()
            .map(|h| h.iter().map(&f).collect())
            .collect();
        Self::new(&outer, &holes)
    }
}

/// Total net area of a region set.
#[must_use]
pub fn total_area(regions: &[Region]) -> f64 {
    regions.iter().map(Region::area).sum()
}

/// `subject − clip`.
#[must_use]
pub fn difference(subject: &[Region], clip: &[Region]) -> Vec<Region> {
    if subject.is_empty() {
        return Vec::new();
    }
    if clip.is_empty() {
        return subject.to_vec();
    }
    run(subject, clip, OverlayRule::Difference)
}

/// `subject ∩ clip`.
#[must_use]
pub fn intersection(subject: &[Region], clip: &[Region]) -> Vec<Region> {
    if subject.is_empty() || clip.is_empty() {
        return Vec::new();
    }
    run(subject, clip, OverlayRule::Intersect)
}

/// Union of a set of non-overlapping regions, merging shared edges.
#[must_use]
pub fn union(regions: &[Region]) -> Vec<Region> {
    if regions.len() <= 1 {
        return regions.to_vec();
    }
    run(&regions[..1], &regions[1..], OverlayRule::Union)
}

/// Returns `true` if both region sets cover the same area.
#[must_use]
pub fn same_coverage(a: &[Region], b: &[Region]) -> bool {
    if a.is_empty() || b.is_empty() {
        return a.is_empty() && b.is_empty();
    }
    total_area(&run(a, b, OverlayRule::Xor)) <= AREA_TOLERANCE
}

/// Returns `true` if the two region sets share a non-negligible area.
#[must_use]
pub fn overlaps(a: &[Region], b: &[Region]) -> bool {
    total_area(&intersection(a, b)) > AREA_TOLERANCE
}

fn run(subject: &[Region], clip: &[Region], rule: OverlayRule) -> Vec<Region> {
    let subject_paths = to_paths(subject);
    let clip_paths = to_paths(clip);
    let shapes: Vec<Vec<Vec<[f64; 2]>>> = subject_paths.overlay(&clip_paths, rule, FillRule::EvenOdd);
    from_shapes(&shapes)
}

fn to_paths(regions: &[Region]) -> Vec<Vec<[f64; 2]>> {
    regions
        .iter()
        .flat_map(Region::contours)
        .map(|contour| contour.iter().map(|p| [p.x, p.y]).collect())
        .collect()
}

/// Converts overlay output (shapes of contours, outer first) into regions,
/// dropping slivers.
fn from_shapes(shapes: &[Vec<Vec<[f64; 2]>>]) -> Vec<Region> {
    let mut regions = Vec::with_capacity(shapes.len());
    for shape in shapes {
        let mut contours = shape.iter().map(|path| {
            let points: Vec<Point2> = path.iter().map(|p| Point2::new(p[0], p[1])).collect();
            simplify_contour(&points, SIMPLIFY_EPSILON)
        });
        let Some(outer) = contours.next() else {
            continue;
        };
        if !is_valid_contour(&outer) {
            continue;
        }
        let holes: Vec<Vec<Point2>> = contours.filter(|h| is_valid_contour(h)).collect();
        let region = Region::new(&outer, &holes);
        if region.area() > AREA_TOLERANCE {
            regions.push(region);
        }
    }
    regions
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Region {
        Region::new(
            &[
                Point2::new(x0, y0),
                Point2::new(x1, y0),
                Point2::new(x1, y1),
                Point2::new(x0, y1),
            ],
            &[],
        )
    }

    #[test]
    fn difference_punches_hole() {
        let result = difference(&[rect(0.0, 0.0, 10.0, 4.0)], &[rect(2.0, 1.0, 4.0, 3.0)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].holes().len(), 1);
        assert_relative_eq!(total_area(&result), 36.0, epsilon = 1e-6);
    }

    #[test]
    fn difference_can_split_region() {
        let result = difference(&[rect(0.0, 0.0, 10.0, 4.0)], &[rect(4.0, -1.0, 6.0, 5.0)]);
        assert_eq!(result.len(), 2);
        assert_relative_eq!(total_area(&result), 32.0, epsilon = 1e-6);
    }

    #[test]
    fn intersection_and_overlap() {
        let a = [rect(0.0, 0.0, 2.0, 2.0)];
        let b = [rect(1.0, 1.0, 3.0, 3.0)];
        assert_relative_eq!(total_area(&intersection(&a, &b)), 1.0, epsilon = 1e-6);
        assert!(overlaps(&a, &b));
        assert!(!overlaps(&a, &[rect(5.0, 5.0, 6.0, 6.0)]));
    }

    #[test]
    fn union_merges_touching_pieces() {
        let merged = union(&[rect(0.0, 0.0, 1.0, 1.0), rect(0.0, 1.0, 1.0, 2.5), rect(0.0, 2.5, 1.0, 3.0)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].outer().len(), 4);
        assert_relative_eq!(total_area(&merged), 3.0, epsilon = 1e-6);
    }

    #[test]
    fn coverage_comparison() {
        let whole = [rect(0.0, 0.0, 2.0, 1.0)];
        let halves = [rect(0.0, 0.0, 1.0, 1.0), rect(1.0, 0.0, 2.0, 1.0)];
        assert!(same_coverage(&whole, &halves));
        assert!(!same_coverage(&whole, &[rect(0.0, 0.0, 1.0, 1.0)]));
        assert!(same_coverage(&[], &[]));
    }

    #[test]
    fn region_windings_are_normalized() {
        let region = Region::new(
            &[Point2::new(0.0, 0.0), Point2::new(0.0, 1.0), Point2::new(1.0, 1.0), Point2::new(1.0, 0.0)],
            &[vec![Point2::new(0.2, 0.2), Point2::new(0.4, 0.2), Point2::new(0.4, 0.4)]],
        );
        assert!(signed_area(region.outer()) > 0.0);
        assert!(signed_area(&region.holes()[0]) < 0.0);
    }
}
