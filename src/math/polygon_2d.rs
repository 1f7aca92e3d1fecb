use super::{Point2, AREA_TOLERANCE, TOLERANCE};

/// Computes the signed area of a closed contour (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area(contour: &[Point2]) -> f64 {
    let n = contour.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += contour[i].x * contour[j].y - contour[j].x * contour[i].y;
    }
    sum * 0.5
}

/// Returns the contour with counter-clockwise winding.
#[must_use]
pub fn ensure_ccw(contour: &[Point2]) -> Vec<Point2> {
    if signed_area(contour) < 0.0 {
        contour.iter().rev().copied().collect()
    } else {
        contour.to_vec()
    }
}

/// Returns the contour with clockwise winding.
#[must_use]
pub fn ensure_cw(contour: &[Point2]) -> Vec<Point2> {
    if signed_area(contour) > 0.0 {
        contour.iter().rev().copied().collect()
    } else {
        contour.to_vec()
    }
}

/// Removes collinear and duplicate vertices from a closed contour.
///
/// Returns the input unchanged if simplification would leave fewer than
/// three vertices.
#[must_use]
pub fn simplify_contour(contour: &[Point2], epsilon: f64) -> Vec<Point2> {
    let mut points: Vec<Point2> = Vec::with_capacity(contour.len());
    for &pt in contour {
        if !matches!(points.last(), Some(last) if (pt - last).norm() <= epsilon) {
            points.push(pt);
        }
    }
    while points.len() > 1 && (points[0] - points[points.len() - 1]).norm() <= epsilon {
        points.pop();
    }
    if points.len() <= 3 {
        return if points.len() == 3 { points } else { contour.to_vec() };
    }

    loop {
        let n = points.len();
        let mut removed = false;
        for i in 0..n {
            let prev = points[(i + n - 1) % n];
            let curr = points[i];
            let next = points[(i + 1) % n];
            let a = curr - prev;
            let b = next - curr;
            let cross = a.x * b.y - a.y * b.x;
            let scale = a.norm() * b.norm();
            if cross.abs() <= epsilon * scale.max(TOLERANCE) {
                points.remove(i);
                removed = true;
                break;
            }
        }
        if !removed || points.len() <= 3 {
            break;
        }
    }
    points
}

/// Winding number of `point` with respect to a closed contour.
///
/// Non-zero => inside, zero => outside.
#[must_use]
pub fn winding_number(point: &Point2, contour: &[Point2]) -> i32 {
    let n = contour.len();
    let mut winding = 0i32;
    for i in 0..n {
        let a = contour[i];
        let b = contour[(i + 1) % n];
        let side = (b.x - a.x) * (point.y - a.y) - (b.y - a.y) * (point.x - a.x);
        if a.y <= point.y {
            if b.y > point.y && side > 0.0 {
                winding += 1;
            }
        } else if b.y <= point.y && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Distance from `point` to the closest edge of a closed contour.
#[must_use]
pub fn distance_to_contour(point: &Point2, contour: &[Point2]) -> f64 {
    let n = contour.len();
    let mut best = f64::INFINITY;
    for i in 0..n {
        let a = contour[i];
        let b = contour[(i + 1) % n];
        let ab = b - a;
        let len_sq = ab.norm_squared();
        let t = if len_sq < TOLERANCE {
            0.0
        } else {
            ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
        };
        best = best.min((point - (a + ab * t)).norm());
    }
    best
}

/// Classification of a point against a closed contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContourSide {
    /// Strictly inside.
    Inside,
    /// Within `tolerance` of the boundary.
    Boundary,
    /// Strictly outside.
    Outside,
}

/// Classifies a point against a contour, treating points within
/// `tolerance` of an edge as on the boundary.
#[must_use]
pub fn classify_point(point: &Point2, contour: &[Point2], tolerance: f64) -> ContourSide {
    if contour.len() < 3 {
        return ContourSide::Outside;
    }
    if distance_to_contour(point, contour) <= tolerance {
        ContourSide::Boundary
    } else if winding_number(point, contour) != 0 {
        ContourSide::Inside
    } else {
        ContourSide::Outside
    }
}

/// Returns `true` if every vertex of `inner` is inside or on `outer`, and at
/// least one is strictly inside.
#[must_use]
pub fn contour_inside_contour(inner: &[Point2], outer: &[Point2], tolerance: f64) -> bool {
    let mut strictly_inside = false;
    for pt in inner {
        match classify_point(pt, outer, tolerance) {
            ContourSide::Outside => return false,
            ContourSide::Inside => strictly_inside = true,
            ContourSide::Boundary => {}
        }
    }
    strictly_inside || inner.is_empty()
}

/// Returns `true` if the contour encloses a non-negligible area.
#[must_use]
pub fn is_valid_contour(contour: &[Point2]) -> bool {
    contour.len() >= 3 && signed_area(contour).abs() > AREA_TOLERANCE
}

/// Computes the axis-aligned bounds of a set of contours.
#[must_use]
pub fn bounds<'a>(contours: impl IntoIterator<Item = &'a [Point2]>) -> Option<(Point2, Point2)> {
    let mut result: Option<(Point2, Point2)> = None;
    for contour in contours {
        for p in contour {
            result = Some(match result {
                None => (*p, *p),
                Some((min, max)) => (
                    Point2::new(min.x.min(p.x), min.y.min(p.y)),
                    Point2::new(max.x.max(p.x), max.y.max(p.y)),
                ),
            });
        }
    }
    result
}
