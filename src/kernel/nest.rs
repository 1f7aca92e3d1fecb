use crate::geometry::CurveLoop;
use crate::math::polygon_2d::contour_inside_contour;
use crate::math::Point2;

/// Boundary tolerance for loop containment tests.
const NEST_TOLERANCE: f64 = 1e-7;

/// Groups coplanar loops into outer loops followed by their holes.
///
/// Loops are ranked by area; each loop's parent is the smallest loop that
/// encloses it. Loops at even nesting depth are outer loops; loops at odd
/// depth are holes of their parent. Groups are ordered by decreasing outer
/// area.
pub(crate) fn sort_and_nest(loops: Vec<CurveLoop>) -> Vec<Vec<CurveLoop>> {
    if loops.is_empty() {
        return Vec::new();
    }

    let areas: Vec<f64> = loops.iter().map(CurveLoop::area).collect();
    let mut order: Vec<usize> = (0..loops.len()).collect();
    order.sort_by(|&a, &b| areas[b].total_cmp(&areas[a]));

    let Ok(plane) = loops[order[0]].plane() else {
        return loops.into_iter().map(|l| vec![l]).collect();
    };
    let contours: Vec<Vec<Point2>> = loops.iter().map(|l| l.to_2d(&plane)).collect();

    let mut parent: Vec<Option<usize>> = vec![None; loops.len()];
    let mut depth: Vec<usize> = vec![0; loops.len()];
    for (rank, &i) in order.iter().enumerate() {
        // Candidates ranked before `i` are at least as large; the last match is the smallest.
        let enclosing = order[..rank]
            .iter()
            .rev()
            .copied()
            .find(|&j| contour_inside_contour(&contours[i], &contours[j], NEST_TOLERANCE));
        if let Some(j) = enclosing {
            parent[i] = Some(j);
            depth[i] = depth[j] + 1;
        }
    }

    let mut slots: Vec<Option<CurveLoop>> = loops.into_iter().map(Some).collect();
    let mut groups = Vec::new();
    for &i in &order {
        if depth[i] % 2 != 0 {
            continue;
        }
        let Some(outer) = slots[i].take() else {
            continue;
        };
        let mut group = vec![outer];
        for &j in &order {
            if parent[j] == Some(i) && depth[j] % 2 == 1 {
                if let Some(hole) = slots[j].take() {
                    group.push(hole);
                }
            }
        }
        groups.push(group);
    }
    groups
}
