use crate::error::Result;

use super::overlay;
use super::solid::{Slab, Solid, Z_TOLERANCE};

/// Splits a solid into its maximal connected volumes.
///
/// Regions of vertically touching slabs are connected when their footprints
/// overlap; connectivity is resolved with a union-find over
/// `(slab, region)` nodes. Volumes are returned in order of their lowest
/// slab, then region.
pub(crate) fn split_into_volumes(solid: Solid) -> Result<Vec<Solid>> {
    if solid.is_empty() {
        return Ok(Vec::new());
    }

    let nodes: Vec<(usize, usize)> = solid
        .slabs()
        .iter()
        .enumerate()
        .flat_map(|(si, s)| (0..s.regions().len()).map(move |ri| (si, ri)))
        .collect();
    if nodes.len() == 1 {
        return Ok(vec![solid]);
    }

    let mut sets = DisjointSets::new(nodes.len());
    let slabs = solid.slabs();
    for (a, &(sa, ra)) in nodes.iter().enumerate() {
        for (b, &(sb, rb)) in nodes.iter().enumerate().skip(a + 1) {
            if sb != sa + 1 || (slabs[sa].top() - slabs[sb].bottom()).abs() > Z_TOLERANCE {
                continue;
            }
            let lower = &slabs[sa].regions()[ra..=ra];
            let upper = &slabs[sb].regions()[rb..=rb];
            if overlay::overlaps(lower, upper) {
                sets.union(a, b);
            }
        }
    }

    let mut groups: Vec<(usize, Vec<(usize, usize)>)> = Vec::new();
    for (i, &node) in nodes.iter().enumerate() {
        let root = sets.find(i);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(node),
            None => groups.push((root, vec![node])),
        }
    }

    let volumes = groups
        .into_iter()
        .map(|(_, members)| {
            let mut parts: Vec<Slab> = Vec::new();
            for (si, ri) in members {
                let source = &slabs[si];
                let region = source.regions()[ri].clone();
                match parts.last_mut() {
                    Some(last) if (last.bottom - source.bottom()).abs() <= Z_TOLERANCE => {
                        last.regions.push(region);
                    }
                    _ => parts.push(Slab {
                        bottom: source.bottom(),
                        top: source.top(),
                        regions: vec![region],
                    }),
                }
            }
            Solid::from_parts(solid.frame().clone(), parts, solid.lateral())
        })
        .collect();
    Ok(volumes)
}

/// Minimal union-find with path halving.
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb.max(ra)] = ra.min(rb);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernel::boolean::difference;
    use crate::math::Point3;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn single_volume_is_returned_as_is() {
        let a = Solid::cuboid(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let volumes = split_into_volumes(a.clone()).unwrap();
        assert_eq!(volumes, vec![a]);
    }

    #[test]
    fn cut_through_produces_two_volumes() {
        let bar = Solid::cuboid(p(0.0, 0.0, 0.0), p(10.0, 1.0, 1.0)).unwrap();
        let gap = Solid::cuboid(p(4.0, -1.0, -1.0), p(6.0, 2.0, 2.0)).unwrap();
        let volumes = split_into_volumes(difference(bar, &gap).unwrap()).unwrap();
        assert_eq!(volumes.len(), 2);
        for v in &volumes {
            assert_relative_eq!(v.volume(), 4.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn stacked_layers_stay_connected() {
        let block = Solid::cuboid(p(0.0, 0.0, 0.0), p(4.0, 4.0, 2.0)).unwrap();
        let pocket = Solid::cuboid(p(1.0, 1.0, 1.0), p(3.0, 3.0, 3.0)).unwrap();
        let cut = difference(block, &pocket).unwrap();
        assert_eq!(cut.slabs().len(), 2);
        let volumes = split_into_volumes(cut).unwrap();
        assert_eq!(volumes.len(), 1);
        assert_relative_eq!(volumes[0].volume(), 32.0 - 4.0, epsilon = 1e-6);
    }

    #[test]
    fn empty_solid_has_no_volumes() {
        let a = Solid::cuboid(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
        let b = Solid::cuboid(p(-1.0, -1.0, -1.0), p(2.0, 2.0, 2.0)).unwrap();
        assert!(split_into_volumes(difference(a, &b).unwrap()).unwrap().is_empty());
    }
}
