use super::PlanarSurface;

/// Vertex tolerance used to decide whether two outer surfaces are the same key.
const KEY_TOLERANCE: f64 = 1e-6;

/// One outer surface together with the openings cut into it.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceEntry {
    /// The outer boundary surface.
    pub outer: PlanarSurface,
    /// Opening surfaces nested inside `outer`. May be empty.
    pub openings: Vec<PlanarSurface>,
}

/// Mapping from outer planar surface to its list of opening surfaces.
///
/// Outer surfaces are unique keys: inserting an outer surface that matches an
/// existing one appends to that entry instead of adding a new key. Entry
/// order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMap {
    entries: Vec<SurfaceEntry>,
}

impl SurfaceMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an outer surface with its openings, merging into an existing
    /// entry with the same outer surface.
    pub fn insert(&mut self, outer: PlanarSurface, openings: Vec<PlanarSurface>) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.outer.approx_eq(&outer, KEY_TOLERANCE))
        {
            entry.openings.extend(openings);
        } else {
            self.entries.push(SurfaceEntry { outer, openings });
        }
    }

    /// Returns the openings recorded for `outer`, if it is a key.
    #[must_use]
    pub fn get(&self, outer: &PlanarSurface) -> Option<&[PlanarSurface]> {
        self.entries
            .iter()
            .find(|e| e.outer.approx_eq(outer, KEY_TOLERANCE))
            .map(|e| e.openings.as_slice())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of openings across all entries.
    #[must_use]
    pub fn opening_count(&self) -> usize {
        self.entries.iter().map(|e| e.openings.len()).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SurfaceEntry> {
        self.entries.iter()
    }
}

impl IntoIterator for SurfaceMap {
    type Item = SurfaceEntry;
    type IntoIter = std::vec::IntoIter<SurfaceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a SurfaceMap {
    type Item = &'a SurfaceEntry;
    type IntoIter = std::slice::Iter<'a, SurfaceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
