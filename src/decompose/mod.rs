//! Surface decomposition.
//!
//! Turns a host element with embedded inserts into a [`SurfaceMap`]: the
//! host's boundary faces toward a reference direction, with the voids of a
//! chosen set of inserts reported as openings. The document is edited
//! speculatively inside a [`MutationSession`] and always rolled back.

mod reference;
mod settings;

pub use reference::ReferencePlane;
pub use settings::{DecompositionSettings, HalfSpacePolicy, Tolerances};

use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, trace};

use crate::diagnostics::{Diagnostic, Diagnostics, LocationFailure};
use crate::document::{Document, ElementKey, MutationSession};
use crate::error::Result;
use crate::geometry::{CurveLoop, PlanarSurface, SurfaceMap};
use crate::kernel::{Face, GeometryKernel, HalfSpace, PlanarFace, Solid};
use crate::math::TOLERANCE;

/// Boundary tolerance when attributing openings to outer surfaces.
const CONTAINMENT_TOLERANCE: f64 = 1e-6;

/// Parameters of one decomposition call.
#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionRequest {
    pub host: ElementKey,
    /// Inserts whose voids are reported as openings. All other inserts are
    /// removed before the baseline solid is taken.
    pub ignore: BTreeSet<ElementKey>,
    pub reference: ReferencePlane,
    /// Clips the baseline solid before differencing.
    pub half_space: Option<HalfSpace>,
    pub tolerances: Tolerances,
}

impl DecompositionRequest {
    #[must_use]
    pub fn new(host: ElementKey, reference: ReferencePlane) -> Self {
        Self {
            host,
            ignore: BTreeSet::new(),
            reference,
            half_space: None,
            tolerances: Tolerances::default(),
        }
    }

    /// Builds a request with tolerances and half-space taken from `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the half-space cannot be built.
    pub fn with_settings(host: ElementKey, reference: ReferencePlane, settings: &DecompositionSettings) -> Result<Self> {
        let half_space = reference.half_space(settings.half_space)?;
        Ok(Self {
            half_space,
            tolerances: settings.tolerances,
            ..Self::new(host, reference)
        })
    }

    #[must_use]
    pub fn ignoring(mut self, inserts: impl IntoIterator<Item = ElementKey>) -> Self {
        self.ignore.extend(inserts);
        self
    }

    #[must_use]
    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    #[must_use]
    pub fn with_half_space(mut self, half_space: HalfSpace) -> Self {
        self.half_space = Some(half_space);
        self
    }
}

/// Why a connected volume of the host produced no surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    /// The host has no volume at all.
    NoBoundingVolume,
    /// No planar face of the volume matches the reference plane.
    NoCandidateFace { volume: usize },
    /// More than one planar face matches the reference plane.
    AmbiguousFace { volume: usize, candidates: usize },
    /// The only faces toward the reference direction are curved.
    NonPlanarFaces { volume: usize },
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unresolved::NoBoundingVolume => f.write_str("element has no bounding volume"),
            Unresolved::NoCandidateFace { volume } => {
                write!(f, "volume {volume}: no planar face at the reference plane")
            }
            Unresolved::AmbiguousFace { volume, candidates } => {
                write!(f, "volume {volume}: {candidates} faces match the reference plane")
            }
            Unresolved::NonPlanarFaces { volume } => {
                write!(f, "volume {volume}: faces toward the reference direction are not planar")
            }
        }
    }
}

/// Result of a decomposition: the surfaces found and what could not be
/// resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decomposition {
    pub surfaces: SurfaceMap,
    pub unresolved: Vec<Unresolved>,
}

/// Computes surface maps of host elements through a [`GeometryKernel`].
#[derive(Clone, Copy)]
pub struct SurfaceDecomposer<'k> {
    kernel: &'k dyn GeometryKernel,
}

impl fmt::Debug for SurfaceDecomposer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceDecomposer").finish_non_exhaustive()
    }
}

impl<'k> SurfaceDecomposer<'k> {
    #[must_use]
    pub fn new(kernel: &'k dyn GeometryKernel) -> Self {
        Self { kernel }
    }

    /// Decomposes the host, reporting failures as diagnostics.
    ///
    /// Never fails: kernel and document errors, unresolved volumes, and a
    /// missing opening set all become location-not-found diagnostics. The
    /// returned map may be empty.
    pub fn decompose(
        &self,
        document: &mut Document,
        request: &DecompositionRequest,
        diagnostics: &mut Diagnostics,
    ) -> SurfaceMap {
        let host = request.host;
        match self.try_decompose(document, request) {
            Ok(decomposition) => {
                for unresolved in &decomposition.unresolved {
                    diagnostics.report(Diagnostic::location_not_found(
                        host,
                        LocationFailure::GeometryUnresolved,
                        unresolved.to_string(),
                    ));
                }
                let surfaces = decomposition.surfaces;
                if !request.ignore.is_empty() && !surfaces.is_empty() && surfaces.opening_count() == 0 {
                    diagnostics.report(Diagnostic::location_not_found(
                        host,
                        LocationFailure::OpeningsUnresolved,
                        format!("{} inserts produced no openings", request.ignore.len()),
                    ));
                }
                surfaces
            }
            Err(err) => {
                diagnostics.report(Diagnostic::location_not_found(
                    host,
                    LocationFailure::GeometryUnresolved,
                    err.to_string(),
                ));
                SurfaceMap::new()
            }
        }
    }

    /// Decomposes the host.
    ///
    /// The document is left exactly as it was, whether this succeeds or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the host does not exist or a kernel operation
    /// fails.
    pub fn try_decompose(&self, document: &mut Document, request: &DecompositionRequest) -> Result<Decomposition> {
        let host = request.host;
        let mut session = MutationSession::begin(document, "surface decomposition");

        for other in session.document().joined_with(host) {
            session.unjoin(host, other)?;
        }
        debug!(host = %host, "unjoined host");

        let baseline = self.baseline_solids(&mut session, request)?;
        let volumes = self.full_volumes(&mut session, host)?;

        let total: f64 = volumes.iter().map(Solid::volume).sum();
        if volumes.is_empty() || total <= TOLERANCE {
            session.rollback();
            return Ok(Decomposition {
                surfaces: SurfaceMap::new(),
                unresolved: vec![Unresolved::NoBoundingVolume],
            });
        }

        let mut decomposition = Decomposition::default();
        for (index, volume) in volumes.into_iter().enumerate() {
            let face = match self.reference_face(index, &volume, request)? {
                Ok(face) => face,
                Err(unresolved) => {
                    debug!(host = %host, %unresolved, "volume unresolved");
                    decomposition.unresolved.push(unresolved);
                    continue;
                }
            };

            let mut entries: Vec<(PlanarSurface, Vec<PlanarSurface>)> = Vec::new();
            let loops = self.kernel.edge_loops(&face);
            for mut group in self.kernel.sort_and_nest_loops(loops) {
                if group.is_empty() {
                    continue;
                }
                let holes = group.split_off(1);
                let outer = group.remove(0);
                let openings = holes
                    .into_iter()
                    .map(|hole| PlanarSurface::new(face.plane().clone(), hole, Vec::new()))
                    .collect();
                entries.push((PlanarSurface::new(face.plane().clone(), outer, Vec::new()), openings));
            }

            for opening in self.remainder_openings(volume, &baseline, request)? {
                attribute_opening(&mut entries, opening);
            }

            for (outer, openings) in entries {
                decomposition.surfaces.insert(outer, openings);
            }
        }

        session.rollback();
        debug!(
            host = %host,
            surfaces = decomposition.surfaces.len(),
            openings = decomposition.surfaces.opening_count(),
            unresolved = decomposition.unresolved.len(),
            "decomposed host"
        );
        Ok(decomposition)
    }

    /// The host's solids with every non-ignored insert removed.
    fn baseline_solids(&self, session: &mut MutationSession<'_>, request: &DecompositionRequest) -> Result<Vec<Solid>> {
        let mut scope = session.nested("baseline solid");
        let removed: Vec<ElementKey> = scope
            .document()
            .inserts_of(request.host)
            .into_iter()
            .filter(|insert| !request.ignore.contains(insert))
            .collect();
        scope.remove(&removed)?;
        scope.regenerate();

        let handle = scope.acquire(request.host)?;
        let mut solids = self.kernel.solids(scope.document(), handle)?;
        if let Some(half_space) = &request.half_space {
            solids = solids
                .into_iter()
                .map(|solid| self.kernel.intersect_half_space(solid, half_space))
                .collect::<Result<_>>()?;
        }
        scope.rollback();
        debug!(host = %request.host, removed = removed.len(), solids = solids.len(), "captured baseline");
        Ok(solids)
    }

    /// The host's maximal connected volumes with every insert removed.
    fn full_volumes(&self, session: &mut MutationSession<'_>, host: ElementKey) -> Result<Vec<Solid>> {
        let mut scope = session.nested("full solid");
        let handle = scope.acquire(host)?;
        let inserts = scope.document().inserts_of(host);
        scope.remove(&inserts)?;
        scope.regenerate();

        let mut volumes = Vec::new();
        for solid in self.kernel.solids(scope.document(), handle)? {
            volumes.extend(self.kernel.split_into_maximal_volumes(solid)?);
        }
        scope.rollback();
        debug!(host = %host, volumes = volumes.len(), "split full solid");
        Ok(volumes)
    }

    /// The single planar face of `volume` at the reference plane.
    fn reference_face(
        &self,
        index: usize,
        volume: &Solid,
        request: &DecompositionRequest,
    ) -> Result<std::result::Result<PlanarFace, Unresolved>> {
        let faces = self.kernel.faces(volume)?;
        let mut candidates = Vec::new();
        let mut curved_toward = false;
        for face in faces {
            match face {
                Face::Planar(face) => {
                    if request.reference.matches(&face, &request.tolerances) {
                        candidates.push(face);
                    }
                }
                Face::Curved(face) => {
                    // a swept face has normals perpendicular to its axis
                    curved_toward |= face.axis().dot(request.reference.normal()).abs() < 1.0 - TOLERANCE;
                }
            }
        }
        Ok(match candidates.len() {
            1 => Ok(candidates.remove(0)),
            0 if curved_toward => Err(Unresolved::NonPlanarFaces { volume: index }),
            0 => Err(Unresolved::NoCandidateFace { volume: index }),
            n => Err(Unresolved::AmbiguousFace {
                volume: index,
                candidates: n,
            }),
        })
    }

    /// Opening surfaces where `volume` has material the baseline lacks.
    fn remainder_openings(
        &self,
        volume: Solid,
        baseline: &[Solid],
        request: &DecompositionRequest,
    ) -> Result<Vec<PlanarSurface>> {
        let mut remainder = volume;
        for solid in baseline {
            remainder = self.kernel.boolean_difference(remainder, solid)?;
        }
        if remainder.is_empty() {
            return Ok(Vec::new());
        }

        let mut openings = Vec::new();
        for face in self.kernel.faces(&remainder)? {
            let Face::Planar(face) = face else {
                continue;
            };
            if !request.reference.matches(&face, &request.tolerances) {
                continue;
            }
            for mut group in self.kernel.sort_and_nest_loops(self.kernel.edge_loops(&face)) {
                if group.is_empty() {
                    continue;
                }
                let inners = group.split_off(1);
                let outer: CurveLoop = group.remove(0);
                openings.push(PlanarSurface::new(face.plane().clone(), outer, inners));
            }
        }
        trace!(host = %request.host, openings = openings.len(), "remainder openings");
        Ok(openings)
    }
}

/// Appends an opening to the outer surface that contains it.
///
/// A volume with a single outer surface takes every opening.
fn attribute_opening(entries: &mut [(PlanarSurface, Vec<PlanarSurface>)], opening: PlanarSurface) {
    let index = entries
        .iter()
        .position(|(outer, _)| outer.outer().strictly_contains_loop(opening.outer(), CONTAINMENT_TOLERANCE))
        .or_else(|| (entries.len() == 1).then_some(0));
    match index.and_then(|i| entries.get_mut(i)) {
        Some((_, openings)) => openings.push(opening),
        None => trace!(area = opening.area(), "opening outside every outer surface"),
    }
}
