//! Per-element converters and the conversion pass that drives them.
//!
//! Every converter follows the same contract: look its source key up in the
//! pass cache and return the hit; otherwise build its object, registering
//! the id in the cache before recursing into anything that may refer back.

mod curve_member;
mod inserts;
mod material;
mod opening;
mod surface_member;

pub use inserts::InsertRule;

use tracing::{debug, info_span, trace};

use crate::cache::{CacheStats, ConversionCache};
use crate::decompose::DecompositionSettings;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::document::{Category, Document, ElementData, ElementKey};
use crate::domain::{ObjectId, StructuralModel};
use crate::error::{BimsurfError, DocumentError, Result};
use crate::kernel::GeometryKernel;

/// Settings shared by every converter in a pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConversionSettings {
    pub decomposition: DecompositionSettings,
    pub opening_rule: InsertRule,
}

impl ConversionSettings {
    #[must_use]
    pub fn with_decomposition(mut self, decomposition: DecompositionSettings) -> Self {
        self.decomposition = decomposition;
        self
    }

    #[must_use]
    pub fn with_opening_rule(mut self, opening_rule: InsertRule) -> Self {
        self.opening_rule = opening_rule;
        self
    }
}

/// Counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub cache: CacheStats,
    pub decompositions: usize,
}

/// Everything a finished pass produced.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub model: StructuralModel,
    pub diagnostics: Diagnostics,
    pub stats: PassStats,
}

/// One top-level conversion invocation.
///
/// The pass owns a fresh cache, so nothing from an earlier pass is ever
/// observed. It borrows the document mutably because surface members are
/// decomposed through scoped, always-rolled-back edits.
pub struct ConversionPass<'a> {
    document: &'a mut Document,
    kernel: &'a dyn GeometryKernel,
    settings: ConversionSettings,
    cache: ConversionCache<ObjectId>,
    model: StructuralModel,
    diagnostics: Diagnostics,
    decompositions: usize,
}

impl std::fmt::Debug for ConversionPass<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionPass")
            .field("settings", &self.settings)
            .field("objects", &self.model.len())
            .field("diagnostics", &self.diagnostics.len())
            .finish_non_exhaustive()
    }
}

impl<'a> ConversionPass<'a> {
    pub fn new(document: &'a mut Document, kernel: &'a dyn GeometryKernel, settings: ConversionSettings) -> Self {
        Self {
            document,
            kernel,
            settings,
            cache: ConversionCache::new(),
            model: StructuralModel::new(),
            diagnostics: Diagnostics::new(),
            decompositions: 0,
        }
    }

    /// Converts each element, best-effort.
    ///
    /// A failing element is reported as a diagnostic and never stops its
    /// siblings. Cache errors mean a converter broke the cache contract, so
    /// debug builds panic on them instead.
    pub fn convert_all(&mut self, keys: impl IntoIterator<Item = ElementKey>) {
        for key in keys {
            let _span = info_span!("convert", element = %key).entered();
            if let Err(err) = self.convert(key) {
                self.report_failure(key, &err);
            }
        }
    }

    fn report_failure(&mut self, key: ElementKey, err: &BimsurfError) {
        debug_assert!(
            !matches!(err, BimsurfError::Cache(_)),
            "cache misuse while converting {key}: {err}"
        );
        self.diagnostics
            .report(Diagnostic::conversion_failed(key, err.to_string()));
    }

    /// Converts one element by category.
    ///
    /// Returns `None` for categories with no structural counterpart.
    ///
    /// # Errors
    ///
    /// Returns an error if the element does not exist or a converter fails.
    pub fn convert(&mut self, key: ElementKey) -> Result<Option<ObjectId>> {
        let category = self.element(key)?.category;
        let id = match category {
            Category::Wall | Category::Floor | Category::Roof => Some(self.convert_surface_member(key)?),
            Category::Door | Category::Window | Category::Opening => Some(self.convert_opening(key)?),
            Category::Beam | Category::Column => Some(self.convert_curve_member(key)?),
            Category::Material => Some(self.convert_material(key, None)?),
            Category::Fixture => {
                trace!(element = %key, "fixture has no structural counterpart");
                None
            }
        };
        Ok(id)
    }

    #[must_use]
    pub fn model(&self) -> &StructuralModel {
        &self.model
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    #[must_use]
    pub fn stats(&self) -> PassStats {
        PassStats {
            cache: self.cache.stats(),
            decompositions: self.decompositions,
        }
    }

    /// Ends the pass, handing over the model and the diagnostics.
    #[must_use]
    pub fn finish(self) -> ConversionOutput {
        let stats = self.stats();
        debug!(
            objects = self.model.len(),
            diagnostics = self.diagnostics.len(),
            decompositions = stats.decompositions,
            "conversion pass finished"
        );
        ConversionOutput {
            model: self.model,
            diagnostics: self.diagnostics,
            stats,
        }
    }

    fn element(&self, key: ElementKey) -> Result<ElementData> {
        self.document
            .element_by_key(key)
            .cloned()
            .ok_or_else(|| DocumentError::ElementNotFound(key).into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::cache::SourceKind;
    use crate::decompose::ReferencePlane;
    use crate::error::CacheError;
    use crate::diagnostics::{DiagnosticKind, LocationFailure};
    use crate::document::{Discipline, ElementHandle, Location, SectionRef};
    use crate::domain::{DomainObject, OpeningKind};
    use crate::geometry::CurveLoop;
    use crate::kernel::{Face, HalfSpace, PlanarFace, PrismKernel, Solid};
    use crate::math::{Point3, Vector3};

    const WALL: ElementKey = ElementKey(1);
    const DOOR: ElementKey = ElementKey(2);
    const WINDOW: ElementKey = ElementKey(3);
    const BEAM_A: ElementKey = ElementKey(4);
    const BEAM_B: ElementKey = ElementKey(5);
    const COLUMN: ElementKey = ElementKey(6);
    const SLEEVE: ElementKey = ElementKey(7);
    const CONCRETE: ElementKey = ElementKey(10);
    const STEEL: ElementKey = ElementKey(11);

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn cuboid(min: Point3, max: Point3) -> Solid {
        Solid::cuboid(min, max).unwrap()
    }

    fn ipe300() -> SectionRef {
        SectionRef {
            type_key: ElementKey(100),
            name: "IPE 300".into(),
            width: 0.15,
            depth: 0.3,
        }
    }

    fn document() -> Document {
        let mut doc = Document::new();
        let front = ReferencePlane::new(Point3::origin(), -Vector3::y(), 0.0).unwrap();
        let elements = [
            ElementData::new(CONCRETE, "Concrete", Category::Material),
            ElementData::new(STEEL, "Steel", Category::Material),
            ElementData::new(WALL, "wall", Category::Wall)
                .with_discipline(Discipline::Structural)
                .with_body(cuboid(p(0.0, 0.0, 0.0), p(10.0, 0.3, 3.0)))
                .with_location(Location::Surface(front))
                .with_material(CONCRETE, Some("C30/37")),
            ElementData::new(DOOR, "door", Category::Door)
                .hosted_by(WALL, cuboid(p(1.0, -0.1, 0.0), p(2.0, 0.4, 2.1)))
                .with_location(Location::Point(p(1.5, 0.0, 0.0))),
            ElementData::new(WINDOW, "window", Category::Window)
                .hosted_by(WALL, cuboid(p(4.0, -0.1, 1.0), p(6.0, 0.4, 2.0))),
            ElementData::new(SLEEVE, "sleeve", Category::Fixture)
                .with_discipline(Discipline::Mechanical)
                .hosted_by(WALL, cuboid(p(8.0, -0.1, 2.2), p(8.4, 0.4, 2.6))),
            ElementData::new(BEAM_A, "beam a", Category::Beam)
                .with_location(Location::Curve {
                    start: p(0.0, 0.0, 3.0),
                    end: p(5.0, 0.0, 3.0),
                })
                .with_material(STEEL, Some("S355"))
                .with_section(ipe300()),
            ElementData::new(BEAM_B, "beam b", Category::Beam)
                .with_location(Location::Curve {
                    start: p(5.0, 0.0, 3.0),
                    end: p(10.0, 0.0, 3.0),
                })
                .with_material(STEEL, Some("S355"))
                .with_section(ipe300()),
            ElementData::new(COLUMN, "column", Category::Column)
                .with_location(Location::Curve {
                    start: p(10.0, 0.0, 0.0),
                    end: p(10.0, 0.0, 3.0),
                })
                .with_material(STEEL, Some("S235"))
                .with_section(ipe300()),
        ];
        for element in elements {
            doc.add_element(element).unwrap();
        }
        doc.regenerate();
        doc
    }

    /// Prism kernel that counts how often solids are split.
    #[derive(Default)]
    struct CountingKernel {
        splits: Cell<usize>,
    }

    impl GeometryKernel for CountingKernel {
        fn solids(&self, document: &Document, element: ElementHandle) -> Result<Vec<Solid>> {
            PrismKernel.solids(document, element)
        }

        fn boolean_difference(&self, a: Solid, b: &Solid) -> Result<Solid> {
            PrismKernel.boolean_difference(a, b)
        }

        fn intersect_half_space(&self, solid: Solid, half_space: &HalfSpace) -> Result<Solid> {
            PrismKernel.intersect_half_space(solid, half_space)
        }

        fn split_into_maximal_volumes(&self, solid: Solid) -> Result<Vec<Solid>> {
            self.splits.set(self.splits.get() + 1);
            PrismKernel.split_into_maximal_volumes(solid)
        }

        fn faces(&self, solid: &Solid) -> Result<Vec<Face>> {
            PrismKernel.faces(solid)
        }

        fn edge_loops(&self, face: &PlanarFace) -> Vec<CurveLoop> {
            PrismKernel.edge_loops(face)
        }

        fn sort_and_nest_loops(&self, loops: Vec<CurveLoop>) -> Vec<Vec<CurveLoop>> {
            PrismKernel.sort_and_nest_loops(loops)
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "cache misuse")]
    fn cache_errors_panic_in_debug_builds() {
        let mut doc = document();
        let mut pass = ConversionPass::new(&mut doc, &PrismKernel, ConversionSettings::default());
        let err: BimsurfError = CacheError::MissingContext {
            kind: SourceKind::Profile,
        }
        .into();
        pass.report_failure(WALL, &err);
    }

    #[test]
    fn element_failures_become_diagnostics() {
        let mut doc = document();
        let mut pass = ConversionPass::new(&mut doc, &PrismKernel, ConversionSettings::default());
        let err: BimsurfError = DocumentError::ElementNotFound(WALL).into();
        pass.report_failure(WALL, &err);
        let output = pass.finish();
        assert_eq!(output.diagnostics.len(), 1);
    }

    #[test]
    fn wall_is_converted_with_its_openings() {
        let mut doc = document();
        let before = doc.snapshot();
        let keys = doc.keys();
        let mut pass = ConversionPass::new(&mut doc, &PrismKernel, ConversionSettings::default());
        pass.convert_all(keys);
        let wall = pass.convert(WALL).unwrap().unwrap();
        let output = pass.finish();

        let member = output.model.surface_member(wall).unwrap();
        assert_eq!(member.surfaces.len(), 1);
        assert_eq!(member.surfaces.opening_count(), 2);
        assert_eq!(member.openings.len(), 2);
        for id in &member.openings {
            assert_eq!(output.model.opening(*id).unwrap().host, Some(wall));
        }
        let material = output.model.material(member.material.unwrap()).unwrap();
        assert_eq!(material.label(), "Concrete C30/37");

        assert_eq!(output.model.placeholder_count(), 0);
        assert_eq!(output.stats.decompositions, 1);
        assert!(output.diagnostics.is_empty());
        assert_eq!(doc.snapshot(), before);
    }

    #[test]
    fn foreign_discipline_rule_adds_fixture_voids() {
        let mut doc = document();
        let settings = ConversionSettings::default().with_opening_rule(InsertRule::ForeignDiscipline);
        let mut pass = ConversionPass::new(&mut doc, &PrismKernel, settings);
        let wall = pass.convert(WALL).unwrap().unwrap();

        let member = pass.model().surface_member(wall).unwrap();
        assert_eq!(member.surfaces.opening_count(), 3);
        // the sleeve leaves a void but is not an opening object
        assert_eq!(member.openings.len(), 2);
    }

    #[test]
    fn repeated_requests_do_not_decompose_again() {
        let mut doc = document();
        let kernel = CountingKernel::default();
        let mut pass = ConversionPass::new(&mut doc, &kernel, ConversionSettings::default());

        let first = pass.convert(WALL).unwrap();
        let second = pass.convert(WALL).unwrap();
        assert_eq!(first, second);
        assert_eq!(kernel.splits.get(), 1);
        assert_eq!(pass.stats().decompositions, 1);
        assert!(pass.stats().cache.hits >= 1);
    }

    #[test]
    fn opening_and_host_resolve_each_other() {
        let mut doc = document();
        let mut pass = ConversionPass::new(&mut doc, &PrismKernel, ConversionSettings::default());
        let door = pass.convert(DOOR).unwrap().unwrap();
        let wall = pass.convert(WALL).unwrap().unwrap();

        let opening = pass.model().opening(door).unwrap();
        assert_eq!(opening.kind, OpeningKind::Door);
        assert_eq!(opening.host, Some(wall));
        assert_eq!(opening.location, Some(p(1.5, 0.0, 0.0)));
        assert!(pass.model().surface_member(wall).unwrap().openings.contains(&door));
        assert_eq!(pass.model().placeholder_count(), 0);
        assert_eq!(pass.stats().decompositions, 1);
    }

    #[test]
    fn materials_and_profiles_follow_grade_and_context() {
        let mut doc = document();
        let mut pass = ConversionPass::new(&mut doc, &PrismKernel, ConversionSettings::default());
        pass.convert_all([BEAM_A, BEAM_B, COLUMN]);
        let a = pass.convert(BEAM_A).unwrap().unwrap();
        let b = pass.convert(BEAM_B).unwrap().unwrap();
        let column = pass.convert(COLUMN).unwrap().unwrap();
        let model = pass.model();

        let (a, b, column) = (
            model.curve_member(a).unwrap(),
            model.curve_member(b).unwrap(),
            model.curve_member(column).unwrap(),
        );
        assert_eq!(a.material, b.material);
        assert_eq!(a.profile, b.profile);
        assert_ne!(a.material, column.material);
        assert_ne!(a.profile, column.profile);

        let profiles = model.iter().filter(|(_, o)| matches!(o, DomainObject::Profile(_))).count();
        let materials = model.iter().filter(|(_, o)| matches!(o, DomainObject::Material(_))).count();
        assert_eq!((profiles, materials), (2, 2));
        assert_eq!(model.profile(column.profile.unwrap()).unwrap().name, "IPE 300");
    }

    #[test]
    fn failures_are_isolated_per_element() {
        let mut doc = document();
        doc.add_element(
            ElementData::new(ElementKey(20), "unplaced wall", Category::Wall)
                .with_body(cuboid(p(0.0, 5.0, 0.0), p(4.0, 5.2, 3.0))),
        )
        .unwrap();
        doc.regenerate();
        let mut pass = ConversionPass::new(&mut doc, &PrismKernel, ConversionSettings::default());
        pass.convert_all([ElementKey(99), ElementKey(20), WALL]);
        let output = pass.finish();

        assert!(output.diagnostics.has(ElementKey(99), DiagnosticKind::ConversionFailed));
        assert!(output.diagnostics.has(
            ElementKey(20),
            DiagnosticKind::LocationNotFound(LocationFailure::GeometryUnresolved)
        ));
        assert!(output.diagnostics.for_element(WALL).next().is_none());
        let members = output
            .model
            .iter()
            .filter(|(_, o)| matches!(o, DomainObject::SurfaceMember(_)))
            .count();
        assert_eq!(members, 2);
    }
}
