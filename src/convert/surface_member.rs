use tracing::debug;

use crate::cache::{SourceKey, SourceKind};
use crate::decompose::{DecompositionRequest, SurfaceDecomposer};
use crate::diagnostics::{Diagnostic, LocationFailure};
use crate::document::{Category, ElementData, ElementKey, Location};
use crate::domain::{DomainObject, ObjectId, SurfaceKind, SurfaceMember};
use crate::error::Result;
use crate::geometry::SurfaceMap;

use super::ConversionPass;

impl ConversionPass<'_> {
    /// Converts a wall, floor or roof.
    ///
    /// The member is registered before its openings are converted, since
    /// every opening converts its host in turn.
    pub(super) fn convert_surface_member(&mut self, key: ElementKey) -> Result<ObjectId> {
        let source = SourceKey::element(SourceKind::SurfaceMember, key);
        if let Some(id) = self.cache.try_get(&source, None)? {
            return Ok(id);
        }

        let data = self.element(key)?;
        let surfaces = self.decompose_location(&data);
        let material = match &data.material {
            Some(material) => Some(self.convert_material(material.element, material.grade.as_deref())?),
            None => None,
        };

        let id = self.model.reserve(SourceKind::SurfaceMember);
        self.cache.put(source, None, id)?;

        let mut openings = Vec::new();
        for insert in self.settings.opening_rule.ignore_set(self.document, key) {
            let is_opening = self
                .document
                .element_by_key(insert)
                .is_some_and(|d| d.category.is_opening());
            if !is_opening {
                continue;
            }
            match self.convert_opening(insert) {
                Ok(opening) => openings.push(opening),
                Err(err) => self
                    .diagnostics
                    .report(Diagnostic::conversion_failed(insert, err.to_string())),
            }
        }

        let kind = match data.category {
            Category::Floor => SurfaceKind::Floor,
            Category::Roof => SurfaceKind::Roof,
            _ => SurfaceKind::Wall,
        };
        debug!(
            element = %key,
            surfaces = surfaces.len(),
            openings = openings.len(),
            "converted surface member"
        );
        self.model.fill(
            id,
            DomainObject::SurfaceMember(SurfaceMember {
                source: key,
                name: data.name,
                kind,
                surfaces,
                material,
                openings,
            }),
        );
        Ok(id)
    }

    fn decompose_location(&mut self, data: &ElementData) -> SurfaceMap {
        let Some(Location::Surface(reference)) = &data.location else {
            self.diagnostics.report(Diagnostic::location_not_found(
                data.key,
                LocationFailure::GeometryUnresolved,
                "element has no reference plane",
            ));
            return SurfaceMap::new();
        };

        let ignore = self.settings.opening_rule.ignore_set(self.document, data.key);
        let request =
            match DecompositionRequest::with_settings(data.key, reference.clone(), &self.settings.decomposition) {
                Ok(request) => request.ignoring(ignore),
                Err(err) => {
                    self.diagnostics.report(Diagnostic::location_not_found(
                        data.key,
                        LocationFailure::GeometryUnresolved,
                        err.to_string(),
                    ));
                    return SurfaceMap::new();
                }
            };

        self.decompositions += 1;
        SurfaceDecomposer::new(self.kernel).decompose(self.document, &request, &mut self.diagnostics)
    }
}
