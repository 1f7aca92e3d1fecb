use tracing::debug;

use crate::cache::{SourceKey, SourceKind};
use crate::diagnostics::{Diagnostic, LocationFailure};
use crate::document::{Category, ElementKey, Location};
use crate::domain::{CurveKind, CurveMember, DomainObject, ObjectId};
use crate::error::Result;

use super::ConversionPass;

impl ConversionPass<'_> {
    /// Converts a beam or column with its material and profile.
    pub(super) fn convert_curve_member(&mut self, key: ElementKey) -> Result<ObjectId> {
        let source = SourceKey::element(SourceKind::CurveMember, key);
        if let Some(id) = self.cache.try_get(&source, None)? {
            return Ok(id);
        }

        let data = self.element(key)?;
        let axis = if let Some(Location::Curve { start, end }) = &data.location {
            Some((*start, *end))
        } else {
            self.diagnostics.report(Diagnostic::location_not_found(
                key,
                LocationFailure::GeometryUnresolved,
                "element has no axis",
            ));
            None
        };

        let material = match &data.material {
            Some(material) => Some(self.convert_material(material.element, material.grade.as_deref())?),
            None => None,
        };
        let profile = match &data.section {
            Some(section) => Some(self.convert_profile(section, material)?),
            None => None,
        };

        let kind = match data.category {
            Category::Column => CurveKind::Column,
            _ => CurveKind::Beam,
        };
        let id = self.model.insert(DomainObject::CurveMember(CurveMember {
            source: key,
            name: data.name,
            kind,
            axis,
            profile,
            material,
        }));
        self.cache.put(source, None, id)?;
        debug!(element = %key, ?kind, "converted curve member");
        Ok(id)
    }
}
