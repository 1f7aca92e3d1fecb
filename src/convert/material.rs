use tracing::trace;

use crate::cache::{SourceKey, SourceKind};
use crate::document::{ElementKey, SectionRef};
use crate::domain::{DomainObject, Material, ObjectId, Profile};
use crate::error::Result;

use super::ConversionPass;

/// Context discriminator for profiles of members without a material.
const UNASSIGNED_MATERIAL: &str = "<unassigned>";

impl ConversionPass<'_> {
    /// Converts a material element, once per grade.
    pub(super) fn convert_material(&mut self, element: ElementKey, grade: Option<&str>) -> Result<ObjectId> {
        let source = match grade {
            Some(grade) => SourceKey::variant(SourceKind::Material, element, grade),
            None => SourceKey::element(SourceKind::Material, element),
        };
        if let Some(id) = self.cache.try_get(&source, None)? {
            return Ok(id);
        }

        let data = self.element(element)?;
        let id = self.model.insert(DomainObject::Material(Material {
            source: element,
            name: data.name,
            grade: grade.map(str::to_owned),
        }));
        self.cache.put(source, None, id)?;
        trace!(element = %element, ?grade, "converted material");
        Ok(id)
    }

    /// Converts a section type, once per material it is used with.
    pub(super) fn convert_profile(&mut self, section: &SectionRef, material: Option<ObjectId>) -> Result<ObjectId> {
        let context = material
            .and_then(|id| self.model.material(id))
            .map_or_else(|| UNASSIGNED_MATERIAL.to_owned(), Material::label);
        let source = SourceKey::element(SourceKind::Profile, section.type_key);
        if let Some(id) = self.cache.try_get(&source, Some(&context))? {
            return Ok(id);
        }

        let id = self.model.insert(DomainObject::Profile(Profile {
            source: section.type_key,
            name: section.name.clone(),
            width: section.width,
            depth: section.depth,
            material,
        }));
        self.cache.put(source, Some(&context), id)?;
        trace!(section = %section.name, %context, "converted profile");
        Ok(id)
    }
}
