use tracing::debug;

use crate::cache::{SourceKey, SourceKind};
use crate::diagnostics::Diagnostic;
use crate::document::{Category, ElementKey, Location};
use crate::domain::{DomainObject, ObjectId, Opening, OpeningKind};
use crate::error::Result;
use crate::math::Point3;

use super::ConversionPass;

impl ConversionPass<'_> {
    /// Converts a door, window or void, together with its host.
    pub(super) fn convert_opening(&mut self, key: ElementKey) -> Result<ObjectId> {
        let source = SourceKey::element(SourceKind::Opening, key);
        if let Some(id) = self.cache.try_get(&source, None)? {
            return Ok(id);
        }

        let data = self.element(key)?;
        let id = self.model.reserve(SourceKind::Opening);
        self.cache.put(source, None, id)?;

        let host = match data.host {
            Some(host) => match self.convert(host) {
                Ok(host) => host,
                Err(err) => {
                    self.diagnostics
                        .report(Diagnostic::conversion_failed(host, err.to_string()));
                    None
                }
            },
            None => None,
        };

        let location = match &data.location {
            Some(Location::Point(point)) => Some(*point),
            _ => data
                .cut
                .as_ref()
                .and_then(|cut| cut.bounding_box())
                .map(|bounds| Point3::from((bounds.min.coords + bounds.max.coords) * 0.5)),
        };
        let kind = match data.category {
            Category::Door => OpeningKind::Door,
            Category::Window => OpeningKind::Window,
            _ => OpeningKind::Void,
        };

        debug!(element = %key, hosted = host.is_some(), "converted opening");
        self.model.fill(
            id,
            DomainObject::Opening(Opening {
                source: key,
                name: data.name,
                kind,
                host,
                location,
            }),
        );
        Ok(id)
    }
}
