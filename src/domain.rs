//! The application-independent structural model produced by a conversion pass.

use slotmap::{new_key_type, SlotMap};

use crate::cache::SourceKind;
use crate::document::ElementKey;
use crate::geometry::SurfaceMap;
use crate::math::Point3;

new_key_type! {
    /// Identifier of an object in a [`StructuralModel`].
    pub struct ObjectId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Wall,
    Floor,
    Roof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    Beam,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpeningKind {
    Door,
    Window,
    Void,
}

/// A planar structural member bounded by decomposed surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMember {
    pub source: ElementKey,
    pub name: String,
    pub kind: SurfaceKind,
    /// Outer boundaries with their openings; empty if the location could not
    /// be resolved.
    pub surfaces: SurfaceMap,
    pub material: Option<ObjectId>,
    pub openings: Vec<ObjectId>,
}

/// A linear structural member.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveMember {
    pub source: ElementKey,
    pub name: String,
    pub kind: CurveKind,
    /// Start and end of the member axis, if known.
    pub axis: Option<(Point3, Point3)>,
    pub profile: Option<ObjectId>,
    pub material: Option<ObjectId>,
}

/// An opening in a host member.
#[derive(Debug, Clone, PartialEq)]
pub struct Opening {
    pub source: ElementKey,
    pub name: String,
    pub kind: OpeningKind,
    pub host: Option<ObjectId>,
    pub location: Option<Point3>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub source: ElementKey,
    pub name: String,
    pub grade: Option<String>,
}

impl Material {
    /// Name and grade, e.g. `"Concrete C30/37"`.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.grade {
            Some(grade) => format!("{} {grade}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A cross-section built against one material.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub source: ElementKey,
    pub name: String,
    pub width: f64,
    pub depth: f64,
    pub material: Option<ObjectId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomainObject {
    /// Reserved for an object whose conversion is still in progress.
    Placeholder(SourceKind),
    SurfaceMember(SurfaceMember),
    CurveMember(CurveMember),
    Opening(Opening),
    Material(Material),
    Profile(Profile),
}

impl DomainObject {
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, DomainObject::Placeholder(_))
    }
}

/// Arena of converted objects.
#[derive(Debug, Clone, Default)]
pub struct StructuralModel {
    objects: SlotMap<ObjectId, DomainObject>,
}

impl StructuralModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: DomainObject) -> ObjectId {
        self.objects.insert(object)
    }

    /// Reserves an id for an object that will be filled in later.
    pub fn reserve(&mut self, kind: SourceKind) -> ObjectId {
        self.objects.insert(DomainObject::Placeholder(kind))
    }

    /// Replaces the object behind `id`, returning the previous one.
    pub fn fill(&mut self, id: ObjectId, object: DomainObject) -> Option<DomainObject> {
        self.objects.get_mut(id).map(|slot| std::mem::replace(slot, object))
    }

    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&DomainObject> {
        self.objects.get(id)
    }

    #[must_use]
    pub fn surface_member(&self, id: ObjectId) -> Option<&SurfaceMember> {
        match self.objects.get(id)? {
            DomainObject::SurfaceMember(member) => Some(member),
            _ => None,
        }
    }

    #[must_use]
    pub fn curve_member(&self, id: ObjectId) -> Option<&CurveMember> {
        match self.objects.get(id)? {
            DomainObject::CurveMember(member) => Some(member),
            _ => None,
        }
    }

    #[must_use]
    pub fn opening(&self, id: ObjectId) -> Option<&Opening> {
        match self.objects.get(id)? {
            DomainObject::Opening(opening) => Some(opening),
            _ => None,
        }
    }

    #[must_use]
    pub fn material(&self, id: ObjectId) -> Option<&Material> {
        match self.objects.get(id)? {
            DomainObject::Material(material) => Some(material),
            _ => None,
        }
    }

    #[must_use]
    pub fn profile(&self, id: ObjectId) -> Option<&Profile> {
        match self.objects.get(id)? {
            DomainObject::Profile(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &DomainObject)> {
        self.objects.iter()
    }

    /// Number of objects still reserved but never filled.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.objects.values().filter(|o| o.is_placeholder()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn reserve_then_fill() {
        let mut model = StructuralModel::new();
        let id = model.reserve(SourceKind::Material);
        assert_eq!(model.placeholder_count(), 1);
        assert!(model.material(id).is_none());

        let previous = model.fill(
            id,
            DomainObject::Material(Material {
                source: ElementKey(5),
                name: "Concrete".into(),
                grade: Some("C30/37".into()),
            }),
        );
        assert_eq!(previous, Some(DomainObject::Placeholder(SourceKind::Material)));
        assert_eq!(model.placeholder_count(), 0);
        assert_eq!(model.material(id).unwrap().label(), "Concrete C30/37");
        assert_eq!(model.len(), 1);
    }
}
