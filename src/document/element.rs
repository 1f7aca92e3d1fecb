use std::fmt;

use crate::decompose::ReferencePlane;
use crate::kernel::Solid;
use crate::math::Point3;

/// Stable identifier of an element, unique within its document.
///
/// Unlike an [`ElementHandle`](super::ElementHandle), a key survives
/// removal and restoration of the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey(pub i64);

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What kind of building element an element is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Wall,
    Floor,
    Roof,
    Beam,
    Column,
    Door,
    Window,
    /// A pure void cut into a host.
    Opening,
    /// An embedded fixture such as a sleeve or anchor plate.
    Fixture,
    Material,
}

impl Category {
    /// Categories whose inserts leave a hole in the host.
    #[must_use]
    pub fn is_opening(self) -> bool {
        matches!(self, Category::Door | Category::Window | Category::Opening)
    }
}

/// Analytical discipline an element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Discipline {
    #[default]
    Architectural,
    Structural,
    Mechanical,
}

/// Placement of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// Surface elements: the plane their boundary is reported in.
    Surface(ReferencePlane),
    /// Linear elements: start and end of the axis.
    Curve { start: Point3, end: Point3 },
    /// Hosted elements: insertion point.
    Point(Point3),
}

/// Reference from an element to its material, with an optional grade.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialRef {
    pub element: ElementKey,
    pub grade: Option<String>,
}

/// Cross-section type of a linear element.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRef {
    /// Key of the section type shared by all elements of this type.
    pub type_key: ElementKey,
    pub name: String,
    pub width: f64,
    pub depth: f64,
}

/// Data stored for one element in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub key: ElementKey,
    pub name: String,
    pub category: Category,
    pub discipline: Discipline,
    /// Own volume before cuts and joins; `None` if the element has no geometry.
    pub body: Option<Solid>,
    /// Host element this element is inserted into.
    pub host: Option<ElementKey>,
    /// Void this insert cuts from its host.
    pub cut: Option<Solid>,
    pub location: Option<Location>,
    pub material: Option<MaterialRef>,
    pub section: Option<SectionRef>,
}

impl ElementData {
    #[must_use]
    pub fn new(key: ElementKey, name: impl Into<String>, category: Category) -> Self {
        Self {
            key,
            name: name.into(),
            category,
            discipline: Discipline::default(),
            body: None,
            host: None,
            cut: None,
            location: None,
            material: None,
            section: None,
        }
    }

    #[must_use]
    pub fn with_discipline(mut self, discipline: Discipline) -> Self {
        self.discipline = discipline;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Solid) -> Self {
        self.body = Some(body);
        self
    }

    /// Inserts this element into `host`, cutting `cut` from it.
    #[must_use]
    pub fn hosted_by(mut self, host: ElementKey, cut: Solid) -> Self {
        self.host = Some(host);
        self.cut = Some(cut);
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn with_material(mut self, element: ElementKey, grade: Option<&str>) -> Self {
        self.material = Some(MaterialRef {
            element,
            grade: grade.map(str::to_owned),
        });
        self
    }

    #[must_use]
    pub fn with_section(mut self, section: SectionRef) -> Self {
        self.section = Some(section);
        self
    }
}
