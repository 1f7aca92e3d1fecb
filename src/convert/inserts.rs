use std::collections::BTreeSet;

use crate::document::{Document, ElementKey};

/// Decides which of a host's inserts become openings.
///
/// Inserts the rule selects are ignored when the host's baseline solid is
/// taken, so their voids are reported as openings. All other inserts are
/// treated as if they were not there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertRule {
    /// Doors, windows and pure voids.
    #[default]
    OpeningCategories,
    /// Inserts from a different discipline than the host.
    ForeignDiscipline,
}

impl InsertRule {
    /// The inserts of `host` this rule selects. Empty if the host is unknown.
    #[must_use]
    pub fn ignore_set(self, document: &Document, host: ElementKey) -> BTreeSet<ElementKey> {
        let Some(host_data) = document.element_by_key(host) else {
            return BTreeSet::new();
        };
        document
            .inserts_of(host)
            .into_iter()
            .filter(|key| {
                document.element_by_key(*key).is_some_and(|insert| match self {
                    InsertRule::OpeningCategories => insert.category.is_opening(),
                    InsertRule::ForeignDiscipline => insert.discipline != host_data.discipline,
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::document::{Category, Discipline, ElementData};
    use crate::kernel::Solid;
    use crate::math::Point3;

    fn document() -> Document {
        let mut doc = Document::new();
        let cut = || Solid::cuboid(Point3::new(1.0, -0.1, 1.0), Point3::new(2.0, 0.4, 2.0)).unwrap();
        doc.add_element(ElementData::new(ElementKey(1), "wall", Category::Wall).with_discipline(Discipline::Structural))
            .unwrap();
        doc.add_element(ElementData::new(ElementKey(2), "window", Category::Window).hosted_by(ElementKey(1), cut()))
            .unwrap();
        doc.add_element(
            ElementData::new(ElementKey(3), "sleeve", Category::Fixture)
                .with_discipline(Discipline::Mechanical)
                .hosted_by(ElementKey(1), cut()),
        )
        .unwrap();
        doc.add_element(
            ElementData::new(ElementKey(4), "anchor", Category::Fixture)
                .with_discipline(Discipline::Structural)
                .hosted_by(ElementKey(1), cut()),
        )
        .unwrap();
        doc
    }

    #[test]
    fn opening_categories_select_doors_and_windows() {
        let doc = document();
        let ignore = InsertRule::OpeningCategories.ignore_set(&doc, ElementKey(1));
        assert_eq!(ignore.into_iter().collect::<Vec<_>>(), vec![ElementKey(2)]);
    }

    #[test]
    fn foreign_discipline_selects_other_trades() {
        let doc = document();
        let ignore = InsertRule::ForeignDiscipline.ignore_set(&doc, ElementKey(1));
        assert_eq!(ignore.into_iter().collect::<Vec<_>>(), vec![ElementKey(2), ElementKey(3)]);
        assert!(InsertRule::ForeignDiscipline.ignore_set(&doc, ElementKey(9)).is_empty());
    }
}
