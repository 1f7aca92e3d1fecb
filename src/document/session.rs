use tracing::{debug, warn};

use crate::error::Result;
use crate::kernel::Solid;

use super::{Document, ElementData, ElementHandle, ElementKey, ScopeId};

/// A scoped set of tentative document edits.
///
/// Edits made through a session are journaled in its scope. The scope ends
/// in exactly one of three ways: [`commit`](Self::commit),
/// [`rollback`](Self::rollback), or being dropped, which rolls back. Rollback
/// never fails from the caller's point of view; undo failures are logged.
///
/// Sessions nest. [`nested`](Self::nested) borrows the parent mutably, so the
/// inner scope must end before the outer one can be used again.
///
/// ```
/// use bimsurf::document::{Category, Document, ElementData, ElementKey, MutationSession};
///
/// let mut doc = Document::new();
/// doc.add_element(ElementData::new(ElementKey(1), "wall", Category::Wall)).unwrap();
///
/// let mut session = MutationSession::begin(&mut doc, "probe");
/// session.remove(&[ElementKey(1)]).unwrap();
/// assert!(!session.document().contains(ElementKey(1)));
/// drop(session);
///
/// assert!(doc.contains(ElementKey(1)));
/// ```
#[derive(Debug)]
pub struct MutationSession<'d> {
    document: &'d mut Document,
    scope: ScopeId,
    finished: bool,
}

impl<'d> MutationSession<'d> {
    /// Opens a new scope on `document`.
    pub fn begin(document: &'d mut Document, label: &str) -> Self {
        let scope = document.begin_scope(label);
        debug!(scope = %scope, label, depth = document.scope_depth(), "began mutation session");
        Self {
            document,
            scope,
            finished: false,
        }
    }

    /// Opens a scope nested inside this one.
    pub fn nested(&mut self, label: &str) -> MutationSession<'_> {
        MutationSession::begin(self.document, label)
    }

    #[must_use]
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        self.document
    }

    /// Acquires a handle bound to this session's scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the element does not exist.
    pub fn acquire(&self, key: ElementKey) -> Result<ElementHandle> {
        self.document.acquire(key)
    }

    /// # Errors
    ///
    /// Returns an error if the handle is stale.
    pub fn element(&self, handle: ElementHandle) -> Result<&ElementData> {
        self.document.element(handle)
    }

    /// # Errors
    ///
    /// Returns an error if the handle is stale or geometry is out of date.
    pub fn solids(&self, handle: ElementHandle) -> Result<Vec<Solid>> {
        self.document.solids(handle)
    }

    /// # Errors
    ///
    /// Returns an error if any key is unknown.
    pub fn remove(&mut self, keys: &[ElementKey]) -> Result<()> {
        self.document.remove(keys)
    }

    /// # Errors
    ///
    /// Returns an error if the elements are not joined.
    pub fn unjoin(&mut self, a: ElementKey, b: ElementKey) -> Result<()> {
        self.document.unjoin(a, b)
    }

    /// Regenerates element geometry; see [`Document::regenerate`].
    pub fn regenerate(&mut self) {
        self.document.regenerate();
    }

    /// Ends the scope, keeping its edits.
    ///
    /// # Errors
    ///
    /// Returns an error if this scope is not the innermost open scope.
    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.document.commit_scope(self.scope)
    }

    /// Ends the scope, undoing its edits.
    pub fn rollback(mut self) {
        self.finish_rollback();
    }

    /// Ends the scope, rolling back if `discard` is set and committing
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error only if a commit fails.
    pub fn end(self, discard: bool) -> Result<()> {
        if discard {
            self.rollback();
            Ok(())
        } else {
            self.commit()
        }
    }

    fn finish_rollback(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Err(err) = self.document.rollback_scope(self.scope) {
            warn!(scope = %self.scope, error = %err, "rollback incomplete");
        }
    }
}

impl Drop for MutationSession<'_> {
    fn drop(&mut self) {
        self.finish_rollback();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::document::Category;
    use crate::error::{BimsurfError, DocumentError};
    use crate::math::Point3;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn document() -> Document {
        let mut doc = Document::new();
        doc.add_element(
            ElementData::new(ElementKey(1), "wall", Category::Wall)
                .with_body(Solid::cuboid(p(0.0, 0.0, 0.0), p(10.0, 0.3, 3.0)).unwrap()),
        )
        .unwrap();
        doc.add_element(
            ElementData::new(ElementKey(2), "door", Category::Door)
                .hosted_by(ElementKey(1), Solid::cuboid(p(1.0, -0.1, 0.0), p(2.0, 0.4, 2.1)).unwrap()),
        )
        .unwrap();
        doc.add_element(
            ElementData::new(ElementKey(3), "floor", Category::Floor)
                .with_body(Solid::cuboid(p(-1.0, -1.0, -0.2), p(11.0, 5.0, 0.0)).unwrap()),
        )
        .unwrap();
        doc.join(ElementKey(3), ElementKey(1)).unwrap();
        doc.regenerate();
        doc
    }

    #[test]
    fn drop_rolls_back_everything() {
        let mut doc = document();
        let before = doc.snapshot();
        {
            let mut session = MutationSession::begin(&mut doc, "probe");
            session.unjoin(ElementKey(1), ElementKey(3)).unwrap();
            session.remove(&[ElementKey(2)]).unwrap();
            session.regenerate();
            assert_eq!(session.document().len(), 2);
        }
        assert_eq!(doc.snapshot(), before);
        assert_eq!(doc.scope_depth(), 0);
    }

    #[test]
    fn commit_keeps_edits() {
        let mut doc = document();
        let mut session = MutationSession::begin(&mut doc, "keep");
        session.remove(&[ElementKey(2)]).unwrap();
        session.commit().unwrap();
        assert!(!doc.contains(ElementKey(2)));
        assert!(doc.is_dirty());
    }

    #[test]
    fn nested_commit_is_undone_by_outer_rollback() {
        let mut doc = document();
        let before = doc.snapshot();
        let mut outer = MutationSession::begin(&mut doc, "outer");
        {
            let mut inner = outer.nested("inner");
            inner.remove(&[ElementKey(2)]).unwrap();
            inner.end(false).unwrap();
        }
        assert!(!outer.document().contains(ElementKey(2)));
        outer.rollback();
        assert_eq!(doc.snapshot(), before);
    }

    #[test]
    fn nested_rollback_leaves_outer_edits() {
        let mut doc = document();
        let mut outer = MutationSession::begin(&mut doc, "outer");
        outer.unjoin(ElementKey(1), ElementKey(3)).unwrap();
        {
            let mut inner = outer.nested("inner");
            inner.remove(&[ElementKey(1), ElementKey(2)]).unwrap();
        }
        assert!(outer.document().contains(ElementKey(1)));
        assert!(!outer.document().are_joined(ElementKey(1), ElementKey(3)));
        outer.commit().unwrap();
        assert!(!doc.are_joined(ElementKey(1), ElementKey(3)));
    }

    #[test]
    fn handles_do_not_outlive_their_scope() {
        let mut doc = document();
        let mut outer = MutationSession::begin(&mut doc, "outer");
        let wall = outer.acquire(ElementKey(1)).unwrap();
        let inner_handle = {
            let mut inner = outer.nested("inner");
            let handle = inner.acquire(ElementKey(3)).unwrap();
            assert!(inner.element(handle).is_ok());
            inner.remove(&[ElementKey(1)]).unwrap();
            handle
        };
        assert!(matches!(
            outer.element(inner_handle),
            Err(BimsurfError::Document(DocumentError::StaleHandle(ElementKey(3))))
        ));
        // restored by rollback into a new slot
        assert!(outer.element(wall).is_err());
        let wall = outer.acquire(ElementKey(1)).unwrap();
        assert_eq!(outer.element(wall).unwrap().name, "wall");
    }
}
