//! The shared element document.
//!
//! A [`Document`] owns every element of a building model together with the
//! geometric joins between them and the regenerated solids of each element.
//! Edits made while a mutation scope is open are journaled so that the
//! scope can be rolled back; see [`MutationSession`].

mod element;
mod journal;
mod session;

pub use element::{Category, Discipline, ElementData, ElementKey, Location, MaterialRef, SectionRef};
pub use journal::{Join, ScopeId};
pub use session::MutationSession;

use std::collections::{BTreeSet, HashMap};

use slotmap::{new_key_type, SlotMap};
use tracing::{debug, trace, warn};

use crate::error::{BimsurfError, DocumentError, Result};
use crate::kernel::{self, Solid};

use journal::{Edit, ScopeFrame};

new_key_type! {
    /// Arena slot of a live element.
    pub struct ElementSlot;
}

/// A live reference to an element, valid within the scope it was acquired in.
///
/// A handle goes stale when its scope ends or when the element it points to
/// is removed. Removing and then restoring an element (for example through a
/// rollback) gives it a new slot, so handles from before are stale too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    slot: ElementSlot,
    key: ElementKey,
    scope: ScopeId,
}

impl ElementHandle {
    #[must_use]
    pub fn key(&self) -> ElementKey {
        self.key
    }

    #[must_use]
    pub fn scope(&self) -> ScopeId {
        self.scope
    }
}

/// Observable document state, for comparing before and after a rollback.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub elements: Vec<ElementData>,
    pub joins: Vec<Join>,
    pub geometry: Vec<(ElementKey, Vec<Solid>)>,
    pub failed: Vec<(ElementKey, String)>,
    pub dirty: bool,
}

/// Arena of building elements with journaled, scoped mutation.
#[derive(Debug, Default)]
pub struct Document {
    elements: SlotMap<ElementSlot, ElementData>,
    index: HashMap<ElementKey, ElementSlot>,
    joins: BTreeSet<Join>,
    geometry: HashMap<ElementKey, Vec<Solid>>,
    failed: HashMap<ElementKey, String>,
    dirty: bool,
    scopes: Vec<ScopeFrame>,
    next_scope: u64,
}

impl Document {
    /// Creates a new, empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Element operations ---

    /// Adds an element and returns its key.
    ///
    /// # Errors
    ///
    /// Returns an error if an element with the same key already exists.
    pub fn add_element(&mut self, data: ElementData) -> Result<ElementKey> {
        let key = data.key;
        if self.index.contains_key(&key) {
            return Err(DocumentError::DuplicateElement(key).into());
        }
        let slot = self.elements.insert(data);
        self.index.insert(key, slot);
        self.record(Edit::Added(key));
        self.dirty = true;
        Ok(key)
    }

    /// Removes elements together with every join they take part in.
    ///
    /// # Errors
    ///
    /// Returns an error if any key is unknown. Nothing is removed in that case.
    pub fn remove(&mut self, keys: &[ElementKey]) -> Result<()> {
        if let Some(missing) = keys.iter().find(|key| !self.index.contains_key(key)) {
            return Err(DocumentError::ElementNotFound(*missing).into());
        }
        for key in keys {
            let involved: Vec<Join> = self.joins.iter().filter(|j| j.involves(*key)).copied().collect();
            for join in involved {
                self.joins.remove(&join);
                self.record(Edit::Unjoined(join));
            }
            let Some(slot) = self.index.remove(key) else {
                continue;
            };
            if let Some(data) = self.elements.remove(slot) {
                self.record(Edit::Removed(Box::new(data)));
            }
        }
        if !keys.is_empty() {
            trace!(count = keys.len(), "removed elements");
            self.dirty = true;
        }
        Ok(())
    }

    /// Acquires a handle to a live element, bound to the innermost open scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the element does not exist.
    pub fn acquire(&self, key: ElementKey) -> Result<ElementHandle> {
        let slot = self
            .index
            .get(&key)
            .copied()
            .ok_or(DocumentError::ElementNotFound(key))?;
        Ok(ElementHandle {
            slot,
            key,
            scope: self.current_scope(),
        })
    }

    /// Returns the element behind a handle.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::StaleHandle`] if the handle's scope has ended
    /// or the element was removed.
    pub fn element(&self, handle: ElementHandle) -> Result<&ElementData> {
        if !self.is_scope_open(handle.scope) {
            return Err(DocumentError::StaleHandle(handle.key).into());
        }
        self.elements
            .get(handle.slot)
            .ok_or_else(|| DocumentError::StaleHandle(handle.key).into())
    }

    /// Looks an element up by its key.
    #[must_use]
    pub fn element_by_key(&self, key: ElementKey) -> Option<&ElementData> {
        self.index.get(&key).and_then(|slot| self.elements.get(*slot))
    }

    #[must_use]
    pub fn contains(&self, key: ElementKey) -> bool {
        self.index.contains_key(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Keys of all live elements, in ascending order.
    #[must_use]
    pub fn keys(&self) -> Vec<ElementKey> {
        let mut keys: Vec<ElementKey> = self.index.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Live elements hosted by `host`, in ascending key order.
    #[must_use]
    pub fn inserts_of(&self, host: ElementKey) -> Vec<ElementKey> {
        let mut inserts: Vec<ElementKey> = self
            .elements
            .values()
            .filter(|data| data.host == Some(host))
            .map(|data| data.key)
            .collect();
        inserts.sort_unstable();
        inserts
    }

    // --- Join operations ---

    /// Joins two elements so that `cutter`'s body is subtracted from `cut`.
    ///
    /// # Errors
    ///
    /// Returns an error if either element does not exist.
    pub fn join(&mut self, cutter: ElementKey, cut: ElementKey) -> Result<()> {
        for key in [cutter, cut] {
            if !self.contains(key) {
                return Err(DocumentError::ElementNotFound(key).into());
            }
        }
        let join = Join { cutter, cut };
        if self.joins.insert(join) {
            self.record(Edit::Joined(join));
            self.dirty = true;
        }
        Ok(())
    }

    /// Removes the join between `a` and `b`, in either direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the two elements are not joined.
    pub fn unjoin(&mut self, a: ElementKey, b: ElementKey) -> Result<()> {
        let found = [Join { cutter: a, cut: b }, Join { cutter: b, cut: a }]
            .into_iter()
            .filter(|join| self.joins.contains(join))
            .collect::<Vec<_>>();
        if found.is_empty() {
            return Err(DocumentError::NotJoined(a, b).into());
        }
        for join in found {
            self.joins.remove(&join);
            self.record(Edit::Unjoined(join));
        }
        self.dirty = true;
        Ok(())
    }

    /// Elements joined with `key` in either direction, in ascending order.
    #[must_use]
    pub fn joined_with(&self, key: ElementKey) -> Vec<ElementKey> {
        let mut others: Vec<ElementKey> = self.joins.iter().filter_map(|j| j.other(key)).collect();
        others.sort_unstable();
        others.dedup();
        others
    }

    #[must_use]
    pub fn are_joined(&self, a: ElementKey, b: ElementKey) -> bool {
        self.joins.contains(&Join { cutter: a, cut: b }) || self.joins.contains(&Join { cutter: b, cut: a })
    }

    // --- Geometry ---

    /// Recomputes the solids of every element from bodies, insert cuts and
    /// joins.
    ///
    /// An element's solid is its body minus the cuts of its live inserts and
    /// minus the bodies of the elements joined as cutters into it. Elements
    /// are regenerated independently: one whose booleans fail gets no
    /// geometry and its failure is kept for [`solids`](Self::solids), while
    /// every other element is still regenerated.
    pub fn regenerate(&mut self) {
        let mut geometry = HashMap::with_capacity(self.elements.len());
        let mut failed = HashMap::new();
        for data in self.elements.values() {
            let Some(body) = &data.body else {
                continue;
            };
            match self.regenerate_element(data.key, body) {
                Ok(solid) => {
                    let solids = if solid.is_empty() { Vec::new() } else { vec![solid] };
                    geometry.insert(data.key, solids);
                }
                Err(err) => {
                    warn!(element = %data.key, error = %err, "element geometry unavailable");
                    failed.insert(data.key, err.to_string());
                }
            }
        }

        let previous = std::mem::replace(&mut self.geometry, geometry);
        let previous_failed = std::mem::replace(&mut self.failed, failed);
        let was_dirty = std::mem::replace(&mut self.dirty, false);
        self.record(Edit::Regenerated {
            geometry: previous,
            failed: previous_failed,
            dirty: was_dirty,
        });
        debug!(
            elements = self.elements.len(),
            failed = self.failed.len(),
            "regenerated document"
        );
    }

    fn regenerate_element(&self, key: ElementKey, body: &Solid) -> Result<Solid> {
        let mut solid = body.clone();
        for insert in self.inserts_of(key) {
            if let Some(cut) = self.element_by_key(insert).and_then(|d| d.cut.as_ref()) {
                solid = kernel::subtract(solid, cut)?;
            }
        }
        for join in self.joins.iter().filter(|j| j.cut == key) {
            if let Some(cutter) = self.element_by_key(join.cutter).and_then(|d| d.body.as_ref()) {
                solid = kernel::subtract(solid, cutter)?;
            }
        }
        Ok(solid)
    }

    /// Returns `true` if elements changed since the last regeneration.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The regenerated solids of an element.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale, the document has pending
    /// edits that were not regenerated, or this element's own geometry
    /// failed to regenerate.
    pub fn solids(&self, handle: ElementHandle) -> Result<Vec<Solid>> {
        let data = self.element(handle)?;
        if self.dirty {
            return Err(DocumentError::NotRegenerated.into());
        }
        if let Some(reason) = self.failed.get(&data.key) {
            return Err(DocumentError::GeometryUnavailable {
                element: data.key,
                reason: reason.clone(),
            }
            .into());
        }
        Ok(self.geometry.get(&data.key).cloned().unwrap_or_default())
    }

    /// Captures the observable state of the document.
    #[must_use]
    pub fn snapshot(&self) -> DocumentSnapshot {
        let mut elements: Vec<ElementData> = self.elements.values().cloned().collect();
        elements.sort_unstable_by_key(|data| data.key);
        let mut geometry: Vec<(ElementKey, Vec<Solid>)> =
            self.geometry.iter().map(|(key, solids)| (*key, solids.clone())).collect();
        geometry.sort_unstable_by_key(|(key, _)| *key);
        let mut failed: Vec<(ElementKey, String)> =
            self.failed.iter().map(|(key, reason)| (*key, reason.clone())).collect();
        failed.sort_unstable_by_key(|(key, _)| *key);
        DocumentSnapshot {
            elements,
            joins: self.joins.iter().copied().collect(),
            geometry,
            failed,
            dirty: self.dirty,
        }
    }

    // --- Scopes ---

    /// Number of open mutation scopes.
    #[must_use]
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    fn current_scope(&self) -> ScopeId {
        self.scopes.last().map_or(ScopeId::ROOT, |frame| frame.id)
    }

    fn is_scope_open(&self, scope: ScopeId) -> bool {
        scope == ScopeId::ROOT || self.scopes.iter().any(|frame| frame.id == scope)
    }

    fn record(&mut self, edit: Edit) {
        if let Some(frame) = self.scopes.last_mut() {
            frame.edits.push(edit);
        }
    }

    pub(crate) fn begin_scope(&mut self, label: &str) -> ScopeId {
        self.next_scope += 1;
        let id = ScopeId(self.next_scope);
        self.scopes.push(ScopeFrame {
            id,
            label: label.to_owned(),
            dirty_at_begin: self.dirty,
            edits: Vec::new(),
        });
        id
    }

    fn pop_scope(&mut self, id: ScopeId) -> Result<ScopeFrame> {
        match self.scopes.last().map(|frame| frame.id) {
            None => Err(DocumentError::NoOpenScope.into()),
            Some(top) if top != id => Err(DocumentError::ScopeMismatch {
                expected: top.0,
                found: id.0,
            }
            .into()),
            Some(_) => self.scopes.pop().ok_or_else(|| DocumentError::NoOpenScope.into()),
        }
    }

    /// Closes the innermost scope, keeping its edits.
    ///
    /// Edits move into the enclosing scope, so rolling that back undoes them
    /// too. At the outermost level they become permanent.
    pub(crate) fn commit_scope(&mut self, id: ScopeId) -> Result<()> {
        let frame = self.pop_scope(id)?;
        trace!(scope = %frame.id, label = %frame.label, edits = frame.edits.len(), "committed scope");
        if let Some(parent) = self.scopes.last_mut() {
            parent.edits.extend(frame.edits);
        }
        Ok(())
    }

    /// Closes the innermost scope, undoing its edits in reverse order.
    ///
    /// Undo is best-effort: every edit is attempted, and the first failure
    /// is returned after the rest have been undone.
    pub(crate) fn rollback_scope(&mut self, id: ScopeId) -> Result<()> {
        let frame = self.pop_scope(id)?;
        let mut first_error: Option<BimsurfError> = None;
        for edit in frame.edits.into_iter().rev() {
            if let Err(err) = self.undo(edit) {
                warn!(scope = %frame.id, error = %err, "failed to undo edit");
                first_error.get_or_insert(err);
            }
        }
        self.dirty = frame.dirty_at_begin;
        trace!(scope = %frame.id, label = %frame.label, "rolled back scope");
        first_error.map_or(Ok(()), Err)
    }

    fn undo(&mut self, edit: Edit) -> Result<()> {
        match edit {
            Edit::Added(key) => {
                let slot = self.index.remove(&key).ok_or(DocumentError::ElementNotFound(key))?;
                self.elements.remove(slot);
            }
            Edit::Removed(data) => {
                let key = data.key;
                if self.index.contains_key(&key) {
                    return Err(DocumentError::DuplicateElement(key).into());
                }
                let slot = self.elements.insert(*data);
                self.index.insert(key, slot);
            }
            Edit::Joined(join) => {
                self.joins.remove(&join);
            }
            Edit::Unjoined(join) => {
                self.joins.insert(join);
            }
            Edit::Regenerated { geometry, failed, dirty } => {
                self.geometry = geometry;
                self.failed = failed;
                self.dirty = dirty;
            }
        }
        Ok(())
    }
}
