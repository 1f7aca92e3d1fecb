use std::collections::HashMap;
use std::fmt;

use crate::kernel::Solid;

use super::{ElementData, ElementKey};

/// Identifier of a mutation scope. [`ScopeId::ROOT`] is the document itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) u64);

impl ScopeId {
    /// The permanent, never-closing document scope.
    pub const ROOT: ScopeId = ScopeId(0);
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A geometric join: `cutter`'s body is subtracted from `cut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Join {
    pub cutter: ElementKey,
    pub cut: ElementKey,
}

impl Join {
    #[must_use]
    pub fn involves(&self, key: ElementKey) -> bool {
        self.cutter == key || self.cut == key
    }

    #[must_use]
    pub fn other(&self, key: ElementKey) -> Option<ElementKey> {
        if self.cutter == key {
            Some(self.cut)
        } else if self.cut == key {
            Some(self.cutter)
        } else {
            None
        }
    }
}

/// A reversible document edit.
#[derive(Debug, Clone)]
pub(crate) enum Edit {
    Added(ElementKey),
    Removed(Box<ElementData>),
    Joined(Join),
    Unjoined(Join),
    Regenerated {
        geometry: HashMap<ElementKey, Vec<Solid>>,
        failed: HashMap<ElementKey, String>,
        dirty: bool,
    },
}

/// Edits recorded since a scope was opened.
#[derive(Debug)]
pub(crate) struct ScopeFrame {
    pub(crate) id: ScopeId,
    pub(crate) label: String,
    pub(crate) dirty_at_begin: bool,
    pub(crate) edits: Vec<Edit>,
}
