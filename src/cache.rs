//! Pass-scoped memoization of converted objects.
//!
//! A [`ConversionCache`] maps the stable identity of a source element, plus
//! an optional context discriminator, to the object produced for it. A
//! converter checks the cache before doing any work and registers its own
//! entry before recursing into children that may reference it back.

use std::collections::HashMap;

use tracing::trace;

use crate::document::ElementKey;
use crate::error::{CacheError, Result};

/// The kinds of source objects a conversion pass produces targets for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    SurfaceMember,
    CurveMember,
    Opening,
    Material,
    Profile,
}

impl SourceKind {
    /// Kinds whose targets depend on the context they are requested in.
    ///
    /// A profile is shared by every element of its section type but is
    /// built against a specific material, so its key alone is not enough.
    #[must_use]
    pub fn requires_context(self) -> bool {
        matches!(self, SourceKind::Profile)
    }
}

/// Stable identity of a source object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKey {
    /// An object with its own document identity.
    Element { kind: SourceKind, key: ElementKey },
    /// A sub-object without document identity, named by its owner and a
    /// variant string such as a material grade.
    Variant {
        kind: SourceKind,
        owner: ElementKey,
        variant: String,
    },
}

impl SourceKey {
    #[must_use]
    pub fn element(kind: SourceKind, key: ElementKey) -> Self {
        SourceKey::Element { kind, key }
    }

    #[must_use]
    pub fn variant(kind: SourceKind, owner: ElementKey, variant: impl Into<String>) -> Self {
        SourceKey::Variant {
            kind,
            owner,
            variant: variant.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceKey::Element { kind, .. } | SourceKey::Variant { kind, .. } => *kind,
        }
    }

    /// The document element this key derives from.
    #[must_use]
    pub fn element_key(&self) -> ElementKey {
        match self {
            SourceKey::Element { key, .. } => *key,
            SourceKey::Variant { owner, .. } => *owner,
        }
    }
}

/// Full cache key: source identity plus optional context discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: SourceKey,
    pub context: Option<String>,
}

/// Lookup counters for one cache lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub inserts: usize,
    pub overwrites: usize,
}

/// Memoization store for one top-level conversion pass.
#[derive(Debug, Clone)]
pub struct ConversionCache<V> {
    entries: HashMap<CacheKey, V>,
    stats: CacheStats,
}

impl<V> Default for ConversionCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }
}

impl<V: Clone> ConversionCache<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value cached for `source` under `context`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::MissingContext`] if the source kind requires a
    /// context and none was given.
    pub fn try_get(&mut self, source: &SourceKey, context: Option<&str>) -> Result<Option<V>> {
        let key = Self::key(source, context)?;
        let found = self.entries.get(&key).cloned();
        if found.is_some() {
            self.stats.hits += 1;
            trace!(?source, ?context, "cache hit");
        } else {
            self.stats.misses += 1;
            trace!(?source, ?context, "cache miss");
        }
        Ok(found)
    }

    /// Stores `value` for `source` under `context`, replacing any earlier
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::MissingContext`] if the source kind requires a
    /// context and none was given.
    pub fn put(&mut self, source: SourceKey, context: Option<&str>, value: V) -> Result<()> {
        let key = Self::key(&source, context)?;
        if self.entries.insert(key, value).is_some() {
            self.stats.overwrites += 1;
        } else {
            self.stats.inserts += 1;
        }
        Ok(())
    }

    /// Returns `true` if an entry exists. Never fails and never counts as a
    /// lookup.
    #[must_use]
    pub fn contains(&self, source: &SourceKey, context: Option<&str>) -> bool {
        self.entries.contains_key(&CacheKey {
            source: source.clone(),
            context: context.map(str::to_owned),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry and resets the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats = CacheStats::default();
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn key(source: &SourceKey, context: Option<&str>) -> Result<CacheKey> {
        let kind = source.kind();
        if kind.requires_context() && context.is_none() {
            return Err(CacheError::MissingContext { kind }.into());
        }
        Ok(CacheKey {
            source: source.clone(),
            context: context.map(str::to_owned),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::BimsurfError;

    fn beam(key: i64) -> SourceKey {
        SourceKey::element(SourceKind::CurveMember, ElementKey(key))
    }

    #[test]
    fn second_lookup_hits() {
        let mut cache = ConversionCache::new();
        assert_eq!(cache.try_get(&beam(1), None).unwrap(), None);
        cache.put(beam(1), None, 10).unwrap();
        assert_eq!(cache.try_get(&beam(1), None).unwrap(), Some(10));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                inserts: 1,
                overwrites: 0
            }
        );
    }

    #[test]
    fn put_overwrites_placeholder() {
        let mut cache = ConversionCache::new();
        cache.put(beam(1), None, "placeholder").unwrap();
        cache.put(beam(1), None, "filled").unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.try_get(&beam(1), None).unwrap(), Some("filled"));
        assert_eq!(cache.stats().overwrites, 1);
    }

    #[test]
    fn context_and_variant_keep_entries_apart() {
        let mut cache = ConversionCache::new();
        let profile = SourceKey::element(SourceKind::Profile, ElementKey(7));
        cache.put(profile.clone(), Some("S235"), 1).unwrap();
        cache.put(profile.clone(), Some("S355"), 2).unwrap();
        assert_eq!(cache.try_get(&profile, Some("S235")).unwrap(), Some(1));
        assert_eq!(cache.try_get(&profile, Some("S355")).unwrap(), Some(2));

        let c30 = SourceKey::variant(SourceKind::Material, ElementKey(3), "C30/37");
        let c40 = SourceKey::variant(SourceKind::Material, ElementKey(3), "C40/50");
        cache.put(c30.clone(), None, 3).unwrap();
        assert!(cache.contains(&c30, None));
        assert!(!cache.contains(&c40, None));
        assert_eq!(c40.element_key(), ElementKey(3));
    }

    #[test]
    fn missing_context_is_an_error() {
        let mut cache: ConversionCache<u32> = ConversionCache::new();
        let profile = SourceKey::element(SourceKind::Profile, ElementKey(7));
        assert!(matches!(
            cache.try_get(&profile, None),
            Err(BimsurfError::Cache(CacheError::MissingContext {
                kind: SourceKind::Profile
            }))
        ));
        assert!(cache.put(profile, None, 1).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_starts_a_fresh_pass() {
        let mut cache = ConversionCache::new();
        cache.put(beam(1), None, 1).unwrap();
        cache.try_get(&beam(1), None).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
