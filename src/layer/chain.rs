//! Immutable fallback chain of resolved layers.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::source::{PropertyMap, SourceOrigin};

/// One named, fully resolved layer plus the layer it falls back to.
///
/// A layer only ever points at a layer that existed before it was built,
/// so a chain cannot form a cycle.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    name: String,
    origin: SourceOrigin,
    values: PropertyMap,
    fallback: Option<Arc<ConfigLayer>>,
}

impl ConfigLayer {
    pub fn new(
        name: impl Into<String>,
        origin: SourceOrigin,
        values: PropertyMap,
        fallback: Option<Arc<ConfigLayer>>,
    ) -> Self {
        Self {
            name: name.into(),
            origin,
            values,
            fallback,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &SourceOrigin {
        &self.origin
    }

    /// Values defined by this layer alone.
    pub fn values(&self) -> &PropertyMap {
        &self.values
    }

    pub fn fallback(&self) -> Option<&ConfigLayer> {
        self.fallback.as_deref()
    }

    /// Layers from highest to lowest priority, starting with `self`.
    pub fn layers(&self) -> Layers<'_> {
        Layers { next: Some(self) }
    }

    /// First value for `key` walking the chain from this layer down.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.layers()
            .find_map(|layer| layer.values.get(key))
            .map(String::as_str)
    }

    /// Union of keys across the whole chain.
    pub fn keys(&self) -> BTreeSet<String> {
        self.layers()
            .flat_map(|layer| layer.values.keys().cloned())
            .collect()
    }

    /// Number of layers in the chain, including `self`.
    pub fn depth(&self) -> usize {
        self.layers().count()
    }
}

/// Iterator over a chain, highest priority first.
pub struct Layers<'a> {
    next: Option<&'a ConfigLayer>,
}

impl<'a> Iterator for Layers<'a> {
    type Item = &'a ConfigLayer;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.fallback();
        Some(current)
    }
}
