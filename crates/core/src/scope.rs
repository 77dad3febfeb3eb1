//! Dynamic scope: the anchor bindings visible to `$dynamicRef`.
//!
//! Entering a schema node unions the node's resource anchors into the
//! scope without overwriting existing bindings, so the outermost
//! resource that declares an anchor keeps it for the whole descent.
//! The scope only ever grows along a call path; siblings share the
//! parent's bindings through a reference-counted map.

use crate::ast::{SchemaAst, SchemaId};
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct DynamicScope {
    bindings: Rc<BTreeMap<String, SchemaId>>,
}

impl DynamicScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the scope with `anchors`. Existing bindings win.
    pub fn extend(&self, anchors: &BTreeMap<String, SchemaId>) -> DynamicScope {
        if anchors.keys().all(|name| self.bindings.contains_key(name)) {
            return self.clone();
        }
        let mut merged = (*self.bindings).clone();
        for (name, target) in anchors {
            merged.entry(name.clone()).or_insert_with(|| {
                trace!(anchor = %name, target = %target, "binding dynamic anchor");
                *target
            });
        }
        Self {
            bindings: Rc::new(merged),
        }
    }

    /// Extend the scope with the anchors visible from `node`.
    pub fn enter(&self, ast: &SchemaAst, node: SchemaId) -> DynamicScope {
        self.extend(ast.dynamic_anchors(node))
    }

    pub fn resolve(&self, anchor: &str) -> Option<SchemaId> {
        self.bindings.get(anchor).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
