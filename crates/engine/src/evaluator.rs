//! The recursive default-application driver.
//!
//! [`Evaluator`] walks a compiled schema together with an instance slot.
//! A slot is `Option<Value>`: `None` is an absent property or array
//! element, which is the only thing a `default` may fill. Scalars are
//! replaced through the slot; objects and arrays are mutated in place.

use crate::coverage::CoverageTracker;
use schemafill_core::{
    DynamicScope, EvalError, KeywordEntry, SchemaAst, SchemaId, SchemaNode, SchemaValidator,
};
use serde_json::Value;
use tracing::trace;

/// Where in the instance a node is being applied, plus recursion depth.
#[derive(Debug, Clone)]
pub(crate) struct Frame<'s> {
    /// Node being evaluated; owner of coverage claims made by its keywords.
    pub node: SchemaId,
    /// JSON pointer of the instance slot.
    pub at: &'s str,
    pub scope: &'s DynamicScope,
    pub depth: usize,
}

pub struct Evaluator<'a, V> {
    pub(crate) ast: &'a SchemaAst,
    pub(crate) validator: &'a V,
    max_depth: usize,
}

impl<'a, V: SchemaValidator> Evaluator<'a, V> {
    pub fn new(ast: &'a SchemaAst, validator: &'a V, max_depth: usize) -> Self {
        Self {
            ast,
            validator,
            max_depth,
        }
    }

    /// Apply the defaults of `schema` to the root slot `instance`.
    ///
    /// On error the slot keeps whatever was filled before the failure.
    pub fn evaluate(
        &self,
        schema: SchemaId,
        instance: &mut Option<Value>,
        scope: &DynamicScope,
        coverage: &mut CoverageTracker,
    ) -> Result<(), EvalError> {
        self.node(schema, instance, scope, "", 0, coverage)
    }

    pub(crate) fn node(
        &self,
        id: SchemaId,
        slot: &mut Option<Value>,
        scope: &DynamicScope,
        at: &str,
        depth: usize,
        coverage: &mut CoverageTracker,
    ) -> Result<(), EvalError> {
        if depth > self.max_depth {
            return Err(EvalError::DepthExceeded {
                limit: self.max_depth,
                location: self.ast.location(id).to_string(),
            });
        }
        // `false` rejects everything, but rejection is the validator's job.
        let SchemaNode::Keywords(entries) = self.ast.node(id) else {
            return Ok(());
        };

        let scope = scope.enter(self.ast, id);
        let frame = Frame {
            node: id,
            at,
            scope: &scope,
            depth,
        };
        for entry in ordered(entries) {
            trace!(keyword = entry.keyword.name(), schema = %entry.location, instance = %at, "applying keyword");
            self.keyword(&entry.keyword, &entry.location, slot, &frame, coverage)?;
        }
        Ok(())
    }

    /// Evaluate `child` in place of the frame's node: same slot, same
    /// instance location, coverage linked to the parent.
    pub(crate) fn in_place(
        &self,
        child: SchemaId,
        slot: &mut Option<Value>,
        frame: &Frame<'_>,
        coverage: &mut CoverageTracker,
    ) -> Result<(), EvalError> {
        coverage.link(frame.node, child, frame.at);
        self.node(child, slot, frame.scope, frame.at, frame.depth + 1, coverage)
    }

    /// Evaluate `child` against the member slot `segment` of the frame's
    /// instance.
    pub(crate) fn descend(
        &self,
        child: SchemaId,
        slot: &mut Option<Value>,
        frame: &Frame<'_>,
        segment: &str,
        coverage: &mut CoverageTracker,
    ) -> Result<(), EvalError> {
        let at = pointer_child(frame.at, segment);
        self.node(child, slot, frame.scope, &at, frame.depth + 1, coverage)
    }
}

/// Keyword entries in evaluation order: `default` first, then the plain
/// applicators, then the branch-selecting keywords, the unevaluated
/// keywords last. Order within a phase is document order.
fn ordered(entries: &[KeywordEntry]) -> Vec<&KeywordEntry> {
    let mut ordered: Vec<&KeywordEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.keyword.phase());
    ordered
}

fn pointer_child(at: &str, segment: &str) -> String {
    format!("{at}/{}", segment.replace('~', "~0").replace('/', "~1"))
}
