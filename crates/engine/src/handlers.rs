//! Keyword handlers: one arm per [`Keyword`] variant.

use crate::coverage::CoverageTracker;
use crate::evaluator::{Evaluator, Frame};
use schemafill_core::{EvalError, Keyword, Pattern, SchemaId, SchemaValidator};
use serde_json::{Map, Value};
use tracing::trace;

impl<V: SchemaValidator> Evaluator<'_, V> {
    pub(crate) fn keyword(
        &self,
        keyword: &Keyword,
        location: &str,
        slot: &mut Option<Value>,
        frame: &Frame<'_>,
        coverage: &mut CoverageTracker,
    ) -> Result<(), EvalError> {
        match keyword {
            Keyword::Default(value) => {
                if slot.is_none() {
                    trace!(instance = %frame.at, "filled default");
                    *slot = Some(value.clone());
                }
                Ok(())
            }

            Keyword::Ref(target) => self.in_place(*target, slot, frame, coverage),
            Keyword::DynamicRef { anchor, fallback } => {
                let target = frame.scope.resolve(anchor).or(*fallback).ok_or_else(|| {
                    EvalError::UnresolvedDynamicAnchor {
                        anchor: anchor.clone(),
                        location: location.to_string(),
                    }
                })?;
                self.in_place(target, slot, frame, coverage)
            }

            Keyword::AllOf(branches) => {
                for branch in branches {
                    self.in_place(*branch, slot, frame, coverage)?;
                }
                Ok(())
            }
            Keyword::AnyOf(branches) => self.any_of(branches, slot, frame, coverage),
            Keyword::OneOf(branches) => {
                let Some(instance) = slot.as_ref() else {
                    return Ok(());
                };
                let mut chosen = None;
                for branch in branches {
                    if self.validator.validate(self.ast, *branch, instance, frame.scope)? {
                        chosen = Some(*branch);
                        break;
                    }
                }
                match chosen {
                    Some(branch) => self.in_place(branch, slot, frame, coverage),
                    None => Ok(()),
                }
            }
            Keyword::If {
                condition,
                then,
                otherwise,
            } => {
                let Some(instance) = slot.as_ref() else {
                    return Ok(());
                };
                if self.validator.validate(self.ast, *condition, instance, frame.scope)? {
                    // Only the condition's coverage counts; its defaults are dropped.
                    let mut scratch = slot.clone();
                    self.in_place(*condition, &mut scratch, frame, coverage)?;
                    match then {
                        Some(then) => self.in_place(*then, slot, frame, coverage),
                        None => Ok(()),
                    }
                } else {
                    match otherwise {
                        Some(otherwise) => self.in_place(*otherwise, slot, frame, coverage),
                        None => Ok(()),
                    }
                }
            }
            Keyword::DependentSchemas(schemas) => {
                for (property, schema) in schemas {
                    let present = slot
                        .as_ref()
                        .and_then(Value::as_object)
                        .is_some_and(|object| object.contains_key(property));
                    if present {
                        self.in_place(*schema, slot, frame, coverage)?;
                    }
                }
                Ok(())
            }

            Keyword::Properties(schemas) => {
                let Some(Value::Object(object)) = slot else {
                    return Ok(());
                };
                for (name, schema) in schemas {
                    self.member(object, name, *schema, frame, coverage)?;
                }
                Ok(())
            }
            Keyword::PatternProperties(schemas) => {
                let Some(Value::Object(object)) = slot else {
                    return Ok(());
                };
                for (pattern, schema) in schemas {
                    let keys: Vec<String> = object
                        .keys()
                        .filter(|key| pattern.is_match(key))
                        .cloned()
                        .collect();
                    for key in keys {
                        self.member(object, &key, *schema, frame, coverage)?;
                    }
                }
                Ok(())
            }
            Keyword::AdditionalProperties {
                schema,
                declared,
                patterns,
            } => {
                let Some(Value::Object(object)) = slot else {
                    return Ok(());
                };
                let keys: Vec<String> = object
                    .keys()
                    .filter(|key| !declared.contains(key) && !matches_any(patterns, key))
                    .cloned()
                    .collect();
                for key in keys {
                    self.member(object, &key, *schema, frame, coverage)?;
                }
                Ok(())
            }
            Keyword::UnevaluatedProperties(schema) => {
                let Some(Value::Object(object)) = slot else {
                    return Ok(());
                };
                let covered = coverage.covered_properties(frame.node, frame.at);
                let keys: Vec<String> = object
                    .keys()
                    .filter(|key| !covered.contains(*key))
                    .cloned()
                    .collect();
                for key in keys {
                    self.member(object, &key, *schema, frame, coverage)?;
                }
                Ok(())
            }

            Keyword::PrefixItems(schemas) => {
                let Some(Value::Array(items)) = slot else {
                    return Ok(());
                };
                for (i, schema) in schemas.iter().enumerate() {
                    if i < items.len() {
                        self.element(items, i, *schema, frame, coverage)?;
                        continue;
                    }
                    // Past the end: extend while the prefix schema yields a value.
                    let mut missing = None;
                    self.descend(*schema, &mut missing, frame, &i.to_string(), coverage)?;
                    match missing {
                        Some(value) => {
                            items.push(value);
                            coverage.claim_item(frame.node, frame.at, i);
                        }
                        None => break,
                    }
                }
                Ok(())
            }
            Keyword::Items { schema, prefix_len } => {
                let Some(Value::Array(items)) = slot else {
                    return Ok(());
                };
                for i in *prefix_len..items.len() {
                    self.element(items, i, *schema, frame, coverage)?;
                }
                Ok(())
            }
            Keyword::Contains { schema, .. } => {
                let Some(Value::Array(items)) = slot else {
                    return Ok(());
                };
                for i in 0..items.len() {
                    self.element(items, i, *schema, frame, coverage)?;
                }
                Ok(())
            }
            Keyword::UnevaluatedItems(schema) => {
                let Some(Value::Array(items)) = slot else {
                    return Ok(());
                };
                let covered = coverage.covered_items(frame.node, frame.at);
                for i in 0..items.len() {
                    if !covered.contains(&i) {
                        self.element(items, i, *schema, frame, coverage)?;
                    }
                }
                Ok(())
            }

            // Driven by `if`.
            Keyword::Then(_) | Keyword::Else(_) => Ok(()),

            // Subschemas that never contribute defaults to the instance.
            Keyword::Not(_) | Keyword::PropertyNames(_) | Keyword::Definitions(_) => Ok(()),

            Keyword::Type(_)
            | Keyword::Enum(_)
            | Keyword::Const(_)
            | Keyword::MultipleOf(_)
            | Keyword::Maximum(_)
            | Keyword::ExclusiveMaximum(_)
            | Keyword::Minimum(_)
            | Keyword::ExclusiveMinimum(_)
            | Keyword::MaxLength(_)
            | Keyword::MinLength(_)
            | Keyword::Pattern(_)
            | Keyword::MaxItems(_)
            | Keyword::MinItems(_)
            | Keyword::UniqueItems(_)
            | Keyword::MaxContains(_)
            | Keyword::MinContains(_)
            | Keyword::MaxProperties(_)
            | Keyword::MinProperties(_)
            | Keyword::Required(_)
            | Keyword::DependentRequired(_)
            | Keyword::Comment(_)
            | Keyword::Metadata { .. }
            | Keyword::Format(_)
            | Keyword::Content { .. } => Ok(()),
        }
    }

    /// `anyOf`: try each branch on a copy and keep the first whose
    /// defaulted result the branch accepts. Coverage claimed by a
    /// rejected branch is rolled back.
    fn any_of(
        &self,
        branches: &[SchemaId],
        slot: &mut Option<Value>,
        frame: &Frame<'_>,
        coverage: &mut CoverageTracker,
    ) -> Result<(), EvalError> {
        for branch in branches {
            let mut tentative = slot.clone();
            let checkpoint = coverage.checkpoint();
            let accepted = self
                .in_place(*branch, &mut tentative, frame, coverage)
                .and_then(|()| match tentative.as_ref() {
                    Some(candidate) => self
                        .validator
                        .validate(self.ast, *branch, candidate, frame.scope)
                        .map_err(EvalError::from),
                    None => Ok(false),
                });
            match accepted {
                Ok(true) => {
                    trace!(branch = %branch, instance = %frame.at, "kept anyOf branch");
                    coverage.commit(checkpoint);
                    *slot = tentative;
                    return Ok(());
                }
                Ok(false) => coverage.rollback(checkpoint),
                Err(e) => {
                    coverage.rollback(checkpoint);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Apply `schema` to `object[name]`. A present member is evaluated in
    /// its own position, so key order is kept; an absent member that
    /// receives a value is appended. Claims `name` when the member exists
    /// afterwards, even if evaluation failed part-way.
    fn member(
        &self,
        object: &mut Map<String, Value>,
        name: &str,
        schema: SchemaId,
        frame: &Frame<'_>,
        coverage: &mut CoverageTracker,
    ) -> Result<(), EvalError> {
        let present = object.contains_key(name);
        let mut member = object.get_mut(name).map(std::mem::take);
        let result = self.descend(schema, &mut member, frame, name, coverage);
        match member {
            Some(value) => match object.get_mut(name) {
                Some(slot) => *slot = value,
                None => {
                    object.insert(name.to_string(), value);
                }
            },
            None if present => {
                object.shift_remove(name);
            }
            None => {}
        }
        if object.contains_key(name) {
            coverage.claim_property(frame.node, frame.at, name);
        }
        result
    }

    /// Apply `schema` to the present element `items[index]`.
    fn element(
        &self,
        items: &mut [Value],
        index: usize,
        schema: SchemaId,
        frame: &Frame<'_>,
        coverage: &mut CoverageTracker,
    ) -> Result<(), EvalError> {
        let mut element = Some(std::mem::take(&mut items[index]));
        let result = self.descend(schema, &mut element, frame, &index.to_string(), coverage);
        if let Some(value) = element {
            items[index] = value;
        }
        coverage.claim_item(frame.node, frame.at, index);
        result
    }
}

fn matches_any(patterns: &[Pattern], key: &str) -> bool {
    patterns.iter().any(|pattern| pattern.is_match(key))
}
