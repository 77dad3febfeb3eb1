//! Boolean JSON Schema 2020-12 validator over the compiled AST.
//!
//! This is the oracle the defaults engine consults at `anyOf`, `oneOf`
//! and `if`. It never mutates the instance. `unevaluatedProperties` and
//! `unevaluatedItems` are decided from the annotations (evaluated keys
//! and indices) collected by the sibling keywords at the same node.

mod equal;

pub use equal::json_equal;

use schemafill_core::{
    DynamicScope, Keyword, KeywordEntry, SchemaAst, SchemaId, SchemaNode, SchemaValidator,
    ValidationError,
};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::trace;

/// Default recursion bound for [`JsonSchemaValidator`].
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Keys and indices a successful evaluation has touched.
#[derive(Debug, Default)]
struct Evaluated {
    properties: BTreeSet<String>,
    items: BTreeSet<usize>,
}

impl Evaluated {
    fn merge(&mut self, other: Evaluated) {
        self.properties.extend(other.properties);
        self.items.extend(other.items);
    }
}

/// Outcome of checking one node: `None` when the instance is invalid.
type Outcome = Result<Option<Evaluated>, ValidationError>;

#[derive(Debug, Clone)]
pub struct JsonSchemaValidator {
    max_depth: usize,
}

impl Default for JsonSchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSchemaValidator {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    fn check(
        &self,
        ast: &SchemaAst,
        id: SchemaId,
        instance: &Value,
        scope: &DynamicScope,
        depth: usize,
    ) -> Outcome {
        if depth > self.max_depth {
            return Err(ValidationError::DepthExceeded {
                limit: self.max_depth,
                location: ast.location(id).to_string(),
            });
        }
        let entries = match ast.node(id) {
            SchemaNode::Bool(true) => return Ok(Some(Evaluated::default())),
            SchemaNode::Bool(false) => return Ok(None),
            SchemaNode::Keywords(entries) => entries,
        };

        let scope = scope.enter(ast, id);
        let mut ordered: Vec<&KeywordEntry> = entries.iter().collect();
        ordered.sort_by_key(|entry| entry.keyword.phase());

        let cx = Cx {
            validator: self,
            ast,
            scope: &scope,
            depth: depth + 1,
        };
        let mut evaluated = Evaluated::default();
        for entry in ordered {
            if !cx.keyword(entry, instance, &mut evaluated)? {
                trace!(keyword = entry.keyword.name(), location = %entry.location, "instance rejected");
                return Ok(None);
            }
        }
        Ok(Some(evaluated))
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(
        &self,
        ast: &SchemaAst,
        schema: SchemaId,
        instance: &Value,
        scope: &DynamicScope,
    ) -> Result<bool, ValidationError> {
        Ok(self.check(ast, schema, instance, scope, 0)?.is_some())
    }
}

/// Per-node evaluation context.
struct Cx<'a> {
    validator: &'a JsonSchemaValidator,
    ast: &'a SchemaAst,
    scope: &'a DynamicScope,
    depth: usize,
}

impl Cx<'_> {
    fn check(&self, id: SchemaId, instance: &Value) -> Outcome {
        self.validator
            .check(self.ast, id, instance, self.scope, self.depth)
    }

    fn passes(&self, id: SchemaId, instance: &Value) -> Result<bool, ValidationError> {
        Ok(self.check(id, instance)?.is_some())
    }

    /// Check one keyword, merging in-place annotations into `evaluated`.
    fn keyword(
        &self,
        entry: &KeywordEntry,
        instance: &Value,
        evaluated: &mut Evaluated,
    ) -> Result<bool, ValidationError> {
        let object = instance.as_object();
        let array = instance.as_array();

        let valid = match &entry.keyword {
            Keyword::Ref(target) => self.in_place(*target, instance, evaluated)?,
            Keyword::DynamicRef { anchor, fallback } => {
                let target = self.scope.resolve(anchor).or(*fallback).ok_or_else(|| {
                    ValidationError::UnresolvedDynamicAnchor {
                        anchor: anchor.clone(),
                        location: entry.location.clone(),
                    }
                })?;
                self.in_place(target, instance, evaluated)?
            }
            Keyword::AllOf(branches) => {
                let mut all = true;
                for branch in branches {
                    all &= self.in_place(*branch, instance, evaluated)?;
                }
                all
            }
            Keyword::AnyOf(branches) => {
                let mut any = false;
                for branch in branches {
                    any |= self.in_place(*branch, instance, evaluated)?;
                }
                any
            }
            Keyword::OneOf(branches) => {
                let mut matched = None;
                let mut count = 0;
                for branch in branches {
                    if let Some(annotations) = self.check(*branch, instance)? {
                        count += 1;
                        matched.get_or_insert(annotations);
                    }
                }
                match matched {
                    Some(annotations) if count == 1 => {
                        evaluated.merge(annotations);
                        true
                    }
                    _ => false,
                }
            }
            Keyword::Not(schema) => !self.passes(*schema, instance)?,
            Keyword::If {
                condition,
                then,
                otherwise,
            } => match self.check(*condition, instance)? {
                Some(annotations) => {
                    evaluated.merge(annotations);
                    match then {
                        Some(then) => self.in_place(*then, instance, evaluated)?,
                        None => true,
                    }
                }
                None => match otherwise {
                    Some(otherwise) => self.in_place(*otherwise, instance, evaluated)?,
                    None => true,
                },
            },
            Keyword::DependentSchemas(schemas) => {
                let mut all = true;
                if let Some(object) = object {
                    for (property, schema) in schemas {
                        if object.contains_key(property) {
                            all &= self.in_place(*schema, instance, evaluated)?;
                        }
                    }
                }
                all
            }

            Keyword::PrefixItems(schemas) => match array {
                Some(items) => {
                    let mut all = true;
                    for (i, (item, schema)) in items.iter().zip(schemas).enumerate() {
                        all &= self.passes(*schema, item)?;
                        evaluated.items.insert(i);
                    }
                    all
                }
                None => true,
            },
            Keyword::Items { schema, prefix_len } => match array {
                Some(items) => {
                    let mut all = true;
                    for (i, item) in items.iter().enumerate().skip(*prefix_len) {
                        all &= self.passes(*schema, item)?;
                        evaluated.items.insert(i);
                    }
                    all
                }
                None => true,
            },
            Keyword::Contains { schema, min, max } => match array {
                Some(items) => {
                    let mut count = 0u64;
                    for (i, item) in items.iter().enumerate() {
                        if self.passes(*schema, item)? {
                            count += 1;
                            evaluated.items.insert(i);
                        }
                    }
                    count >= *min && max.is_none_or(|max| count <= max)
                }
                None => true,
            },
            Keyword::Properties(schemas) => match object {
                Some(object) => {
                    let mut all = true;
                    for (name, schema) in schemas {
                        if let Some(value) = object.get(name) {
                            all &= self.passes(*schema, value)?;
                            evaluated.properties.insert(name.clone());
                        }
                    }
                    all
                }
                None => true,
            },
            Keyword::PatternProperties(schemas) => match object {
                Some(object) => {
                    let mut all = true;
                    for (pattern, schema) in schemas {
                        for (key, value) in object.iter().filter(|(key, _)| pattern.is_match(key)) {
                            all &= self.passes(*schema, value)?;
                            evaluated.properties.insert(key.clone());
                        }
                    }
                    all
                }
                None => true,
            },
            Keyword::AdditionalProperties {
                schema,
                declared,
                patterns,
            } => match object {
                Some(object) => {
                    let mut all = true;
                    for (key, value) in object {
                        if declared.contains(key) || patterns.iter().any(|p| p.is_match(key)) {
                            continue;
                        }
                        all &= self.passes(*schema, value)?;
                        evaluated.properties.insert(key.clone());
                    }
                    all
                }
                None => true,
            },
            Keyword::PropertyNames(schema) => match object {
                Some(object) => {
                    let mut all = true;
                    for key in object.keys() {
                        all &= self.passes(*schema, &Value::String(key.clone()))?;
                    }
                    all
                }
                None => true,
            },
            Keyword::UnevaluatedItems(schema) => match array {
                Some(items) => {
                    let mut all = true;
                    for (i, item) in items.iter().enumerate() {
                        if !evaluated.items.contains(&i) {
                            all &= self.passes(*schema, item)?;
                        }
                    }
                    evaluated.items.extend(0..items.len());
                    all
                }
                None => true,
            },
            Keyword::UnevaluatedProperties(schema) => match object {
                Some(object) => {
                    let mut all = true;
                    for (key, value) in object {
                        if !evaluated.properties.contains(key) {
                            all &= self.passes(*schema, value)?;
                        }
                    }
                    evaluated.properties.extend(object.keys().cloned());
                    all
                }
                None => true,
            },

            Keyword::Type(types) => types.iter().any(|ty| ty.matches(instance)),
            Keyword::Enum(values) => values.iter().any(|value| json_equal(value, instance)),
            Keyword::Const(value) => json_equal(value, instance),
            Keyword::MultipleOf(divisor) => !instance.is_number() || multiple_of(instance, *divisor),
            Keyword::Maximum(limit) => number(instance).is_none_or(|n| n <= *limit),
            Keyword::ExclusiveMaximum(limit) => number(instance).is_none_or(|n| n < *limit),
            Keyword::Minimum(limit) => number(instance).is_none_or(|n| n >= *limit),
            Keyword::ExclusiveMinimum(limit) => number(instance).is_none_or(|n| n > *limit),
            Keyword::MaxLength(limit) => chars(instance).is_none_or(|len| len <= *limit),
            Keyword::MinLength(limit) => chars(instance).is_none_or(|len| len >= *limit),
            Keyword::Pattern(pattern) => instance.as_str().is_none_or(|s| pattern.is_match(s)),
            Keyword::MaxItems(limit) => array.is_none_or(|items| items.len() as u64 <= *limit),
            Keyword::MinItems(limit) => array.is_none_or(|items| items.len() as u64 >= *limit),
            Keyword::UniqueItems(unique) => !*unique || array.is_none_or(|items| all_unique(items)),
            Keyword::MaxProperties(limit) => object.is_none_or(|o| o.len() as u64 <= *limit),
            Keyword::MinProperties(limit) => object.is_none_or(|o| o.len() as u64 >= *limit),
            Keyword::Required(names) => {
                object.is_none_or(|o| names.iter().all(|name| o.contains_key(name)))
            }
            Keyword::DependentRequired(dependencies) => object.is_none_or(|o| {
                dependencies
                    .iter()
                    .filter(|(property, _)| o.contains_key(property))
                    .all(|(_, required)| required.iter().all(|name| o.contains_key(name)))
            }),

            // minContains / maxContains are folded into `contains`; `then`
            // and `else` are driven by `if`.
            Keyword::MaxContains(_)
            | Keyword::MinContains(_)
            | Keyword::Then(_)
            | Keyword::Else(_)
            | Keyword::Definitions(_)
            | Keyword::Comment(_)
            | Keyword::Default(_)
            | Keyword::Metadata { .. }
            | Keyword::Format(_)
            | Keyword::Content { .. } => true,
        };
        Ok(valid)
    }

    /// Check an in-place applicator and keep its annotations on success.
    fn in_place(
        &self,
        id: SchemaId,
        instance: &Value,
        evaluated: &mut Evaluated,
    ) -> Result<bool, ValidationError> {
        match self.check(id, instance)? {
            Some(annotations) => {
                evaluated.merge(annotations);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn number(instance: &Value) -> Option<f64> {
    instance.as_f64()
}

fn chars(instance: &Value) -> Option<u64> {
    instance.as_str().map(|s| s.chars().count() as u64)
}

/// Integer instances against integral divisors are checked exactly. Past
/// 2^53 a float quotient has no fractional bits left, so the remainder
/// decides instead.
fn multiple_of(instance: &Value, divisor: f64) -> bool {
    let integer = instance
        .as_i64()
        .map(i128::from)
        .or_else(|| instance.as_u64().map(i128::from));
    if let Some(value) = integer
        && divisor.fract() == 0.0
        && divisor >= 1.0
    {
        return value % (divisor as i128) == 0;
    }
    let Some(value) = instance.as_f64() else {
        return false;
    };
    let quotient = value / divisor;
    if !quotient.is_finite() || quotient.abs() >= 2f64.powi(53) {
        return value % divisor == 0.0;
    }
    (quotient - quotient.round()).abs() <= f64::EPSILON * quotient.abs().max(1.0)
}

fn all_unique(items: &[Value]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(i, a)| items[i + 1..].iter().all(|b| !json_equal(a, b)))
}
