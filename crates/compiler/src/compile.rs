//! Raw schema documents → compiled keyword arena.

use crate::index::{Location, ResourceIndex, Site};
use crate::registry::SchemaRegistry;
use crate::uri;
use schemafill_core::{
    CompileError, CompiledSchema, JsonType, Keyword, KeywordEntry, Pattern, SchemaAst, SchemaId,
    SchemaNode,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// The only dialect the compiler understands.
pub const DIALECT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

const METADATA: [&str; 6] = [
    "title",
    "description",
    "deprecated",
    "readOnly",
    "writeOnly",
    "examples",
];

const CONTENT: [&str; 3] = ["contentEncoding", "contentMediaType", "contentSchema"];

/// Keywords that are consumed by indexing and never reach the AST.
const IDENTIFIERS: [&str; 5] = ["$id", "$schema", "$anchor", "$dynamicAnchor", "$vocabulary"];

/// Compiler options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Reject keywords outside the 2020-12 vocabulary instead of
    /// ignoring them.
    pub strict_keywords: bool,
}

/// Compiles schemas held in a [`SchemaRegistry`] into a [`SchemaAst`].
///
/// Each subschema location is compiled at most once; a reference to a
/// location that is already being compiled receives the reserved id,
/// which is how `$ref` cycles close.
pub struct Compiler<'r> {
    registry: &'r SchemaRegistry,
    index: ResourceIndex,
    options: CompileOptions,
    ast: SchemaAst,
    compiled: HashMap<Location, SchemaId>,
    resources: HashMap<String, usize>,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r SchemaRegistry, options: CompileOptions) -> Result<Self, CompileError> {
        Ok(Self {
            registry,
            index: ResourceIndex::build(registry)?,
            options,
            ast: SchemaAst::new(),
            compiled: HashMap::new(),
            resources: HashMap::new(),
        })
    }

    /// Compile the schema named by `uri`: a registered document or an
    /// embedded `$id` resource, optionally with a pointer or anchor
    /// fragment.
    pub fn compile(mut self, uri: &str) -> Result<CompiledSchema, CompileError> {
        let location = self.index.lookup(uri).ok_or_else(|| {
            if self.registry.contains(uri) {
                CompileError::UnresolvedReference {
                    reference: uri.to_string(),
                    base: uri::document_key(uri).unwrap_or_default(),
                }
            } else {
                CompileError::NotRegistered(uri.to_string())
            }
        })?;
        let root = self.compile_location(&location)?;
        self.link_dynamic_anchors()?;

        debug!(
            root = %uri,
            nodes = self.ast.len(),
            resources = self.ast.resources().len(),
            "Compiled schema"
        );
        Ok(CompiledSchema {
            ast: self.ast,
            root,
        })
    }

    /// Compile every dynamic anchor of every resource the AST touches.
    /// Compiling an anchor can pull in further resources, so this runs
    /// until no new resource appears.
    fn link_dynamic_anchors(&mut self) -> Result<(), CompileError> {
        let mut next = 0;
        while next < self.ast.resources().len() {
            let resource_uri = self.ast.resource(next).uri.clone();
            for (name, location) in self.index.dynamic_anchors(&resource_uri) {
                let target = self.compile_location(&location)?;
                trace!(resource = %resource_uri, anchor = %name, target = %target, "linked dynamic anchor");
                self.ast
                    .resource_mut(next)
                    .dynamic_anchors
                    .insert(name, target);
            }
            next += 1;
        }
        Ok(())
    }

    fn resource_index(&mut self, uri: &str) -> usize {
        if let Some(index) = self.resources.get(uri) {
            return *index;
        }
        let index = self.ast.add_resource(uri);
        self.resources.insert(uri.to_string(), index);
        index
    }

    fn compile_location(&mut self, location: &Location) -> Result<SchemaId, CompileError> {
        if let Some(id) = self.compiled.get(location) {
            return Ok(*id);
        }
        let registry = self.registry;
        let unresolved = || CompileError::UnresolvedReference {
            reference: location.uri(),
            base: location.document.clone(),
        };
        let value = registry
            .get(&location.document)
            .and_then(|document| document.pointer(&location.pointer))
            .ok_or_else(unresolved)?;
        if !matches!(value, Value::Bool(_) | Value::Object(_)) {
            return Err(CompileError::InvalidSchema {
                location: location.uri(),
                reason: format!("expected an object or boolean, found {}", kind(value)),
            });
        }
        let site = self
            .index
            .ensure_site(location, registry)?
            .ok_or_else(unresolved)?;

        let resource = self.resource_index(&site.resource);
        let id = self.ast.reserve(location.uri(), resource);
        self.compiled.insert(location.clone(), id);

        let node = match value.as_object() {
            Some(map) => SchemaNode::Keywords(self.compile_keywords(map, location, &site)?),
            None => SchemaNode::Bool(value.as_bool() == Some(true)),
        };
        self.ast.define(id, node);
        Ok(id)
    }

    fn compile_keywords(
        &mut self,
        map: &Map<String, Value>,
        location: &Location,
        site: &Site,
    ) -> Result<Vec<KeywordEntry>, CompileError> {
        if let Some(dialect) = map.get("$schema") {
            let dialect = dialect
                .as_str()
                .ok_or_else(|| invalid("$schema", location, "must be a string"))?;
            if dialect.trim_end_matches('#') != DIALECT_2020_12 {
                return Err(CompileError::UnsupportedDialect(dialect.to_string()));
            }
        }

        let mut entries = Vec::with_capacity(map.len());
        for (name, value) in map {
            if IDENTIFIERS.contains(&name.as_str()) {
                continue;
            }
            let Some(keyword) = self.compile_keyword(name, value, map, location, site)? else {
                continue;
            };
            entries.push(KeywordEntry {
                keyword,
                location: location.child(name).uri(),
            });
        }
        Ok(entries)
    }

    fn compile_keyword(
        &mut self,
        name: &str,
        value: &Value,
        siblings: &Map<String, Value>,
        location: &Location,
        site: &Site,
    ) -> Result<Option<Keyword>, CompileError> {
        let here = location.child(name);
        let keyword = match name {
            "$ref" => {
                let reference = as_str(name, value, location)?;
                Keyword::Ref(self.compile_reference(reference, site)?)
            }
            "$dynamicRef" => {
                let reference = as_str(name, value, location)?;
                self.compile_dynamic_ref(reference, site)?
            }
            "$defs" | "definitions" => Keyword::Definitions(self.schema_map(name, value, &here)?),
            "$comment" => Keyword::Comment(as_str(name, value, location)?.to_string()),

            "allOf" => Keyword::AllOf(self.schema_list(name, value, &here)?),
            "anyOf" => Keyword::AnyOf(self.schema_list(name, value, &here)?),
            "oneOf" => Keyword::OneOf(self.schema_list(name, value, &here)?),
            "not" => Keyword::Not(self.compile_location(&here)?),
            "if" => Keyword::If {
                condition: self.compile_location(&here)?,
                then: self.sibling_schema(siblings, "then", location)?,
                otherwise: self.sibling_schema(siblings, "else", location)?,
            },
            "then" => Keyword::Then(self.compile_location(&here)?),
            "else" => Keyword::Else(self.compile_location(&here)?),
            "dependentSchemas" => Keyword::DependentSchemas(self.schema_map(name, value, &here)?),
            "prefixItems" => {
                let schemas = self.schema_list(name, value, &here)?;
                Keyword::PrefixItems(schemas)
            }
            "items" => Keyword::Items {
                schema: self.compile_location(&here)?,
                prefix_len: siblings
                    .get("prefixItems")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len),
            },
            "contains" => Keyword::Contains {
                schema: self.compile_location(&here)?,
                min: match siblings.get("minContains") {
                    Some(min) => as_count("minContains", min, location)?,
                    None => 1,
                },
                max: siblings
                    .get("maxContains")
                    .map(|max| as_count("maxContains", max, location))
                    .transpose()?,
            },
            "properties" => Keyword::Properties(self.schema_map(name, value, &here)?),
            "patternProperties" => {
                let schemas = self.schema_map(name, value, &here)?;
                let mut compiled = Vec::with_capacity(schemas.len());
                for (source, schema) in schemas {
                    compiled.push((pattern(&source)?, schema));
                }
                Keyword::PatternProperties(compiled)
            }
            "additionalProperties" => {
                let declared = siblings
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| props.keys().cloned().collect())
                    .unwrap_or_default();
                let patterns = match siblings.get("patternProperties").and_then(Value::as_object) {
                    Some(props) => props.keys().map(|source| pattern(source)).collect::<Result<_, _>>()?,
                    None => Vec::new(),
                };
                Keyword::AdditionalProperties {
                    schema: self.compile_location(&here)?,
                    declared,
                    patterns,
                }
            }
            "propertyNames" => Keyword::PropertyNames(self.compile_location(&here)?),
            "unevaluatedItems" => Keyword::UnevaluatedItems(self.compile_location(&here)?),
            "unevaluatedProperties" => Keyword::UnevaluatedProperties(self.compile_location(&here)?),

            "type" => Keyword::Type(types(value, location)?),
            "enum" => match value {
                Value::Array(values) => Keyword::Enum(values.clone()),
                _ => return Err(invalid(name, location, "must be an array")),
            },
            "const" => Keyword::Const(value.clone()),
            "multipleOf" => {
                let divisor = as_number(name, value, location)?;
                if divisor <= 0.0 {
                    return Err(invalid(name, location, "must be strictly greater than 0"));
                }
                Keyword::MultipleOf(divisor)
            }
            "maximum" => Keyword::Maximum(as_number(name, value, location)?),
            "exclusiveMaximum" => Keyword::ExclusiveMaximum(as_number(name, value, location)?),
            "minimum" => Keyword::Minimum(as_number(name, value, location)?),
            "exclusiveMinimum" => Keyword::ExclusiveMinimum(as_number(name, value, location)?),
            "maxLength" => Keyword::MaxLength(as_count(name, value, location)?),
            "minLength" => Keyword::MinLength(as_count(name, value, location)?),
            "pattern" => Keyword::Pattern(pattern(as_str(name, value, location)?)?),
            "maxItems" => Keyword::MaxItems(as_count(name, value, location)?),
            "minItems" => Keyword::MinItems(as_count(name, value, location)?),
            "uniqueItems" => match value {
                Value::Bool(unique) => Keyword::UniqueItems(*unique),
                _ => return Err(invalid(name, location, "must be a boolean")),
            },
            "maxContains" => Keyword::MaxContains(as_count(name, value, location)?),
            "minContains" => Keyword::MinContains(as_count(name, value, location)?),
            "maxProperties" => Keyword::MaxProperties(as_count(name, value, location)?),
            "minProperties" => Keyword::MinProperties(as_count(name, value, location)?),
            "required" => Keyword::Required(string_list(name, value, location)?),
            "dependentRequired" => {
                let Value::Object(map) = value else {
                    return Err(invalid(name, location, "must be an object"));
                };
                let mut dependencies = Vec::with_capacity(map.len());
                for (property, required) in map {
                    dependencies.push((property.clone(), string_list(name, required, location)?));
                }
                Keyword::DependentRequired(dependencies)
            }

            "default" => Keyword::Default(value.clone()),
            "format" => Keyword::Format(as_str(name, value, location)?.to_string()),
            other => {
                if let Some(name) = METADATA.iter().find(|known| **known == other).copied() {
                    Keyword::Metadata {
                        name,
                        value: value.clone(),
                    }
                } else if let Some(name) = CONTENT.iter().find(|known| **known == other).copied() {
                    Keyword::Content {
                        name,
                        value: value.clone(),
                    }
                } else if self.options.strict_keywords {
                    return Err(CompileError::UnknownKeyword {
                        keyword: other.to_string(),
                        location: location.uri(),
                    });
                } else {
                    warn!(keyword = %other, location = %location.uri(), "Skipping unknown keyword");
                    return Ok(None);
                }
            }
        };
        Ok(Some(keyword))
    }

    fn compile_reference(&mut self, reference: &str, site: &Site) -> Result<SchemaId, CompileError> {
        let target = uri::resolve(&site.base, reference)?;
        let location = self
            .index
            .lookup(target.as_str())
            .ok_or_else(|| CompileError::UnresolvedReference {
                reference: reference.to_string(),
                base: site.base.clone(),
            })?;
        self.compile_location(&location)
    }

    /// A `$dynamicRef` is dynamic only when its fragment is a plain name
    /// and its static target (if any) declares the same `$dynamicAnchor`.
    /// Everything else behaves like `$ref`.
    fn compile_dynamic_ref(&mut self, reference: &str, site: &Site) -> Result<Keyword, CompileError> {
        let target = uri::resolve(&site.base, reference)?;
        let fragment = uri::fragment(&target);
        let anchor = (!fragment.is_empty() && !fragment.starts_with('/')).then(|| fragment.to_string());

        let Some(anchor) = anchor else {
            return Ok(Keyword::Ref(self.compile_reference(reference, site)?));
        };
        let Some(location) = self.index.lookup(target.as_str()) else {
            return Ok(Keyword::DynamicRef {
                anchor,
                fallback: None,
            });
        };

        let bookended = self
            .registry
            .get(&location.document)
            .and_then(|document| document.pointer(&location.pointer))
            .and_then(|schema| schema.get("$dynamicAnchor"))
            .and_then(Value::as_str)
            == Some(anchor.as_str());
        let fallback = self.compile_location(&location)?;
        if bookended {
            Ok(Keyword::DynamicRef {
                anchor,
                fallback: Some(fallback),
            })
        } else {
            Ok(Keyword::Ref(fallback))
        }
    }

    fn sibling_schema(
        &mut self,
        siblings: &Map<String, Value>,
        name: &str,
        location: &Location,
    ) -> Result<Option<SchemaId>, CompileError> {
        if siblings.contains_key(name) {
            self.compile_location(&location.child(name)).map(Some)
        } else {
            Ok(None)
        }
    }

    fn schema_list(
        &mut self,
        name: &str,
        value: &Value,
        here: &Location,
    ) -> Result<Vec<SchemaId>, CompileError> {
        let Value::Array(items) = value else {
            return Err(invalid(name, here, "must be an array of schemas"));
        };
        if items.is_empty() && name != "prefixItems" {
            return Err(invalid(name, here, "must not be empty"));
        }
        (0..items.len())
            .map(|i| self.compile_location(&here.child(&i.to_string())))
            .collect()
    }

    fn schema_map(
        &mut self,
        name: &str,
        value: &Value,
        here: &Location,
    ) -> Result<Vec<(String, SchemaId)>, CompileError> {
        let Value::Object(map) = value else {
            return Err(invalid(name, here, "must be an object of schemas"));
        };
        let mut schemas = Vec::with_capacity(map.len());
        for key in map.keys() {
            schemas.push((key.clone(), self.compile_location(&here.child(key))?));
        }
        Ok(schemas)
    }
}

fn invalid(keyword: &str, location: &Location, reason: &str) -> CompileError {
    CompileError::InvalidKeywordValue {
        keyword: keyword.to_string(),
        location: location.uri(),
        reason: reason.to_string(),
    }
}

fn as_str<'v>(keyword: &str, value: &'v Value, location: &Location) -> Result<&'v str, CompileError> {
    value
        .as_str()
        .ok_or_else(|| invalid(keyword, location, "must be a string"))
}

fn as_number(keyword: &str, value: &Value, location: &Location) -> Result<f64, CompileError> {
    value
        .as_f64()
        .ok_or_else(|| invalid(keyword, location, "must be a number"))
}

/// Non-negative integer; `2.0` is accepted as `2`.
fn as_count(keyword: &str, value: &Value, location: &Location) -> Result<u64, CompileError> {
    if let Some(count) = value.as_u64() {
        return Ok(count);
    }
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
        _ => Err(invalid(keyword, location, "must be a non-negative integer")),
    }
}

fn string_list(keyword: &str, value: &Value, location: &Location) -> Result<Vec<String>, CompileError> {
    let Value::Array(items) = value else {
        return Err(invalid(keyword, location, "must be an array of strings"));
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(keyword, location, "must be an array of strings"))
        })
        .collect()
}

fn types(value: &Value, location: &Location) -> Result<Vec<JsonType>, CompileError> {
    let parse = |name: &Value| {
        name.as_str()
            .and_then(JsonType::parse)
            .ok_or_else(|| invalid("type", location, &format!("unknown type {name}")))
    };
    match value {
        Value::String(_) => Ok(vec![parse(value)?]),
        Value::Array(names) => names.iter().map(parse).collect(),
        _ => Err(invalid("type", location, "must be a string or an array of strings")),
    }
}

fn pattern(source: &str) -> Result<Pattern, CompileError> {
    Pattern::new(source).map_err(|e| CompileError::InvalidPattern {
        pattern: source.to_string(),
        reason: e.to_string(),
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile_one(document: Value) -> Result<CompiledSchema, CompileError> {
        let mut registry = SchemaRegistry::new();
        let uri = registry.register(document, Some("https://example.com/root"))?;
        Compiler::new(&registry, CompileOptions::default())?.compile(&uri)
    }

    fn keywords(compiled: &CompiledSchema, id: SchemaId) -> &[KeywordEntry] {
        match compiled.ast.node(id) {
            SchemaNode::Keywords(entries) => entries,
            SchemaNode::Bool(_) => panic!("expected keyword node"),
        }
    }

    fn find<'a>(compiled: &'a CompiledSchema, id: SchemaId, name: &str) -> &'a Keyword {
        &keywords(compiled, id)
            .iter()
            .find(|entry| entry.keyword.name() == name)
            .unwrap_or_else(|| panic!("no {name} keyword"))
            .keyword
    }

    #[test]
    fn compiles_properties_and_defaults() {
        let compiled = compile_one(json!({
            "type": "object",
            "properties": {"ccc": {"default": "foo"}}
        }))
        .unwrap();

        let Keyword::Properties(props) = find(&compiled, compiled.root, "properties") else {
            panic!("expected properties");
        };
        assert_eq!(props[0].0, "ccc");
        assert!(matches!(
            find(&compiled, props[0].1, "default"),
            Keyword::Default(v) if v == &json!("foo")
        ));
        assert_eq!(compiled.root_location(), "https://example.com/root#");
    }

    #[test]
    fn self_reference_closes_the_cycle() {
        let compiled = compile_one(json!({
            "properties": {"child": {"$ref": "#"}}
        }))
        .unwrap();
        let Keyword::Properties(props) = find(&compiled, compiled.root, "properties") else {
            panic!("expected properties");
        };
        assert!(matches!(find(&compiled, props[0].1, "$ref"), Keyword::Ref(id) if *id == compiled.root));
    }

    #[test]
    fn shared_subschemas_compile_once() {
        let compiled = compile_one(json!({
            "$defs": {"name": {"type": "string"}},
            "properties": {
                "first": {"$ref": "#/$defs/name"},
                "last": {"$ref": "#/$defs/name"}
            }
        }))
        .unwrap();
        // root, $defs/name, first, last
        assert_eq!(compiled.ast.len(), 4);
    }

    #[test]
    fn anchors_and_embedded_resources_resolve() {
        let compiled = compile_one(json!({
            "$defs": {
                "tagged": {"$anchor": "tag", "default": 1},
                "nested": {"$id": "https://example.com/nested", "default": 2}
            },
            "allOf": [{"$ref": "#tag"}, {"$ref": "nested"}]
        }))
        .unwrap();
        assert_eq!(compiled.ast.resources().len(), 2);
        let Keyword::AllOf(branches) = find(&compiled, compiled.root, "allOf") else {
            panic!("expected allOf");
        };
        let Keyword::Ref(tagged) = find(&compiled, branches[0], "$ref") else {
            panic!("expected $ref");
        };
        assert_eq!(compiled.ast.location(*tagged), "https://example.com/root#/$defs/tagged");
        let Keyword::Ref(nested) = find(&compiled, branches[1], "$ref") else {
            panic!("expected $ref");
        };
        assert_eq!(compiled.ast.location(*nested), "https://example.com/root#/$defs/nested");
    }

    #[test]
    fn cross_document_references_use_the_registry() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(json!({"$id": "https://example.com/address", "default": {}}), None)
            .unwrap();
        let uri = registry
            .register(
                json!({"$id": "https://example.com/person", "properties": {"home": {"$ref": "address"}}}),
                None,
            )
            .unwrap();
        let compiled = Compiler::new(&registry, CompileOptions::default())
            .unwrap()
            .compile(&uri)
            .unwrap();
        assert_eq!(compiled.ast.resources().len(), 2);
    }

    #[test]
    fn dynamic_ref_with_bookended_anchor_stays_dynamic() {
        let compiled = compile_one(json!({
            "$dynamicAnchor": "node",
            "properties": {"next": {"$dynamicRef": "#node"}}
        }))
        .unwrap();
        let Keyword::Properties(props) = find(&compiled, compiled.root, "properties") else {
            panic!("expected properties");
        };
        match find(&compiled, props[0].1, "$dynamicRef") {
            Keyword::DynamicRef { anchor, fallback } => {
                assert_eq!(anchor, "node");
                assert_eq!(*fallback, Some(compiled.root));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(compiled.ast.dynamic_anchors(compiled.root).get("node"), Some(&compiled.root));
    }

    #[test]
    fn dynamic_ref_without_bookend_degrades_to_ref() {
        let compiled = compile_one(json!({
            "$anchor": "plain",
            "items": {"$dynamicRef": "#plain"}
        }))
        .unwrap();
        let Keyword::Items { schema, .. } = find(&compiled, compiled.root, "items") else {
            panic!("expected items");
        };
        assert!(matches!(find(&compiled, *schema, "$dynamicRef"), Keyword::Ref(_)));
    }

    #[test]
    fn sibling_data_is_folded_in() {
        let compiled = compile_one(json!({
            "prefixItems": [{}, {}],
            "items": {},
            "contains": {},
            "maxContains": 3,
            "properties": {"a": {}},
            "patternProperties": {"^x-": {}},
            "additionalProperties": false,
            "if": {}, "then": {}
        }))
        .unwrap();
        assert!(matches!(
            find(&compiled, compiled.root, "items"),
            Keyword::Items { prefix_len: 2, .. }
        ));
        assert!(matches!(
            find(&compiled, compiled.root, "contains"),
            Keyword::Contains { min: 1, max: Some(3), .. }
        ));
        match find(&compiled, compiled.root, "additionalProperties") {
            Keyword::AdditionalProperties { declared, patterns, .. } => {
                assert_eq!(declared, &vec!["a".to_string()]);
                assert_eq!(patterns[0].as_str(), "^x-");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            find(&compiled, compiled.root, "if"),
            Keyword::If { then: Some(_), otherwise: None, .. }
        ));
    }

    #[test]
    fn unknown_keywords_are_skipped_unless_strict() {
        let document = json!({"frobnicate": 1, "default": 0});
        let compiled = compile_one(document.clone()).unwrap();
        assert_eq!(keywords(&compiled, compiled.root).len(), 1);

        let mut registry = SchemaRegistry::new();
        let uri = registry.register(document, Some("https://example.com/strict")).unwrap();
        let err = Compiler::new(&registry, CompileOptions { strict_keywords: true })
            .unwrap()
            .compile(&uri)
            .unwrap_err();
        assert!(matches!(err, CompileError::UnknownKeyword { keyword, .. } if keyword == "frobnicate"));
    }

    #[test]
    fn rejects_malformed_keyword_values() {
        let err = compile_one(json!({"minLength": -1})).unwrap_err();
        assert!(matches!(err, CompileError::InvalidKeywordValue { keyword, .. } if keyword == "minLength"));

        let err = compile_one(json!({"properties": []})).unwrap_err();
        assert!(matches!(err, CompileError::InvalidKeywordValue { keyword, .. } if keyword == "properties"));

        let err = compile_one(json!({"pattern": "("})).unwrap_err();
        assert!(matches!(err, CompileError::InvalidPattern { .. }));

        let err = compile_one(json!({"type": "float"})).unwrap_err();
        assert!(matches!(err, CompileError::InvalidKeywordValue { keyword, .. } if keyword == "type"));

        let err = compile_one(json!({"properties": {"a": 3}})).unwrap_err();
        assert!(matches!(err, CompileError::InvalidSchema { .. }));
    }

    #[test]
    fn rejects_other_dialects_and_dangling_refs() {
        let err = compile_one(json!({"$schema": "http://json-schema.org/draft-07/schema#"})).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedDialect(_)));

        assert!(compile_one(json!({"$schema": "https://json-schema.org/draft/2020-12/schema"})).is_ok());

        let err = compile_one(json!({"$ref": "https://example.com/missing"})).unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedReference { .. }));

        let err = compile_one(json!({"$ref": "#/$defs/missing"})).unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedReference { .. }));
    }

    #[test]
    fn compiling_an_unregistered_uri_fails() {
        let registry = SchemaRegistry::new();
        let err = Compiler::new(&registry, CompileOptions::default())
            .unwrap()
            .compile("https://example.com/nothing")
            .unwrap_err();
        assert!(matches!(err, CompileError::NotRegistered(_)));
    }
}
