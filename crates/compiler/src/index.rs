//! Resource index: where every schema resource, anchor and subschema
//! lives inside the registered documents, and which base URI applies at
//! each subschema.

use crate::registry::SchemaRegistry;
use crate::uri;
use schemafill_core::CompileError;
use serde_json::Value;
use std::collections::HashMap;

/// A position inside a registered document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Location {
    pub document: String,
    pub pointer: String,
}

impl Location {
    pub fn root(document: &str) -> Self {
        Self {
            document: document.to_string(),
            pointer: String::new(),
        }
    }

    pub fn child(&self, segment: &str) -> Self {
        let escaped = segment.replace('~', "~0").replace('/', "~1");
        Self {
            document: self.document.clone(),
            pointer: format!("{}/{}", self.pointer, escaped),
        }
    }

    pub fn uri(&self) -> String {
        format!("{}#{}", self.document, self.pointer)
    }

    fn parent(&self) -> Option<Self> {
        let pos = self.pointer.rfind('/')?;
        Some(Self {
            document: self.document.clone(),
            pointer: self.pointer[..pos].to_string(),
        })
    }
}

/// Base URI and owning resource in effect at a subschema.
#[derive(Debug, Clone)]
pub(crate) struct Site {
    pub base: String,
    pub resource: String,
}

/// How a keyword holds its subschemas.
enum Shape {
    Single,
    Map,
    Array,
}

fn subschema_shape(keyword: &str) -> Option<Shape> {
    match keyword {
        "additionalProperties" | "propertyNames" | "items" | "contains" | "if" | "then"
        | "else" | "not" | "unevaluatedItems" | "unevaluatedProperties" | "contentSchema" => {
            Some(Shape::Single)
        }
        "properties" | "patternProperties" | "$defs" | "definitions" | "dependentSchemas" => {
            Some(Shape::Map)
        }
        "allOf" | "anyOf" | "oneOf" | "prefixItems" => Some(Shape::Array),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub(crate) struct ResourceIndex {
    resources: HashMap<String, Location>,
    anchors: HashMap<String, Location>,
    dynamic_anchors: HashMap<String, Vec<(String, Location)>>,
    sites: HashMap<Location, Site>,
}

impl ResourceIndex {
    pub fn build(registry: &SchemaRegistry) -> Result<Self, CompileError> {
        let mut index = Self::default();
        for (uri, document) in registry.iter() {
            let location = Location::root(uri);
            index.resources.insert(uri.to_string(), location.clone());
            index.walk(document, &location, uri, uri)?;
        }
        Ok(index)
    }

    fn walk(
        &mut self,
        value: &Value,
        location: &Location,
        base: &str,
        resource: &str,
    ) -> Result<(), CompileError> {
        let map = match value {
            Value::Object(map) => map,
            Value::Bool(_) => {
                self.sites.insert(
                    location.clone(),
                    Site {
                        base: base.to_string(),
                        resource: resource.to_string(),
                    },
                );
                return Ok(());
            }
            _ => return Ok(()),
        };

        let (base, resource) = match map.get("$id") {
            Some(Value::String(id)) => {
                let resolved = uri::resolve(base, id)?;
                if !uri::fragment(&resolved).is_empty() {
                    return Err(CompileError::InvalidKeywordValue {
                        keyword: "$id".into(),
                        location: location.uri(),
                        reason: "must not contain a non-empty fragment".into(),
                    });
                }
                let absolute = uri::absolute(&resolved);
                self.resources.insert(absolute.clone(), location.clone());
                (absolute.clone(), absolute)
            }
            Some(_) => {
                return Err(CompileError::InvalidKeywordValue {
                    keyword: "$id".into(),
                    location: location.uri(),
                    reason: "must be a string".into(),
                });
            }
            None => (base.to_string(), resource.to_string()),
        };

        self.sites.insert(
            location.clone(),
            Site {
                base: base.clone(),
                resource: resource.clone(),
            },
        );

        if let Some(name) = map.get("$anchor").and_then(Value::as_str) {
            self.anchors.insert(format!("{base}#{name}"), location.clone());
        }
        if let Some(name) = map.get("$dynamicAnchor").and_then(Value::as_str) {
            self.anchors.insert(format!("{base}#{name}"), location.clone());
            self.dynamic_anchors
                .entry(resource.clone())
                .or_default()
                .push((name.to_string(), location.clone()));
        }

        for (keyword, child) in map {
            let Some(shape) = subschema_shape(keyword) else {
                continue;
            };
            let keyword_location = location.child(keyword);
            match (shape, child) {
                (Shape::Single, _) => self.walk(child, &keyword_location, &base, &resource)?,
                (Shape::Map, Value::Object(children)) => {
                    for (name, schema) in children {
                        self.walk(schema, &keyword_location.child(name), &base, &resource)?;
                    }
                }
                (Shape::Array, Value::Array(children)) => {
                    for (i, schema) in children.iter().enumerate() {
                        self.walk(
                            schema,
                            &keyword_location.child(&i.to_string()),
                            &base,
                            &resource,
                        )?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Find the location an absolute URI (with optional fragment) names.
    pub fn lookup(&self, target: &str) -> Option<Location> {
        let url = uri::parse(target).ok()?;
        let absolute = uri::absolute(&url);
        let fragment = uri::percent_decode(uri::fragment(&url));
        let root = self.resources.get(&absolute)?;
        if fragment.is_empty() {
            Some(root.clone())
        } else if fragment.starts_with('/') {
            Some(Location {
                document: root.document.clone(),
                pointer: format!("{}{}", root.pointer, fragment),
            })
        } else {
            self.anchors.get(&format!("{absolute}#{fragment}")).cloned()
        }
    }

    /// Site of `location`. Locations that the initial walk did not reach
    /// (subschemas under unknown keywords) inherit the site of their
    /// nearest indexed ancestor and are indexed on first use.
    pub fn ensure_site(
        &mut self,
        location: &Location,
        registry: &SchemaRegistry,
    ) -> Result<Option<Site>, CompileError> {
        if let Some(site) = self.sites.get(location) {
            return Ok(Some(site.clone()));
        }
        let mut ancestor = location.parent();
        while let Some(candidate) = ancestor {
            if let Some(site) = self.sites.get(&candidate).cloned() {
                let Some(value) = registry
                    .get(&location.document)
                    .and_then(|doc| doc.pointer(&location.pointer))
                else {
                    return Ok(None);
                };
                self.walk(value, location, &site.base, &site.resource)?;
                return Ok(self.sites.get(location).cloned());
            }
            ancestor = candidate.parent();
        }
        Ok(None)
    }

    pub fn dynamic_anchors(&self, resource: &str) -> Vec<(String, Location)> {
        self.dynamic_anchors
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }
}
