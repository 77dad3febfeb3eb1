//! Compiled schema AST: an arena of nodes addressed by [`SchemaId`].

use crate::keyword::Keyword;
use std::collections::BTreeMap;
use std::fmt;

/// Stable index of a node in a [`SchemaAst`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(u32);

impl SchemaId {
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema#{}", self.0)
    }
}

/// One unit of the compiled schema: a boolean leaf or a bag of keywords.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Bool(bool),
    Keywords(Vec<KeywordEntry>),
}

/// A compiled keyword together with its annotation slot, the absolute
/// schema location the keyword was compiled from.
#[derive(Debug, Clone)]
pub struct KeywordEntry {
    pub keyword: Keyword,
    pub location: String,
}

/// Per-node metadata.
#[derive(Debug, Clone)]
pub struct NodeMeta {
    /// Absolute location of the node, `<document uri>#<json pointer>`.
    pub location: String,
    /// Index of the schema resource (the closest enclosing `$id`).
    pub resource: usize,
}

/// A schema resource: a document root or an embedded `$id` subschema.
#[derive(Debug, Clone, Default)]
pub struct Resource {
    pub uri: String,
    /// Dynamic anchors declared anywhere inside this resource.
    pub dynamic_anchors: BTreeMap<String, SchemaId>,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaAst {
    nodes: Vec<SchemaNode>,
    meta: Vec<NodeMeta>,
    resources: Vec<Resource>,
}

impl SchemaAst {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a node slot before its keywords are compiled, so that
    /// cyclic references can point at it. The slot holds `true` until
    /// [`SchemaAst::define`] replaces it.
    pub fn reserve(&mut self, location: impl Into<String>, resource: usize) -> SchemaId {
        let id = SchemaId::from_index(self.nodes.len());
        self.nodes.push(SchemaNode::Bool(true));
        self.meta.push(NodeMeta {
            location: location.into(),
            resource,
        });
        id
    }

    pub fn define(&mut self, id: SchemaId, node: SchemaNode) {
        self.nodes[id.index()] = node;
    }

    pub fn add_resource(&mut self, uri: impl Into<String>) -> usize {
        self.resources.push(Resource {
            uri: uri.into(),
            dynamic_anchors: BTreeMap::new(),
        });
        self.resources.len() - 1
    }

    pub fn resource(&self, index: usize) -> &Resource {
        &self.resources[index]
    }

    pub fn resource_mut(&mut self, index: usize) -> &mut Resource {
        &mut self.resources[index]
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn node(&self, id: SchemaId) -> &SchemaNode {
        &self.nodes[id.index()]
    }

    pub fn meta(&self, id: SchemaId) -> &NodeMeta {
        &self.meta[id.index()]
    }

    pub fn location(&self, id: SchemaId) -> &str {
        &self.meta[id.index()].location
    }

    /// Dynamic anchors that become visible when evaluation enters `id`.
    pub fn dynamic_anchors(&self, id: SchemaId) -> &BTreeMap<String, SchemaId> {
        &self.resources[self.meta[id.index()].resource].dynamic_anchors
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Output of the compiler: the arena plus the root node reference.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    pub ast: SchemaAst,
    pub root: SchemaId,
}

impl CompiledSchema {
    /// Absolute location of the root node.
    pub fn root_location(&self) -> &str {
        self.ast.location(self.root)
    }
}
