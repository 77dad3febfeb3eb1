//! Schema document registry, keyed by absolute URI.

use crate::uri;
use schemafill_core::CompileError;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Raw schema documents available to the compiler.
///
/// A registry is an ordinary value: callers build one per compilation
/// (or keep one per application) instead of sharing a global table.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    documents: HashMap<String, Value>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document and return the URI it was registered under.
    ///
    /// The URI is the document's `$id`, resolved against `retrieval_uri`
    /// when both are present. A document without either is rejected.
    pub fn register(
        &mut self,
        document: Value,
        retrieval_uri: Option<&str>,
    ) -> Result<String, CompileError> {
        let id = document.get("$id").and_then(Value::as_str);
        let url = match (id, retrieval_uri) {
            (Some(id), Some(retrieval)) => uri::resolve(retrieval, id)?,
            (Some(id), None) => uri::parse(id)?,
            (None, Some(retrieval)) => uri::parse(retrieval)?,
            (None, None) => return Err(CompileError::MissingId),
        };
        let uri = uri::absolute(&url);
        if self.documents.insert(uri.clone(), document).is_some() {
            debug!(uri = %uri, "Replaced registered schema");
        } else {
            debug!(uri = %uri, "Registered schema");
        }
        Ok(uri)
    }

    /// Remove a document. Returns it if it was registered.
    pub fn unregister(&mut self, uri: &str) -> Option<Value> {
        self.documents.remove(&uri::document_key(uri)?)
    }

    /// Look up a document by its registered (fragment-less) URI.
    pub fn get(&self, uri: &str) -> Option<&Value> {
        self.documents.get(uri)
    }

    pub fn contains(&self, uri: &str) -> bool {
        uri::document_key(uri).is_some_and(|key| self.documents.contains_key(&key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.documents.iter().map(|(uri, doc)| (uri.as_str(), doc))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registers_under_id() {
        let mut registry = SchemaRegistry::new();
        let uri = registry
            .register(json!({"$id": "https://example.com/person"}), None)
            .unwrap();
        assert_eq!(uri, "https://example.com/person");
        assert!(registry.contains("https://example.com/person#"));
    }

    #[test]
    fn relative_id_resolves_against_retrieval_uri() {
        let mut registry = SchemaRegistry::new();
        let uri = registry
            .register(
                json!({"$id": "address.json"}),
                Some("https://example.com/schemas/person.json"),
            )
            .unwrap();
        assert_eq!(uri, "https://example.com/schemas/address.json");
    }

    #[test]
    fn document_without_any_uri_is_rejected() {
        let mut registry = SchemaRegistry::new();
        let err = registry.register(json!({"type": "object"}), None).unwrap_err();
        assert!(matches!(err, CompileError::MissingId));
        assert!(registry.is_empty());
    }

    #[test]
    fn relative_id_without_retrieval_uri_is_rejected() {
        let mut registry = SchemaRegistry::new();
        let err = registry.register(json!({"$id": "person.json"}), None).unwrap_err();
        assert!(matches!(err, CompileError::InvalidUri { .. }));
    }

    #[test]
    fn unregister_removes_document() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(json!({}), Some("https://example.com/tmp"))
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.unregister("https://example.com/tmp").is_some());
        assert!(registry.unregister("https://example.com/tmp").is_none());
    }
}
