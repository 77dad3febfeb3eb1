//! JSON Schema 2020-12 compiler for schemafill.
//!
//! Raw schema documents are registered in a [`SchemaRegistry`], indexed
//! for `$id` / `$anchor` / `$dynamicAnchor`, and compiled into the
//! arena AST from `schemafill-core`. References are resolved here, once;
//! nothing downstream parses schema text.
//!
//! ```no_run
//! use schemafill_compiler::{compile_document, CompileOptions};
//! use serde_json::json;
//!
//! let compiled = compile_document(
//!     json!({"properties": {"ccc": {"default": "foo"}}}),
//!     CompileOptions::default(),
//! )
//! .unwrap();
//! assert!(!compiled.ast.is_empty());
//! ```

mod compile;
mod index;
pub mod registry;
pub mod uri;

pub use compile::{CompileOptions, Compiler, DIALECT_2020_12};
pub use registry::SchemaRegistry;

use schemafill_core::{CompileError, CompiledSchema};
use serde_json::Value;

/// Retrieval URI given to documents compiled without a registry.
pub const ANONYMOUS_BASE: &str = "https://schemafill.local/schema";

/// Compile the registered schema at `uri`.
pub fn compile(
    registry: &SchemaRegistry,
    uri: &str,
    options: CompileOptions,
) -> Result<CompiledSchema, CompileError> {
    Compiler::new(registry, options)?.compile(uri)
}

/// Compile a standalone document. A document without `$id` is given
/// [`ANONYMOUS_BASE`] as its URI.
pub fn compile_document(
    document: Value,
    options: CompileOptions,
) -> Result<CompiledSchema, CompileError> {
    let mut registry = SchemaRegistry::new();
    let uri = registry.register(document, Some(ANONYMOUS_BASE))?;
    compile(&registry, &uri, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn standalone_documents_get_the_anonymous_base() {
        let compiled = compile_document(json!({"default": 1}), CompileOptions::default()).unwrap();
        assert_eq!(compiled.root_location(), "https://schemafill.local/schema#");
    }

    #[test]
    fn standalone_documents_keep_their_id() {
        let compiled = compile_document(
            json!({"$id": "https://example.com/tree", "items": {"$ref": "#"}}),
            CompileOptions::default(),
        )
        .unwrap();
        assert_eq!(compiled.root_location(), "https://example.com/tree#");
        assert_eq!(compiled.ast.len(), 2);
    }

    #[test]
    fn boolean_root_schemas_compile() {
        let compiled = compile_document(json!(false), CompileOptions::default());
        // a boolean document has no $id but still gets the anonymous base
        let compiled = compiled.unwrap();
        assert_eq!(compiled.ast.len(), 1);
    }
}
