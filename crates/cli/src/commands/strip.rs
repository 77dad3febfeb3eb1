//! `schemafill strip`: drop members the schema does not declare.

use super::{CmdResult, compile_schema, print_json, read_json};
use schemafill_config::AppConfig;
use schemafill_core::{DynamicScope, SchemaValidator};
use schemafill_forms::remove_extra_properties;
use schemafill_validator::JsonSchemaValidator;
use std::path::Path;

pub fn run(config: &AppConfig, schema: &Path, instance: &Path) -> CmdResult {
    let raw_schema = read_json(schema)?;
    let mut document = read_json(instance)?;

    // Stripping goes ahead either way; a nonconforming input is only reported.
    let compiled = compile_schema(config, schema, &[])?;
    let validator = JsonSchemaValidator::with_max_depth(config.engine.max_depth);
    if !validator.validate(&compiled.ast, compiled.root, &document, &DynamicScope::new())? {
        tracing::warn!(
            instance = %instance.display(),
            "Document does not conform to its schema before stripping"
        );
    }

    remove_extra_properties(&raw_schema, &mut document);
    print_json(&document, config.output.pretty)
}
