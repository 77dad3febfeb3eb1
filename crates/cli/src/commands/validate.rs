//! `schemafill validate`: check a document against a schema.

use super::{CmdResult, compile_schema, read_json};
use schemafill_config::AppConfig;
use schemafill_core::{DynamicScope, SchemaValidator};
use schemafill_validator::JsonSchemaValidator;
use std::path::{Path, PathBuf};

pub fn run(config: &AppConfig, schema: &Path, instance: &Path, with: &[PathBuf]) -> CmdResult {
    let compiled = compile_schema(config, schema, with)?;
    let document = read_json(instance)?;
    let validator = JsonSchemaValidator::with_max_depth(config.engine.max_depth);

    if validator.validate(&compiled.ast, compiled.root, &document, &DynamicScope::new())? {
        println!("valid");
        Ok(())
    } else {
        Err(format!(
            "{} does not conform to {}",
            instance.display(),
            schema.display()
        )
        .into())
    }
}
