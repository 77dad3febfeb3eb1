//! `schemafill apply`: fill schema defaults into a document.

use super::{CmdResult, compile_schema, print_json, read_json};
use schemafill_config::AppConfig;
use schemafill_engine::{DefaultsEngine, EngineOptions};
use schemafill_validator::JsonSchemaValidator;
use std::path::PathBuf;

pub struct ApplyArgs {
    pub schema: PathBuf,
    pub instance: Option<PathBuf>,
    pub with: Vec<PathBuf>,
    pub validate: bool,
    pub compact: bool,
}

pub fn run(config: &AppConfig, args: ApplyArgs) -> CmdResult {
    let compiled = compile_schema(config, &args.schema, &args.with)?;
    let options = EngineOptions {
        max_depth: config.engine.max_depth,
        validate_output: args.validate || config.engine.validate_output,
    };
    let engine = DefaultsEngine::new(
        compiled,
        JsonSchemaValidator::with_max_depth(config.engine.max_depth),
        options,
    );

    let filled = match &args.instance {
        Some(path) => engine.apply_owned(read_json(path)?)?,
        None => engine.materialize()?.ok_or_else(|| {
            format!(
                "{} declares no root default; pass --instance",
                args.schema.display()
            )
        })?,
    };

    print_json(&filled, config.output.pretty && !args.compact)
}
