//! Subcommand implementations and the schema loading they share.

pub mod apply;
pub mod config_cmd;
pub mod decode_query;
pub mod strip;
pub mod validate;

use schemafill_compiler::{CompileOptions, SchemaRegistry};
use schemafill_config::AppConfig;
use schemafill_core::CompiledSchema;
use serde_json::Value;
use std::path::{Path, PathBuf};

type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Read a JSON document from `path`, or from stdin when `path` is `-`.
pub fn read_json(path: &Path) -> CmdResult<Value> {
    let content = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin())
            .map_err(|e| format!("Failed to read stdin: {e}"))?
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?
    };
    let value = serde_json::from_str(&content)
        .map_err(|e| format!("Invalid JSON in {}: {e}", path.display()))?;
    Ok(value)
}

/// `file://` URI a schema file is registered under unless it carries an
/// absolute `$id`.
pub fn file_uri(path: &Path) -> CmdResult<String> {
    let absolute = std::path::absolute(path)
        .map_err(|e| format!("Failed to resolve {}: {e}", path.display()))?;
    let url = url::Url::from_file_path(&absolute)
        .map_err(|()| format!("Cannot express {} as a file URI", absolute.display()))?;
    Ok(url.into())
}

/// Register the configured preloads, the `--with` files and finally
/// `schema`, then compile `schema`.
pub fn compile_schema(config: &AppConfig, schema: &Path, with: &[PathBuf]) -> CmdResult<CompiledSchema> {
    let mut registry = SchemaRegistry::new();
    for extra in config.schemas.preload.iter().chain(with) {
        let uri = registry.register(read_json(extra)?, Some(&file_uri(extra)?))?;
        tracing::debug!(path = %extra.display(), uri = %uri, "Loaded extra schema");
    }
    let uri = registry.register(read_json(schema)?, Some(&file_uri(schema)?))?;
    let options = CompileOptions {
        strict_keywords: config.compiler.strict_keywords,
    };
    Ok(schemafill_compiler::compile(&registry, &uri, options)?)
}

pub fn print_json(value: &Value, pretty: bool) -> CmdResult {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
