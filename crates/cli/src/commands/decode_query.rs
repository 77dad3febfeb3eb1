//! `schemafill decode-query`: form query string to typed JSON.

use super::{CmdResult, print_json, read_json};
use schemafill_config::AppConfig;
use schemafill_forms::decode_form_query;
use serde_json::Value;
use std::path::Path;

pub fn run(config: &AppConfig, schema: &Path, query: &str) -> CmdResult {
    let schema = read_json(schema)?;
    let decoded = decode_form_query(&schema, query)?;
    print_json(&Value::Object(decoded), config.output.pretty)
}
