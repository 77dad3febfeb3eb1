//! Default-application engine for schemafill.
//!
//! Fills declared `default` values into a JSON document without touching
//! anything the document already supplies. The engine walks a schema
//! compiled by `schemafill-compiler` and asks a [`SchemaValidator`] which
//! branch of `anyOf`, `oneOf` and `if` applies.
//!
//! ```no_run
//! use schemafill_engine::add_defaults;
//! use serde_json::json;
//!
//! let schema = json!({"type": "object", "properties": {"ccc": {"default": "foo"}}});
//! let filled = add_defaults(schema, json!({})).unwrap();
//! assert_eq!(filled, json!({"ccc": "foo"}));
//! ```

pub mod coverage;
pub mod evaluator;
mod handlers;

pub use coverage::CoverageTracker;
pub use evaluator::Evaluator;

use schemafill_compiler::{CompileOptions, compile_document};
use schemafill_core::{CompiledSchema, DynamicScope, Error, EvalError, Result, SchemaValidator};
use schemafill_validator::JsonSchemaValidator;
use serde_json::Value;
use tracing::{debug, warn};

/// Default recursion bound for evaluation.
pub const DEFAULT_MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Maximum schema nesting depth before a pass fails with
    /// `DepthExceeded`.
    pub max_depth: usize,
    /// Validate the filled document against the root schema.
    pub validate_output: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            validate_output: false,
        }
    }
}

/// A compiled schema ready to fill documents.
///
/// Every pass starts from an empty dynamic scope and a fresh
/// [`CoverageTracker`]; nothing carries over between calls.
pub struct DefaultsEngine<V = JsonSchemaValidator> {
    compiled: CompiledSchema,
    validator: V,
    options: EngineOptions,
}

impl<V: SchemaValidator> DefaultsEngine<V> {
    pub fn new(compiled: CompiledSchema, validator: V, options: EngineOptions) -> Self {
        Self {
            compiled,
            validator,
            options,
        }
    }

    pub fn compiled(&self) -> &CompiledSchema {
        &self.compiled
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Fill defaults into `instance` in place.
    ///
    /// On failure `instance` keeps the defaults filled before the error.
    pub fn apply(&self, instance: &mut Value) -> Result<()> {
        let mut slot = Some(std::mem::take(instance));
        let result = self.run(&mut slot);
        if let Some(value) = slot {
            *instance = value;
        }
        result?;
        self.check_output(instance)
    }

    /// Fill defaults into an owned document and return it.
    pub fn apply_owned(&self, mut instance: Value) -> Result<Value> {
        self.apply(&mut instance)?;
        Ok(instance)
    }

    /// The document produced from nothing: the root's own default with
    /// everything beneath it filled. `None` when the root declares no
    /// default.
    pub fn materialize(&self) -> Result<Option<Value>> {
        let mut slot = None;
        self.run(&mut slot)?;
        if let Some(value) = &slot {
            self.check_output(value)?;
        }
        Ok(slot)
    }

    fn run(&self, slot: &mut Option<Value>) -> std::result::Result<(), EvalError> {
        debug!(schema = %self.compiled.root_location(), "Applying defaults");
        let evaluator = Evaluator::new(&self.compiled.ast, &self.validator, self.options.max_depth);
        let mut coverage = CoverageTracker::new();
        evaluator.evaluate(self.compiled.root, slot, &DynamicScope::new(), &mut coverage)
    }

    fn check_output(&self, instance: &Value) -> Result<()> {
        if !self.options.validate_output {
            return Ok(());
        }
        let valid = self
            .validator
            .validate(&self.compiled.ast, self.compiled.root, instance, &DynamicScope::new())
            .map_err(EvalError::from)?;
        if valid {
            Ok(())
        } else {
            let schema = self.compiled.root_location().to_string();
            warn!(schema = %schema, "Filled document does not conform to its schema");
            Err(Error::InstanceValidation { schema })
        }
    }
}

/// Compile `schema`, fill its defaults into `instance` and return the
/// result. The schema is compiled into a throwaway registry, so nothing
/// stays registered afterwards.
pub fn add_defaults(schema: Value, instance: Value) -> Result<Value> {
    let compiled = compile_document(schema, CompileOptions::default())?;
    let engine = DefaultsEngine::new(
        compiled,
        JsonSchemaValidator::with_max_depth(DEFAULT_MAX_DEPTH),
        EngineOptions::default(),
    );
    engine.apply_owned(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use schemafill_core::CompileError;
    use serde_json::json;

    fn engine(schema: Value, options: EngineOptions) -> DefaultsEngine {
        let compiled = compile_document(schema, CompileOptions::default()).unwrap();
        DefaultsEngine::new(compiled, JsonSchemaValidator::new(), options)
    }

    #[test]
    fn fills_a_missing_property() {
        let schema = json!({"type": "object", "properties": {"ccc": {"default": "foo"}}});
        assert_eq!(add_defaults(schema, json!({})).unwrap(), json!({"ccc": "foo"}));
    }

    #[test]
    fn extends_prefix_items_from_defaults() {
        let schema = json!({"prefixItems": [{"default": 39}, {"default": "foo"}]});
        assert_eq!(add_defaults(schema, json!([])).unwrap(), json!([39, "foo"]));
    }

    #[test]
    fn if_selects_then_or_else() {
        let schema = json!({
            "if": {"required": ["aaa"]},
            "then": {"properties": {"bbb": {"default": 1}}},
            "else": {"properties": {"bbb": {"default": 2}}}
        });
        assert_eq!(
            add_defaults(schema.clone(), json!({"aaa": 1})).unwrap(),
            json!({"aaa": 1, "bbb": 1})
        );
        assert_eq!(add_defaults(schema, json!({})).unwrap(), json!({"bbb": 2}));
    }

    #[test]
    fn unevaluated_properties_only_reach_uncovered_keys() {
        let schema = json!({
            "properties": {"a": {"default": {}}},
            "unevaluatedProperties": {"properties": {"tag": {"default": "x"}}}
        });
        assert_eq!(
            add_defaults(schema, json!({"b": {}})).unwrap(),
            json!({"a": {}, "b": {"tag": "x"}})
        );
    }

    #[test]
    fn root_default_is_visible_to_unevaluated_properties() {
        let engine = engine(
            json!({
                "default": {"k": {}},
                "unevaluatedProperties": {"properties": {"tag": {"default": "x"}}}
            }),
            EngineOptions::default(),
        );
        assert_eq!(engine.materialize().unwrap(), Some(json!({"k": {"tag": "x"}})));
    }

    #[test]
    fn materialize_without_root_default_is_absent() {
        let engine = engine(
            json!({"properties": {"a": {"default": 1}}}),
            EngineOptions::default(),
        );
        assert_eq!(engine.materialize().unwrap(), None);
    }

    #[test]
    fn explicit_falsy_values_are_kept() {
        let schema = json!({
            "properties": {
                "flag": {"default": true},
                "count": {"default": 5},
                "name": {"default": "n"},
                "note": {"default": "x"}
            }
        });
        let instance = json!({"flag": false, "count": 0, "name": "", "note": null});
        assert_eq!(add_defaults(schema, instance.clone()).unwrap(), instance);
    }

    #[test]
    fn self_reference_without_progress_hits_the_depth_limit() {
        let engine = engine(
            json!({"$ref": "#"}),
            EngineOptions {
                max_depth: 32,
                validate_output: false,
            },
        );
        let err = engine.apply_owned(json!({})).unwrap_err();
        assert!(matches!(
            err,
            Error::Application(EvalError::DepthExceeded { limit: 32, .. })
        ));
    }

    #[test]
    fn output_validation_reports_nonconforming_documents() {
        let schema = json!({"properties": {"a": {"type": "integer", "default": "x"}}});
        let checked = engine(
            schema.clone(),
            EngineOptions {
                validate_output: true,
                ..EngineOptions::default()
            },
        );
        let err = checked.apply_owned(json!({})).unwrap_err();
        assert!(matches!(err, Error::InstanceValidation { .. }));

        let unchecked = engine(schema, EngineOptions::default());
        assert_eq!(unchecked.apply_owned(json!({})).unwrap(), json!({"a": "x"}));
    }

    #[test]
    fn failed_pass_keeps_partial_mutation() {
        let engine = engine(
            json!({
                "properties": {
                    "a": {"default": 1},
                    "b": {"$dynamicRef": "#missing"}
                }
            }),
            EngineOptions::default(),
        );
        let mut instance = json!({"b": {}});
        let err = engine.apply(&mut instance).unwrap_err();
        assert!(matches!(
            err,
            Error::Application(EvalError::UnresolvedDynamicAnchor { .. })
        ));
        assert_eq!(instance, json!({"a": 1, "b": {}}));
    }

    #[test]
    fn invalid_schemas_surface_as_compilation_errors() {
        let err = add_defaults(json!({"minItems": "two"}), json!([])).unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaCompilation(CompileError::InvalidKeywordValue { .. })
        ));
    }

    #[test]
    fn conditions_see_defaults_filled_by_siblings() {
        let schema = json!({
            "properties": {"a": {"default": 1}},
            "if": {"required": ["a"]},
            "then": {"properties": {"b": {"default": "then"}}},
            "else": {"properties": {"c": {"default": "else"}}}
        });
        let engine = engine(schema, EngineOptions::default());
        let once = engine.apply_owned(json!({})).unwrap();
        assert_eq!(once, json!({"a": 1, "b": "then"}));
        assert_eq!(engine.apply_owned(once.clone()).unwrap(), once);
    }

    #[test]
    fn member_order_follows_the_input_document() {
        let schema = json!({
            "properties": {
                "m": {"default": 2},
                "a": {"properties": {"x": {"default": 1}}}
            }
        });
        let filled = add_defaults(schema, json!({"z": 1, "a": {}})).unwrap();
        let keys: Vec<_> = filled.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_eq!(
            serde_json::to_string(&filled).unwrap(),
            r#"{"z":1,"a":{"x":1},"m":2}"#
        );
    }

    #[test]
    fn any_of_over_large_arrays_stays_linear() {
        let schema = json!({"items": {"anyOf": [{"properties": {"a": {"default": 1}}}]}});
        let instance = Value::Array(vec![json!({}); 10_000]);
        let started = std::time::Instant::now();
        let filled = add_defaults(schema, instance).unwrap();
        let elapsed = started.elapsed();
        let items = filled.as_array().unwrap();
        assert_eq!(items.len(), 10_000);
        assert!(items.iter().all(|item| item == &json!({"a": 1})));
        assert!(
            elapsed < std::time::Duration::from_secs(10),
            "took {elapsed:?}"
        );
    }

    fn slot_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i32>().prop_map(Value::from),
            "[a-z]{0,4}".prop_map(Value::from),
            Just(json!({})),
        ]
    }

    fn sample_instance() -> impl Strategy<Value = Value> {
        prop::collection::btree_map(
            prop_oneof![Just("a"), Just("b"), Just("nested"), Just("extra")],
            slot_value(),
            0..4,
        )
        .prop_map(|members| {
            Value::Object(
                members
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), value))
                    .collect(),
            )
        })
    }

    fn sample_schema() -> Value {
        json!({
            "properties": {
                "a": {"default": 1},
                "b": {"default": false},
                "nested": {"default": {}, "properties": {"inner": {"default": "x"}}}
            },
            "if": {"required": ["extra"]},
            "then": {"properties": {"c": {"default": []}}},
            "unevaluatedProperties": {"default": null}
        })
    }

    fn conditional_instance() -> impl Strategy<Value = Value> {
        prop::collection::btree_map(
            prop_oneof![Just("a"), Just("b"), Just("c"), Just("d")],
            slot_value(),
            0..4,
        )
        .prop_map(|members| {
            Value::Object(
                members
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), value))
                    .collect(),
            )
        })
    }

    fn conditional_schema() -> Value {
        json!({
            "properties": {"a": {"default": 1}},
            "if": {"required": ["a"], "properties": {"a": {"type": "integer"}}},
            "then": {"properties": {"b": {"default": "then"}}},
            "else": {"properties": {"c": {"default": "else"}}},
            "oneOf": [
                {"required": ["d"], "properties": {"d": {"type": "boolean"}}},
                {"properties": {"e": {"default": 0}}}
            ]
        })
    }

    proptest! {
        #[test]
        fn conditions_on_sibling_defaults_are_idempotent(instance in conditional_instance()) {
            let engine = engine(conditional_schema(), EngineOptions::default());
            let once = engine.apply_owned(instance).unwrap();
            let twice = engine.apply_owned(once.clone()).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn applying_twice_equals_applying_once(instance in sample_instance()) {
            let engine = engine(sample_schema(), EngineOptions::default());
            let once = engine.apply_owned(instance).unwrap();
            let twice = engine.apply_owned(once.clone()).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn present_members_are_never_overwritten(instance in sample_instance()) {
            let engine = engine(sample_schema(), EngineOptions::default());
            let filled = engine.apply_owned(instance.clone()).unwrap();
            for (key, value) in instance.as_object().unwrap() {
                if key == "nested" && value.is_object() {
                    continue;
                }
                prop_assert_eq!(&filled[key], value);
            }
        }
    }
}
