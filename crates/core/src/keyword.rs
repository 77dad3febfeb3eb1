//! The closed keyword vocabulary of the compiled AST.
//!
//! Every keyword the compiler can emit is a variant of [`Keyword`].
//! Values are pre-resolved: references are [`SchemaId`]s, patterns are
//! compiled regular expressions, and sibling data an applicator needs
//! (the `prefixItems` length for `items`, the declared names for
//! `additionalProperties`, ...) is folded in at compile time.

use crate::ast::SchemaId;
use regex_lite::Regex;
use serde_json::Value;
use std::fmt;

/// Base IRI for keyword identifiers.
pub const KEYWORD_BASE: &str = "https://json-schema.org/keyword/";

/// A single compiled keyword.
#[derive(Debug, Clone)]
pub enum Keyword {
    // --- Core ---
    Ref(SchemaId),
    /// `$dynamicRef` whose fragment names a dynamic anchor. `fallback`
    /// is the statically resolved target, if there is one.
    DynamicRef {
        anchor: String,
        fallback: Option<SchemaId>,
    },
    Definitions(Vec<(String, SchemaId)>),
    Comment(String),

    // --- Applicators ---
    AllOf(Vec<SchemaId>),
    AnyOf(Vec<SchemaId>),
    OneOf(Vec<SchemaId>),
    Not(SchemaId),
    If {
        condition: SchemaId,
        then: Option<SchemaId>,
        otherwise: Option<SchemaId>,
    },
    /// Consumed by [`Keyword::If`]; kept so the subschema is compiled.
    Then(SchemaId),
    /// Consumed by [`Keyword::If`]; kept so the subschema is compiled.
    Else(SchemaId),
    DependentSchemas(Vec<(String, SchemaId)>),
    PrefixItems(Vec<SchemaId>),
    Items {
        schema: SchemaId,
        prefix_len: usize,
    },
    Contains {
        schema: SchemaId,
        min: u64,
        max: Option<u64>,
    },
    Properties(Vec<(String, SchemaId)>),
    PatternProperties(Vec<(Pattern, SchemaId)>),
    AdditionalProperties {
        schema: SchemaId,
        declared: Vec<String>,
        patterns: Vec<Pattern>,
    },
    PropertyNames(SchemaId),

    // --- Unevaluated ---
    UnevaluatedItems(SchemaId),
    UnevaluatedProperties(SchemaId),

    // --- Validation ---
    Type(Vec<JsonType>),
    Enum(Vec<Value>),
    Const(Value),
    MultipleOf(f64),
    Maximum(f64),
    ExclusiveMaximum(f64),
    Minimum(f64),
    ExclusiveMinimum(f64),
    MaxLength(u64),
    MinLength(u64),
    Pattern(Pattern),
    MaxItems(u64),
    MinItems(u64),
    UniqueItems(bool),
    MaxContains(u64),
    MinContains(u64),
    MaxProperties(u64),
    MinProperties(u64),
    Required(Vec<String>),
    DependentRequired(Vec<(String, Vec<String>)>),

    // --- Meta-data, format, content ---
    Default(Value),
    Metadata { name: &'static str, value: Value },
    Format(String),
    Content { name: &'static str, value: Value },
}

/// Evaluation phase of a keyword within its schema node.
///
/// `default` runs before its siblings so they observe the populated
/// value. Keywords that pick a branch by inspecting the instance (`if`,
/// `oneOf`, `anyOf`, `dependentSchemas`) run once the other applicators
/// have filled their defaults. The unevaluated keywords run last, after
/// every other applicator at the node has recorded its coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Default,
    Applicator,
    Conditional,
    Unevaluated,
}

impl Keyword {
    /// The keyword's name as written in schema documents.
    pub fn name(&self) -> &'static str {
        match self {
            Keyword::Ref(_) => "$ref",
            Keyword::DynamicRef { .. } => "$dynamicRef",
            Keyword::Definitions(_) => "$defs",
            Keyword::Comment(_) => "$comment",
            Keyword::AllOf(_) => "allOf",
            Keyword::AnyOf(_) => "anyOf",
            Keyword::OneOf(_) => "oneOf",
            Keyword::Not(_) => "not",
            Keyword::If { .. } => "if",
            Keyword::Then(_) => "then",
            Keyword::Else(_) => "else",
            Keyword::DependentSchemas(_) => "dependentSchemas",
            Keyword::PrefixItems(_) => "prefixItems",
            Keyword::Items { .. } => "items",
            Keyword::Contains { .. } => "contains",
            Keyword::Properties(_) => "properties",
            Keyword::PatternProperties(_) => "patternProperties",
            Keyword::AdditionalProperties { .. } => "additionalProperties",
            Keyword::PropertyNames(_) => "propertyNames",
            Keyword::UnevaluatedItems(_) => "unevaluatedItems",
            Keyword::UnevaluatedProperties(_) => "unevaluatedProperties",
            Keyword::Type(_) => "type",
            Keyword::Enum(_) => "enum",
            Keyword::Const(_) => "const",
            Keyword::MultipleOf(_) => "multipleOf",
            Keyword::Maximum(_) => "maximum",
            Keyword::ExclusiveMaximum(_) => "exclusiveMaximum",
            Keyword::Minimum(_) => "minimum",
            Keyword::ExclusiveMinimum(_) => "exclusiveMinimum",
            Keyword::MaxLength(_) => "maxLength",
            Keyword::MinLength(_) => "minLength",
            Keyword::Pattern(_) => "pattern",
            Keyword::MaxItems(_) => "maxItems",
            Keyword::MinItems(_) => "minItems",
            Keyword::UniqueItems(_) => "uniqueItems",
            Keyword::MaxContains(_) => "maxContains",
            Keyword::MinContains(_) => "minContains",
            Keyword::MaxProperties(_) => "maxProperties",
            Keyword::MinProperties(_) => "minProperties",
            Keyword::Required(_) => "required",
            Keyword::DependentRequired(_) => "dependentRequired",
            Keyword::Default(_) => "default",
            Keyword::Metadata { name, .. } | Keyword::Content { name, .. } => *name,
            Keyword::Format(_) => "format",
        }
    }

    /// Globally unique keyword identifier, e.g.
    /// `https://json-schema.org/keyword/properties`.
    pub fn id(&self) -> String {
        format!("{KEYWORD_BASE}{}", self.name().trim_start_matches('$'))
    }

    pub fn phase(&self) -> Phase {
        match self {
            Keyword::Default(_) => Phase::Default,
            Keyword::If { .. }
            | Keyword::OneOf(_)
            | Keyword::AnyOf(_)
            | Keyword::DependentSchemas(_) => Phase::Conditional,
            Keyword::UnevaluatedItems(_) | Keyword::UnevaluatedProperties(_) => Phase::Unevaluated,
            _ => Phase::Applicator,
        }
    }
}

/// A compiled `pattern` / `patternProperties` regular expression.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// The primitive types named by the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    String,
    Integer,
}

impl JsonType {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(JsonType::Null),
            "boolean" => Some(JsonType::Boolean),
            "object" => Some(JsonType::Object),
            "array" => Some(JsonType::Array),
            "number" => Some(JsonType::Number),
            "string" => Some(JsonType::String),
            "integer" => Some(JsonType::Integer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Boolean => "boolean",
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Integer => "integer",
        }
    }

    /// Whether `value` is an instance of this type. Integers include
    /// numbers with a zero fractional part, so `1.0` is an `integer`.
    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (JsonType::Null, Value::Null) => true,
            (JsonType::Boolean, Value::Bool(_)) => true,
            (JsonType::Object, Value::Object(_)) => true,
            (JsonType::Array, Value::Array(_)) => true,
            (JsonType::Number, Value::Number(_)) => true,
            (JsonType::String, Value::String(_)) => true,
            (JsonType::Integer, Value::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            _ => false,
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_runs_first_and_unevaluated_last() {
        let default = Keyword::Default(json!(1));
        let props = Keyword::Properties(vec![]);
        let uneval = Keyword::UnevaluatedProperties(SchemaId::from_index(0));
        assert!(default.phase() < props.phase());
        assert!(props.phase() < uneval.phase());
    }

    #[test]
    fn branch_selection_waits_for_sibling_applicators() {
        let props = Keyword::Properties(vec![]);
        let condition = Keyword::If {
            condition: SchemaId::from_index(1),
            then: None,
            otherwise: None,
        };
        let uneval = Keyword::UnevaluatedItems(SchemaId::from_index(0));
        assert_eq!(condition.phase(), Phase::Conditional);
        assert_eq!(Keyword::OneOf(vec![]).phase(), Phase::Conditional);
        assert!(props.phase() < condition.phase());
        assert!(condition.phase() < uneval.phase());
    }

    #[test]
    fn keyword_ids_strip_dollar_prefix() {
        assert_eq!(
            Keyword::Ref(SchemaId::from_index(3)).id(),
            "https://json-schema.org/keyword/ref"
        );
        assert_eq!(
            Keyword::Properties(vec![]).id(),
            "https://json-schema.org/keyword/properties"
        );
    }

    #[test]
    fn integer_type_accepts_whole_floats() {
        assert!(JsonType::Integer.matches(&json!(1.0)));
        assert!(JsonType::Integer.matches(&json!(-7)));
        assert!(!JsonType::Integer.matches(&json!(1.5)));
        assert!(JsonType::Number.matches(&json!(1.5)));
        assert!(!JsonType::Null.matches(&json!(false)));
    }

    #[test]
    fn pattern_keeps_source() {
        let pattern = Pattern::new("^x-").unwrap();
        assert_eq!(pattern.as_str(), "^x-");
        assert!(pattern.is_match("x-trace"));
        assert!(!pattern.is_match("trace"));
        assert!(Pattern::new("(").is_err());
    }
}
