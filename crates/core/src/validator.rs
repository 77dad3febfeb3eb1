//! Validation oracle trait: the seam branch-selecting keywords use.
//!
//! `anyOf`, `oneOf` and `if` ask an oracle whether an instance satisfies
//! a subschema. The default evaluator never validates on its own, so the
//! oracle can be swapped for a stub in tests.

use crate::ast::{SchemaAst, SchemaId};
use crate::error::ValidationError;
use crate::scope::DynamicScope;
use serde_json::Value;

pub trait SchemaValidator {
    /// Whether `instance` satisfies the subschema `schema`.
    ///
    /// Must not observe or retain the instance beyond the call.
    fn validate(
        &self,
        ast: &SchemaAst,
        schema: SchemaId,
        instance: &Value,
        scope: &DynamicScope,
    ) -> Result<bool, ValidationError>;
}

impl<T: SchemaValidator + ?Sized> SchemaValidator for &T {
    fn validate(
        &self,
        ast: &SchemaAst,
        schema: SchemaId,
        instance: &Value,
        scope: &DynamicScope,
    ) -> Result<bool, ValidationError> {
        (**self).validate(ast, schema, instance, scope)
    }
}

impl<T: SchemaValidator + ?Sized> SchemaValidator for Box<T> {
    fn validate(
        &self,
        ast: &SchemaAst,
        schema: SchemaId,
        instance: &Value,
        scope: &DynamicScope,
    ) -> Result<bool, ValidationError> {
        (**self).validate(ast, schema, instance, scope)
    }
}
