//! Schema-driven helpers that sit around the defaults engine:
//! decoding HTML form submissions into typed JSON and dropping
//! properties a schema does not declare.

pub mod query;
pub mod strip;

pub use query::decode_form_query;
pub use strip::remove_extra_properties;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum FormError {
    #[error("Field '{field}' expects a {expected}, got '{value}'")]
    InvalidNumber {
        field: String,
        expected: &'static str,
        value: String,
    },
}
