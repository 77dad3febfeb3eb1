//! # schemafill core
//!
//! Domain types shared by every schemafill crate: the compiled schema
//! AST, its closed keyword vocabulary, dynamic scope bookkeeping, the
//! validation oracle seam, and the error taxonomy.
//!
//! ## Design Philosophy
//!
//! The compiler produces a [`SchemaAst`], an arena of schema nodes
//! addressed by [`SchemaId`]. Everything downstream (validator, default
//! evaluator) reads that arena and never re-parses schema text. Because
//! nodes are addressed by index, `$ref` back-edges are plain ids and
//! recursive schemas need no unrolling.
//!
//! The keyword vocabulary is a closed enum, so dispatch over it is an
//! exhaustive `match` instead of a string-keyed table.

pub mod ast;
pub mod error;
pub mod keyword;
pub mod scope;
pub mod validator;

// Re-export key types at crate root for ergonomics
pub use ast::{CompiledSchema, KeywordEntry, NodeMeta, Resource, SchemaAst, SchemaId, SchemaNode};
pub use error::{CompileError, Error, EvalError, Result, ValidationError};
pub use keyword::{JsonType, Keyword, Pattern, Phase};
pub use scope::DynamicScope;
pub use validator::SchemaValidator;
