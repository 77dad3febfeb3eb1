//! URI handling for `$id`, `$ref` and `$dynamicRef` values.
//!
//! Parsing and reference resolution are done by [`url::Url`]; documents
//! are keyed by the serialized form without fragment, so every URI that
//! reaches the registry or the index has been through the same
//! normalization.

use percent_encoding::percent_decode_str;
use schemafill_core::CompileError;
use url::Url;

pub fn parse(uri: &str) -> Result<Url, CompileError> {
    Url::parse(uri).map_err(|e| CompileError::InvalidUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })
}

/// Resolve `reference` against the absolute URI `base`.
pub fn resolve(base: &str, reference: &str) -> Result<Url, CompileError> {
    parse(base)?
        .join(reference)
        .map_err(|e| CompileError::InvalidUri {
            uri: reference.to_string(),
            reason: format!("cannot resolve against {base}: {e}"),
        })
}

/// The URI with its fragment removed.
pub fn absolute(url: &Url) -> String {
    let mut absolute = url.clone();
    absolute.set_fragment(None);
    absolute.into()
}

/// The fragment, empty when there is none.
pub fn fragment(url: &Url) -> &str {
    url.fragment().unwrap_or("")
}

/// Normalized fragment-less form of `uri`, if it parses.
pub fn document_key(uri: &str) -> Option<String> {
    Url::parse(uri).ok().map(|url| absolute(&url))
}

/// Decode `%XX` escapes in a fragment.
pub fn percent_decode(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}
