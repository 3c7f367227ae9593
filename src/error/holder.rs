//! Process-wide default parser.
//!
//! The default is assigned at most once. Code that owns a parser should pass
//! it explicitly; this exists for adapters that have no other way to reach
//! one.

use std::sync::OnceLock;

use super::parser::ErrorParser;

static DEFAULT_PARSER: OnceLock<ErrorParser> = OnceLock::new();

/// Installs the process-wide default parser.
///
/// # Errors
/// Returns the rejected parser if a default was already installed or
/// already initialized by [`default_parser`].
pub fn install_default_parser(parser: ErrorParser) -> Result<(), ErrorParser> {
    DEFAULT_PARSER.set(parser)
}

/// Returns the process-wide default parser.
///
/// Falls back to the built-in catalog if nothing was installed.
pub fn default_parser() -> &'static ErrorParser {
    DEFAULT_PARSER.get_or_init(|| {
        tracing::debug!("no parser installed, using built-in catalog");
        ErrorParser::new()
    })
}
