//! Error parsing and classification module
//!
//! This module turns identity-server error responses (status code plus body
//! text) into typed [`IdentityError`] values. Responses are tested against two
//! ordered rule tiers: protocol/session rules first, then application rules.

pub mod catalog;
pub mod classification;
pub mod holder;
pub mod matcher;
pub mod parser;
pub mod rule;

// Re-export main types for convenient access
pub use catalog::{default_api_rules, default_ids_rules};
pub use classification::{
    ApiErrorKind, ApiErrorType, ErrorCategory, ErrorSource, IdentityError, IdsErrorKind,
    IdsErrorType, Tier,
};
pub use holder::{default_parser, install_default_parser};
pub use matcher::{MatcherError, MessageMatcher, RegexMatcher, RegexOption, StatusCodeMatcher};
pub use parser::{raise_if_present, ErrorParser, ResponseSignal, TierSelection};
pub use rule::{CategoryFactory, ErrorFactory, Rule};
