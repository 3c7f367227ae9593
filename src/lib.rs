//! Identity server error parser
//!
//! Classifies identity-server error responses (HTTP status code plus body
//! text) into typed errors by testing them against ordered, pattern-based
//! rules.
//!
//! ```
//! use identity_error_parser::error::{ErrorParser, IdsErrorKind, ErrorCategory, TierSelection};
//!
//! let parser = ErrorParser::new();
//! let error = parser
//!     .classify_text(TierSelection::Any, 400, "User is locked out")
//!     .expect("locked account response");
//! assert_eq!(error.category(), ErrorCategory::Ids(IdsErrorKind::LockedAccount));
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
