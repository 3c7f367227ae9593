//! Rules pair a matcher with the factory that builds its error.

use std::fmt;

use super::classification::{ErrorCategory, IdentityError};
use super::matcher::{MessageMatcher, RegexMatcher};

/// Builds the error for a rule whose matcher voted true.
///
/// Factories never fail; missing inputs become absent fields.
pub trait ErrorFactory: Send + Sync {
    /// Creates the error for the given response.
    fn create(&self, message: Option<&str>, status_code: u16) -> IdentityError;
}

impl<F> ErrorFactory for F
where
    F: Fn(Option<&str>, u16) -> IdentityError + Send + Sync,
{
    fn create(&self, message: Option<&str>, status_code: u16) -> IdentityError {
        self(message, status_code)
    }
}

/// Factory producing an [`IdentityError`] of a fixed category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryFactory(pub ErrorCategory);

impl ErrorFactory for CategoryFactory {
    fn create(&self, message: Option<&str>, status_code: u16) -> IdentityError {
        IdentityError::from_response(self.0, message, status_code)
    }
}

/// A matcher and the factory invoked when it votes true.
pub struct Rule {
    matcher: Box<dyn MessageMatcher>,
    factory: Box<dyn ErrorFactory>,
    description: String,
}

impl Rule {
    /// Creates a rule from any matcher and factory.
    pub fn new(
        matcher: impl MessageMatcher + 'static,
        factory: impl ErrorFactory + 'static,
    ) -> Self {
        Self {
            matcher: Box::new(matcher),
            factory: Box::new(factory),
            description: String::from("custom"),
        }
    }

    /// Creates a rule producing errors of `category`, described by the category name.
    pub fn for_category(matcher: RegexMatcher, category: impl Into<ErrorCategory>) -> Self {
        let category = category.into();
        Self::new(matcher, CategoryFactory(category)).with_description(category.to_string())
    }

    /// Sets the description used in logs and rule listings.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns the matcher.
    pub fn matcher(&self) -> &dyn MessageMatcher {
        self.matcher.as_ref()
    }

    /// Returns the factory.
    pub fn factory(&self) -> &dyn ErrorFactory {
        self.factory.as_ref()
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
