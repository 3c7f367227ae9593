//! Error parser for identity-server responses
//!
//! The parser holds two ordered rule lists. Protocol/session rules
//! ([`Tier::Ids`]) are evaluated before application rules ([`Tier::Api`]);
//! within a tier the first rule whose matcher votes true produces the error
//! and later rules are never consulted.

use std::convert::Infallible;
use std::fmt;

use super::catalog::{default_api_rules, default_ids_rules};
use super::classification::{IdentityError, Tier};
use super::rule::Rule;

/// Which tiers a lookup consults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TierSelection {
    /// Protocol/session rules only.
    Ids,
    /// Application rules only.
    Api,
    /// Protocol/session rules, then application rules.
    #[default]
    Any,
}

impl From<Tier> for TierSelection {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Ids => TierSelection::Ids,
            Tier::Api => TierSelection::Api,
        }
    }
}

/// A response being classified: its status code and a lazy body accessor.
///
/// The body is read on first demand and memoized, so one signal calls the
/// supplier at most once no matter how many rules inspect it. An empty body
/// counts as no message. A failed read is not memoized.
pub struct ResponseSignal<F> {
    status_code: u16,
    supplier: F,
    body: Option<Option<String>>,
}

impl<F, E> ResponseSignal<F>
where
    F: FnMut() -> Result<String, E>,
{
    /// Creates a signal; the supplier is not called yet.
    pub fn new(status_code: u16, supplier: F) -> Self {
        Self {
            status_code,
            supplier,
            body: None,
        }
    }

    /// The response status code.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Resolves the body if needed and returns it as the message.
    ///
    /// # Errors
    /// Returns the supplier's error unchanged.
    pub fn message(&mut self) -> Result<Option<&str>, E> {
        if self.body.is_none() {
            let text = (self.supplier)()?;
            self.body = Some(if text.is_empty() { None } else { Some(text) });
        }
        Ok(self.resolved_message())
    }

    /// Returns the message if the body was already resolved.
    pub fn resolved_message(&self) -> Option<&str> {
        self.body.as_ref().and_then(|body| body.as_deref())
    }

    /// Returns true once the body has been read.
    pub fn is_resolved(&self) -> bool {
        self.body.is_some()
    }
}

impl<F> fmt::Debug for ResponseSignal<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseSignal")
            .field("status_code", &self.status_code)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// Surfaces a found error as a failure, or does nothing.
///
/// # Errors
/// Returns `error` converted into `E` when it is present.
pub fn raise_if_present<E>(error: Option<IdentityError>) -> Result<(), E>
where
    E: From<IdentityError>,
{
    match error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

/// Classifies identity-server error responses.
///
/// Rule lists are configured up front and only read during classification,
/// so a parser can be shared across threads once built.
#[derive(Debug)]
pub struct ErrorParser {
    /// Protocol/session rules, in priority order.
    ids_rules: Vec<Rule>,
    /// Application rules, in priority order.
    api_rules: Vec<Rule>,
}

impl Default for ErrorParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorParser {
    /// Creates a parser with the built-in catalog.
    pub fn new() -> Self {
        Self::with_rules(default_ids_rules(), default_api_rules())
    }

    /// Creates a parser from injected rule lists.
    pub fn with_rules(ids_rules: Vec<Rule>, api_rules: Vec<Rule>) -> Self {
        Self {
            ids_rules,
            api_rules,
        }
    }

    /// Creates a parser with no rules; every lookup finds nothing.
    pub fn empty() -> Self {
        Self::with_rules(Vec::new(), Vec::new())
    }

    /// Appends a protocol/session rule.
    pub fn add_ids_rule(&mut self, rule: Rule) {
        self.ids_rules.push(rule);
    }

    /// Appends an application rule.
    pub fn add_api_rule(&mut self, rule: Rule) {
        self.api_rules.push(rule);
    }

    /// Returns the protocol/session rules.
    pub fn ids_rules(&self) -> &[Rule] {
        &self.ids_rules
    }

    /// Returns the application rules.
    pub fn api_rules(&self) -> &[Rule] {
        &self.api_rules
    }

    /// Returns the rules of one tier.
    pub fn rules(&self, tier: Tier) -> &[Rule] {
        match tier {
            Tier::Ids => &self.ids_rules,
            Tier::Api => &self.api_rules,
        }
    }

    /// Finds the error produced by the first matching rule of `tier`.
    ///
    /// The body is resolved only when a rule's matcher requires it. Faults
    /// from matchers and factories are not caught here.
    ///
    /// # Errors
    /// Returns the body supplier's error unchanged.
    pub fn find_in_tier<F, E>(
        &self,
        tier: Tier,
        signal: &mut ResponseSignal<F>,
    ) -> Result<Option<IdentityError>, E>
    where
        F: FnMut() -> Result<String, E>,
    {
        let status_code = signal.status_code();
        for rule in self.rules(tier) {
            let matcher = rule.matcher();
            let message = if matcher.requires_message() {
                signal.message()?
            } else {
                signal.resolved_message()
            };

            if matcher.vote(message, status_code) {
                tracing::debug!(
                    rule = rule.description(),
                    %tier,
                    status_code,
                    "response classified"
                );
                return Ok(Some(rule.factory().create(message, status_code)));
            }
        }
        Ok(None)
    }

    /// Finds an error in the selected tiers.
    ///
    /// With [`TierSelection::Any`], a protocol/session match suppresses the
    /// application rules entirely.
    ///
    /// # Errors
    /// Returns the body supplier's error unchanged.
    pub fn find<F, E>(
        &self,
        selection: TierSelection,
        signal: &mut ResponseSignal<F>,
    ) -> Result<Option<IdentityError>, E>
    where
        F: FnMut() -> Result<String, E>,
    {
        match selection {
            TierSelection::Ids => self.find_in_tier(Tier::Ids, signal),
            TierSelection::Api => self.find_in_tier(Tier::Api, signal),
            TierSelection::Any => match self.find_in_tier(Tier::Ids, signal)? {
                Some(error) => Ok(Some(error)),
                None => self.find_in_tier(Tier::Api, signal),
            },
        }
    }

    /// Finds a protocol/session error for the response.
    ///
    /// # Errors
    /// Returns the body supplier's error unchanged.
    pub fn find_ids_error<F, E>(
        &self,
        status_code: u16,
        body: F,
    ) -> Result<Option<IdentityError>, E>
    where
        F: FnMut() -> Result<String, E>,
    {
        self.find(TierSelection::Ids, &mut ResponseSignal::new(status_code, body))
    }

    /// Finds an application error for the response.
    ///
    /// # Errors
    /// Returns the body supplier's error unchanged.
    pub fn find_api_error<F, E>(
        &self,
        status_code: u16,
        body: F,
    ) -> Result<Option<IdentityError>, E>
    where
        F: FnMut() -> Result<String, E>,
    {
        self.find(TierSelection::Api, &mut ResponseSignal::new(status_code, body))
    }

    /// Finds a protocol/session error, falling back to an application error.
    ///
    /// Both tiers share one signal, so the body is read at most once.
    ///
    /// # Errors
    /// Returns the body supplier's error unchanged.
    pub fn find_any_error<F, E>(
        &self,
        status_code: u16,
        body: F,
    ) -> Result<Option<IdentityError>, E>
    where
        F: FnMut() -> Result<String, E>,
    {
        self.find(TierSelection::Any, &mut ResponseSignal::new(status_code, body))
    }

    /// Classifies a response whose body is already in memory.
    pub fn classify_text(
        &self,
        selection: TierSelection,
        status_code: u16,
        text: &str,
    ) -> Option<IdentityError> {
        let mut signal = ResponseSignal::new(status_code, || Ok::<_, Infallible>(text.to_owned()));
        match self.find(selection, &mut signal) {
            Ok(found) => found,
            Err(never) => match never {},
        }
    }

    /// Finds an error in the selected tiers and raises it.
    ///
    /// # Errors
    /// Returns the classified error converted into `E`, or the body
    /// supplier's error unchanged.
    pub fn process<F, E>(
        &self,
        selection: TierSelection,
        status_code: u16,
        body: F,
    ) -> Result<(), E>
    where
        F: FnMut() -> Result<String, E>,
        E: From<IdentityError>,
    {
        let found = self.find(selection, &mut ResponseSignal::new(status_code, body))?;
        raise_if_present(found)
    }

    /// Raises the protocol/session error for the response, if any.
    ///
    /// # Errors
    /// See [`ErrorParser::process`].
    pub fn process_ids_error<F, E>(&self, status_code: u16, body: F) -> Result<(), E>
    where
        F: FnMut() -> Result<String, E>,
        E: From<IdentityError>,
    {
        self.process(TierSelection::Ids, status_code, body)
    }

    /// Raises the application error for the response, if any.
    ///
    /// # Errors
    /// See [`ErrorParser::process`].
    pub fn process_api_error<F, E>(&self, status_code: u16, body: F) -> Result<(), E>
    where
        F: FnMut() -> Result<String, E>,
        E: From<IdentityError>,
    {
        self.process(TierSelection::Api, status_code, body)
    }

    /// Raises a protocol/session or application error for the response, if any.
    ///
    /// # Errors
    /// See [`ErrorParser::process`].
    pub fn process_any_error<F, E>(&self, status_code: u16, body: F) -> Result<(), E>
    where
        F: FnMut() -> Result<String, E>,
        E: From<IdentityError>,
    {
        self.process(TierSelection::Any, status_code, body)
    }
}
