//! Rule catalog configuration.
//!
//! Catalogs can be extended or replaced from a TOML file, following the
//! same loading conventions as the rest of the tooling (file source plus
//! `IDP__` environment overrides).

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::error::{
    default_api_rules, default_ids_rules, ApiErrorKind, ErrorCategory, ErrorParser, IdsErrorKind,
    MatcherError, RegexMatcher, RegexOption, Rule, Tier,
};

/// Errors that can occur when loading a parser configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),

    /// The configuration file path is invalid.
    #[error("invalid configuration path: {0}")]
    InvalidPath(String),

    /// A configured rule cannot be built.
    #[error("invalid {tier} rule #{index}: {source}")]
    InvalidRule {
        tier: Tier,
        index: usize,
        #[source]
        source: MatcherError,
    },
}

/// A rule as written in a catalog file.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig<K> {
    /// The error kind produced on a match.
    pub kind: K,
    /// Patterns matched against the whole response text.
    pub patterns: Vec<String>,
    /// Options applied to every pattern.
    #[serde(default = "RegexOption::defaults")]
    pub options: Vec<RegexOption>,
    /// Vote returned when the response has no body.
    #[serde(default)]
    pub absent_message_vote: bool,
}

impl<K> RuleConfig<K>
where
    K: Into<ErrorCategory> + Copy,
{
    fn build(&self, tier: Tier, index: usize) -> Result<Rule, ConfigError> {
        let matcher = RegexMatcher::with_options(self.patterns.iter().cloned(), self.options.clone())
            .map_err(|source| ConfigError::InvalidRule {
                tier,
                index,
                source,
            })?
            .absent_message_vote(self.absent_message_vote);
        Ok(Rule::for_category(matcher, self.kind))
    }
}

fn default_true() -> bool {
    true
}

/// Parser configuration: which rules to evaluate, in order.
#[derive(Debug, Clone, Deserialize)]
pub struct ParserConfig {
    /// Whether the built-in catalog comes before the configured rules.
    #[serde(default = "default_true")]
    pub include_defaults: bool,
    /// Additional protocol/session rules.
    #[serde(default)]
    pub ids: Vec<RuleConfig<IdsErrorKind>>,
    /// Additional application rules.
    #[serde(default)]
    pub api: Vec<RuleConfig<ApiErrorKind>>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            include_defaults: true,
            ids: Vec::new(),
            api: Vec::new(),
        }
    }
}

impl ParserConfig {
    /// Load parser configuration from a file path.
    ///
    /// # Environment Variable Overrides
    ///
    /// Scalar values can be overridden with `IDP__<KEY>`
    /// (e.g. `IDP__INCLUDE_DEFAULTS=false`).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration file does not exist
    /// - The configuration file cannot be parsed
    /// - The path is invalid
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use identity_error_parser::config::ParserConfig;
    ///
    /// let parser = ParserConfig::load("idp.toml")?.build_parser()?;
    /// # Ok::<(), identity_error_parser::config::ConfigError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::InvalidPath(format!("{:?}", path)))?;

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path_str.to_string()));
        }

        let config = Config::builder()
            .add_source(File::with_name(path_str))
            .add_source(
                Environment::with_prefix("IDP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let parser_config: ParserConfig = config.try_deserialize()?;
        tracing::debug!(
            path = path_str,
            include_defaults = parser_config.include_defaults,
            ids_rules = parser_config.ids.len(),
            api_rules = parser_config.api.len(),
            "loaded parser configuration"
        );

        Ok(parser_config)
    }

    /// Builds a parser: built-in rules first (if included), then configured
    /// rules in file order.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidRule`] for a rule with no patterns.
    pub fn build_parser(&self) -> Result<ErrorParser, ConfigError> {
        let (mut ids_rules, mut api_rules) = if self.include_defaults {
            (default_ids_rules(), default_api_rules())
        } else {
            (Vec::new(), Vec::new())
        };

        for (index, rule) in self.ids.iter().enumerate() {
            ids_rules.push(rule.build(Tier::Ids, index)?);
        }
        for (index, rule) in self.api.iter().enumerate() {
            api_rules.push(rule.build(Tier::Api, index)?);
        }

        Ok(ErrorParser::with_rules(ids_rules, api_rules))
    }
}
