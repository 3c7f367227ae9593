use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::*;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use identity_error_parser::config::ParserConfig;
use identity_error_parser::error::{
    ErrorCategory, ErrorParser, IdentityError, ResponseSignal, Tier, TierSelection,
};
use identity_error_parser::logging::{init_logging, LoggingConfig};

#[derive(Parser)]
#[command(name = "idp")]
#[command(author, version, about = "Classify identity-server error responses")]
#[command(after_help = "Examples:
  idp classify --status 400 --body 'User is locked out'
  curl -s ... | idp classify --status 422 --json
  idp rules --tier api")]
struct Cli {
    /// Rule catalog file (TOML); the built-in catalog is used otherwise
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Disable colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one response
    Classify {
        /// HTTP status code of the response
        #[arg(short, long)]
        status: u16,

        /// Response body text
        #[arg(short, long, conflicts_with = "body_file")]
        body: Option<String>,

        /// Read the response body from a file
        #[arg(long, value_name = "FILE")]
        body_file: Option<PathBuf>,

        /// Rule tiers to consult
        #[arg(short, long, value_enum, default_value = "any")]
        tier: CliTier,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Exit with an error when the response is classified
        #[arg(long)]
        strict: bool,
    },
    /// List the active rules in evaluation order
    Rules {
        /// Rule tiers to list
        #[arg(short, long, value_enum, default_value = "any")]
        tier: CliTier,

        /// Print the rules as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliTier {
    /// Protocol/session rules, then application rules
    Any,
    /// Protocol/session rules only
    Ids,
    /// Application rules only
    Api,
}

impl From<CliTier> for TierSelection {
    fn from(tier: CliTier) -> Self {
        match tier {
            CliTier::Any => TierSelection::Any,
            CliTier::Ids => TierSelection::Ids,
            CliTier::Api => TierSelection::Api,
        }
    }
}

impl CliTier {
    fn tiers(self) -> &'static [Tier] {
        match self {
            CliTier::Any => &[Tier::Ids, Tier::Api],
            CliTier::Ids => &[Tier::Ids],
            CliTier::Api => &[Tier::Api],
        }
    }
}

#[derive(Serialize)]
struct ClassificationReport<'a> {
    matched: bool,
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<ErrorCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_message: Option<&'a str>,
}

impl<'a> ClassificationReport<'a> {
    fn new(status_code: u16, error: Option<&'a IdentityError>) -> Self {
        Self {
            matched: error.is_some(),
            status_code,
            category: error.map(IdentityError::category),
            message: error.map(IdentityError::message),
            original_message: error.and_then(IdentityError::original_message),
        }
    }
}

#[derive(Serialize)]
struct RuleReport<'a> {
    tier: Tier,
    index: usize,
    description: &'a str,
}

fn load_parser(config: Option<&Path>) -> Result<ErrorParser> {
    match config {
        Some(path) => {
            let config = ParserConfig::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            config
                .build_parser()
                .with_context(|| format!("Invalid rule catalog in {}", path.display()))
        }
        None => Ok(ErrorParser::new()),
    }
}

/// Returns a lazy body accessor; stdin is only read if a rule asks for it.
fn body_supplier(
    body: Option<String>,
    body_file: Option<PathBuf>,
) -> impl FnMut() -> Result<String> {
    move || match (&body, &body_file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read body from {}", path.display())),
        (None, None) => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read body from stdin")?;
            Ok(text)
        }
    }
}

fn print_classification(report: &ClassificationReport<'_>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    match report.category {
        Some(category) => {
            println!(
                "{} {} (status {})",
                "✗".red(),
                category.to_string().bold(),
                report.status_code
            );
            if let Some(message) = report.message {
                println!("  {}", message);
            }
            if let Some(original) = report.original_message {
                println!("  {} {}", "upstream:".dimmed(), original);
            }
        }
        None => println!(
            "{} no match (status {})",
            "✓".green(),
            report.status_code
        ),
    }
    Ok(())
}

fn classify(
    parser: &ErrorParser,
    status: u16,
    supplier: impl FnMut() -> Result<String>,
    tier: CliTier,
    json: bool,
    strict: bool,
) -> Result<()> {
    if strict {
        // Classified errors surface through the same channel as read failures.
        parser.process(tier.into(), status, supplier)?;
        print_classification(&ClassificationReport::new(status, None), json)?;
        return Ok(());
    }

    let mut signal = ResponseSignal::new(status, supplier);
    let found = parser.find(tier.into(), &mut signal)?;
    print_classification(&ClassificationReport::new(status, found.as_ref()), json)
}

fn rule_reports(parser: &ErrorParser, tier: CliTier) -> Vec<RuleReport<'_>> {
    tier.tiers()
        .iter()
        .flat_map(|&tier| {
            parser
                .rules(tier)
                .iter()
                .enumerate()
                .map(move |(index, rule)| RuleReport {
                    tier,
                    index,
                    description: rule.description(),
                })
        })
        .collect()
}

fn list_rules(parser: &ErrorParser, tier: CliTier, json: bool) -> Result<()> {
    let reports = rule_reports(parser, tier);
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!(
            "{:>3}  {}  {}",
            report.index,
            report.tier.to_string().cyan(),
            report.description
        );
    }
    println!();
    println!("{} rules", reports.len());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    init_logging(LoggingConfig::from_verbosity(cli.verbose));

    let parser = load_parser(cli.config.as_deref())?;

    match cli.command {
        Commands::Classify {
            status,
            body,
            body_file,
            tier,
            json,
            strict,
        } => classify(
            &parser,
            status,
            body_supplier(body, body_file),
            tier,
            json,
            strict,
        ),
        Commands::Rules { tier, json } => list_rules(&parser, tier, json),
    }
}
