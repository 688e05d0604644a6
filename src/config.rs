// src/config.rs
use crate::constants::{
    API_KEY_ENV_VAR, DEFAULT_API_BASE_URL, DEFAULT_MODEL, DEFAULT_STORE_FILE,
    DISCOVERY_CONCURRENCY_LIMIT, EXTRACTION_MAX_ATTEMPTS, EXTRACTION_RETRY_DELAY,
};
use crate::error::AppError;
use crate::error_recovery::RetryPolicy;
use crate::types::{ApiKey, GroupName, ParentLabel, PostalCode, ServiceUrl};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about = "Discover clinics by postal code, group by group", long_about = None)]
pub struct CommandLineInput {
    #[command(subcommand)]
    pub command: CommandInput,

    /// Collection snapshot file
    #[arg(short, long, global = true)]
    pub store: Option<PathBuf>,

    /// Keep the collection in memory only (nothing is saved)
    #[arg(long, global = true, default_value_t = false)]
    pub ephemeral: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Debug override of the per-group in-flight cap (fixed at 2 otherwise)
    #[arg(long, global = true, hide = true, default_value_t = DISCOVERY_CONCURRENCY_LIMIT)]
    pub concurrency: usize,

    /// Debug override of the attempts per postal code (3 otherwise)
    #[arg(long, global = true, hide = true, default_value_t = EXTRACTION_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Debug override of the pause between attempts, in milliseconds
    #[arg(long, global = true, hide = true, default_value_t = EXTRACTION_RETRY_DELAY.as_millis() as u64)]
    pub retry_delay_ms: u64,

    /// Model used for extraction
    #[arg(long, global = true, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the extraction service
    #[arg(long, global = true, default_value = DEFAULT_API_BASE_URL)]
    pub api_base: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CommandInput {
    /// Import location rows from a JSON file and merge them into the collection
    Import { file: PathBuf },
    /// Show every group with its progress
    List,
    /// Start or resume discovery for a group, or every group under a label
    Run { label: String, group: Option<String> },
    /// Retry one failed postal code and continue the group
    Retry {
        label: String,
        group: String,
        code: String,
    },
    /// Write a group's records as JSON
    Export {
        label: String,
        group: String,
        /// Output file or directory (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove every group and the saved snapshot
    Reset,
}

/// A validated command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Import {
        file: PathBuf,
    },
    List,
    Run {
        label: ParentLabel,
        group: Option<GroupName>,
    },
    Retry {
        label: ParentLabel,
        group: GroupName,
        code: PostalCode,
    },
    Export {
        label: ParentLabel,
        group: GroupName,
        output: Option<PathBuf>,
    },
    Reset,
}

impl Command {
    /// Whether the command talks to the extraction service.
    pub fn needs_extractor(&self) -> bool {
        matches!(self, Command::Run { .. } | Command::Retry { .. })
    }

    fn resolve(input: CommandInput) -> Result<Self, AppError> {
        Ok(match input {
            CommandInput::Import { file } => Command::Import { file },
            CommandInput::List => Command::List,
            CommandInput::Run { label, group } => Command::Run {
                label: ParentLabel::new(label)?,
                group: group.map(GroupName::new).transpose()?,
            },
            CommandInput::Retry { label, group, code } => Command::Retry {
                label: ParentLabel::new(label)?,
                group: GroupName::new(group)?,
                code: PostalCode::parse(&code)?,
            },
            CommandInput::Export {
                label,
                group,
                output,
            } => Command::Export {
                label: ParentLabel::new(label)?,
                group: GroupName::new(group)?,
                output,
            },
            CommandInput::Reset => Command::Reset,
        })
    }
}

/// Connection settings for the extraction service.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub api_key: ApiKey,
    pub base_url: ServiceUrl,
    pub model: String,
}

/// Where the collection lives.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

/// Resolved configuration: validated and ready to drive a command.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub command: Command,
    pub store: StoreLocation,
    pub verbose: bool,
    pub policy: RetryPolicy,
    /// Present only for commands that call the extraction service.
    pub extraction: Option<ExtractionConfig>,
}

impl AppConfig {
    /// Resolves the configuration from CLI input and the environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let api_key = std::env::var(API_KEY_ENV_VAR).ok();
        Self::resolve_with_key(cli, api_key)
    }

    /// Resolves with an explicit API key instead of reading the environment.
    pub fn resolve_with_key(
        cli: CommandLineInput,
        api_key: Option<String>,
    ) -> Result<Self, AppError> {
        let command = Command::resolve(cli.command)?;
        let policy = RetryPolicy::new(
            cli.concurrency,
            cli.max_attempts,
            Duration::from_millis(cli.retry_delay_ms),
        )?;

        let extraction = if command.needs_extractor() {
            let key = api_key.ok_or_else(|| {
                AppError::MissingConfiguration(format!(
                    "{} environment variable not set",
                    API_KEY_ENV_VAR
                ))
            })?;
            Some(ExtractionConfig {
                api_key: ApiKey::new(key)?,
                base_url: ServiceUrl::parse(&cli.api_base)?,
                model: cli.model,
            })
        } else {
            None
        };

        let store = if cli.ephemeral {
            StoreLocation::Memory
        } else {
            StoreLocation::File(cli.store.unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE)))
        };

        Ok(AppConfig {
            command,
            store,
            verbose: cli.verbose,
            policy,
            extraction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "AIzaSyTESTKEY-0123456789abcdef";

    fn parse(args: &[&str]) -> CommandLineInput {
        CommandLineInput::try_parse_from(std::iter::once("pinscan").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn list_needs_no_key() {
        let config = AppConfig::resolve_with_key(parse(&["list"]), None).unwrap();
        assert_eq!(config.command, Command::List);
        assert!(config.extraction.is_none());
        assert_eq!(config.store, StoreLocation::File(PathBuf::from(DEFAULT_STORE_FILE)));
        assert_eq!(config.policy, RetryPolicy::default());
    }

    #[test]
    fn run_requires_key() {
        let err = AppConfig::resolve_with_key(parse(&["run", "Maharashtra", "Pune"]), None)
            .unwrap_err();
        assert!(matches!(err, AppError::MissingConfiguration(_)));

        let config =
            AppConfig::resolve_with_key(parse(&["run", "Maharashtra", "Pune"]), Some(KEY.into()))
                .unwrap();
        let extraction = config.extraction.unwrap();
        assert_eq!(extraction.model, DEFAULT_MODEL);
        assert_eq!(
            config.command,
            Command::Run {
                label: ParentLabel::new("Maharashtra").unwrap(),
                group: Some(GroupName::new("Pune").unwrap()),
            }
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let config = AppConfig::resolve_with_key(
            parse(&["export", "Goa", "Panaji", "-o", "out.json", "--ephemeral", "--verbose"]),
            None,
        )
        .unwrap();
        assert_eq!(config.store, StoreLocation::Memory);
        assert!(config.verbose);
        assert_eq!(
            config.command,
            Command::Export {
                label: ParentLabel::new("Goa").unwrap(),
                group: GroupName::new("Panaji").unwrap(),
                output: Some(PathBuf::from("out.json")),
            }
        );
    }

    #[test]
    fn policy_flags_are_validated() {
        let config = AppConfig::resolve_with_key(
            parse(&["list", "--concurrency", "4", "--max-attempts", "5", "--retry-delay-ms", "10"]),
            None,
        )
        .unwrap();
        assert_eq!(config.policy.concurrency, 4);
        assert_eq!(config.policy.max_attempts, 5);
        assert_eq!(config.policy.delay, Duration::from_millis(10));

        let err =
            AppConfig::resolve_with_key(parse(&["list", "--concurrency", "0"]), None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn scheduler_defaults_are_fixed_and_overrides_hidden() {
        use clap::CommandFactory;

        let config = AppConfig::resolve_with_key(parse(&["list"]), None).unwrap();
        assert_eq!(config.policy, RetryPolicy::default());
        assert_eq!(config.policy.concurrency, 2);

        let help = CommandLineInput::command().render_help().to_string();
        assert!(!help.contains("--concurrency"));
        assert!(!help.contains("--max-attempts"));
        assert!(!help.contains("--retry-delay-ms"));
    }

    #[test]
    fn retry_validates_code() {
        let err = AppConfig::resolve_with_key(
            parse(&["retry", "Maharashtra", "Pune", "!!"]),
            Some(KEY.into()),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
