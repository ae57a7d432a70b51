//! Command line configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ACCESS_URL` | | Access point URL |
//! | `ACCESS_PARSER` | | Record parser |
//! | `ACCESS_BASEDIR` | | Base directory for relative URLs |
//! | `ACCESS_CONFIG` | | JSON configuration file |
//! | `ACCESS_LOG_LEVEL` | warn | Log level |
//!
//! Flags override values read from the configuration file.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use helios_access::AccessPointConfig;
use helios_access::types::{Condition, Value};

/// Command line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "access-query")]
#[command(about = "Search records of an access point")]
pub struct CliConfig {
    /// Access point URL, for example `file:///srv/music`.
    #[arg(long, env = "ACCESS_URL")]
    pub url: Option<String>,

    /// Record parser (raw, text, json).
    #[arg(long, env = "ACCESS_PARSER")]
    pub parser: Option<String>,

    /// Base directory for relative URLs.
    #[arg(long, env = "ACCESS_BASEDIR")]
    pub basedir: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long, env = "ACCESS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Storage aliases (`public=native/...`).
    #[arg(long)]
    pub storage_aliases: Option<String>,

    /// Parser aliases (`public=native/...`).
    #[arg(long)]
    pub parser_aliases: Option<String>,

    /// Text encoding of record content.
    #[arg(long)]
    pub encoding: Option<String>,

    /// Backend option as `key=value`; the value is read as JSON if possible.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub options: Vec<String>,

    /// Print the search plan instead of searching.
    #[arg(long)]
    pub explain: bool,

    /// Maximum number of records to print.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "ACCESS_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Conditions such as `artist=Coltrane`, `year>=1960` or a bare value.
    pub conditions: Vec<String>,
}

impl CliConfig {
    /// Validates the arguments.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.url.is_none() && self.config.is_none() {
            errors.push("Either --url or --config is required".to_string());
        }

        for option in &self.options {
            match option.split_once('=') {
                Some((key, _)) if !key.trim().is_empty() => {}
                _ => errors.push(format!("Option '{}' is not of the form key=value", option)),
            }
        }

        if self.limit == Some(0) {
            errors.push("Limit cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Builds the access point configuration.
    pub fn access_point_config(&self) -> anyhow::Result<AccessPointConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                AccessPointConfig::from_json(&json)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => AccessPointConfig::new(self.url.clone().unwrap_or_default()),
        };

        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(parser) = &self.parser {
            config = config.with_parser(parser.clone());
        }
        if let Some(basedir) = &self.basedir {
            config = config.with_basedir(basedir.clone());
        }
        if let Some(aliases) = &self.storage_aliases {
            config = config.with_storage_aliases(aliases.clone());
        }
        if let Some(aliases) = &self.parser_aliases {
            config = config.with_parser_aliases(aliases.clone());
        }
        if let Some(encoding) = &self.encoding {
            config = config.with_default_encoding(encoding.clone());
        }
        for option in &self.options {
            let (key, value) = option
                .split_once('=')
                .with_context(|| format!("option '{}' is not of the form key=value", option))?;
            config = config.with_extra(key.trim(), option_value(value));
        }

        Ok(config)
    }

    /// Parses the positional conditions.
    pub fn parsed_conditions(&self) -> anyhow::Result<Vec<Condition>> {
        self.conditions
            .iter()
            .map(|condition| {
                condition
                    .parse::<Condition>()
                    .with_context(|| format!("invalid condition '{}'", condition))
            })
            .collect()
    }
}

fn option_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
