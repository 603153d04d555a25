//! Command-line interface parsing for merchantcache
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the service configuration and the command to run.

use std::collections::HashSet;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::config::{ServiceConfig, API_KEY_ENV, API_URL_ENV, DEFAULT_API_URL};
use crate::data::MerchantFilters;

/// Default page size for menus
pub const DEFAULT_MENU_LIMIT: u32 = 48;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A page or page size of zero was given
    #[error("Invalid {0}: must be at least 1")]
    ZeroValue(&'static str),
}

/// merchantcache - Read merchants and menus from the content API
#[derive(Parser, Debug)]
#[command(name = "merchantcache")]
#[command(about = "Cached reads of merchants and menus from a headless CMS")]
#[command(version)]
pub struct Cli {
    /// Base URL of the content API
    #[arg(long, env = API_URL_ENV, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// API key sent as `users API-Key <KEY>`
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Log cache hits and misses
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List merchants
    Merchants {
        /// Only active (true) or inactive (false) merchants
        #[arg(long)]
        active: Option<bool>,
        /// Page size
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show one merchant
    Merchant {
        /// Merchant id
        id: String,
    },
    /// Count merchants
    Count {
        /// Only active (true) or inactive (false) merchants
        #[arg(long)]
        active: Option<bool>,
    },
    /// Show a merchant's menu
    Menu {
        /// Merchant id
        merchant_id: String,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Page size
        #[arg(long, default_value_t = DEFAULT_MENU_LIMIT)]
        limit: u32,
    },
    /// Show the first page of several merchants' menus, fetched concurrently
    ///
    /// A merchant named more than once is fetched and printed once.
    Menus {
        /// Merchant ids
        #[arg(required = true)]
        merchant_ids: Vec<String>,
    },
}

/// A validated command ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Merchants(MerchantFilters),
    Merchant(String),
    Count(Option<bool>),
    Menu { merchant_id: String, page: u32, limit: u32 },
    Menus(Vec<String>),
}

fn non_zero(value: u32, name: &'static str) -> Result<u32, CliError> {
    if value == 0 {
        Err(CliError::ZeroValue(name))
    } else {
        Ok(value)
    }
}

impl Cli {
    /// Service configuration from the URL and key arguments
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig::default()
            .with_base_url(self.api_url.clone())
            .with_api_key(self.api_key.clone())
    }

    /// Validates the subcommand arguments
    ///
    /// # Returns
    /// * `Ok(Command)` with validated values
    /// * `Err(CliError)` if a page or limit is zero
    ///
    /// Repeated merchant ids for `menus` are dropped, keeping the first.
    pub fn command(&self) -> Result<Command, CliError> {
        let command = match &self.command {
            Commands::Merchants {
                active,
                limit,
                page,
            } => Command::Merchants(MerchantFilters {
                is_active: *active,
                limit: non_zero(*limit, "limit")?,
                page: non_zero(*page, "page")?,
            }),
            Commands::Merchant { id } => Command::Merchant(id.clone()),
            Commands::Count { active } => Command::Count(*active),
            Commands::Menu {
                merchant_id,
                page,
                limit,
            } => Command::Menu {
                merchant_id: merchant_id.clone(),
                page: non_zero(*page, "page")?,
                limit: non_zero(*limit, "limit")?,
            },
            Commands::Menus { merchant_ids } => {
                let mut seen = HashSet::new();
                let unique = merchant_ids
                    .iter()
                    .filter(|id| seen.insert(id.as_str()))
                    .cloned()
                    .collect();
                Command::Menus(unique)
            }
        };
        Ok(command)
    }
}
