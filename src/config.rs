//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use reqwest::Url;

use crate::{cache::manager::DEFAULT_CACHE_VERSION, notify::NotificationPermission};

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "pomodoro-shell")]
#[command(about = "A Pomodoro timer host with persisted state and an offline-first asset cache")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "3000")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding the persisted timer state
    #[arg(short, long, default_value = ".pomodoro")]
    pub data_dir: PathBuf,

    /// Public origin the app is served from (defaults to http://<host>:<port>)
    #[arg(long)]
    pub origin: Option<Url>,

    /// Static file server that hosts the built application
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    pub upstream: Url,

    /// Cache version tag; partitions from other versions are deleted on start
    #[arg(long, default_value = DEFAULT_CACHE_VERSION)]
    pub cache_version: String,

    /// Upstream request timeout in seconds
    #[arg(long, default_value = "10")]
    pub network_timeout: u64,

    /// Notification permission granted by the host
    #[arg(long, value_enum, default_value = "granted")]
    pub notifications: NotificationPermission,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Public origin of the application
    pub fn origin(&self) -> anyhow::Result<Url> {
        match &self.origin {
            Some(origin) => Ok(origin.clone()),
            None => Ok(Url::parse(&format!("http://{}", self.address()))?),
        }
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.network_timeout)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
