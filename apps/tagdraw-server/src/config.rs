use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use serde::Deserialize;

pub const DEFAULT_GRAPH_API: &str = "https://graph.facebook.com/v19.0";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    Sled,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub graph_api_base: String,
    pub ig_token: Option<String>,
    pub ig_post_id: Option<String>,
    pub sync_interval_secs: u64,
    pub admin_password: Option<String>,
    pub store: StoreKind,
    pub db_path: PathBuf,
    /// Comma separated; empty allows any origin.
    pub cors_origins: String,
    pub default_count: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3001".to_string(),
            graph_api_base: DEFAULT_GRAPH_API.to_string(),
            ig_token: None,
            ig_post_id: None,
            sync_interval_secs: 60,
            admin_password: None,
            store: StoreKind::Memory,
            db_path: PathBuf::from("comments.db"),
            cors_origins: String::new(),
            default_count: 20,
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Secrets come from the environment so they stay out of config files.
    pub fn apply_env(mut self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok());
        self
    }

    fn apply_env_with(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("IG_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.ig_token = Some(v);
        }
        if let Some(v) = var("IG_POST_ID").filter(|v| !v.trim().is_empty()) {
            self.ig_post_id = Some(v);
        }
        if let Some(v) = var("ADMIN_PASSWORD").filter(|v| !v.is_empty()) {
            self.admin_password = Some(v);
        }
    }

    /// Live Graph API credentials, if both the token and the post id are set.
    pub fn graph_credentials(&self) -> Option<(&str, &str)> {
        match (self.ig_token.as_deref(), self.ig_post_id.as_deref()) {
            (Some(token), Some(post)) if !token.is_empty() && !post.is_empty() => Some((token, post)),
            _ => None,
        }
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
    }
}

#[derive(Parser, Debug)]
#[command(name = "tagdraw-server", version, about = "Hashtag giveaway: sync comments, verify followers, draw winners")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub bind: Option<String>,
    #[arg(long, global = true, value_enum)]
    pub store: Option<StoreKind>,
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,
    #[arg(long, global = true)]
    pub graph_api_base: Option<String>,
    #[arg(long, global = true)]
    pub sync_interval_secs: Option<u64>,
    #[arg(long, global = true)]
    pub cors_origins: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API with background comment sync (default)
    Serve,
    /// Fetch and store comments once, then exit
    Sync,
    /// Draw winners from stored comments and print them with their prizes
    Pick {
        #[arg(long)]
        count: Option<usize>,
        #[arg(long, default_value = "all")]
        tag: String,
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn merge_into_config(&self, mut cfg: ServerConfig) -> ServerConfig {
        if let Some(v) = &self.bind {
            cfg.bind = v.clone();
        }
        if let Some(v) = self.store {
            cfg.store = v;
        }
        if let Some(v) = &self.db_path {
            cfg.db_path = v.clone();
        }
        if let Some(v) = &self.graph_api_base {
            cfg.graph_api_base = v.clone();
        }
        if let Some(v) = self.sync_interval_secs {
            cfg.sync_interval_secs = v;
        }
        if let Some(v) = &self.cors_origins {
            cfg.cors_origins = v.clone();
        }
        cfg
    }

    /// File, then flags, then environment secrets.
    pub fn load_config(&self) -> Result<ServerConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => {
                info!("loading config from {}", path.display());
                ServerConfig::from_file(path)?
            }
            None => ServerConfig::default(),
        };
        let cfg = self.merge_into_config(base).apply_env();
        if cfg.admin_password.is_none() {
            warn!("ADMIN_PASSWORD not set, admin routes will reject every request");
        }
        if cfg.graph_credentials().is_none() {
            warn!("IG_TOKEN or IG_POST_ID not set, using demo comments and like counts");
        }
        Ok(cfg)
    }
}
