use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::lifecycle::{GraphEdges, LifecycleEngine, LifecycleGraph, DEFAULT_LOST_ESCALATION_DAYS};

/// Main configuration structure for the asset lifecycle service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LifecycleAppConfig {
    /// Observability settings
    pub observability: ObservabilityConfig,
    /// Lifecycle rules and escalation
    pub lifecycle: LifecycleConfig,
    /// File store settings
    pub storage: StorageConfig,
    /// Database settings (optional)
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (overridden by RUST_LOG)
    pub log_level: String,
    /// Emit logs as JSON
    pub json_logs: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LifecycleConfig {
    /// Days an asset may stay Lost before it is disposed automatically
    pub lost_escalation_days: u32,
    /// How often the background sweep runs
    pub sweep_interval_minutes: u64,
    /// Replacement adjacency list; the built-in graph is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<Vec<GraphEdges>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory of the file store
    pub state_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite file path or connection string)
    pub url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for LifecycleAppConfig {
    fn default() -> Self {
        Self {
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
            lifecycle: LifecycleConfig {
                lost_escalation_days: DEFAULT_LOST_ESCALATION_DAYS,
                sweep_interval_minutes: 60,
                graph: None,
            },
            storage: StorageConfig {
                state_dir: PathBuf::from(".asset-lifecycle"),
            },
            database: None,
        }
    }
}

impl LifecycleAppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (`explicit` if given, else asset-lifecycle.toml)
    /// 3. Environment variables (ASSET_LIFECYCLE_<SECTION>__<KEY>)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        match explicit {
            Some(path) => {
                builder = builder.add_source(File::from(path.to_path_buf()).required(true));
            }
            None if Path::new("asset-lifecycle.toml").exists() => {
                builder = builder.add_source(File::with_name("asset-lifecycle"));
            }
            None => {}
        }

        builder = builder.add_source(
            Environment::with_prefix("ASSET_LIFECYCLE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: LifecycleAppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.lifecycle.sweep_interval_minutes == 0 {
            anyhow::bail!("lifecycle.sweep_interval_minutes must be greater than zero");
        }
        self.lifecycle_graph()?;
        Ok(())
    }

    /// The configured graph, or the built-in default
    pub fn lifecycle_graph(&self) -> Result<LifecycleGraph> {
        match &self.lifecycle.graph {
            Some(edges) => Ok(LifecycleGraph::from_edges(edges)?),
            None => Ok(LifecycleGraph::default()),
        }
    }

    pub fn engine(&self) -> Result<LifecycleEngine> {
        Ok(LifecycleEngine::new(self.lifecycle_graph()?))
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.lifecycle.sweep_interval_minutes * 60)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
