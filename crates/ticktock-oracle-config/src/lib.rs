//! Configuration management for the TickTock differential oracle
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (TTO_* prefix, `__` between section and key)
//! 2. ttoracle.local.toml (gitignored, local overrides)
//! 3. ttoracle.toml (git-tracked, suite config)
//! 4. ~/.config/ticktock-oracle/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)

use serde::{Deserialize, Serialize};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Seed used for the suite-wide random stream when none is configured.
pub const DEFAULT_SEED: u64 = 1_234_567_890;

/// Absolute tolerance applied to float comparisons.
pub const DEFAULT_FLOAT_TOLERANCE: f64 = 0.000_000_000_12;

/// Main oracle configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OracleConfig {
    pub suite: SuiteConfig,
    pub compare: CompareConfig,
    pub submit: SubmitConfig,
    pub query: QueryConfig,
    pub backends: BackendsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SuiteConfig {
    /// Seed for the shared random stream; one seed per suite run.
    pub seed: u64,
    /// First timestamp (ms) handed to fixture generation.
    pub start_ms: i64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            start_ms: 1_569_859_200_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompareConfig {
    pub float_tolerance: f64,
    /// Strip empty series from reference responses before comparing.
    pub normalize_empty_series: bool,
    /// Skip queries that combine a rate transform with cross-series aggregation.
    pub skip_rate_with_aggregation: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            float_tolerance: DEFAULT_FLOAT_TOLERANCE,
            normalize_empty_series: true,
            skip_rate_with_aggregation: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SubmitConfig {
    pub format: WriteFormat,
}

/// Encoding used when submitting fixtures to the system under test.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WriteFormat {
    /// `put <metric> <ts> <value> k=v...` lines.
    #[default]
    Plain,
    /// Structured JSON body.
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryConfig {
    pub method: QueryMethod,
    pub timeout_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            method: QueryMethod::Post,
            timeout_secs: 10,
        }
    }
}

/// How queries are sent to the system under test.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum QueryMethod {
    /// Structured body.
    #[default]
    Post,
    /// Compact URL parameters.
    Get,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendsConfig {
    pub sut: EndpointConfig,
    pub reference: EndpointConfig,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            sut: EndpointConfig {
                host: "127.0.0.1".to_string(),
                http_port: 7182,
                data_port: Some(7181),
            },
            reference: EndpointConfig {
                host: "127.0.0.1".to_string(),
                http_port: 4242,
                data_port: None,
            },
        }
    }
}

/// Network location of one backend. Only carried here; the oracle core never connects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndpointConfig {
    pub host: String,
    pub http_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_port: Option<u16>,
}

impl EndpointConfig {
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    pub fn data_address(&self) -> Option<String> {
        self.data_port.map(|port| format!("{}:{port}", self.host))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl OracleConfig {
    /// Load configuration from all sources
    pub fn load() -> anyhow::Result<Self> {
        ConfigLoader::new().load()
    }

    /// Development preset: debug logging, everything else default.
    pub fn development() -> Self {
        Self {
            logging: LoggingConfig {
                filter: "debug".to_string(),
            },
            ..Default::default()
        }
    }

    /// CI preset: exercises the JSON write path and the URL query path.
    pub fn ci() -> Self {
        Self {
            submit: SubmitConfig {
                format: WriteFormat::Json,
            },
            query: QueryConfig {
                method: QueryMethod::Get,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML text, filling gaps with defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(ConfigError::ParseError)
    }

    /// Render this configuration as TOML, e.g. to seed a `ttoracle.toml`.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::SerializeError)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let tolerance = self.compare.float_tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "compare.float_tolerance must be a finite non-negative number, got {tolerance}"
            )));
        }
        if self.query.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "query.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
