//! Configuration loading.
//!
//! Configuration starts from defaults, is optionally seeded from a TOML
//! file named by `GATEWAY_CONFIG`, and is then overridden field by field
//! from environment variables. The merged result is validated before the
//! gateway starts.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::{AnalyzerConfig, GatewayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { name: String, reason: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { name, reason } => {
                write!(f, "Invalid environment variable {}: {}", name, reason)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load, merge and validate the gateway configuration.
pub fn load_config() -> Result<GatewayConfig, ConfigError> {
    let mut config = match env::var("GATEWAY_CONFIG") {
        Ok(path) => load_file(Path::new(&path))?,
        Err(_) => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load configuration from a TOML file.
pub fn load_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

fn apply_env_overrides(config: &mut GatewayConfig) -> Result<(), ConfigError> {
    override_var("PORT", &mut config.server.port)?;
    override_var("MAX_QUEUE_SIZE", &mut config.queue.max_queue_size)?;
    override_var("BATCH_SIZE", &mut config.queue.batch_size)?;
    override_var("PROCESSING_INTERVAL", &mut config.queue.processing_interval_ms)?;
    override_var("HEALTH_CHECK_INTERVAL", &mut config.health_check.interval_ms)?;
    override_var("HEALTH_CHECK_TIMEOUT", &mut config.health_check.timeout_ms)?;
    override_var("FAILURE_THRESHOLD", &mut config.health_check.failure_threshold)?;
    override_var("SUCCESS_THRESHOLD", &mut config.health_check.success_threshold)?;
    override_var("SEND_TIMEOUT", &mut config.dispatch.send_timeout_ms)?;
    override_var("RETRY_ON_FAILURE", &mut config.dispatch.retry_on_failure)?;
    override_var("WORKER_COUNT", &mut config.dispatch.worker_count)?;
    override_var("SHUTDOWN_GRACE", &mut config.dispatch.shutdown_grace_ms)?;
    override_var("METRICS_ENABLED", &mut config.observability.metrics_enabled)?;
    override_var("METRICS_ADDRESS", &mut config.observability.metrics_address)?;

    if let Ok(raw) = env::var("ANALYZERS") {
        config.analyzers = parse_analyzer_list(&raw)?;
    }

    Ok(())
}

/// Override one field from the named environment variable, if set.
fn override_var<T>(name: &str, field: &mut T) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = env::var(name) {
        *field = raw.parse().map_err(|e: T::Err| ConfigError::Env {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

/// Parse the `ANALYZERS` variable: comma-separated `id:endpoint:weight`
/// triples. The endpoint may itself contain colons, so the id ends at the
/// first colon and the weight starts after the last one.
pub fn parse_analyzer_list(raw: &str) -> Result<Vec<AnalyzerConfig>, ConfigError> {
    let bad = |entry: &str, reason: &str| ConfigError::Env {
        name: "ANALYZERS".to_string(),
        reason: format!("entry '{entry}': {reason}"),
    };

    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, rest) = entry
                .split_once(':')
                .ok_or_else(|| bad(entry, "expected id:endpoint:weight"))?;
            let (endpoint, weight) = rest
                .rsplit_once(':')
                .ok_or_else(|| bad(entry, "expected id:endpoint:weight"))?;
            let weight: f64 = weight
                .parse()
                .map_err(|_| bad(entry, "weight is not a number"))?;
            Ok(AnalyzerConfig {
                id: id.to_string(),
                endpoint: endpoint.to_string(),
                weight,
            })
        })
        .collect()
}
