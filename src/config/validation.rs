//! Configuration validation logic.

use std::collections::HashSet;

use url::Url;

use crate::config::schema::GatewayConfig;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation error: {}", self.0)
    }
}

/// Validate a GatewayConfig for semantic correctness.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // 1. Queue and worker bounds
    if config.queue.max_queue_size == 0 {
        errors.push(ValidationError("queue.max_queue_size must be > 0".to_string()));
    }
    if config.queue.batch_size == 0 {
        errors.push(ValidationError("queue.batch_size must be > 0".to_string()));
    }
    if config.dispatch.worker_count == 0 {
        errors.push(ValidationError("dispatch.worker_count must be > 0".to_string()));
    }

    // 2. Health thresholds
    if config.health_check.failure_threshold == 0 {
        errors.push(ValidationError(
            "health_check.failure_threshold must be > 0".to_string(),
        ));
    }
    if config.health_check.success_threshold == 0 {
        errors.push(ValidationError(
            "health_check.success_threshold must be > 0".to_string(),
        ));
    }

    // 3. Analyzer entries
    let mut seen: HashSet<&str> = HashSet::new();
    for analyzer in &config.analyzers {
        if analyzer.id.is_empty() {
            errors.push(ValidationError("analyzer id must not be empty".to_string()));
            continue;
        }
        if !seen.insert(analyzer.id.as_str()) {
            errors.push(ValidationError(format!(
                "duplicate analyzer id '{}'",
                analyzer.id
            )));
        }
        match Url::parse(&analyzer.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(_) => errors.push(ValidationError(format!(
                "analyzer '{}' endpoint must be http(s), got '{}'",
                analyzer.id, analyzer.endpoint
            ))),
            Err(e) => errors.push(ValidationError(format!(
                "analyzer '{}' endpoint '{}' is not a valid URL: {}",
                analyzer.id, analyzer.endpoint, e
            ))),
        }
        if !(analyzer.weight > 0.0) {
            errors.push(ValidationError(format!(
                "analyzer '{}' weight must be positive, got {}",
                analyzer.id, analyzer.weight
            )));
        }
    }

    // 4. Timeouts (basic check)
    if config.dispatch.send_timeout_ms == 0 || config.health_check.timeout_ms == 0 {
        tracing::warn!("Outbound timeouts are set to 0, requests might time out immediately");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
