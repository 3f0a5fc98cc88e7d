//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! Optional TOML file (GATEWAY_CONFIG)
//!     → loader.rs (parse, then apply env var overrides)
//!     → validation.rs (collect semantic errors)
//!     → schema.rs types consumed at startup
//! ```

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::GatewayConfig;
