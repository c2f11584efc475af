//! Demo configuration loaded from environment variables.

/// Scenario configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `SEED_STOCK` — initial stock per demo product (default: `25`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub seed_stock: u32,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            seed_stock: std::env::var("SEED_STOCK")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(25),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_stock: 25,
            log_level: "info".to_string(),
        }
    }
}
