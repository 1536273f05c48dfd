/// Configuration loading from TOML file
use std::path::Path;

use crate::error::{KiteError, Result};
use crate::types::Config;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| KiteError::ConfigError(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| KiteError::ConfigError(format!("Failed to parse config: {}", e)))?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    if config.user_id.is_empty() {
        return Err(KiteError::ConfigError("user_id is empty".to_string()));
    }

    if config.password.is_empty() {
        return Err(KiteError::ConfigError("password is empty".to_string()));
    }

    if config.totp_secret.is_empty() {
        return Err(KiteError::ConfigError("totp_secret is empty".to_string()));
    }

    if config.http_timeout_secs == 0 {
        return Err(KiteError::ConfigError(
            "http_timeout_secs must be > 0".to_string(),
        ));
    }

    Ok(())
}
