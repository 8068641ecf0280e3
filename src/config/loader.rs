/// Configuration loading from TOML file
use std::path::Path;

use crate::error::{RecorderError, Result};
use crate::types::AppConfig;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| RecorderError::Config(format!("Failed to read config file: {}", e)))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| RecorderError::Config(format!("Failed to parse config: {}", e)))?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<()> {
    if config.data_dir.is_empty() {
        return Err(RecorderError::Config("data_dir is empty".to_string()));
    }

    if config.setting_file.is_empty() {
        return Err(RecorderError::Config("setting_file is empty".to_string()));
    }

    if config.timer_period_secs == 0 {
        return Err(RecorderError::Config(
            "timer_period_secs must be >= 1".to_string(),
        ));
    }

    if config.flush_every == 0 {
        return Err(RecorderError::Config(
            "flush_every must be >= 1".to_string(),
        ));
    }

    if config.bar_interval_secs <= 0 {
        return Err(RecorderError::Config(format!(
            "Invalid bar_interval_secs: {}",
            config.bar_interval_secs
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_minimal_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "data_dir = \"capture\"").unwrap();
        file.flush().unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.data_dir, "capture");
        assert_eq!(config.timer_period_secs, 1);
        assert_eq!(config.flush_every, 10);
        assert_eq!(config.bar_interval_secs, 60);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "flush_every = 0").unwrap();
        file.flush().unwrap();

        assert!(load_config(file.path()).is_err());
    }
}
