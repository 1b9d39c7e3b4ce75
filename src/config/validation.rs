use crate::config::types::{BatchConfig, Config, DiscoveryConfig, FetchConfig, OcrConfig};
use crate::{ConfigError, ConfigResult};

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_fetch_config(&config.fetch)?;
    validate_discovery_config(&config.discovery)?;
    validate_ocr_config(&config.ocr)?;
    validate_batch_config(&config.batch)?;

    if config.storage.data_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "data_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_fetch_config(config: &FetchConfig) -> ConfigResult<()> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be > 0".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be > 0".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    // Header values must be visible ASCII
    for (name, value) in [
        ("user_agent", &config.user_agent),
        ("accept_language", &config.accept_language),
    ] {
        if !value.chars().all(|c| c == ' ' || c.is_ascii_graphic()) {
            return Err(ConfigError::Validation(format!(
                "{} contains characters not allowed in an HTTP header: '{}'",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates candidate discovery configuration
fn validate_discovery_config(config: &DiscoveryConfig) -> ConfigResult<()> {
    if config.max_candidates < 1 || config.max_candidates > 20 {
        return Err(ConfigError::Validation(format!(
            "max_candidates must be between 1 and 20, got {}",
            config.max_candidates
        )));
    }

    Ok(())
}

/// Validates OCR configuration
fn validate_ocr_config(config: &OcrConfig) -> ConfigResult<()> {
    if config.tesseract_binary.trim().is_empty() {
        return Err(ConfigError::Validation(
            "tesseract_binary cannot be empty".to_string(),
        ));
    }

    if config.language.trim().is_empty() {
        return Err(ConfigError::Validation(
            "language cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates batch configuration
fn validate_batch_config(config: &BatchConfig) -> ConfigResult<()> {
    if config.max_concurrent < 1 || config.max_concurrent > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be between 1 and 64, got {}",
            config.max_concurrent
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_fetch_config() {
        let mut config = FetchConfig::default();
        assert!(validate_fetch_config(&config).is_ok());

        config.timeout_secs = 0;
        assert!(validate_fetch_config(&config).is_err());

        let mut config = FetchConfig::default();
        config.user_agent = "   ".to_string();
        assert!(validate_fetch_config(&config).is_err());

        let mut config = FetchConfig::default();
        config.accept_language = "en\nX-Injected: 1".to_string();
        assert!(validate_fetch_config(&config).is_err());
    }

    #[test]
    fn test_validate_discovery_bounds() {
        let mut config = DiscoveryConfig::default();
        config.max_candidates = 20;
        assert!(validate_discovery_config(&config).is_ok());

        config.max_candidates = 21;
        assert!(validate_discovery_config(&config).is_err());

        config.max_candidates = 0;
        assert!(validate_discovery_config(&config).is_err());
    }

    #[test]
    fn test_validate_ocr_config() {
        let mut config = OcrConfig::default();
        config.language = String::new();
        assert!(validate_ocr_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_data_dir() {
        let mut config = Config::default();
        config.storage.data_dir = std::path::PathBuf::new();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
