use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Tool paths are not empty
/// - Working and destination directories differ
/// - Maximum speed is a positive number
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    for (key, path) in [
        ("fetcher.ytdlp_path", &config.fetcher.ytdlp_path),
        ("converter.ffmpeg_path", &config.converter.ffmpeg_path),
        ("converter.ffprobe_path", &config.converter.ffprobe_path),
    ] {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                key
            )));
        }
    }

    if config.storage.temp_dir == config.storage.output_dir {
        return Err(ConfigError::ValidationError(
            "storage.temp_dir and storage.output_dir must differ".to_string(),
        ));
    }

    let max_speed = config.orchestrator.max_speed;
    if !max_speed.is_finite() || max_speed <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "orchestrator.max_speed must be positive, got {}",
            max_speed
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::net::IpAddr;
    use std::path::PathBuf;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_same_directories_fails() {
        let mut config = Config::default();
        config.storage.output_dir = config.storage.temp_dir.clone();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_validate_empty_tool_path_fails() {
        let mut config = Config::default();
        config.fetcher.ytdlp_path = PathBuf::new();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("fetcher.ytdlp_path"));
    }

    #[test]
    fn test_validate_non_positive_max_speed_fails() {
        let mut config = Config::default();
        config.orchestrator.max_speed = 0.0;
        assert!(validate_config(&config).is_err());

        config.orchestrator.max_speed = f64::NAN;
        assert!(validate_config(&config).is_err());
    }
}
