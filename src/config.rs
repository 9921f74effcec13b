use crate::database::DatabaseConfig;
use crate::error::Error;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<&LogLevel> for LevelFilter {
    fn from(level: &LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    /// Case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::Config(format!(
                    "unknown log level '{}', expected one of error, warn, info, debug, trace",
                    s
                ))
            })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_config_cache_duration() -> Duration {
    Duration::from_secs(300)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default)]
    pub database: DatabaseConfig,
    // Lifetime of cached config store values
    #[serde(default = "default_config_cache_duration")]
    #[serde(with = "humantime_serde")]
    pub config_cache_duration: Duration,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize TOML: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Parse the listen configuration into a SocketAddr
    pub fn parse_listen_addr(&self) -> Result<SocketAddr, Error> {
        // Accepted forms:
        // - "127.0.0.1:8000"
        // - "*:8000" -> "0.0.0.0:8000"
        // - "8000" -> "0.0.0.0:8000"
        // - "localhost:8000"
        let s = self.listen.trim();
        let addr_str = if s.starts_with('*') {
            s.replacen('*', "0.0.0.0", 1)
        } else if !s.contains(':') {
            format!("0.0.0.0:{}", s)
        } else {
            s.to_string()
        };

        addr_str
            .parse::<SocketAddr>()
            .or_else(|_| {
                use std::net::ToSocketAddrs;
                addr_str
                    .to_socket_addrs()
                    .map_err(|e| {
                        Error::Config(format!("Failed to resolve address '{}': {}", addr_str, e))
                    })?
                    .next()
                    .ok_or_else(|| Error::Config(format!("No address resolved for '{}'", addr_str)))
            })
            .map_err(|e| Error::Config(format!("Invalid listen address '{}': {}", s, e)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Error> {
        self.parse_listen_addr()?;

        if self.config_cache_duration.is_zero() {
            return Err(Error::Config(
                "config_cache_duration must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen: default_listen(),
            log_level: LogLevel::default(),
            database: DatabaseConfig::default(),
            config_cache_duration: default_config_cache_duration(),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "listen: {}, log_level: {}, database: {}, config_cache_duration: {}",
            self.listen,
            self.log_level,
            self.database,
            humantime::format_duration(self.config_cache_duration),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_with_listen(listen: &str) -> Config {
        Config {
            listen: listen.to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_parse_listen_addr() {
        assert!(config_with_listen("localhost:8000")
            .parse_listen_addr()
            .is_ok());

        let addr = config_with_listen("*:8080").parse_listen_addr().unwrap();
        assert_eq!(addr.port(), 8080);
        assert!(addr.ip().is_unspecified());

        let addr = config_with_listen("9000").parse_listen_addr().unwrap();
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());
        assert!(config_with_listen("invalid").validate().is_err());

        let config = Config {
            config_cache_duration: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plenum.toml");
        let mut config = Config::default();
        config.log_level = LogLevel::Debug;
        config.config_cache_duration = Duration::from_secs(60);
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.log_level, LogLevel::Debug);
        assert_eq!(loaded.config_cache_duration, Duration::from_secs(60));
        assert_eq!(loaded.listen, config.listen);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str("listen = \"127.0.0.1:9999\"").unwrap();
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.config_cache_duration, default_config_cache_duration());
        assert!(matches!(config.database, DatabaseConfig::Sqlite { .. }));
    }

    #[test]
    fn test_log_level_parsing() {
        for level in LogLevel::ALL {
            assert_eq!(level.as_str().parse::<LogLevel>().unwrap(), level);
        }
        assert_eq!(" DEBUG ".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!(LevelFilter::from(&LogLevel::Warn), LevelFilter::Warn);
        assert!("verbose".parse::<LogLevel>().is_err());
    }
}
