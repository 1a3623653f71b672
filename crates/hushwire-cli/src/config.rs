//! Configuration system for the Hushwire CLI.

use hushwire_crypto::rsa::{DEFAULT_MODULUS_BITS, MIN_MODULUS_BITS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Largest modulus the CLI will generate.
pub const MAX_MODULUS_BITS: u64 = 8192;

/// Hushwire configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Key generation and storage
    #[serde(default)]
    pub keys: KeysConfig,
    /// Contact keyring
    #[serde(default)]
    pub keyring: KeyringConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Key configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    /// Modulus width for new key pairs
    #[serde(default = "default_bits")]
    pub bits: u64,
    /// Directory for generated key files
    #[serde(default = "default_key_dir")]
    pub directory: PathBuf,
}

/// Keyring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyringConfig {
    /// Keyring file path
    #[serde(default = "default_keyring_path")]
    pub path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

// Default values

fn default_bits() -> u64 {
    DEFAULT_MODULUS_BITS
}

fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".hushwire")
}

fn default_key_dir() -> PathBuf {
    data_dir().join("keys")
}

fn default_keyring_path() -> PathBuf {
    data_dir().join("keyring.toml")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            bits: default_bits(),
            directory: default_key_dir(),
        }
    }
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self {
            path: default_keyring_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get default config path
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("hushwire/config.toml")
    }

    /// Load config from default path, or create default if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if reading or creating the config fails.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let path = Self::default_path();

        if path.exists() {
            Self::load(&path)
        } else {
            let config = Self::default();
            config.save(&path)?;
            Ok(config)
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_bits(self.keys.bits)?;

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }

        if self.keyring.path.as_os_str().is_empty() {
            anyhow::bail!("Keyring path must not be empty");
        }

        Ok(())
    }
}

/// Check a modulus width against the range the CLI supports.
///
/// # Errors
///
/// Returns an error if `bits` is outside `[MIN_MODULUS_BITS, MAX_MODULUS_BITS]`.
pub fn validate_bits(bits: u64) -> anyhow::Result<()> {
    if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&bits) {
        anyhow::bail!(
            "Key size must be between {} and {} bits, got {}",
            MIN_MODULUS_BITS,
            MAX_MODULUS_BITS,
            bits
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.keys.bits, 512);
        assert_eq!(config.logging.level, "info");
        assert!(config.keyring.path.ends_with("keyring.toml"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());

        config.keys.bits = 8;
        assert!(config.validate().is_err());

        config.keys.bits = 16_384;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.keys.bits, deserialized.keys.bits);
        assert_eq!(config.keyring.path, deserialized.keyring.path);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[keys]\nbits = 1024\n").unwrap();
        assert_eq!(config.keys.bits, 1024);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.keys.bits = 768;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.keys.bits, 768);
    }
}
