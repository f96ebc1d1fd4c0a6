//! Tool configuration loading

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profiles: ProfilesConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub firmware: FirmwareConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilesConfig {
    /// Property list holding the profile table
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Dictionary keys leading from the plist root to the profile table
    #[serde(default = "default_key_path")]
    pub key_path: Vec<String>,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            path: None,
            key_path: default_key_path(),
        }
    }
}

fn default_key_path() -> Vec<String> {
    vec![
        "IOKitPersonalities".to_string(),
        "CodecCommander".to_string(),
        "Codec Profile".to_string(),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Driver name used to select the override sub-dictionary
    #[serde(default = "default_driver_name")]
    pub name: String,
    /// Another audio driver that resets the codec itself is loaded
    #[serde(default)]
    pub alternate_driver_present: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            name: default_driver_name(),
            alternate_driver_present: false,
        }
    }
}

fn default_driver_name() -> String {
    "CodecCommander".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmwareConfig {
    /// Firmware path of the HDA controller
    #[serde(default = "default_acpi_path")]
    pub acpi_path: String,
    /// Property list with the package the override method returns
    #[serde(default, rename = "override")]
    pub override_path: Option<PathBuf>,
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self {
            acpi_path: default_acpi_path(),
            override_path: None,
        }
    }
}

fn default_acpi_path() -> String {
    "\\_SB.PCI0.HDEF".to_string()
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/hdacfg.toml")).unwrap();
        assert!(config.profiles.path.is_none());
        assert_eq!(config.profiles.key_path.len(), 3);
        assert_eq!(config.driver.name, "CodecCommander");
        assert!(!config.driver.alternate_driver_present);
        assert_eq!(config.firmware.acpi_path, "\\_SB.PCI0.HDEF");
        assert!(config.firmware.override_path.is_none());
    }

    #[test]
    fn test_parse_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[profiles]
path = "Info.plist"
key_path = []

[driver]
name = "CodecCommander"
alternate_driver_present = true

[firmware]
acpi_path = '\_SB.PCI0.HDAS'
override = "rmcf.plist"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.profiles.path, Some(PathBuf::from("Info.plist")));
        assert!(config.profiles.key_path.is_empty());
        assert!(config.driver.alternate_driver_present);
        assert_eq!(config.firmware.acpi_path, "\\_SB.PCI0.HDAS");
        assert_eq!(config.firmware.override_path, Some(PathBuf::from("rmcf.plist")));
    }

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str("[driver]\nname = \"Other\"\n").unwrap();
        assert_eq!(config.driver.name, "Other");
        assert_eq!(config.profiles.key_path[2], "Codec Profile");
    }
}
