//! TOML-based configuration system.
//!
//! Loads settings from a `config.toml` file, falling back to defaults when
//! the file is missing, unreadable or partial. Every struct implements
//! `Default` and is `#[serde(default)]`.
//!
//! ## Config file search order
//!
//! 1. `SURIBROWS_CONFIG` environment variable (explicit override)
//! 2. Next to the executable (`<exe_dir>/config.toml`)
//! 3. Platform config directory (`%APPDATA%\SuriBrows\config.toml` on Windows)
//! 4. Current working directory (`./config.toml`)
//! 5. No file found → `Config::default()`

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Config structs
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub navigation: NavigationConfig,
    pub fireproofing: FireproofingConfig,
    pub content_blocking: ContentBlockingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub default_url: String,
}

/// Navigation policy switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Honour command-click / command+shift-click on links.
    pub open_in_new_tab: bool,
    /// URL schemes handed to other applications instead of loaded.
    pub external_schemes: Vec<String>,
    /// Reissue main-frame loads with `Sec-GPC: 1`.
    pub gpc_enabled: bool,
    /// Upgrade `http://` navigations to hosts known to serve HTTPS.
    pub https_upgrade: bool,
    /// Hosts known to serve the same content over HTTPS.
    pub https_upgradeable_hosts: Vec<String>,
}

/// Login detection and the fireproofed-domain store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FireproofingConfig {
    /// Path of the allow-list file. Empty = platform config directory.
    pub store_path: String,
    /// Also treat a changed cookie jar as a login when the landing URL
    /// did not change.
    pub detect_cookie_changes: bool,
}

/// Content rule lists attached to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentBlockingConfig {
    pub tracking_protection: bool,
    pub attribution: bool,
    /// Directory of ABP filter lists. Empty = search `resources/filters/`.
    pub filters_dir: String,
    /// File name (inside the filters directory) of the attribution list.
    pub attribution_list: String,
    /// Domains the user exempted from protection (no HTTPS upgrade either).
    pub unprotected_domains: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_url: "https://example.com".to_string(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            open_in_new_tab: true,
            external_schemes: ["mailto", "tel", "sms", "facetime", "maps", "itms-apps"]
                .into_iter()
                .map(String::from)
                .collect(),
            gpc_enabled: true,
            https_upgrade: true,
            https_upgradeable_hosts: Vec::new(),
        }
    }
}

impl Default for ContentBlockingConfig {
    fn default() -> Self {
        Self {
            tracking_protection: true,
            attribution: true,
            filters_dir: String::new(),
            attribution_list: "attribution.txt".to_string(),
            unprotected_domains: Vec::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config loading and saving
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Loads configuration from a TOML file. Never fails: returns defaults
    /// if no file is found or if parsing fails.
    pub fn load() -> Self {
        match find_config_path() {
            Some(path) => match fs::read_to_string(&path) {
                Ok(content) => match toml::from_str::<Config>(&content) {
                    Ok(config) => {
                        info!(path = %path.display(), "Configuration loaded");
                        config
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                        Config::default()
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot read config, using defaults");
                    Config::default()
                }
            },
            None => {
                info!("No config file found, using defaults");
                Config::default()
            }
        }
    }

    /// Where the fireproofed-domain store lives.
    pub fn fireproof_store_path(&self) -> PathBuf {
        if self.fireproofing.store_path.is_empty() {
            platform_dir_or_cwd().join("fireproof.toml")
        } else {
            PathBuf::from(&self.fireproofing.store_path)
        }
    }
}

/// Searches for a config file in the standard locations.
fn find_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SURIBROWS_CONFIG") {
        let p = PathBuf::from(path);
        if p.is_file() {
            return Some(p);
        }
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let p = dir.join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    if let Some(dir) = platform_config_dir() {
        let p = dir.join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    let p = PathBuf::from("config.toml");
    if p.is_file() {
        return Some(p);
    }

    None
}

fn platform_dir_or_cwd() -> PathBuf {
    platform_config_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the platform config directory without adding a dependency.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join("SuriBrows"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .or_else(|| std::env::var("HOME").ok().map(|h| format!("{h}/.config")))
            .map(|dir| PathBuf::from(dir).join("suribrows"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.general.default_url, "https://example.com");
        assert!(c.navigation.open_in_new_tab);
        assert!(c.navigation.external_schemes.iter().any(|s| s == "mailto"));
        assert!(!c.fireproofing.detect_cookie_changes);
        assert!(c.content_blocking.tracking_protection);
        assert!(c.content_blocking.attribution);
        assert_eq!(c.content_blocking.attribution_list, "attribution.txt");
        assert!(c.navigation.gpc_enabled);
        assert!(c.navigation.https_upgrade);
        assert!(c.content_blocking.unprotected_domains.is_empty());
    }

    #[test]
    fn test_https_upgrade_section() {
        let toml = r#"
[navigation]
gpc_enabled = false
https_upgradeable_hosts = ["example.com"]

[content_blocking]
unprotected_domains = ["intranet.example"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.navigation.gpc_enabled);
        assert!(config.navigation.https_upgrade); // default
        assert_eq!(config.navigation.https_upgradeable_hosts, vec!["example.com".to_string()]);
        assert_eq!(
            config.content_blocking.unprotected_domains,
            vec!["intranet.example".to_string()]
        );
    }

    #[test]
    fn test_empty_toml_returns_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.navigation.open_in_new_tab);
        assert!(config.content_blocking.tracking_protection);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml = r#"
[content_blocking]
tracking_protection = false

[fireproofing]
detect_cookie_changes = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.content_blocking.tracking_protection);
        assert!(config.content_blocking.attribution); // default
        assert!(config.fireproofing.detect_cookie_changes);
        assert!(config.navigation.open_in_new_tab); // default
    }

    #[test]
    fn test_external_schemes_override() {
        let toml = r#"
[navigation]
external_schemes = ["mailto"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.navigation.external_schemes, vec!["mailto".to_string()]);
    }

    #[test]
    fn test_full_toml_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(
            deserialized.navigation.external_schemes,
            config.navigation.external_schemes
        );
        assert_eq!(deserialized.general.default_url, config.general.default_url);
    }

    #[test]
    fn test_explicit_store_path_wins() {
        let mut config = Config::default();
        config.fireproofing.store_path = "/tmp/fp.toml".into();
        assert_eq!(config.fireproof_store_path(), PathBuf::from("/tmp/fp.toml"));
    }

    #[test]
    fn test_default_store_path_not_empty() {
        let path = Config::default().fireproof_store_path();
        assert!(path.ends_with("fireproof.toml"));
    }
}
