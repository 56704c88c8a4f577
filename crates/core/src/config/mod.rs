//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::classify::{self, CacheRules};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the site is served from; root-relative paths resolve against it.
    ///
    /// Set via SHELLCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Prefix shared by every generation name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Deployed asset version. Bumping it retires the previous generations
    /// on the next activation.
    ///
    /// Set via SHELLCACHE_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Shell resources stored at install time.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Path prefixes that always bypass the cache.
    #[serde(default = "default_never_cache")]
    pub never_cache: Vec<String>,

    /// Regex over the URL path selecting cache-first assets.
    #[serde(default = "default_static_extensions")]
    pub static_extensions: String,

    /// Path prefixes served network-first.
    #[serde(default = "default_dynamic_prefixes")]
    pub dynamic_prefixes: Vec<String>,

    /// Icon shown on push notifications that do not name one.
    #[serde(default = "default_notification_icon")]
    pub notification_icon: String,

    /// Badge shown on push notifications.
    #[serde(default = "default_notification_badge")]
    pub notification_badge: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:4173".into()
}

fn default_cache_prefix() -> String {
    "portfolio".into()
}

fn default_version() -> String {
    "v1.0.0".into()
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_precache() -> Vec<String> {
    vec!["/".into(), "/index.html".into(), "/manifest.json".into()]
}

fn default_never_cache() -> Vec<String> {
    classify::NEVER_CACHE.iter().map(|s| s.to_string()).collect()
}

fn default_static_extensions() -> String {
    classify::STATIC_EXTENSIONS.into()
}

fn default_dynamic_prefixes() -> Vec<String> {
    classify::DYNAMIC_PREFIXES.iter().map(|s| s.to_string()).collect()
}

fn default_notification_icon() -> String {
    "/icons/icon-192x192.png".into()
}

fn default_notification_badge() -> String {
    "/icons/badge-72x72.png".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            version: default_version(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            precache: default_precache(),
            never_cache: default_never_cache(),
            static_extensions: default_static_extensions(),
            dynamic_prefixes: default_dynamic_prefixes(),
            notification_icon: default_notification_icon(),
            notification_badge: default_notification_badge(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of the generation holding shell assets.
    pub fn static_cache_name(&self) -> String {
        format!("{}-static-{}", self.cache_prefix, self.version)
    }

    /// Name of the generation holding runtime-fetched content.
    pub fn dynamic_cache_name(&self) -> String {
        format!("{}-dynamic-{}", self.cache_prefix, self.version)
    }

    /// Parsed site origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `origin` is blank and
    /// `ConfigError::Invalid` if it is not an absolute URL.
    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        if self.origin.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "origin".into(),
                hint: "Set SHELLCACHE_ORIGIN environment variable".into(),
            });
        }
        url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Classifier rules built from the configured lists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `static_extensions` does not compile.
    pub fn cache_rules(&self) -> Result<CacheRules, ConfigError> {
        CacheRules::new(self.never_cache.clone(), &self.static_extensions, self.dynamic_prefixes.clone())
            .map_err(|e| ConfigError::Invalid { field: "static_extensions".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load from an explicit TOML string layered over the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the TOML is malformed or validation fails.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml))
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./shellcache.sqlite"));
        assert_eq!(config.user_agent, "shellcache/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.precache, vec!["/", "/index.html", "/manifest.json"]);
        assert_eq!(config.never_cache, vec!["/admin", "/api/analytics", "/sw.js"]);
        assert_eq!(config.dynamic_prefixes, vec!["/api/", "/images/", "/assets/"]);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_generation_names() {
        let config = AppConfig::default();
        assert_eq!(config.static_cache_name(), "portfolio-static-v1.0.0");
        assert_eq!(config.dynamic_cache_name(), "portfolio-dynamic-v1.0.0");
    }

    #[test]
    fn test_cache_rules_from_config() {
        let config = AppConfig { static_extensions: r"\.wasm$".into(), ..Default::default() };
        let rules = config.cache_rules().unwrap();
        assert!(rules.is_static_asset("/pkg/app.wasm"));
        assert!(!rules.is_static_asset("/app.css"));
    }

    #[test]
    fn test_from_toml_str_overrides() {
        let config = AppConfig::from_toml_str(
            r#"
            version = "v2.0.0"
            origin = "https://portfolio.example"
            precache = ["/", "/offline.html"]
            "#,
        )
        .unwrap();

        assert_eq!(config.static_cache_name(), "portfolio-static-v2.0.0");
        assert_eq!(config.origin_url().unwrap().host_str(), Some("portfolio.example"));
        assert_eq!(config.precache, vec!["/", "/offline.html"]);
        assert_eq!(config.timeout_ms, 20_000);
    }

    #[test]
    fn test_blank_origin_is_missing() {
        let config = AppConfig { origin: " ".into(), ..Default::default() };
        assert!(matches!(config.origin_url(), Err(ConfigError::Missing { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_from_toml_str_rejects_invalid() {
        let result = AppConfig::from_toml_str("timeout_ms = 5");
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }
}
