//! Request classification.
//!
//! Maps an intercepted request to the caching policy that applies to it.
//! Classification is a pure function of the request and the rule lists;
//! nothing is remembered between calls.

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::request::{InterceptedRequest, RequestMode};

/// Path prefixes that are never read from or written to any generation.
pub const NEVER_CACHE: &[&str] = &["/admin", "/api/analytics", "/sw.js"];

/// File extensions served cache-first.
pub const STATIC_EXTENSIONS: &str = r"\.(css|js|png|jpg|jpeg|gif|svg|woff|woff2|ttf|eot|ico)$";

/// Path prefixes served network-first.
pub const DYNAMIC_PREFIXES: &[&str] = &["/api/", "/images/", "/assets/"];

/// Category of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    NeverCache,
    StaticAsset,
    DynamicAsset,
    Navigation,
    Other,
}

/// Caching strategy applied to a classified request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    NavigationFallback,
}

impl Classification {
    /// Strategy for this category, `None` when the request must pass through.
    pub fn strategy(self) -> Option<Strategy> {
        match self {
            Classification::NeverCache => None,
            Classification::StaticAsset => Some(Strategy::CacheFirst),
            Classification::DynamicAsset => Some(Strategy::NetworkFirst),
            Classification::Navigation => Some(Strategy::NavigationFallback),
            // Same as DynamicAsset today; kept separate so either can change alone.
            Classification::Other => Some(Strategy::NetworkFirst),
        }
    }
}

/// Rule lists consulted by [`classify`].
#[derive(Debug, Clone)]
pub struct CacheRules {
    pub never_cache: Vec<String>,
    pub static_extensions: Regex,
    pub dynamic_prefixes: Vec<String>,
}

impl CacheRules {
    /// Build rules from raw lists, compiling the extension pattern.
    pub fn new(
        never_cache: Vec<String>, static_extensions: &str, dynamic_prefixes: Vec<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self { never_cache, static_extensions: Regex::new(static_extensions)?, dynamic_prefixes })
    }

    pub fn is_never_cache(&self, path: &str) -> bool {
        self.never_cache.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn is_static_asset(&self, path: &str) -> bool {
        self.static_extensions.is_match(path)
    }

    pub fn is_dynamic_asset(&self, path: &str) -> bool {
        self.dynamic_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}

impl Default for CacheRules {
    fn default() -> Self {
        Self {
            never_cache: NEVER_CACHE.iter().map(|s| s.to_string()).collect(),
            static_extensions: Regex::new(STATIC_EXTENSIONS).expect("built-in extension pattern compiles"),
            dynamic_prefixes: DYNAMIC_PREFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Classify a request. First match wins, in this order: never-cache prefix,
/// static extension, dynamic prefix, navigation, other.
pub fn classify(request: &InterceptedRequest, rules: &CacheRules) -> Classification {
    let path = request.url.path();

    if rules.is_never_cache(path) {
        Classification::NeverCache
    } else if rules.is_static_asset(path) {
        Classification::StaticAsset
    } else if rules.is_dynamic_asset(path) {
        Classification::DynamicAsset
    } else if is_navigation(request) {
        Classification::Navigation
    } else {
        Classification::Other
    }
}

fn is_navigation(request: &InterceptedRequest) -> bool {
    request.mode == RequestMode::Navigate || (request.is_get() && request.accepts_html())
}
