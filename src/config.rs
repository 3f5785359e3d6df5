use crate::glossary::GlossaryMap;
use crate::i18n::RegionDefaults;
use crate::provider::Formality;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

const DEEPL_FREE_API_URL: &str = "https://api-free.deepl.com";
const DEEPL_PRO_API_URL: &str = "https://api.deepl.com";

#[derive(Debug, Clone)]
pub struct Config {
    // DeepL
    pub deepl_api_key: String,
    pub deepl_api_url: String,
    pub request_timeout: Duration,

    // Language handling
    pub region_defaults: RegionDefaults,
    pub formality: Option<Formality>,
    pub glossaries: GlossaryMap,

    // Language list cache
    pub language_cache_ttl: Duration,
    pub language_fetch_pause: Duration,
    pub cache_dir: PathBuf,
}

impl Config {
    /// Configuration with defaults for everything but the API key
    pub fn new(api_key: impl Into<String>) -> Self {
        let deepl_api_key = api_key.into();
        Self {
            deepl_api_url: default_api_url(&deepl_api_key).to_string(),
            deepl_api_key,
            request_timeout: Duration::from_secs(30),
            region_defaults: RegionDefaults::default(),
            formality: None,
            glossaries: GlossaryMap::default(),
            language_cache_ttl: Duration::from_secs(24 * 60 * 60),
            language_fetch_pause: Duration::from_secs(1),
            cache_dir: std::env::temp_dir().join("record-translate"),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("DEEPL_API_KEY").context("DEEPL_API_KEY not set")?;
        let mut config = Self::new(api_key);

        if let Ok(url) = std::env::var("DEEPL_API_URL") {
            config.deepl_api_url = url.trim_end_matches('/').to_string();
        }

        config.request_timeout = Duration::from_secs(env_number("DEEPL_TIMEOUT_SECS", 30));

        // Fallback variants for the deprecated bare "EN" and "PT" targets
        if let Ok(variant) = std::env::var("DEEPL_DEFAULT_EN_VARIANT") {
            config.region_defaults.english = variant.to_uppercase();
        }
        if let Ok(variant) = std::env::var("DEEPL_DEFAULT_PT_VARIANT") {
            config.region_defaults.portuguese = variant.to_uppercase();
        }

        config.formality = std::env::var("DEEPL_FORMALITY")
            .ok()
            .and_then(|value| match value.parse() {
                Ok(formality) => Some(formality),
                Err(e) => {
                    warn!("Ignoring DEEPL_FORMALITY: {}", e);
                    None
                }
            });

        if let Ok(raw) = std::env::var("DEEPL_GLOSSARIES") {
            config.glossaries = GlossaryMap::parse(&raw);
        }

        config.language_cache_ttl = Duration::from_secs(env_number(
            "DEEPL_LANGUAGE_CACHE_TTL_SECS",
            24 * 60 * 60,
        ));
        config.language_fetch_pause =
            Duration::from_millis(env_number("DEEPL_LANGUAGE_FETCH_PAUSE_MS", 1000));

        if let Ok(dir) = std::env::var("DEEPL_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }

        Ok(config)
    }
}

/// Free-tier keys carry a ":fx" suffix and live on a separate host
fn default_api_url(api_key: &str) -> &'static str {
    if api_key.ends_with(":fx") {
        DEEPL_FREE_API_URL
    } else {
        DEEPL_PRO_API_URL
    }
}

fn env_number(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "DEEPL_API_KEY",
        "DEEPL_API_URL",
        "DEEPL_TIMEOUT_SECS",
        "DEEPL_DEFAULT_EN_VARIANT",
        "DEEPL_DEFAULT_PT_VARIANT",
        "DEEPL_FORMALITY",
        "DEEPL_GLOSSARIES",
        "DEEPL_LANGUAGE_CACHE_TTL_SECS",
        "DEEPL_LANGUAGE_FETCH_PAUSE_MS",
        "DEEPL_CACHE_DIR",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_free_key_uses_free_host() {
        let config = Config::new("abc:fx");
        assert_eq!(config.deepl_api_url, "https://api-free.deepl.com");
    }

    #[test]
    fn test_pro_key_uses_pro_host() {
        let config = Config::new("abc");
        assert_eq!(config.deepl_api_url, "https://api.deepl.com");
    }

    #[test]
    fn test_new_defaults() {
        let config = Config::new("key");
        assert_eq!(config.language_cache_ttl, Duration::from_secs(86400));
        assert_eq!(config.language_fetch_pause, Duration::from_secs(1));
        assert_eq!(config.region_defaults.english, "EN-GB");
        assert_eq!(config.region_defaults.portuguese, "PT-PT");
        assert!(config.formality.is_none());
        assert!(config.glossaries.is_empty());
    }

    #[test]
    #[serial]
    fn test_from_env_requires_api_key() {
        clear_env();
        let result = Config::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("DEEPL_API_KEY"));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_overrides() {
        clear_env();
        std::env::set_var("DEEPL_API_KEY", "secret:fx");
        std::env::set_var("DEEPL_API_URL", "http://localhost:9999/");
        std::env::set_var("DEEPL_DEFAULT_EN_VARIANT", "en-us");
        std::env::set_var("DEEPL_FORMALITY", "prefer_less");
        std::env::set_var("DEEPL_GLOSSARIES", "en-de=g-1, de-en=g-2");
        std::env::set_var("DEEPL_LANGUAGE_FETCH_PAUSE_MS", "0");

        let config = Config::from_env().expect("config should load");
        clear_env();

        assert_eq!(config.deepl_api_key, "secret:fx");
        assert_eq!(config.deepl_api_url, "http://localhost:9999");
        assert_eq!(config.region_defaults.english, "EN-US");
        assert_eq!(config.region_defaults.portuguese, "PT-PT");
        assert_eq!(config.formality, Some(Formality::PreferLess));
        assert_eq!(config.glossaries.get("en", "de"), Some("g-1"));
        assert_eq!(config.glossaries.get("de", "en"), Some("g-2"));
        assert_eq!(config.language_fetch_pause, Duration::ZERO);
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_invalid_numbers_and_formality() {
        clear_env();
        std::env::set_var("DEEPL_API_KEY", "secret");
        std::env::set_var("DEEPL_TIMEOUT_SECS", "soon");
        std::env::set_var("DEEPL_FORMALITY", "very-polite");

        let config = Config::from_env().expect("config should load");
        clear_env();

        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.formality.is_none());
    }
}
