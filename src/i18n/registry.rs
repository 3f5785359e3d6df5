//! Provider-supported languages and their 24-hour cache.

use crate::cache::CacheStore;
use crate::error::{Error, Result};
use crate::provider::{LanguageKind, ProviderLanguage, TranslationProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cache key of the language list entry
pub const LANGUAGE_CACHE_KEY: &str = "deepl_supported_languages";

/// Source and target languages the provider accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedLanguages {
    pub source: Vec<ProviderLanguage>,
    pub target: Vec<ProviderLanguage>,
}

fn base_of(code: &str) -> &str {
    code.split(['-', '_']).next().unwrap_or(code)
}

impl SupportedLanguages {
    pub fn is_empty(&self) -> bool {
        self.source.is_empty() && self.target.is_empty()
    }

    /// Case-insensitive base-code match; regions are ignored
    pub fn supports_source(&self, base: &str) -> bool {
        self.source
            .iter()
            .any(|lang| base_of(&lang.language).eq_ignore_ascii_case(base))
    }

    pub fn supports_target(&self, base: &str) -> bool {
        self.target
            .iter()
            .any(|lang| base_of(&lang.language).eq_ignore_ascii_case(base))
    }

    /// Formality support of an exact provider target code
    pub fn target_supports_formality(&self, provider_code: &str) -> bool {
        self.target
            .iter()
            .find(|lang| lang.language.eq_ignore_ascii_case(provider_code))
            .map(|lang| lang.supports_formality)
            .unwrap_or(false)
    }
}

/// Reads the supported language lists through a `CacheStore`.
pub struct LanguageCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    fetch_pause: Duration,
}

impl LanguageCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration, fetch_pause: Duration) -> Self {
        Self {
            store,
            ttl,
            fetch_pause,
        }
    }

    /// Cached lists, or a fresh fetch on miss.
    ///
    /// The two list calls are spaced by `fetch_pause` to stay clear of the
    /// provider's rate limit.
    pub async fn load(&self, provider: &dyn TranslationProvider) -> Result<SupportedLanguages> {
        match self.store.get(LANGUAGE_CACHE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<SupportedLanguages>(&raw) {
                Ok(languages) => return Ok(languages),
                Err(e) => debug!("Ignoring unreadable language cache entry: {}", e),
            },
            Ok(None) => {}
            Err(e) => debug!("Language cache read failed: {}", e),
        }

        let source = provider.languages(LanguageKind::Source).await?;
        if !self.fetch_pause.is_zero() {
            tokio::time::sleep(self.fetch_pause).await;
        }
        let target = provider.languages(LanguageKind::Target).await?;

        let languages = SupportedLanguages { source, target };
        info!(
            "Fetched {} source and {} target languages from {}",
            languages.source.len(),
            languages.target.len(),
            provider.provider_name()
        );

        let stored = serde_json::to_string(&languages)
            .map_err(Error::from)
            .and_then(|raw| self.store.set(LANGUAGE_CACHE_KEY, &raw, self.ttl));
        if let Err(e) = stored {
            warn!("Language cache write failed, keeping fetched languages: {}", e);
        }

        Ok(languages)
    }
}
