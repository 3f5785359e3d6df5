//! Translation invoker: availability, supported languages and per-field
//! translation with hooks, language normalization and glossaries.

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::Result;
use crate::glossary::GlossaryResolver;
use crate::hooks::{FieldContext, FieldFlow, Hooks};
use crate::i18n::{
    target_provider_code, LanguageCache, LanguageCode, RegionDefaults, SupportedLanguages,
    TranslationMetrics,
};
use crate::provider::{Formality, TextOptions, TranslationProvider};
use crate::schema::FieldConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

/// Process-lifetime availability flag.
///
/// The usage probe runs at most once. A failed language fetch disables the
/// translator for the rest of the process.
#[derive(Debug, Default)]
pub struct Availability {
    probed: OnceCell<bool>,
    disabled: AtomicBool,
}

impl Availability {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff the usage probe succeeded, the quota is not used up and the
    /// translator has not been disabled
    pub async fn check(&self, provider: &dyn TranslationProvider) -> bool {
        if self.is_disabled() {
            return false;
        }

        let probed = *self
            .probed
            .get_or_init(|| async {
                match provider.usage().await {
                    Ok(usage) if usage.is_exhausted() => {
                        warn!(
                            "{} quota exhausted ({}/{} characters)",
                            provider.provider_name(),
                            usage.character_count,
                            usage.character_limit
                        );
                        false
                    }
                    Ok(usage) => {
                        info!(
                            "{} available ({}/{} characters used)",
                            provider.provider_name(),
                            usage.character_count,
                            usage.character_limit
                        );
                        true
                    }
                    Err(e) => {
                        error!("{} usage probe failed: {}", provider.provider_name(), e);
                        false
                    }
                }
            })
            .await;

        probed && !self.is_disabled()
    }

    pub fn disable(&self) {
        self.disabled.store(true, Ordering::SeqCst);
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }
}

pub struct TranslationService {
    provider: Arc<dyn TranslationProvider>,
    languages: LanguageCache,
    availability: Arc<Availability>,
    glossaries: GlossaryResolver,
    region_defaults: RegionDefaults,
    formality: Option<Formality>,
    metrics: Arc<TranslationMetrics>,
    hooks: Arc<Hooks>,
}

impl TranslationService {
    pub fn new(
        provider: Arc<dyn TranslationProvider>,
        config: &Config,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            provider,
            languages: LanguageCache::new(
                cache,
                config.language_cache_ttl,
                config.language_fetch_pause,
            ),
            availability: Arc::new(Availability::new()),
            glossaries: GlossaryResolver::new(config.glossaries.clone()),
            region_defaults: config.region_defaults.clone(),
            formality: config.formality,
            metrics: Arc::new(TranslationMetrics::new()),
            hooks: Arc::new(Hooks::new()),
        }
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Share one availability flag between services
    pub fn with_availability(mut self, availability: Arc<Availability>) -> Self {
        self.availability = availability;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<TranslationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    pub async fn is_available(&self) -> bool {
        self.availability.check(self.provider.as_ref()).await
    }

    /// Supported languages from the 24-hour cache.
    ///
    /// A failed fetch disables the translator and yields empty sets.
    pub async fn cached_languages(&self) -> SupportedLanguages {
        match self.languages.load(self.provider.as_ref()).await {
            Ok(languages) => languages,
            Err(e) => {
                error!(
                    "Failed to load supported languages from {}, disabling translation: {}",
                    self.provider.provider_name(),
                    e
                );
                self.availability.disable();
                SupportedLanguages::default()
            }
        }
    }

    pub async fn can_translate(&self, source: &LanguageCode, target: &LanguageCode) -> bool {
        if source.to_string().eq_ignore_ascii_case(&target.to_string()) {
            return false;
        }

        let languages = self.cached_languages().await;
        if !languages.supports_source(source.base()) {
            debug!("Source language {} is not supported", source);
            return false;
        }
        if !languages.supports_target(target.base()) {
            debug!("Target language {} is not supported", target);
            return false;
        }
        true
    }

    /// Translate one text. Empty text is returned as is without a provider
    /// call; provider errors are returned unchanged.
    pub async fn translate_text(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let languages = self.cached_languages().await;
        let target_code = target_provider_code(target, &languages.target, &self.region_defaults);
        let source_code = source.source_code();

        let options = TextOptions {
            glossary_id: self
                .glossaries
                .resolve(self.provider.as_ref(), source.base(), target.base())
                .await,
            formality: self
                .formality
                .filter(|_| languages.target_supports_formality(&target_code)),
        };

        debug!(
            "Translating {} characters {} -> {}",
            text.len(),
            source_code,
            target_code
        );

        self.metrics.record_api_call();
        match self
            .provider
            .translate_text(text, &source_code, &target_code, &options)
            .await
        {
            Ok(translated) => Ok(translated),
            Err(e) => {
                self.metrics.record_api_failure();
                Err(e)
            }
        }
    }

    /// Translate a field value through the hook pipeline:
    /// non-breaking space normalization for rich text, pre-process hooks,
    /// before-field hooks, the provider call, after-field hooks.
    pub async fn translate_field_internal(
        &self,
        table: &str,
        field: &str,
        value: &str,
        config: &FieldConfig,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String> {
        let ctx = FieldContext {
            table,
            field,
            source,
            target,
        };

        let value = if config.is_rich_text() {
            value.replace("&nbsp;", " ").replace("&#160;", " ")
        } else {
            value.to_string()
        };
        let value = self.hooks.run_preprocess(&ctx, value);

        let value = match self.hooks.run_before_field(&ctx, value) {
            FieldFlow::Continue(value) => value,
            FieldFlow::Done(value) => {
                debug!("Hook finished {}.{} without translation", table, field);
                return Ok(value);
            }
        };

        let translated = self.translate_text(&value, source, target).await?;
        Ok(self.hooks.run_after_field(&ctx, translated))
    }
}

impl std::fmt::Debug for TranslationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationService")
            .field("provider", &self.provider.provider_name())
            .field("availability", &self.availability)
            .field("formality", &self.formality)
            .field("hooks", &self.hooks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::glossary::GlossaryMap;
    use crate::provider::GlossaryInfo;
    use crate::schema::FieldType;
    use crate::test_support::{FakeProvider, ReadOnlyCache};
    use std::time::Duration;

    fn test_config() -> Config {
        let mut config = Config::new("test-key");
        config.language_fetch_pause = Duration::ZERO;
        config
    }

    fn service(provider: Arc<FakeProvider>) -> TranslationService {
        TranslationService::new(provider, &test_config(), Arc::new(MemoryCache::new()))
    }

    fn code(raw: &str) -> LanguageCode {
        LanguageCode::parse(raw).expect("valid language")
    }

    // ==================== Availability Tests ====================

    #[tokio::test]
    async fn test_availability_probes_once() {
        let provider = Arc::new(FakeProvider::new());
        let service = service(provider.clone());

        assert!(service.is_available().await);
        assert!(service.is_available().await);
        assert_eq!(provider.usage_calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_quota_is_unavailable() {
        let provider = Arc::new(FakeProvider::new().with_usage(1000, 1000));
        assert!(!service(provider).is_available().await);
    }

    #[tokio::test]
    async fn test_failed_probe_is_unavailable() {
        let provider = Arc::new(FakeProvider::new().failing_usage());
        assert!(!service(provider).is_available().await);
    }

    #[tokio::test]
    async fn test_language_fetch_failure_disables_translator() {
        let provider = Arc::new(FakeProvider::new().failing_languages());
        let service = service(provider);

        assert!(service.cached_languages().await.is_empty());
        assert!(!service.is_available().await);
    }

    #[tokio::test]
    async fn test_unwritable_cache_keeps_translator_enabled() {
        let provider = Arc::new(FakeProvider::new());
        let service = TranslationService::new(provider, &test_config(), Arc::new(ReadOnlyCache));

        assert!(service.can_translate(&code("en"), &code("de")).await);
        assert!(service.is_available().await);
    }

    // ==================== can_translate Tests ====================

    #[tokio::test]
    async fn test_can_translate() {
        let service = service(Arc::new(FakeProvider::new()));

        assert!(!service.can_translate(&code("en"), &code("en")).await);
        assert!(!service.can_translate(&code("en-US"), &code("EN_us")).await);
        assert!(!service.can_translate(&code("en"), &code("xx")).await);
        assert!(!service.can_translate(&code("ja"), &code("de")).await);
        assert!(service.can_translate(&code("en-US"), &code("de-DE")).await);
        assert!(service.can_translate(&code("en-US"), &code("en-GB")).await);
    }

    // ==================== translate_text Tests ====================

    #[tokio::test]
    async fn test_empty_text_skips_provider() {
        let provider = Arc::new(FakeProvider::new());
        let service = service(provider.clone());

        let result = service
            .translate_text("", &code("en"), &code("de"))
            .await
            .expect("translate");

        assert_eq!(result, "");
        assert!(provider.translate_calls().is_empty());
        assert_eq!(provider.language_calls(), 0);
    }

    #[tokio::test]
    async fn test_deprecated_target_uses_region_variant() {
        let provider = Arc::new(FakeProvider::new());
        let service = service(provider.clone());

        service
            .translate_text("Hallo", &code("de"), &code("en_US"))
            .await
            .expect("translate");
        service
            .translate_text("Hallo", &code("de"), &code("en"))
            .await
            .expect("translate");
        service
            .translate_text("Hallo", &code("de"), &code("pt-BR"))
            .await
            .expect("translate");

        let targets: Vec<String> = provider
            .translate_calls()
            .into_iter()
            .map(|call| call.target_lang)
            .collect();
        assert_eq!(targets, vec!["EN-US", "EN-GB", "PT-BR"]);
    }

    #[tokio::test]
    async fn test_source_sent_as_base_code() {
        let provider = Arc::new(FakeProvider::new());
        let service = service(provider.clone());

        let result = service
            .translate_text("Hello", &code("en-US"), &code("de-DE"))
            .await
            .expect("translate");

        assert_eq!(result, "[DE] Hello");
        let calls = provider.translate_calls();
        assert_eq!(calls[0].source_lang, "EN");
        assert_eq!(calls[0].target_lang, "DE");
        assert_eq!(service.metrics().api_calls(), 1);
    }

    #[tokio::test]
    async fn test_formality_only_for_supporting_targets() {
        let provider = Arc::new(FakeProvider::new());
        let mut config = test_config();
        config.formality = Some(Formality::More);
        let service = TranslationService::new(provider.clone(), &config, Arc::new(MemoryCache::new()));

        service
            .translate_text("Hello", &code("en"), &code("de"))
            .await
            .expect("translate");
        service
            .translate_text("Hallo", &code("de"), &code("en-GB"))
            .await
            .expect("translate");

        let calls = provider.translate_calls();
        assert_eq!(calls[0].options.formality, Some(Formality::More));
        assert_eq!(calls[1].options.formality, None);
    }

    #[tokio::test]
    async fn test_glossary_attached_when_valid() {
        let provider = Arc::new(FakeProvider::new().with_glossaries(vec![GlossaryInfo {
            glossary_id: "g1".into(),
            name: "terms".into(),
            ready: true,
            source_lang: "en".into(),
            target_lang: "de".into(),
            entry_count: 2,
        }]));
        let mut config = test_config();
        config.glossaries = GlossaryMap::parse("en-de=g1,en-fr=missing");
        let service = TranslationService::new(provider.clone(), &config, Arc::new(MemoryCache::new()));

        service
            .translate_text("Hello", &code("en-US"), &code("de-DE"))
            .await
            .expect("translate");
        service
            .translate_text("Hello", &code("en"), &code("fr"))
            .await
            .expect("translate");

        let calls = provider.translate_calls();
        assert_eq!(calls[0].options.glossary_id.as_deref(), Some("g1"));
        assert_eq!(calls[1].options.glossary_id, None);
        assert_eq!(provider.glossary_list_calls(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = Arc::new(FakeProvider::new().failing_translate());
        let service = service(provider);

        let result = service
            .translate_text("Hello", &code("en"), &code("de"))
            .await;

        assert!(matches!(result, Err(crate::error::Error::QuotaExceeded(_))));
        assert_eq!(service.metrics().api_failures(), 1);
    }

    // ==================== translate_field_internal Tests ====================

    #[tokio::test]
    async fn test_rich_text_nbsp_normalized() {
        let provider = Arc::new(FakeProvider::new());
        let service = service(provider.clone());
        let mut config = FieldConfig::new(FieldType::Text);
        config.enable_richtext = true;

        service
            .translate_field_internal(
                "tt_content",
                "bodytext",
                "<p>Hello&nbsp;world&#160;!</p>",
                &config,
                &code("en"),
                &code("de"),
            )
            .await
            .expect("translate");

        assert_eq!(provider.translate_calls()[0].text, "<p>Hello world !</p>");
    }

    #[tokio::test]
    async fn test_plain_input_keeps_nbsp() {
        let provider = Arc::new(FakeProvider::new());
        let service = service(provider.clone());

        service
            .translate_field_internal(
                "tt_content",
                "header",
                "A&nbsp;B",
                &FieldConfig::new(FieldType::Input),
                &code("en"),
                &code("de"),
            )
            .await
            .expect("translate");

        assert_eq!(provider.translate_calls()[0].text, "A&nbsp;B");
    }

    #[tokio::test]
    async fn test_hook_pipeline_order() {
        let provider = Arc::new(FakeProvider::new());
        let hooks = Hooks::new()
            .on_preprocess(|_, value| value.trim().to_string())
            .on_before_field(|_, value| FieldFlow::Continue(format!("{}?", value)))
            .on_after_field(|ctx, value| format!("{} ({})", value, ctx.field));
        let service = service(provider.clone()).with_hooks(hooks);

        let result = service
            .translate_field_internal(
                "tt_content",
                "header",
                "  Hello ",
                &FieldConfig::new(FieldType::Input),
                &code("en"),
                &code("de"),
            )
            .await
            .expect("translate");

        assert_eq!(provider.translate_calls()[0].text, "Hello?");
        assert_eq!(result, "[DE] Hello? (header)");
    }

    #[tokio::test]
    async fn test_before_field_done_skips_provider_and_after_hooks() {
        let provider = Arc::new(FakeProvider::new());
        let hooks = Hooks::new()
            .on_before_field(|_, value| FieldFlow::Done(value))
            .on_after_field(|_, _| "unreachable".to_string());
        let service = service(provider.clone()).with_hooks(hooks);

        let result = service
            .translate_field_internal(
                "tt_content",
                "header",
                "Keep me",
                &FieldConfig::new(FieldType::Input),
                &code("en"),
                &code("de"),
            )
            .await
            .expect("translate");

        assert_eq!(result, "Keep me");
        assert!(provider.translate_calls().is_empty());
    }
}
