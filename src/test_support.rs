//! In-process provider double for unit tests.
//!
//! Translations are deterministic: `"Hello"` into `DE` becomes `"[DE] Hello"`.

use crate::cache::CacheStore;
use crate::error::{Error, Result};
use crate::provider::{
    GlossaryInfo, LanguageKind, ProviderLanguage, TextOptions, TranslationProvider, Usage,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One recorded `translate_text` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateCall {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub options: TextOptions,
}

#[derive(Debug)]
pub struct FakeProvider {
    usage: Option<Usage>,
    fail_languages: bool,
    fail_translate: bool,
    glossaries: Vec<GlossaryInfo>,
    usage_calls: AtomicUsize,
    language_calls: AtomicUsize,
    glossary_list_calls: AtomicUsize,
    translate_calls: Mutex<Vec<TranslateCall>>,
}

fn language(code: &str, supports_formality: bool) -> ProviderLanguage {
    ProviderLanguage {
        language: code.to_string(),
        name: code.to_string(),
        supports_formality,
    }
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            usage: Some(Usage {
                character_count: 10,
                character_limit: 1000,
            }),
            fail_languages: false,
            fail_translate: false,
            glossaries: Vec::new(),
            usage_calls: AtomicUsize::new(0),
            language_calls: AtomicUsize::new(0),
            glossary_list_calls: AtomicUsize::new(0),
            translate_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_usage(mut self, character_count: u64, character_limit: u64) -> Self {
        self.usage = Some(Usage {
            character_count,
            character_limit,
        });
        self
    }

    pub fn failing_usage(mut self) -> Self {
        self.usage = None;
        self
    }

    pub fn failing_languages(mut self) -> Self {
        self.fail_languages = true;
        self
    }

    pub fn failing_translate(mut self) -> Self {
        self.fail_translate = true;
        self
    }

    pub fn with_glossaries(mut self, glossaries: Vec<GlossaryInfo>) -> Self {
        self.glossaries = glossaries;
        self
    }

    pub fn usage_calls(&self) -> usize {
        self.usage_calls.load(Ordering::SeqCst)
    }

    pub fn language_calls(&self) -> usize {
        self.language_calls.load(Ordering::SeqCst)
    }

    pub fn glossary_list_calls(&self) -> usize {
        self.glossary_list_calls.load(Ordering::SeqCst)
    }

    pub fn translate_calls(&self) -> Vec<TranslateCall> {
        self.translate_calls
            .lock()
            .expect("translate call log poisoned")
            .clone()
    }
}

#[async_trait]
impl TranslationProvider for FakeProvider {
    async fn usage(&self) -> Result<Usage> {
        self.usage_calls.fetch_add(1, Ordering::SeqCst);
        self.usage.ok_or_else(|| Error::Api {
            status: 403,
            body: "Forbidden".to_string(),
        })
    }

    async fn languages(&self, kind: LanguageKind) -> Result<Vec<ProviderLanguage>> {
        self.language_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_languages {
            return Err(Error::Api {
                status: 503,
                body: "Service Unavailable".to_string(),
            });
        }
        Ok(match kind {
            LanguageKind::Source => vec![
                language("EN", false),
                language("DE", false),
                language("FR", false),
            ],
            LanguageKind::Target => vec![
                language("DE", true),
                language("EN-GB", false),
                language("EN-US", false),
                language("FR", true),
                language("PT-PT", true),
                language("PT-BR", true),
            ],
        })
    }

    async fn translate_text(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        options: &TextOptions,
    ) -> Result<String> {
        self.translate_calls
            .lock()
            .expect("translate call log poisoned")
            .push(TranslateCall {
                text: text.to_string(),
                source_lang: source_lang.to_string(),
                target_lang: target_lang.to_string(),
                options: options.clone(),
            });
        if self.fail_translate {
            return Err(Error::QuotaExceeded("Quota exceeded".to_string()));
        }
        Ok(format!("[{}] {}", target_lang, text))
    }

    async fn list_glossaries(&self) -> Result<Vec<GlossaryInfo>> {
        self.glossary_list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.glossaries.clone())
    }

    async fn create_glossary(
        &self,
        name: &str,
        source_lang: &str,
        target_lang: &str,
        entries: &[(String, String)],
    ) -> Result<GlossaryInfo> {
        Ok(GlossaryInfo {
            glossary_id: format!("fake-{}", name),
            name: name.to_string(),
            ready: true,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            entry_count: entries.len() as u64,
        })
    }

    async fn glossary_entries(&self, _glossary_id: &str) -> Result<Vec<(String, String)>> {
        Ok(Vec::new())
    }

    async fn delete_glossary(&self, _glossary_id: &str) -> Result<()> {
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "fake"
    }
}

/// Cache store that never holds anything and rejects every write
#[derive(Debug, Default)]
pub struct ReadOnlyCache;

impl CacheStore for ReadOnlyCache {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only cache",
        )))
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}
