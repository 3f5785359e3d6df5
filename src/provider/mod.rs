//! Translation provider abstraction.
//!
//! The engine only talks to the provider through `TranslationProvider`, so the
//! record walker never sees HTTP details. `DeeplClient` is the production
//! implementation.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod deepl;

pub use deepl::DeeplClient;

/// Account usage as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub character_count: u64,
    pub character_limit: u64,
}

impl Usage {
    /// A zero limit means the account has no character limit
    pub fn is_exhausted(&self) -> bool {
        self.character_limit > 0 && self.character_count >= self.character_limit
    }
}

/// Which side of a language pair a language list describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageKind {
    Source,
    Target,
}

impl LanguageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageKind::Source => "source",
            LanguageKind::Target => "target",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderLanguage {
    /// Provider code, e.g. "DE", "EN-GB"
    pub language: String,
    pub name: String,
    #[serde(default)]
    pub supports_formality: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryInfo {
    pub glossary_id: String,
    pub name: String,
    #[serde(default)]
    pub ready: bool,
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default)]
    pub entry_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formality {
    Default,
    More,
    Less,
    PreferMore,
    PreferLess,
}

impl Formality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Formality::Default => "default",
            Formality::More => "more",
            Formality::Less => "less",
            Formality::PreferMore => "prefer_more",
            Formality::PreferLess => "prefer_less",
        }
    }
}

impl FromStr for Formality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(Formality::Default),
            "more" => Ok(Formality::More),
            "less" => Ok(Formality::Less),
            "prefer_more" => Ok(Formality::PreferMore),
            "prefer_less" => Ok(Formality::PreferLess),
            other => Err(Error::Decode(format!("unknown formality '{}'", other))),
        }
    }
}

impl fmt::Display for Formality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call options for a text translation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextOptions {
    pub glossary_id: Option<String>,
    pub formality: Option<Formality>,
}

/// Operations the engine needs from a machine-translation service.
///
/// Text translation is always requested with HTML tag handling and
/// formatting preservation enabled.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Usage/quota probe
    async fn usage(&self) -> Result<Usage>;

    async fn languages(&self, kind: LanguageKind) -> Result<Vec<ProviderLanguage>>;

    /// Translate one text from `source_lang` into `target_lang` (provider codes)
    async fn translate_text(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        options: &TextOptions,
    ) -> Result<String>;

    async fn list_glossaries(&self) -> Result<Vec<GlossaryInfo>>;

    async fn create_glossary(
        &self,
        name: &str,
        source_lang: &str,
        target_lang: &str,
        entries: &[(String, String)],
    ) -> Result<GlossaryInfo>;

    async fn glossary_entries(&self, glossary_id: &str) -> Result<Vec<(String, String)>>;

    async fn delete_glossary(&self, glossary_id: &str) -> Result<()>;

    /// Used for logging
    fn provider_name(&self) -> &str;
}
