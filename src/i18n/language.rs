//! Language codes: normalized two-part representation of site locales and
//! their mapping onto provider codes.

use crate::error::{Error, Result};
use crate::provider::ProviderLanguage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A normalized language code: lowercase language plus optional uppercase region.
///
/// Accepts the common locale spellings found in site configuration
/// (`de`, `de-DE`, `de_DE`, `de_DE.UTF-8`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode {
    language: String,
    region: Option<String>,
}

impl LanguageCode {
    pub fn parse(code: &str) -> Result<Self> {
        // Drop encoding (".UTF-8") and modifier ("@euro") suffixes
        let trimmed = code
            .trim()
            .split(['.', '@'])
            .next()
            .unwrap_or_default();

        let mut parts = trimmed.split(['-', '_']);
        let language = parts.next().unwrap_or_default();
        if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(Error::InvalidLanguage(code.to_string()));
        }

        let region = match parts.next() {
            Some(region)
                if (2..=4).contains(&region.len())
                    && region.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                Some(region.to_uppercase())
            }
            Some(_) => return Err(Error::InvalidLanguage(code.to_string())),
            None => None,
        };

        Ok(Self {
            language: language.to_lowercase(),
            region,
        })
    }

    /// Base language, lowercase (e.g. "en" for "en-US")
    pub fn base(&self) -> &str {
        &self.language
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Provider spelling of the full code: "EN-US", "DE"
    pub fn provider_code(&self) -> String {
        match &self.region {
            Some(region) => format!("{}-{}", self.language.to_uppercase(), region),
            None => self.language.to_uppercase(),
        }
    }

    /// Source languages are always sent as bare base codes
    pub fn source_code(&self) -> String {
        self.language.to_uppercase()
    }
}

impl FromStr for LanguageCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.to_string()
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{}-{}", self.language, region),
            None => f.write_str(&self.language),
        }
    }
}

/// Fallback variants for bare codes the provider no longer accepts as targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionDefaults {
    pub english: String,
    pub portuguese: String,
}

impl Default for RegionDefaults {
    fn default() -> Self {
        Self {
            english: "EN-GB".to_string(),
            portuguese: "PT-PT".to_string(),
        }
    }
}

/// Deprecated bare targets and the regional variants that replace them
const DEPRECATED_TARGETS: &[(&str, &[&str])] = &[("en", &["GB", "US"]), ("pt", &["PT", "BR"])];

/// Map a site locale onto the code sent as the provider's target language.
///
/// Bare "en" and "pt" are deprecated as targets: the locale's own region is
/// used when it is one of the supported variants, otherwise the configured
/// default. Other languages keep their region only when the provider lists the
/// full code (e.g. "ZH-HANS"), and are sent as base codes otherwise.
pub fn target_provider_code(
    target: &LanguageCode,
    supported_targets: &[ProviderLanguage],
    defaults: &RegionDefaults,
) -> String {
    if let Some((_, variants)) = DEPRECATED_TARGETS
        .iter()
        .find(|(base, _)| *base == target.base())
    {
        return match target.region() {
            Some(region) if variants.contains(&region) => target.provider_code(),
            _ if target.base() == "en" => defaults.english.clone(),
            _ => defaults.portuguese.clone(),
        };
    }

    let full = target.provider_code();
    if target.region().is_some()
        && supported_targets
            .iter()
            .any(|lang| lang.language.eq_ignore_ascii_case(&full))
    {
        return full;
    }
    target.source_code()
}
