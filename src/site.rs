use crate::error::{Error, Result};
use crate::i18n::LanguageCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A language configured on a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteLanguage {
    pub language_id: i64,
    #[serde(default)]
    pub title: String,
    pub locale: LanguageCode,
}

/// Looks up the site language a page renders in.
pub trait SiteResolver: Send + Sync {
    /// `None` when the page belongs to no site or the site lacks the language
    fn site_language(&self, page_id: u64, language_id: i64) -> Option<SiteLanguage>;
}

/// Site configuration registered up front: page → site, site → languages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticSites {
    #[serde(default)]
    pub pages: BTreeMap<u64, String>,
    #[serde(default)]
    pub sites: BTreeMap<String, Vec<SiteLanguage>>,
}

impl StaticSites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&raw).map_err(|e| {
            Error::Schema(format!(
                "invalid site file {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    pub fn with_site(mut self, identifier: impl Into<String>, languages: Vec<SiteLanguage>) -> Self {
        self.sites.insert(identifier.into(), languages);
        self
    }

    pub fn with_page(mut self, page_id: u64, site: impl Into<String>) -> Self {
        self.pages.insert(page_id, site.into());
        self
    }
}

impl SiteResolver for StaticSites {
    fn site_language(&self, page_id: u64, language_id: i64) -> Option<SiteLanguage> {
        let site = self.pages.get(&page_id)?;
        self.sites
            .get(site)?
            .iter()
            .find(|language| language.language_id == language_id)
            .cloned()
    }
}
