//! Glossary selection for a language pair.

use crate::provider::{GlossaryInfo, TranslationProvider};
use std::collections::BTreeMap;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Configured glossary ids keyed by (source base, target base)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlossaryMap {
    entries: BTreeMap<(String, String), String>,
}

impl GlossaryMap {
    /// Parse `src-tgt=id` pairs separated by commas, e.g. `en-de=abc,de-en=def`.
    /// Malformed pairs are skipped.
    pub fn parse(raw: &str) -> Self {
        let mut map = Self::default();
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let parsed = pair.split_once('=').and_then(|(languages, id)| {
                let (source, target) = languages.trim().split_once('-')?;
                if source.trim().is_empty() || target.trim().is_empty() {
                    return None;
                }
                Some((source, target, id.trim()))
            });
            match parsed {
                Some((source, target, id)) if !id.is_empty() => map.insert(source, target, id),
                _ => warn!("Ignoring malformed glossary mapping '{}'", pair),
            }
        }
        map
    }

    pub fn insert(&mut self, source: &str, target: &str, glossary_id: &str) {
        self.entries.insert(
            (source.trim().to_lowercase(), target.trim().to_lowercase()),
            glossary_id.to_string(),
        );
    }

    pub fn get(&self, source: &str, target: &str) -> Option<&str> {
        self.entries
            .get(&(source.to_lowercase(), target.to_lowercase()))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves the glossary to attach to a translation.
///
/// The live glossary list is fetched at most once per resolver, so one
/// resolver is one lookup context.
#[derive(Debug, Default)]
pub struct GlossaryResolver {
    map: GlossaryMap,
    live: OnceCell<Vec<GlossaryInfo>>,
}

impl GlossaryResolver {
    pub fn new(map: GlossaryMap) -> Self {
        Self {
            map,
            live: OnceCell::new(),
        }
    }

    /// Configured glossary id for the base pair, if it exists on the provider
    /// and is ready. Unknown ids are logged and omitted.
    pub async fn resolve(
        &self,
        provider: &dyn TranslationProvider,
        source_base: &str,
        target_base: &str,
    ) -> Option<String> {
        let glossary_id = self.map.get(source_base, target_base)?;

        let live = self
            .live
            .get_or_init(|| async {
                match provider.list_glossaries().await {
                    Ok(glossaries) => glossaries,
                    Err(e) => {
                        warn!("Could not fetch glossary list: {}", e);
                        Vec::new()
                    }
                }
            })
            .await;

        let valid = live.iter().any(|glossary| {
            glossary.glossary_id == glossary_id
                && glossary.ready
                && glossary.source_lang.eq_ignore_ascii_case(source_base)
                && glossary.target_lang.eq_ignore_ascii_case(target_base)
        });

        if valid {
            debug!(
                "Using glossary {} for {} -> {}",
                glossary_id, source_base, target_base
            );
            Some(glossary_id.to_string())
        } else {
            warn!(
                "Configured glossary {} for {} -> {} is not available, translating without it",
                glossary_id, source_base, target_base
            );
            None
        }
    }
}
