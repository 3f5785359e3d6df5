use super::{
    GlossaryInfo, LanguageKind, ProviderLanguage, TextOptions, TranslationProvider, Usage,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::retry::{send_with_retry, RetryConfig};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// DeepL v2 REST client
#[derive(Clone)]
pub struct DeeplClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    retry: RetryConfig,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: Vec<&'a str>,
    source_lang: &'a str,
    target_lang: &'a str,
    tag_handling: &'static str,
    preserve_formatting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    glossary_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    formality: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GlossaryList {
    glossaries: Vec<GlossaryInfo>,
}

#[derive(Debug, Serialize)]
struct CreateGlossaryRequest<'a> {
    name: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
    entries: String,
    entries_format: &'static str,
}

impl DeeplClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryConfig::provider_call(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.deepl_api_key.clone(),
            config.deepl_api_url.clone(),
            config.request_timeout,
        )
    }

    /// Replace the transport retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
    }

    /// Send a request (with the transport retry) and return the raw body
    async fn execute<F>(&self, operation: &str, build: F) -> Result<String>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        send_with_retry(&self.retry, operation, || {
            let request = self.authorized(build());
            async move {
                let response = request.send().await?;
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|e| format!("<failed to read body: {}>", e));

                if status.as_u16() == 456 {
                    return Err(Error::QuotaExceeded(body));
                }
                if !status.is_success() {
                    return Err(Error::Api {
                        status: status.as_u16(),
                        body,
                    });
                }
                Ok(body)
            }
        })
        .await
    }

    async fn execute_json<T, F>(&self, operation: &str, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let body = self.execute(operation, build).await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Decode(format!("{} returned invalid JSON: {}", operation, e)))
    }
}

impl std::fmt::Debug for DeeplClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeeplClient")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl TranslationProvider for DeeplClient {
    async fn usage(&self) -> Result<Usage> {
        self.execute_json("DeepL usage", || self.client.get(self.url("/v2/usage")))
            .await
    }

    async fn languages(&self, kind: LanguageKind) -> Result<Vec<ProviderLanguage>> {
        self.execute_json(&format!("DeepL {} languages", kind.as_str()), || {
            self.client
                .get(self.url("/v2/languages"))
                .query(&[("type", kind.as_str())])
        })
        .await
    }

    async fn translate_text(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        options: &TextOptions,
    ) -> Result<String> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let request = TranslateRequest {
            text: vec![text],
            source_lang,
            target_lang,
            tag_handling: "html",
            preserve_formatting: true,
            glossary_id: options.glossary_id.as_deref(),
            formality: options.formality.map(|f| f.as_str()),
        };

        debug!(
            "Translating {} characters {} -> {}",
            text.chars().count(),
            source_lang,
            target_lang
        );

        let response: TranslateResponse = self
            .execute_json(&format!("DeepL translate to {}", target_lang), || {
                self.client.post(self.url("/v2/translate")).json(&request)
            })
            .await?;

        response
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| Error::Decode("translate response contained no translations".into()))
    }

    async fn list_glossaries(&self) -> Result<Vec<GlossaryInfo>> {
        let list: GlossaryList = self
            .execute_json("DeepL glossary list", || {
                self.client.get(self.url("/v2/glossaries"))
            })
            .await?;
        Ok(list.glossaries)
    }

    async fn create_glossary(
        &self,
        name: &str,
        source_lang: &str,
        target_lang: &str,
        entries: &[(String, String)],
    ) -> Result<GlossaryInfo> {
        let request = CreateGlossaryRequest {
            name,
            source_lang,
            target_lang,
            entries: entries_to_tsv(entries),
            entries_format: "tsv",
        };
        self.execute_json("DeepL glossary create", || {
            self.client.post(self.url("/v2/glossaries")).json(&request)
        })
        .await
    }

    async fn glossary_entries(&self, glossary_id: &str) -> Result<Vec<(String, String)>> {
        let body = self
            .execute("DeepL glossary entries", || {
                self.client
                    .get(self.url(&format!("/v2/glossaries/{}/entries", glossary_id)))
                    .header("Accept", "text/tab-separated-values")
            })
            .await?;
        Ok(tsv_to_entries(&body))
    }

    async fn delete_glossary(&self, glossary_id: &str) -> Result<()> {
        self.execute("DeepL glossary delete", || {
            self.client
                .delete(self.url(&format!("/v2/glossaries/{}", glossary_id)))
        })
        .await?;
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "DeepL"
    }
}

fn entries_to_tsv(entries: &[(String, String)]) -> String {
    entries
        .iter()
        .map(|(source, target)| format!("{}\t{}", source.trim(), target.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn tsv_to_entries(body: &str) -> Vec<(String, String)> {
    body.lines()
        .filter_map(|line| {
            let (source, target) = line.split_once('\t')?;
            Some((source.to_string(), target.to_string()))
        })
        .collect()
}
