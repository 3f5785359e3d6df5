use anyhow::{bail, Context, Result};
use record_translate::cache::{CacheStore, FileCache};
use record_translate::config::Config;
use record_translate::flexform::StaticFlexForms;
use record_translate::provider::DeeplClient;
use record_translate::schema::SchemaRegistry;
use record_translate::site::{SiteResolver, StaticSites};
use record_translate::{Record, RecordTranslator, TranslationService};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// One translation job as read from the job file
#[derive(Debug, Deserialize)]
struct Job {
    schema: SchemaRegistry,
    sites: StaticSites,
    #[serde(default)]
    flexforms: StaticFlexForms,
    table: String,
    record: Record,
    target_language_id: i64,
    #[serde(default)]
    except_fields: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging on stderr; stdout carries the result
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("record_translate=info".parse()?),
        )
        .init();

    let Some(job_path) = std::env::args().nth(1) else {
        bail!("usage: translate-record <job.json>");
    };

    let config = Config::from_env()?;

    let raw = std::fs::read_to_string(&job_path)
        .with_context(|| format!("Failed to read job file {}", job_path))?;
    let job: Job = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse job file {}", job_path))?;

    let page_id = if job.table == "pages" {
        job.record.uid
    } else {
        job.record.pid
    };
    let target = job
        .sites
        .site_language(page_id, job.target_language_id)
        .with_context(|| {
            format!(
                "Language {} is not configured for page {}",
                job.target_language_id, page_id
            )
        })?;

    info!(
        "Translating {}:{} into {}",
        job.table, job.record.uid, target.locale
    );

    let cache: Arc<dyn CacheStore> = Arc::new(FileCache::new(&config.cache_dir));
    let provider = Arc::new(DeeplClient::from_config(&config)?);
    let service = TranslationService::new(provider, &config, cache.clone());
    let translator = RecordTranslator::new(
        Arc::new(job.schema),
        Arc::new(job.sites),
        Arc::new(job.flexforms),
        cache,
        service,
    );

    let translated = translator
        .translate_record(&job.table, &job.record, &target, &job.except_fields)
        .await?;

    info!(
        "Done: {} field(s) changed, metrics: {}",
        translated.len(),
        serde_json::to_string(&translator.service().metrics().report())?
    );

    println!("{}", serde_json::to_string_pretty(&translated)?);
    Ok(())
}
