//! Language handling for the translation engine.
//!
//! # Architecture
//!
//! - `language`: normalized `LanguageCode` and the mapping onto provider codes,
//!   including the deprecated bare "EN"/"PT" targets
//! - `registry`: provider-supported languages and their 24-hour cache
//! - `metrics`: per-service translation counters
//!
//! # Example
//!
//! ```rust,ignore
//! use record_translate::i18n::{LanguageCode, RegionDefaults, target_provider_code};
//!
//! let target = LanguageCode::parse("en_US.UTF-8")?;
//! let code = target_provider_code(&target, &[], &RegionDefaults::default());
//! assert_eq!(code, "EN-US");
//! ```

mod language;
mod metrics;
mod registry;

pub use language::{target_provider_code, LanguageCode, RegionDefaults};
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageCache, SupportedLanguages, LANGUAGE_CACHE_KEY};
