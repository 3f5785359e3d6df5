//! Translate CMS record fields, including flexform values, through DeepL.
//!
//! `RecordTranslator` walks a record in schema order, asks the eligibility
//! classifier about each field, translates the candidates through a
//! `TranslationService` and regenerates slug fields from the result.

pub mod cache;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod flexform;
pub mod glossary;
pub mod hooks;
pub mod i18n;
pub mod provider;
pub mod record;
pub mod retry;
pub mod schema;
pub mod service;
pub mod site;
pub mod slug;
pub mod walker;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result};
pub use record::{FieldValue, Record};
pub use service::TranslationService;
pub use walker::RecordTranslator;
