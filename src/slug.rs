//! URL slugs derived from other fields of a record.

use crate::record::Record;
use crate::schema::FieldConfig;
use regex::Regex;
use std::sync::OnceLock;

const DEFAULT_FIELD_SEPARATOR: &str = "/";

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

fn tag_regex() -> &'static Regex {
    TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex"))
}

/// Builds the slug of a record from its slug field configuration.
pub trait SlugGenerator: Send + Sync {
    /// An empty string means no slug could be built
    fn generate(&self, table: &str, config: &FieldConfig, record: &Record) -> String;
}

/// Joins the configured source fields and reduces them to a URL-safe path.
///
/// For each entry of `generator_options.fields` the first non-empty value is
/// used; the parts are joined with `field_separator`. Page slugs always start
/// with `/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSlugGenerator;

impl SlugGenerator for DefaultSlugGenerator {
    fn generate(&self, table: &str, config: &FieldConfig, record: &Record) -> String {
        let Some(options) = &config.generator_options else {
            return String::new();
        };

        let parts: Vec<String> = options
            .fields
            .iter()
            .filter_map(|group| {
                group
                    .names()
                    .into_iter()
                    .filter_map(|name| record.get(name)?.as_text().map(|v| v.into_owned()))
                    .find(|value| !value.trim().is_empty())
            })
            .collect();
        if parts.is_empty() {
            return String::new();
        }

        let separator = options
            .field_separator
            .as_deref()
            .unwrap_or(DEFAULT_FIELD_SEPARATOR);
        let slug = sanitize(&parts.join(separator));

        if table == "pages" && !slug.starts_with('/') {
            format!("/{}", slug)
        } else {
            slug
        }
    }
}

/// Lowercase, markup removed, separators and whitespace mapped to `-`, every
/// other character that is not alphanumeric or `/` dropped.
pub fn sanitize(value: &str) -> String {
    let text = tag_regex().replace_all(value, "");
    let text = text.replace("&nbsp;", " ").replace("&amp;", "-");

    let mut slug = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        let mapped = match c {
            c if c.is_alphanumeric() => c,
            '/' => '/',
            '-' | '_' | '+' | '.' | ',' => '-',
            c if c.is_whitespace() || c == '\u{a0}' => '-',
            _ => continue,
        };
        if mapped == '-' && (slug.is_empty() || slug.ends_with('-') || slug.ends_with('/')) {
            continue;
        }
        if mapped == '/' && slug.ends_with('-') {
            slug.pop();
        }
        if mapped == '/' && slug.ends_with('/') {
            continue;
        }
        slug.push(mapped);
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
