//! Decides whether a field value is a translation candidate.
//!
//! Rules are checked in a fixed order and the first match wins:
//!
//! 1. explicit opt-out (`translate: false`)
//! 2. empty or null value
//! 3. `l10n_mode: exclude`
//! 4. single-line input: rejected for custom render types, typolink soft
//!    references, value pickers, restrictive eval rules and numeric-looking
//!    values such as "15px"
//! 5. multi-line text: rejected for custom render types and, with rich text
//!    enabled, for markup without visible text
//! 6. flexform containers are always candidates
//! 7. anything else is rejected
//!
//! The verdict is always handed to the eligibility hooks, which have the final
//! word.

use crate::hooks::{EligibilityContext, Hooks};
use crate::record::FieldValue;
use crate::schema::{ColumnConfig, FieldConfig, FieldType};
use regex::Regex;
use std::sync::OnceLock;

// Substring match on the raw eval string: "trim,int" and "datetime,int" are
// rejected, and so is any custom rule containing one of these words.
static EVAL_REGEX: OnceLock<Regex> = OnceLock::new();
static NUMERIC_UNIT_REGEX: OnceLock<Regex> = OnceLock::new();
static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

fn eval_regex() -> &'static Regex {
    EVAL_REGEX.get_or_init(|| {
        Regex::new(r"alphanum|domainname|double2|int|is_in|md5|nospace|num|password|year")
            .expect("Invalid eval regex")
    })
}

fn numeric_unit_regex() -> &'static Regex {
    NUMERIC_UNIT_REGEX
        .get_or_init(|| Regex::new(r"^[0-9.]+[a-zA-Z]*$").expect("Invalid numeric regex"))
}

fn tag_regex() -> &'static Regex {
    TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex"))
}

/// Full classification including the eligibility hooks.
pub fn can_field_be_translated(
    table: &str,
    field: &str,
    value: &FieldValue,
    column: &ColumnConfig,
    hooks: &Hooks,
) -> bool {
    let tentative = classify(value, column);
    hooks.run_eligibility(
        &EligibilityContext {
            table,
            field,
            value,
            column,
        },
        tentative,
    )
}

/// Classification by metadata and value alone
pub fn classify(value: &FieldValue, column: &ColumnConfig) -> bool {
    if column.translate == Some(false) {
        return false;
    }
    if value.is_empty() {
        return false;
    }
    if column.is_language_excluded() {
        return false;
    }

    match column.config.field_type {
        FieldType::Input => input_is_translatable(value, &column.config),
        FieldType::Text => text_is_translatable(value, &column.config),
        FieldType::Flex => true,
        FieldType::Slug | FieldType::Other => false,
    }
}

fn input_is_translatable(value: &FieldValue, config: &FieldConfig) -> bool {
    if config.has_custom_render_type() {
        return false;
    }
    if config
        .softref
        .as_deref()
        .is_some_and(|softref| softref.contains("typolink"))
    {
        return false;
    }
    if config.value_picker {
        return false;
    }
    if config
        .eval
        .as_deref()
        .is_some_and(|eval| eval_regex().is_match(eval))
    {
        return false;
    }

    match value.as_text() {
        Some(text) => !is_numeric_with_unit(&text),
        None => false,
    }
}

fn text_is_translatable(value: &FieldValue, config: &FieldConfig) -> bool {
    if config.has_custom_render_type() {
        return false;
    }
    let Some(text) = value.as_text() else {
        return false;
    };
    if config.enable_richtext && visible_text(&text).is_empty() {
        return false;
    }
    true
}

/// Digits and dots, optionally followed by letters: "15", "0.1234", "15px", "3em"
pub fn is_numeric_with_unit(value: &str) -> bool {
    numeric_unit_regex().is_match(value)
}

/// Markup stripped, whitespace entities decoded, surrounding whitespace trimmed
fn visible_text(html: &str) -> String {
    let stripped = tag_regex().replace_all(html, "");
    stripped
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&#xA0;", " ")
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{a0}')
        .to_string()
}
