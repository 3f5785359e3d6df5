//! Extension points around record and field translation.
//!
//! Callbacks are registered per extension point and run in registration
//! order; each one receives the output of the previous one.

use crate::i18n::LanguageCode;
use crate::record::{FieldValue, Record};
use crate::schema::ColumnConfig;
use std::collections::BTreeMap;

/// Field being translated
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    pub table: &'a str,
    /// Column name, or dotted path for flexform leaves
    pub field: &'a str,
    pub source: &'a LanguageCode,
    pub target: &'a LanguageCode,
}

/// Field being classified
#[derive(Debug, Clone, Copy)]
pub struct EligibilityContext<'a> {
    pub table: &'a str,
    pub field: &'a str,
    pub value: &'a FieldValue,
    pub column: &'a ColumnConfig,
}

/// Result of a before-field callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldFlow {
    /// Translate this (possibly rewritten) value
    Continue(String),
    /// Use this value as the result without calling the provider
    Done(String),
}

type BeforeRecordHook = Box<dyn Fn(&str, &mut Record, &mut Vec<String>) + Send + Sync>;
type AfterRecordHook = Box<
    dyn Fn(&str, &Record, BTreeMap<String, FieldValue>) -> BTreeMap<String, FieldValue>
        + Send
        + Sync,
>;
type BeforeFieldHook = Box<dyn Fn(&FieldContext<'_>, String) -> FieldFlow + Send + Sync>;
type ValueHook = Box<dyn Fn(&FieldContext<'_>, String) -> String + Send + Sync>;
type EligibilityHook = Box<dyn Fn(&EligibilityContext<'_>, bool) -> bool + Send + Sync>;

#[derive(Default)]
pub struct Hooks {
    before_record: Vec<BeforeRecordHook>,
    after_record: Vec<AfterRecordHook>,
    before_field: Vec<BeforeFieldHook>,
    after_field: Vec<ValueHook>,
    eligibility: Vec<EligibilityHook>,
    preprocess: Vec<ValueHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// May rewrite the record and the list of excluded fields
    pub fn on_before_record<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &mut Record, &mut Vec<String>) + Send + Sync + 'static,
    {
        self.before_record.push(Box::new(hook));
        self
    }

    /// Receives the translated field map and returns the final one
    pub fn on_after_record<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &Record, BTreeMap<String, FieldValue>) -> BTreeMap<String, FieldValue>
            + Send
            + Sync
            + 'static,
    {
        self.after_record.push(Box::new(hook));
        self
    }

    pub fn on_before_field<F>(mut self, hook: F) -> Self
    where
        F: Fn(&FieldContext<'_>, String) -> FieldFlow + Send + Sync + 'static,
    {
        self.before_field.push(Box::new(hook));
        self
    }

    pub fn on_after_field<F>(mut self, hook: F) -> Self
    where
        F: Fn(&FieldContext<'_>, String) -> String + Send + Sync + 'static,
    {
        self.after_field.push(Box::new(hook));
        self
    }

    /// Receives the classifier's tentative verdict and returns the final one
    pub fn on_eligibility<F>(mut self, hook: F) -> Self
    where
        F: Fn(&EligibilityContext<'_>, bool) -> bool + Send + Sync + 'static,
    {
        self.eligibility.push(Box::new(hook));
        self
    }

    /// Rewrites a value before any before-field callback sees it
    pub fn on_preprocess<F>(mut self, hook: F) -> Self
    where
        F: Fn(&FieldContext<'_>, String) -> String + Send + Sync + 'static,
    {
        self.preprocess.push(Box::new(hook));
        self
    }

    pub fn run_before_record(&self, table: &str, record: &mut Record, except: &mut Vec<String>) {
        for hook in &self.before_record {
            hook(table, record, except);
        }
    }

    pub fn run_after_record(
        &self,
        table: &str,
        record: &Record,
        fields: BTreeMap<String, FieldValue>,
    ) -> BTreeMap<String, FieldValue> {
        self.after_record
            .iter()
            .fold(fields, |fields, hook| hook(table, record, fields))
    }

    /// Stops at the first callback returning `Done`
    pub fn run_before_field(&self, ctx: &FieldContext<'_>, value: String) -> FieldFlow {
        let mut value = value;
        for hook in &self.before_field {
            match hook(ctx, value) {
                FieldFlow::Continue(next) => value = next,
                done @ FieldFlow::Done(_) => return done,
            }
        }
        FieldFlow::Continue(value)
    }

    pub fn run_after_field(&self, ctx: &FieldContext<'_>, value: String) -> String {
        self.after_field
            .iter()
            .fold(value, |value, hook| hook(ctx, value))
    }

    pub fn run_eligibility(&self, ctx: &EligibilityContext<'_>, tentative: bool) -> bool {
        self.eligibility
            .iter()
            .fold(tentative, |verdict, hook| hook(ctx, verdict))
    }

    pub fn run_preprocess(&self, ctx: &FieldContext<'_>, value: String) -> String {
        self.preprocess
            .iter()
            .fold(value, |value, hook| hook(ctx, value))
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("before_record", &self.before_record.len())
            .field("after_record", &self.after_record.len())
            .field("before_field", &self.before_field.len())
            .field("after_field", &self.after_field.len())
            .field("eligibility", &self.eligibility.len())
            .field("preprocess", &self.preprocess.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldConfig, FieldType};

    fn languages() -> (LanguageCode, LanguageCode) {
        (
            LanguageCode::parse("en").expect("valid"),
            LanguageCode::parse("de").expect("valid"),
        )
    }

    #[test]
    fn test_empty_hooks_pass_values_through() {
        let hooks = Hooks::new();
        let (source, target) = languages();
        let ctx = FieldContext {
            table: "tt_content",
            field: "header",
            source: &source,
            target: &target,
        };

        assert_eq!(
            hooks.run_before_field(&ctx, "Hello".into()),
            FieldFlow::Continue("Hello".into())
        );
        assert_eq!(hooks.run_after_field(&ctx, "Hallo".into()), "Hallo");
        assert_eq!(hooks.run_preprocess(&ctx, "x".into()), "x");
    }

    #[test]
    fn test_value_hooks_chain_in_order() {
        let hooks = Hooks::new()
            .on_after_field(|_, value| format!("{}!", value))
            .on_after_field(|_, value| value.to_uppercase());
        let (source, target) = languages();
        let ctx = FieldContext {
            table: "t",
            field: "f",
            source: &source,
            target: &target,
        };

        assert_eq!(hooks.run_after_field(&ctx, "hallo".into()), "HALLO!");
    }

    #[test]
    fn test_before_field_done_short_circuits() {
        let hooks = Hooks::new()
            .on_before_field(|_, value| FieldFlow::Done(value))
            .on_before_field(|_, _| FieldFlow::Continue("never".into()));
        let (source, target) = languages();
        let ctx = FieldContext {
            table: "t",
            field: "f",
            source: &source,
            target: &target,
        };

        assert_eq!(
            hooks.run_before_field(&ctx, "keep".into()),
            FieldFlow::Done("keep".into())
        );
    }

    #[test]
    fn test_eligibility_override() {
        let hooks = Hooks::new().on_eligibility(|ctx, verdict| verdict || ctx.field == "force");
        let column = ColumnConfig::new(FieldConfig::new(FieldType::Other));
        let value = FieldValue::from("x");

        let forced = EligibilityContext {
            table: "t",
            field: "force",
            value: &value,
            column: &column,
        };
        let other = EligibilityContext {
            field: "other",
            ..forced
        };

        assert!(hooks.run_eligibility(&forced, false));
        assert!(!hooks.run_eligibility(&other, false));
    }

    #[test]
    fn test_record_hooks() {
        let hooks = Hooks::new()
            .on_before_record(|_, record, except| {
                record.fields.insert("extra".into(), FieldValue::from("added"));
                except.push("secret".into());
            })
            .on_after_record(|_, _, mut fields| {
                fields.remove("secret");
                fields
            });

        let mut record = Record::new(1, 1);
        let mut except = Vec::new();
        hooks.run_before_record("t", &mut record, &mut except);
        assert_eq!(record.get("extra"), Some(&FieldValue::from("added")));
        assert_eq!(except, vec!["secret".to_string()]);

        let mut fields = BTreeMap::new();
        fields.insert("secret".to_string(), FieldValue::from("x"));
        fields.insert("title".to_string(), FieldValue::from("y"));
        let fields = hooks.run_after_record("t", &record, fields);
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key("title"));
    }

    #[test]
    fn test_debug_lists_counts() {
        let hooks = Hooks::new().on_preprocess(|_, v| v);
        assert!(format!("{:?}", hooks).contains("preprocess: 1"));
    }
}
