//! Record walker: selects the fields of a record to translate, recurses into
//! flexform values and regenerates slugs from the translated record.

use crate::cache::CacheStore;
use crate::eligibility::can_field_be_translated;
use crate::error::Result;
use crate::flexform::{
    FlexElement, FlexField, FlexFormData, FlexFormResolver, FlexFormSchema, FlexValue,
    SectionEntry, DEFAULT_LANGUAGE_KEY, DEFAULT_VALUE_KEY,
};
use crate::i18n::LanguageCode;
use crate::record::{FieldValue, Record};
use crate::schema::{ColumnConfig, FieldType, SchemaRegistry, TableSchema};
use crate::service::TranslationService;
use crate::site::{SiteLanguage, SiteResolver};
use crate::slug::{DefaultSlugGenerator, SlugGenerator};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How long parsed flexform data structures stay cached
const FLEXFORM_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Source and target of one translation run
struct LanguagePair {
    source: LanguageCode,
    target: LanguageCode,
}

pub struct RecordTranslator {
    schema: Arc<SchemaRegistry>,
    sites: Arc<dyn SiteResolver>,
    flexforms: Arc<dyn FlexFormResolver>,
    cache: Arc<dyn CacheStore>,
    service: TranslationService,
    slugs: Box<dyn SlugGenerator>,
}

impl RecordTranslator {
    pub fn new(
        schema: Arc<SchemaRegistry>,
        sites: Arc<dyn SiteResolver>,
        flexforms: Arc<dyn FlexFormResolver>,
        cache: Arc<dyn CacheStore>,
        service: TranslationService,
    ) -> Self {
        Self {
            schema,
            sites,
            flexforms,
            cache,
            service,
            slugs: Box::new(DefaultSlugGenerator),
        }
    }

    pub fn with_slug_generator(mut self, slugs: impl SlugGenerator + 'static) -> Self {
        self.slugs = Box::new(slugs);
        self
    }

    pub fn service(&self) -> &TranslationService {
        &self.service
    }

    /// Translate the eligible fields of `record` into `target`.
    ///
    /// Returns only the fields whose value changed, after the after-record
    /// hooks. Records without a resolvable source language, unsupported
    /// language pairs and an unavailable provider yield an empty map.
    pub async fn translate_record(
        &self,
        table: &str,
        record: &Record,
        target: &SiteLanguage,
        except_fields: &[String],
    ) -> Result<BTreeMap<String, FieldValue>> {
        let mut record = record.clone();
        let mut except_fields = except_fields.to_vec();
        self.service
            .hooks()
            .run_before_record(table, &mut record, &mut except_fields);

        let translated = self
            .translate_fields(table, &record, target, &except_fields)
            .await?;

        Ok(self
            .service
            .hooks()
            .run_after_record(table, &record, translated))
    }

    /// Translate one field of `record`; `None` when it was skipped or its
    /// value did not change.
    pub async fn translate_field(
        &self,
        table: &str,
        record: &Record,
        field: &str,
        target: &SiteLanguage,
    ) -> Result<Option<FieldValue>> {
        let Some(schema) = self.schema.table(table) else {
            debug!("No schema for table {}", table);
            return Ok(None);
        };
        let Some(column) = schema.column(field) else {
            debug!("No column configuration for {}.{}", table, field);
            return Ok(None);
        };
        if schema.is_control_column(field) {
            return Ok(None);
        }
        let Some(value) = record.get(field) else {
            return Ok(None);
        };
        let Some(languages) = self.language_pair(table, schema, record, target).await else {
            return Ok(None);
        };

        self.translate_column(table, record, field, column, value, &languages)
            .await
    }

    async fn translate_fields(
        &self,
        table: &str,
        record: &Record,
        target: &SiteLanguage,
        except_fields: &[String],
    ) -> Result<BTreeMap<String, FieldValue>> {
        let mut translated = BTreeMap::new();

        let Some(schema) = self.schema.table(table) else {
            debug!("No schema for table {}, nothing to translate", table);
            return Ok(translated);
        };
        let Some(languages) = self.language_pair(table, schema, record, target).await else {
            return Ok(translated);
        };

        for column in &schema.columns {
            let name = column.name.as_str();
            if except_fields.iter().any(|except| except == name) || schema.is_control_column(name)
            {
                continue;
            }
            let Some(value) = record.get(name) else {
                continue;
            };

            if let Some(new_value) = self
                .translate_column(table, record, name, &column.column, value, &languages)
                .await?
            {
                translated.insert(name.to_string(), new_value);
            }
        }

        if !translated.is_empty() {
            self.regenerate_slugs(table, schema, record, except_fields, &mut translated);
        }

        info!(
            "Translated {} field(s) of {}:{} into {}",
            translated.len(),
            table,
            record.uid,
            languages.target
        );
        Ok(translated)
    }

    /// Source language from the record's page, checked against the target
    /// and the provider's supported languages
    async fn language_pair(
        &self,
        table: &str,
        schema: &TableSchema,
        record: &Record,
        target: &SiteLanguage,
    ) -> Option<LanguagePair> {
        let page_id = if table == "pages" {
            record.uid
        } else {
            record.pid
        };
        let language_id = schema
            .ctrl
            .language_field
            .as_deref()
            .and_then(|field| record.get(field))
            .and_then(FieldValue::as_i64)
            .unwrap_or(0);

        let Some(source) = self.sites.site_language(page_id, language_id) else {
            debug!(
                "No site language {} for page {}, skipping {}:{}",
                language_id, page_id, table, record.uid
            );
            return None;
        };

        if !self.service.is_available().await {
            info!("Translation provider unavailable, skipping {}:{}", table, record.uid);
            return None;
        }
        if !self
            .service
            .can_translate(&source.locale, &target.locale)
            .await
        {
            debug!(
                "Cannot translate {}:{} from {} to {}",
                table, record.uid, source.locale, target.locale
            );
            return None;
        }

        Some(LanguagePair {
            source: source.locale,
            target: target.locale.clone(),
        })
    }

    async fn translate_column(
        &self,
        table: &str,
        record: &Record,
        field: &str,
        column: &ColumnConfig,
        value: &FieldValue,
        languages: &LanguagePair,
    ) -> Result<Option<FieldValue>> {
        if !can_field_be_translated(table, field, value, column, self.service.hooks()) {
            self.service.metrics().record_field_skipped();
            return Ok(None);
        }

        if column.config.field_type == FieldType::Flex {
            let FieldValue::FlexForm(data) = value else {
                debug!("{}.{} is not a flexform value, skipping", table, field);
                return Ok(None);
            };
            return Ok(self
                .translate_flexform(table, record, field, data, languages)
                .await?
                .map(FieldValue::FlexForm));
        }

        let Some(text) = value.as_text() else {
            return Ok(None);
        };
        let translated = self
            .service
            .translate_field_internal(
                table,
                field,
                &text,
                &column.config,
                &languages.source,
                &languages.target,
            )
            .await?;

        if translated == text {
            return Ok(None);
        }
        self.service.metrics().record_field_translated();
        Ok(Some(FieldValue::Text(translated)))
    }

    /// Rewrites the default-language leaves of a flexform value. Sheets,
    /// sections, instance keys and all other slots are copied unchanged.
    async fn translate_flexform(
        &self,
        table: &str,
        record: &Record,
        field: &str,
        data: &FlexFormData,
        languages: &LanguagePair,
    ) -> Result<Option<FlexFormData>> {
        let Some(structure) = self.flexform_structure(table, field, record) else {
            return Ok(None);
        };

        let mut data = data.clone();
        let mut changed = false;

        for (sheet_name, sheet) in data.data.iter_mut() {
            let Some(sheet_schema) = structure.sheets.get(sheet_name) else {
                continue;
            };
            let Some(fields) = sheet.get_mut(DEFAULT_LANGUAGE_KEY) else {
                continue;
            };

            for (element_name, element) in fields.iter_mut() {
                let path = format!("{}.{}.{}", field, sheet_name, element_name);
                match (element, sheet_schema.elements.get(element_name)) {
                    (FlexField::Value(slots), Some(FlexElement::Field(column))) => {
                        changed |= self
                            .translate_flex_leaf(table, &path, slots, column, languages)
                            .await?;
                    }
                    (FlexField::Section(section), Some(FlexElement::Section(section_schema))) => {
                        for (instance_key, containers) in section.el.iter_mut() {
                            for (container_name, entry) in containers.iter_mut() {
                                let SectionEntry::Container(container) = entry else {
                                    continue;
                                };
                                let Some(container_schema) =
                                    section_schema.containers.get(container_name)
                                else {
                                    continue;
                                };

                                for (inner_name, slots) in container.el.iter_mut() {
                                    let Some(column) = container_schema.elements.get(inner_name)
                                    else {
                                        continue;
                                    };
                                    let inner_path =
                                        format!("{}.{}.{}", path, instance_key, inner_name);
                                    changed |= self
                                        .translate_flex_leaf(
                                            table,
                                            &inner_path,
                                            slots,
                                            column,
                                            languages,
                                        )
                                        .await?;
                                }
                            }
                        }
                    }
                    _ => debug!("No matching data structure for {}", path),
                }
            }
        }

        Ok(changed.then_some(data))
    }

    async fn translate_flex_leaf(
        &self,
        table: &str,
        path: &str,
        slots: &mut FlexValue,
        column: &ColumnConfig,
        languages: &LanguagePair,
    ) -> Result<bool> {
        let Some(Value::String(current)) = slots.get(DEFAULT_VALUE_KEY) else {
            return Ok(false);
        };
        let current = current.clone();

        // Nested flexforms are not supported inside a flexform
        if column.config.field_type == FieldType::Flex {
            return Ok(false);
        }
        let value = FieldValue::Text(current.clone());
        if !can_field_be_translated(table, path, &value, column, self.service.hooks()) {
            self.service.metrics().record_field_skipped();
            return Ok(false);
        }

        let translated = self
            .service
            .translate_field_internal(
                table,
                path,
                &current,
                &column.config,
                &languages.source,
                &languages.target,
            )
            .await?;
        if translated == current {
            return Ok(false);
        }

        slots.insert(DEFAULT_VALUE_KEY.to_string(), Value::String(translated));
        self.service.metrics().record_field_translated();
        Ok(true)
    }

    /// Parsed data structure of a flexform field, cached under its identifier.
    /// Resolution failures skip the field.
    fn flexform_structure(&self, table: &str, field: &str, record: &Record) -> Option<FlexFormSchema> {
        let identifier = match self.flexforms.identifier(table, field, record) {
            Ok(identifier) => identifier,
            Err(e) => {
                debug!("Skipping flexform {}.{}: {}", table, field, e);
                return None;
            }
        };
        let cache_key = format!("flexform_ds_{}", identifier);

        match self.cache.get(&cache_key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(structure) => return Some(structure),
                Err(e) => debug!("Ignoring unreadable cached structure {}: {}", identifier, e),
            },
            Ok(None) => {}
            Err(e) => debug!("Flexform cache read failed: {}", e),
        }

        let structure = match self.flexforms.parse(&identifier) {
            Ok(structure) => structure,
            Err(e) => {
                debug!("Skipping flexform {}.{}: {}", table, field, e);
                return None;
            }
        };

        match serde_json::to_string(&structure) {
            Ok(raw) => {
                if let Err(e) = self.cache.set(&cache_key, &raw, FLEXFORM_CACHE_TTL) {
                    debug!("Flexform cache write failed: {}", e);
                }
            }
            Err(e) => debug!("Could not serialize structure {}: {}", identifier, e),
        }
        Some(structure)
    }

    /// Rebuild slug fields from the record with the translations applied
    fn regenerate_slugs(
        &self,
        table: &str,
        schema: &TableSchema,
        record: &Record,
        except_fields: &[String],
        translated: &mut BTreeMap<String, FieldValue>,
    ) {
        let merged = record.merged_with(translated);

        for column in &schema.columns {
            if column.column.config.field_type != FieldType::Slug
                || except_fields.contains(&column.name)
            {
                continue;
            }
            let slug = self.slugs.generate(table, &column.column.config, &merged);
            if slug.is_empty() {
                continue;
            }
            let unchanged = record
                .get(&column.name)
                .and_then(FieldValue::as_text)
                .is_some_and(|current| current == slug);
            if !unchanged {
                debug!("Regenerated {}.{} as {}", table, column.name, slug);
                translated.insert(column.name.clone(), FieldValue::Text(slug));
            }
        }
    }
}

impl std::fmt::Debug for RecordTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordTranslator")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}
