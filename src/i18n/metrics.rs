//! Translation metrics and observability module.
//!
//! Counts provider calls and per-field outcomes for one `TranslationService`.
//! The counters are owned by the service rather than global, so separate
//! services (and tests) never share state.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Number of text translation calls sent to the provider
    api_calls: AtomicUsize,

    /// Number of text translation calls that failed
    api_failures: AtomicUsize,

    /// Number of fields (or flexform leaves) whose value changed
    fields_translated: AtomicUsize,

    /// Number of fields rejected by the eligibility classifier
    fields_skipped: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call to the translation provider.
    pub fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed provider call.
    pub fn record_api_failure(&self) {
        self.api_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_field_translated(&self) {
        self.fields_translated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_field_skipped(&self) {
        self.fields_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::Relaxed)
    }

    pub fn api_failures(&self) -> usize {
        self.api_failures.load(Ordering::Relaxed)
    }

    pub fn fields_translated(&self) -> usize {
        self.fields_translated.load(Ordering::Relaxed)
    }

    pub fn fields_skipped(&self) -> usize {
        self.fields_skipped.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let calls = self.api_calls();
        let failures = self.api_failures();
        let api_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            api_calls: calls,
            api_failures: failures,
            api_success_rate,
            fields_translated: self.fields_translated(),
            fields_skipped: self.fields_skipped(),
        }
    }
}

/// Metrics report containing current translation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    /// Number of provider calls made
    pub api_calls: usize,

    /// Number of provider failures
    pub api_failures: usize,

    /// Provider success rate as a percentage (0-100)
    pub api_success_rate: f64,

    pub fields_translated: usize,

    pub fields_skipped: usize,
}
