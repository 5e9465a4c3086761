//! Diagnostics - Host-visible errors and warnings

use serde::Serialize;

use crate::provider::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A structured message reported to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: None,
        }
    }

    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl ProviderError {
    /// Translate this error into host diagnostics
    ///
    /// The first entry carries the summary with the cause as detail. A
    /// chained platform error behind the cause becomes a second entry, and
    /// related errors (such as a failed cleanup) follow with their own
    /// entries.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut summary = self.message.clone();
        if let Some(id) = &self.resource_id {
            summary = format!("[{}] {}", id, summary);
        }

        let mut first = Diagnostic::error(summary);
        let mut chained = None;
        if let Some(cause) = &self.cause {
            first = first.with_detail(cause.to_string());
            if let Some(source) = cause.source() {
                chained = Some(Diagnostic::error("Platform error").with_detail(source.to_string()));
            }
        }

        let mut diagnostics = vec![first];
        diagnostics.extend(chained);
        for related in &self.related {
            diagnostics.extend(related.diagnostics());
        }
        diagnostics
    }
}
