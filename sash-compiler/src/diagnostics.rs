use serde::Serialize;
use thiserror::Error;

use crate::source::SourceSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub level: DiagnosticLevel,
    pub span: SourceSpan,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("cannot retain diagnostics: no draft is open")]
    RetainWithoutDraft,
    #[error("cannot discard diagnostics: no draft is open")]
    DiscardWithoutDraft,
}

/// Ordered diagnostics sink.
///
/// Reports go to the innermost open draft when there is one, otherwise straight
/// into the committed list. A draft is either retained (merged into whatever is
/// beneath it) or discarded.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    drafts: Vec<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            drafts: Vec::new(),
        }
    }

    pub fn push_error_with_span<S: Into<String>>(&mut self, message: S, span: SourceSpan) {
        self.push(Diagnostic {
            message: message.into(),
            level: DiagnosticLevel::Error,
            span,
        });
    }

    pub fn push_warning_with_span<S: Into<String>>(&mut self, message: S, span: SourceSpan) {
        self.push(Diagnostic {
            message: message.into(),
            level: DiagnosticLevel::Warning,
            span,
        });
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        match self.drafts.last_mut() {
            Some(draft) => draft.push(diagnostic),
            None => self.entries.push(diagnostic),
        }
    }

    pub fn draft(&mut self) {
        self.drafts.push(Vec::new());
    }

    pub fn retain(&mut self) -> Result<(), DraftError> {
        let draft = self.drafts.pop().ok_or(DraftError::RetainWithoutDraft)?;
        match self.drafts.last_mut() {
            Some(parent) => parent.extend(draft),
            None => self.entries.extend(draft),
        }
        Ok(())
    }

    pub fn discard(&mut self) -> Result<(), DraftError> {
        self.drafts
            .pop()
            .map(|_| ())
            .ok_or(DraftError::DiscardWithoutDraft)
    }

    pub fn open_drafts(&self) -> usize {
        self.drafts.len()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        for diagnostic in other.entries {
            self.push(diagnostic);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|diagnostic| diagnostic.level == DiagnosticLevel::Error)
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(column: usize) -> SourceSpan {
        SourceSpan::single_point(1, column)
    }

    fn messages(diagnostics: &Diagnostics) -> Vec<&str> {
        diagnostics
            .entries()
            .iter()
            .map(|d| d.message.as_str())
            .collect()
    }

    #[test]
    fn retained_drafts_merge_into_parent() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push_error_with_span("first", span(1));
        diagnostics.draft();
        diagnostics.push_error_with_span("outer draft", span(2));
        diagnostics.draft();
        diagnostics.push_error_with_span("inner draft", span(3));
        assert_eq!(messages(&diagnostics), vec!["first"]);

        diagnostics.retain().unwrap();
        assert_eq!(messages(&diagnostics), vec!["first"]);
        diagnostics.retain().unwrap();
        assert_eq!(
            messages(&diagnostics),
            vec!["first", "outer draft", "inner draft"]
        );
    }

    #[test]
    fn discarded_drafts_leave_no_trace() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.draft();
        diagnostics.push_error_with_span("speculative", span(1));
        diagnostics.discard().unwrap();
        diagnostics.push_error_with_span("kept", span(2));
        assert_eq!(messages(&diagnostics), vec!["kept"]);
        assert_eq!(diagnostics.open_drafts(), 0);
    }

    #[test]
    fn closing_a_draft_that_was_never_opened_is_a_fault() {
        let mut diagnostics = Diagnostics::new();
        assert_eq!(diagnostics.retain(), Err(DraftError::RetainWithoutDraft));
        assert_eq!(diagnostics.discard(), Err(DraftError::DiscardWithoutDraft));
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push_warning_with_span("Redundant semicolons", span(1));
        assert!(!diagnostics.is_empty());
        assert!(!diagnostics.has_errors());
    }
}
