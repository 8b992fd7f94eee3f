//! Compiled page model.

use serde::Serialize;

use crate::heading::{TocEntry, escape_html};

/// Title of the page served when compilation fails.
pub const FALLBACK_TITLE: &str = "Compilation Error";

/// Description of the page served when compilation fails.
pub const FALLBACK_DESCRIPTION: &str = "This document could not be compiled due to syntax errors.";

/// Render-ready result of compiling one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledPage {
    /// Front matter title, else the first H1.
    pub title: Option<String>,
    /// Front matter description.
    pub description: Option<String>,
    /// Headings in document order, excluding the title H1.
    pub toc: Vec<TocEntry>,
    /// Rendered HTML body.
    pub html: String,
    /// Slug path of another page to render instead of this one.
    pub source: Option<String>,
    /// Full-width layout requested.
    pub full: bool,
    /// Compilation error message when this is the fallback page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompiledPage {
    /// Error page standing in for a document that failed to compile.
    pub fn fallback(message: &str) -> Self {
        let html = format!(
            concat!(
                "<div class=\"compile-error\" role=\"alert\">\n",
                "<h2>Content Compilation Error</h2>\n",
                "<p>This document contains invalid syntax and could not be compiled.</p>\n",
                "<details>\n<summary>Error Details</summary>\n<pre>{}</pre>\n</details>\n",
                "</div>\n"
            ),
            escape_html(message)
        );
        Self {
            title: Some(FALLBACK_TITLE.to_owned()),
            description: Some(FALLBACK_DESCRIPTION.to_owned()),
            toc: Vec::new(),
            html,
            source: None,
            full: false,
            error: Some(message.to_owned()),
        }
    }

    /// Whether this is a fallback error page.
    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}
