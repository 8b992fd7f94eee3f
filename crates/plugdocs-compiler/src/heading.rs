//! Heading ids, title extraction and table of contents.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// Tracks headings while walking markdown events.
///
/// The first H1 becomes the page title and is left out of the table of
/// contents; it is still rendered.
#[derive(Default)]
pub(crate) struct HeadingState {
    title: Option<String>,
    current: Option<(u8, Option<String>)>,
    text: String,
    toc: Vec<TocEntry>,
    id_counts: HashMap<String, usize>,
}

impl HeadingState {
    /// Start a heading, optionally with an explicit `{#id}`.
    pub fn start_heading(&mut self, level: u8, explicit_id: Option<&str>) {
        self.current = Some((level, explicit_id.map(str::to_owned)));
        self.text.clear();
    }

    /// Whether a heading is being collected.
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Append heading text.
    pub fn push_text(&mut self, text: &str) {
        if self.is_active() {
            self.text.push_str(text);
        }
    }

    /// Finish the heading and return its id.
    pub fn complete_heading(&mut self) -> Option<String> {
        let (level, explicit_id) = self.current.take()?;
        let text = std::mem::take(&mut self.text);
        let title = text.trim().to_owned();
        let id = match explicit_id {
            Some(id) => {
                *self.id_counts.entry(id.clone()).or_default() += 1;
                id
            }
            None => self.generate_id(&title),
        };

        if level == 1 && self.title.is_none() {
            self.title = Some(title);
        } else {
            self.toc.push(TocEntry {
                level,
                title,
                id: id.clone(),
            });
        }
        Some(id)
    }

    fn generate_id(&mut self, text: &str) -> String {
        let mut base_id = slugify(text);
        if base_id.is_empty() {
            base_id = "section".to_owned();
        }
        let count = self.id_counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        id
    }

    /// Extracted title and table of contents.
    pub fn finish(self) -> (Option<String>, Vec<TocEntry>) {
        (self.title, self.toc)
    }
}

/// Convert text to URL-safe slug.
///
/// Converts to lowercase, replaces whitespace/dashes/underscores with single dashes,
/// and removes other non-alphanumeric characters.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }
    result
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
