//! Markdown to HTML rendering with heading ids.

use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

use crate::heading::{HeadingState, TocEntry};

/// Rendered body with the data extracted along the way.
pub(crate) struct Rendered {
    pub html: String,
    pub title: Option<String>,
    pub toc: Vec<TocEntry>,
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Render markdown, assigning every heading a unique id.
pub(crate) fn render_markdown(markdown: &str) -> Rendered {
    let mut events: Vec<Event<'_>> = Parser::new_ext(markdown, options()).collect();
    let mut headings = HeadingState::default();
    let mut open_heading = None;

    for idx in 0..events.len() {
        let completed = match &events[idx] {
            Event::Start(Tag::Heading { level, id, .. }) => {
                headings.start_heading(heading_level_to_num(*level), id.as_deref());
                open_heading = Some(idx);
                None
            }
            Event::Text(text) | Event::Code(text) => {
                headings.push_text(text);
                None
            }
            Event::End(TagEnd::Heading(_)) => headings.complete_heading(),
            _ => None,
        };

        if let Some(new_id) = completed
            && let Some(start) = open_heading.take()
            && let Event::Start(Tag::Heading { id, .. }) = &mut events[start]
        {
            *id = Some(CowStr::from(new_id));
        }
    }

    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, events.into_iter());
    let (title, toc) = headings.finish();
    Rendered {
        html: output,
        title,
        toc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_heading_ids_and_toc() {
        let rendered = render_markdown("# Widgets\n\n## Install `composer`\n\n## Install `composer`\n");

        assert_eq!(rendered.title.as_deref(), Some("Widgets"));
        assert_eq!(
            rendered.toc,
            vec![
                TocEntry {
                    level: 2,
                    title: "Install composer".to_owned(),
                    id: "install-composer".to_owned(),
                },
                TocEntry {
                    level: 2,
                    title: "Install composer".to_owned(),
                    id: "install-composer-1".to_owned(),
                },
            ]
        );
        assert!(rendered.html.contains(r#"<h1 id="widgets">Widgets</h1>"#));
        assert!(rendered.html.contains(r#"<h2 id="install-composer-1">"#));
    }

    #[test]
    fn test_gfm_tables() {
        let rendered = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(rendered.html.contains("<table>"));
    }

    #[test]
    fn test_escaped_braces_render_literally() {
        let rendered = render_markdown(r"Use \{\{ name \}\}");
        assert!(rendered.html.contains("Use {{ name }}"));
    }
}
