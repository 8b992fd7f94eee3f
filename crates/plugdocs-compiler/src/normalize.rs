//! Deterministic source cleanup applied before compilation.
//!
//! Repository READMEs are written for GitHub's renderer and routinely contain
//! constructs our compiler would misread. Outside fenced code blocks and inline
//! code spans this pass:
//!
//! - removes HTML comments (including multi-line ones)
//! - strips inline `style` attributes from HTML tags
//! - escapes `{{` and `}}` in markdown text so template-looking text stays
//!   literal (tags and raw HTML blocks are left alone)
//! - rewrites void tags (`<br>`, `<img ...>`) to self-closing form
//! - replaces typographic quotes and dashes with ASCII
//!
//! Fences tagged `env`, `dotenv` or `environment` are relabelled `bash`.
//! Running the pass twice yields the same output as running it once.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[A-Za-z][^<>]*>").unwrap());

static STYLE_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+style\s*=\s*(?:"[^"]*"|'[^']*')"#).unwrap()
});

static VOID_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^<(area|base|br|col|embed|hr|img|input|link|meta|source|track|wbr)\b([^<>]*?)\s*/?>$",
    )
    .unwrap()
});

/// Fence languages compiled as shell snippets.
const ENV_LANGUAGES: &[&str] = &["env", "dotenv", "environment"];

/// Tags that open a raw HTML block even in the middle of a paragraph.
const HTML_BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "center", "dd", "details", "dialog",
    "div", "dl", "dt", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "html", "li", "main", "nav", "ol", "p", "section", "summary", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Normalize markdown source. See the module docs for the rules.
pub fn normalize(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut fence: Option<Fence> = None;
    let mut in_comment = false;
    let mut html_block = false;
    // No paragraph is open, so a lone tag line starts an HTML block.
    let mut block_start = true;

    for line in source.split_inclusive('\n') {
        if let Some(open) = &fence {
            if open.is_closed_by(line) {
                fence = None;
            }
            out.push_str(line);
            block_start = true;
            continue;
        }
        if !in_comment
            && !html_block
            && let Some(open) = Fence::parse(line)
        {
            out.push_str(&open.relabel(line));
            fence = Some(open);
            continue;
        }

        let blank = line.trim().is_empty();
        if blank {
            html_block = false;
        } else if !html_block && !in_comment && starts_html_block(line, block_start) {
            html_block = true;
        }

        let normalized = normalize_line(line, &mut in_comment, !html_block);
        out.push_str(&normalized);
        if in_comment
            && line.ends_with('\n')
            && !normalized.ends_with('\n')
            && !normalized.is_empty()
        {
            out.push('\n');
        }
        block_start = blank || line.trim_start().starts_with('#');
    }
    out
}

/// Whether `line` opens a raw HTML block, whose content markdown leaves as is.
fn starts_html_block(line: &str, block_start: bool) -> bool {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return false;
    }
    let rest = line[indent..].trim_end();
    let Some(tag) = rest.strip_prefix('<') else {
        return false;
    };
    let tag = tag.strip_prefix('/').unwrap_or(tag);
    let name_len = tag
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(tag.len());
    let (name, after) = tag.split_at(name_len);
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return false;
    }
    if HTML_BLOCK_TAGS.iter().any(|t| name.eq_ignore_ascii_case(t)) {
        return after.is_empty() || after.starts_with([' ', '\t', '>', '/']);
    }
    block_start && TAG_RE.find(rest).is_some_and(|m| m.start() == 0 && m.end() == rest.len())
}

/// An open fenced code block.
struct Fence {
    marker: char,
    len: usize,
    /// Byte range of the language word within the opening line.
    lang: Option<(usize, usize)>,
}

impl Fence {
    fn parse(line: &str) -> Option<Self> {
        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent > 3 {
            return None;
        }
        let rest = &line[indent..];
        let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = rest.chars().take_while(|c| *c == marker).count();
        if len < 3 {
            return None;
        }
        let info = &rest[len..];
        if marker == '`' && info.contains('`') {
            return None;
        }
        let info_start = indent + len + (info.len() - info.trim_start().len());
        let word_len = line[info_start..]
            .find(|c: char| c.is_whitespace() || c == '{')
            .unwrap_or(line.len() - info_start);
        let lang = (word_len > 0).then_some((info_start, info_start + word_len));
        Some(Self { marker, len, lang })
    }

    fn is_closed_by(&self, line: &str) -> bool {
        let trimmed = line.trim_start_matches(' ');
        if line.len() - trimmed.len() > 3 {
            return false;
        }
        let run = trimmed.chars().take_while(|c| *c == self.marker).count();
        run >= self.len && trimmed[run..].trim().is_empty()
    }

    fn relabel(&self, line: &str) -> String {
        match self.lang {
            Some((start, end))
                if ENV_LANGUAGES
                    .iter()
                    .any(|lang| line[start..end].eq_ignore_ascii_case(lang)) =>
            {
                format!("{}bash{}", &line[..start], &line[end..])
            }
            _ => line.to_owned(),
        }
    }
}

/// Normalize one line outside fences, tracking multi-line comments.
fn normalize_line(line: &str, in_comment: &mut bool, escape_braces: bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    loop {
        if *in_comment {
            match rest.find("-->") {
                Some(end) => {
                    rest = &rest[end + 3..];
                    *in_comment = false;
                }
                None => return out,
            }
        }

        let next_tick = rest.find('`');
        let next_comment = rest.find("<!--");
        match (next_tick, next_comment) {
            (Some(tick), comment) if comment.is_none_or(|c| tick < c) => {
                out.push_str(&normalize_prose(&rest[..tick], escape_braces));
                let run = rest[tick..].chars().take_while(|c| *c == '`').count();
                let delimiter = &rest[tick..tick + run];
                let after = &rest[tick + run..];
                match after.find(delimiter) {
                    Some(close) => {
                        let end = tick + run + close + run;
                        out.push_str(&rest[tick..end]);
                        rest = &rest[end..];
                    }
                    None => {
                        out.push_str(delimiter);
                        rest = after;
                    }
                }
            }
            (_, Some(comment)) => {
                out.push_str(&normalize_prose(&rest[..comment], escape_braces));
                rest = &rest[comment + 4..];
                *in_comment = true;
            }
            _ => {
                out.push_str(&normalize_prose(rest, escape_braces));
                return out;
            }
        }
    }
}

/// Rewrite prose text that is known not to be code or a comment.
fn normalize_prose(text: &str, escape_braces: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for tag in TAG_RE.find_iter(text) {
        push_text(&mut out, &text[last..tag.start()], escape_braces);
        out.push_str(&normalize_tag(tag.as_str()));
        last = tag.end();
    }
    push_text(&mut out, &text[last..], escape_braces);
    out
}

/// Append text between tags.
fn push_text(out: &mut String, text: &str, escape_braces: bool) {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if escape_braces && chars.peek() == Some(&'{') => {
                chars.next();
                out.push_str(r"\{\{");
            }
            '}' if escape_braces && chars.peek() == Some(&'}') => {
                chars.next();
                out.push_str(r"\}\}");
            }
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            _ => out.push(c),
        }
    }
}

fn normalize_tag(tag: &str) -> String {
    let tag = STYLE_ATTR_RE.replace_all(tag, "");
    match VOID_TAG_RE.captures(&tag) {
        Some(caps) => format!("<{}{} />", &caps[1], &caps[2]),
        None => tag.into_owned(),
    }
}
