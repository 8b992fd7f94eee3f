//! YAML front matter extraction.

use serde::Deserialize;

use crate::CompileError;

/// Page fields recognized in front matter. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FrontMatter {
    /// Page title, overrides the first H1.
    pub title: Option<String>,
    /// Page description.
    pub description: Option<String>,
    /// Slug path of another page whose content should be shown instead.
    pub source: Option<String>,
    /// Render without the table of contents column.
    pub full: bool,
}

/// Split a leading `---` front matter block from the markdown body.
///
/// The block must start on the first line and end with a `---` or `...` line.
/// Documents without front matter return the default and the whole input.
pub fn split_front_matter(source: &str) -> Result<(FrontMatter, &str), CompileError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let Some(after_open) = strip_delimiter_line(source, "---") else {
        return Ok((FrontMatter::default(), source));
    };

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return Ok((parse_yaml(yaml)?, body));
        }
        offset += line.len();
    }
    Err(CompileError::UnterminatedFrontMatter)
}

/// Strip `delimiter` if it is alone on the first line.
fn strip_delimiter_line<'a>(source: &'a str, delimiter: &str) -> Option<&'a str> {
    let (first, rest) = match source.find('\n') {
        Some(idx) => (&source[..idx], &source[idx + 1..]),
        None => (source, ""),
    };
    (first.trim_end() == delimiter).then_some(rest)
}

fn parse_yaml(yaml: &str) -> Result<FrontMatter, CompileError> {
    let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    match value {
        serde_yaml::Value::Null => Ok(FrontMatter::default()),
        serde_yaml::Value::Mapping(_) => Ok(serde_yaml::from_value(value)?),
        _ => Err(CompileError::FrontMatterNotMapping),
    }
}
