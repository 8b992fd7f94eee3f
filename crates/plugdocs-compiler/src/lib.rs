//! Markdown page compiler.
//!
//! Turns repository markdown into render-ready [`CompiledPage`]s:
//!
//! 1. [`normalize`] cleans GitHub-flavored quirks out of the source
//! 2. YAML front matter is split off into [`FrontMatter`]
//! 3. The body is rendered to HTML with unique heading ids and a table of contents
//!
//! Results are memoized per path and source. A document that cannot be
//! compiled yields an error page instead of failing the request.
//!
//! # Example
//!
//! ```
//! use plugdocs_compiler::Compiler;
//!
//! let compiler = Compiler::new();
//! let page = compiler.compile("widgets/1.x/readme", "# Widgets\n\n## Usage\n");
//! assert_eq!(page.title.as_deref(), Some("Widgets"));
//! assert_eq!(page.toc[0].id, "usage");
//! ```

mod compiler;
mod frontmatter;
mod heading;
mod normalize;
mod page;
mod render;

pub use compiler::Compiler;
pub use frontmatter::{FrontMatter, split_front_matter};
pub use heading::{TocEntry, escape_html, slugify};
pub use normalize::normalize;
pub use page::{CompiledPage, FALLBACK_DESCRIPTION, FALLBACK_TITLE};

/// Reasons a document cannot be compiled.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Opening `---` without a closing delimiter.
    #[error("front matter is not terminated")]
    UnterminatedFrontMatter,
    /// Front matter is not valid YAML or has mistyped fields.
    #[error("invalid front matter: {0}")]
    InvalidFrontMatter(#[from] serde_yaml::Error),
    /// Front matter parsed to something other than a mapping.
    #[error("front matter must be a mapping")]
    FrontMatterNotMapping,
}
