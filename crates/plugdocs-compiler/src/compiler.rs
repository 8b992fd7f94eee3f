//! Memoized page compilation.

use std::sync::Arc;

use plugdocs_cache::Memo;
use sha2::{Digest, Sha256};

use crate::frontmatter::split_front_matter;
use crate::normalize::normalize;
use crate::page::CompiledPage;
use crate::render::render_markdown;
use crate::CompileError;

/// Compiles markdown into [`CompiledPage`]s, once per distinct input.
///
/// Compilation never fails: documents with broken front matter produce
/// [`CompiledPage::fallback`], which is memoized like any other result.
#[derive(Debug, Default)]
pub struct Compiler {
    memo: Memo<String, CompiledPage>,
}

impl Compiler {
    /// Create a compiler with an empty memo.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `source`, identified by `path` for logging and memoization.
    pub fn compile(&self, path: &str, source: &str) -> Arc<CompiledPage> {
        self.memo.get_or_compute(memo_key(path, source), || {
            match compile_page(source) {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!(path, error = %e, "Failed to compile page");
                    CompiledPage::fallback(&e.to_string())
                }
            }
        })
    }

    /// Number of memoized compilations.
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    /// Whether nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    /// Forget all memoized compilations.
    pub fn clear(&self) {
        self.memo.clear();
    }
}

/// Hash of path and source; the length prefix keeps the pair unambiguous.
fn memo_key(path: &str, source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{path}:", path.len()));
    hasher.update(source);
    hex::encode(hasher.finalize())
}

fn compile_page(source: &str) -> Result<CompiledPage, CompileError> {
    let (meta, body) = split_front_matter(source)?;
    let rendered = render_markdown(&normalize(body));

    Ok(CompiledPage {
        title: meta.title.or(rendered.title),
        description: meta.description,
        toc: rendered.toc,
        html: rendered.html,
        source: meta.source.filter(|s| !s.trim().is_empty()),
        full: meta.full,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::FALLBACK_TITLE;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compile_extracts_metadata() {
        let compiler = Compiler::new();
        let page = compiler.compile(
            "widgets/1.x/installation",
            "---\ndescription: Setup steps\n---\n# Installation\n\n## Requirements\n\nPHP 8.2\n",
        );

        assert_eq!(page.title.as_deref(), Some("Installation"));
        assert_eq!(page.description.as_deref(), Some("Setup steps"));
        assert_eq!(page.toc.len(), 1);
        assert_eq!(page.toc[0].id, "requirements");
        assert!(page.html.contains("<p>PHP 8.2</p>"));
        assert!(!page.is_fallback());
    }

    #[test]
    fn test_front_matter_title_wins() {
        let compiler = Compiler::new();
        let page = compiler.compile("a", "---\ntitle: Custom\n---\n# Heading\n");

        assert_eq!(page.title.as_deref(), Some("Custom"));
        assert!(page.toc.is_empty());
    }

    #[test]
    fn test_same_input_is_memoized() {
        let compiler = Compiler::new();
        let first = compiler.compile("a", "# Same");
        let second = compiler.compile("a", "# Same");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(compiler.len(), 1);
    }

    #[test]
    fn test_different_path_is_separate_entry() {
        let compiler = Compiler::new();
        let first = compiler.compile("a", "# Same");
        let second = compiler.compile("b", "# Same");

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
        assert_eq!(compiler.len(), 2);
    }

    #[test]
    fn test_memo_key_is_unambiguous() {
        assert_ne!(memo_key("a:b", "c"), memo_key("a", "b:c"));
    }

    #[test]
    fn test_broken_front_matter_falls_back() {
        let compiler = Compiler::new();
        let page = compiler.compile("broken", "---\ntitle: [oops\n---\nBody\n");

        assert!(page.is_fallback());
        assert_eq!(page.title.as_deref(), Some(FALLBACK_TITLE));
        assert!(page.html.contains("Content Compilation Error"));

        let again = compiler.compile("broken", "---\ntitle: [oops\n---\nBody\n");
        assert!(Arc::ptr_eq(&page, &again));
    }

    #[test]
    fn test_source_redirect_and_normalization() {
        let compiler = Compiler::new();
        let page = compiler.compile(
            "a",
            "---\nsource: widgets/1.x/overview\nfull: true\n---\nSee {{ x }}<br>\n",
        );

        assert_eq!(page.source.as_deref(), Some("widgets/1.x/overview"));
        assert!(page.full);
        assert!(page.html.contains("{{ x }}"));
    }

    #[test]
    fn test_raw_html_keeps_template_braces() {
        let compiler = Compiler::new();
        let page = compiler.compile(
            "a",
            "<div align=\"center\">\n{{ name }}\n</div>\n\n<a href=\"https://x.test/{{v}}\">link</a>\n",
        );

        assert!(!page.html.contains(r"\{\{"));
        assert!(page.html.contains("<div align=\"center\">\n{{ name }}\n</div>"));
        assert!(page.html.contains(r#"<a href="https://x.test/{{v}}">link</a>"#));
    }

    #[test]
    fn test_clear() {
        let compiler = Compiler::new();
        compiler.compile("a", "x");
        compiler.clear();
        assert!(compiler.is_empty());
    }
}
