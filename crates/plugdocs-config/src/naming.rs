//! Naming helpers shared by configuration and page aggregation.

/// File name without its last extension.
///
/// `"Getting Started.md"` becomes `"Getting Started"`; names without a dot are
/// returned unchanged.
pub fn base_file_name(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// URL slug for a file name: base name, whitespace runs as `-`, lowercased.
pub fn file_slug(name: &str) -> String {
    slugify_words(base_file_name(name))
}

/// Lowercase a label and join its whitespace-separated words with `-`.
pub fn slugify_words(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Human-readable name for a repository, e.g. `filament-tree` → `Filament Tree`.
pub fn display_name_from_repo(repo: &str) -> String {
    repo.split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title derived from a (possibly nested) file path.
///
/// Uses the last path segment without extension, treats `-` and `_` as word
/// separators and title-cases each word: `guides/getting_started.md` becomes
/// `Getting Started`.
pub fn title_from_file(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    base_file_name(name)
        .split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| capitalize(&word.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_file_name() {
        assert_eq!(base_file_name("README.md"), "README");
        assert_eq!(base_file_name("archive.tar.gz"), "archive.tar");
        assert_eq!(base_file_name("LICENSE"), "LICENSE");
    }

    #[test]
    fn test_file_slug() {
        assert_eq!(file_slug("README.md"), "readme");
        assert_eq!(file_slug("Getting  Started.md"), "getting-started");
        assert_eq!(file_slug("CHANGELOG"), "changelog");
    }

    #[test]
    fn test_display_name_from_repo() {
        assert_eq!(display_name_from_repo("filament-tree"), "Filament Tree");
        assert_eq!(
            display_name_from_repo("filament-cms-website-plugin"),
            "Filament Cms Website Plugin"
        );
    }

    #[test]
    fn test_title_from_file() {
        assert_eq!(title_from_file("README.md"), "Readme");
        assert_eq!(
            title_from_file("guides/getting_started.md"),
            "Getting Started"
        );
        assert_eq!(title_from_file("advanced-usage.mdx"), "Advanced Usage");
    }
}
