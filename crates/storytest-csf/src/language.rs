//! Source dialect detection
//!
//! Story modules are TypeScript or JavaScript, with or without JSX.
//! Both are parsed with the tree-sitter TypeScript grammars.

use std::path::Path;

/// Grammar used to parse a story module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    /// Plain TypeScript (no JSX; allows `<T>expr` assertions)
    TypeScript,
    /// TSX grammar, also used for JavaScript since it accepts JSX
    Tsx,
}

impl SourceLanguage {
    /// Get file extensions for this grammar
    #[inline]
    #[must_use]
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            SourceLanguage::TypeScript => &["ts", "mts", "cts"],
            SourceLanguage::Tsx => &["tsx", "js", "jsx", "mjs", "cjs"],
        }
    }

    /// Detect grammar from file extension
    ///
    /// Unknown extensions fall back to TSX, the more permissive grammar
    /// for JavaScript-like sources.
    #[inline]
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.');
        if SourceLanguage::TypeScript.extensions().contains(&ext) {
            SourceLanguage::TypeScript
        } else {
            SourceLanguage::Tsx
        }
    }

    /// Detect grammar from a file path
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(SourceLanguage::Tsx, Self::from_extension)
    }

    /// Get tree-sitter language
    #[inline]
    #[must_use]
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self {
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

impl std::fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceLanguage::TypeScript => "TypeScript",
            SourceLanguage::Tsx => "TSX",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_from_extension() {
        assert_eq!(SourceLanguage::from_extension("ts"), SourceLanguage::TypeScript);
        assert_eq!(SourceLanguage::from_extension(".mts"), SourceLanguage::TypeScript);
        assert_eq!(SourceLanguage::from_extension("tsx"), SourceLanguage::Tsx);
        assert_eq!(SourceLanguage::from_extension("jsx"), SourceLanguage::Tsx);
        assert_eq!(SourceLanguage::from_extension("unknown"), SourceLanguage::Tsx);
    }

    #[test]
    fn language_from_path() {
        let ts = SourceLanguage::from_path(Path::new("src/Button.stories.ts"));
        assert_eq!(ts, SourceLanguage::TypeScript);

        let js = SourceLanguage::from_path(Path::new("src/Button.stories.js"));
        assert_eq!(js, SourceLanguage::Tsx);

        let bare = SourceLanguage::from_path(Path::new("Button"));
        assert_eq!(bare, SourceLanguage::Tsx);
    }
}
