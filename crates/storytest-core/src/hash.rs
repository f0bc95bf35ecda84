//! Cache keys for transformed modules

use std::fmt::{self, Display, Formatter};
use std::path::Path;

/// Blake3 hash of a module's path and source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceHash([u8; 32]);

impl SourceHash {
    /// Hash a file path together with its contents
    ///
    /// The path takes part because titles derive from it.
    #[must_use]
    pub fn compute(path: &Path, source: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update(&[0]);
        hasher.update(source.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Raw bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for SourceHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_same_hash() {
        let a = SourceHash::compute(Path::new("a.stories.tsx"), "export default {};");
        let b = SourceHash::compute(Path::new("a.stories.tsx"), "export default {};");
        assert_eq!(a, b);
        assert_eq!(a.to_string().len(), 64);
        assert_eq!(a.short().len(), 16);
    }

    #[test]
    fn path_changes_hash() {
        let a = SourceHash::compute(Path::new("a.stories.tsx"), "x");
        let b = SourceHash::compute(Path::new("b.stories.tsx"), "x");
        assert_ne!(a, b);
    }

    #[test]
    fn boundary_between_path_and_source() {
        let a = SourceHash::compute(Path::new("ab"), "c");
        let b = SourceHash::compute(Path::new("a"), "bc");
        assert_ne!(a, b);
    }
}
