use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::mode::BuildMode;

pub const NAME_PLACEHOLDER: &str = "[name]";
pub const HASH_PLACEHOLDER: &str = "[hash]";
pub const EXT_PLACEHOLDER: &str = "[ext]";

/// Hex characters of the content digest substituted for `[hash]`.
pub const HASH_LENGTH: usize = 20;

/// File-name template handed to the bundler for emitted bundles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamingPattern(String);

impl NamingPattern {
    /// `[name].<ext>` in development, `[name].[hash].<ext>` in production.
    pub fn for_mode(mode: BuildMode, extension: &str) -> Self {
        let ext = extension.trim().trim_start_matches('.');
        match mode {
            BuildMode::Development => Self(format!("{NAME_PLACEHOLDER}.{ext}")),
            BuildMode::Production => Self(format!("{NAME_PLACEHOLDER}.{HASH_PLACEHOLDER}.{ext}")),
        }
    }

    /// Name template used by file-emission stages. Never hash-qualified.
    pub fn asset() -> Self {
        Self(format!("{NAME_PLACEHOLDER}.{EXT_PLACEHOLDER}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn hash_placeholders(&self) -> usize {
        self.0.matches(HASH_PLACEHOLDER).count()
    }

    /// Expands the template for one emitted file. The hash is derived from
    /// `content` only, so unchanged content keeps its name across builds.
    pub fn render(&self, name: &str, extension: &str, content: &[u8]) -> String {
        let mut rendered = self
            .0
            .replace(NAME_PLACEHOLDER, name)
            .replace(EXT_PLACEHOLDER, extension.trim_start_matches('.'));
        if rendered.contains(HASH_PLACEHOLDER) {
            rendered = rendered.replace(HASH_PLACEHOLDER, &content_hash(content));
        }
        rendered
    }
}

impl fmt::Display for NamingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let mut digest = format!("{:x}", hasher.finalize());
    digest.truncate(HASH_LENGTH);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_is_content_derived() {
        let pattern = NamingPattern::for_mode(BuildMode::Production, "js");
        let first = pattern.render("main", "js", b"console.log(1)");
        let again = pattern.render("main", "js", b"console.log(1)");
        let changed = pattern.render("main", "js", b"console.log(2)");
        assert_eq!(first, again);
        assert_ne!(first, changed);
        assert!(first.starts_with("main."));
        assert!(first.ends_with(".js"));
        assert_eq!(first.len(), "main..js".len() + HASH_LENGTH);
    }

    #[test]
    fn asset_pattern_substitutes_extension() {
        let rendered = NamingPattern::asset().render("logo", ".png", b"\x89PNG");
        assert_eq!(rendered, "logo.png");
    }
}
