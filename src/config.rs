use serde::{Deserialize, Serialize};

/// Tunables of the editing engine. Every field has a default, so a config
/// file only needs to name what it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Treat an empty paragraph right after a blockquote as a regular
    /// vertical stop instead of skipping it.
    pub prefer_top_level_gap: bool,
    /// Display width of a tab inside code blocks, used for column tracking.
    pub code_tab_width: usize,
    /// Text inserted by Tab inside a code block.
    pub code_indent: String,
    /// Opening fence that turns a paragraph into a code block on Enter.
    pub fence_marker: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            prefer_top_level_gap: true,
            code_tab_width: 4,
            code_indent: "\t".to_string(),
            fence_marker: "```".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{ "code_tab_width": 8 }"#).unwrap();
        assert_eq!(config.code_tab_width, 8);
        assert!(config.prefer_top_level_gap);
        assert_eq!(config.fence_marker, "```");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let config = EditorConfig::from_json(r#"{ "theme": "dark" }"#).unwrap();
        assert_eq!(config, EditorConfig::default());
    }
}
