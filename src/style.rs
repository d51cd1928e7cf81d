use crate::error::ConfigError;
use crate::persistence::{to_pretty_json, write_atomic};
use serde_json::{json, Map, Value};
use std::path::Path;

pub const STYLE_FILE_NAME: &str = "theme.json";

/// Named colour and font tokens consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTable {
    tokens: Map<String, Value>,
}

impl Default for StyleTable {
    fn default() -> Self {
        let defaults = json!({
            "color": "#ffe7e7",
            "background-color": "#367582",
            "font-family": "Titillium Web",
            "QPushButton": { "background-color": "#c6b9e8" },
            "QPushButton:checked": { "background-color": "#64826d" },
            "QPushButton:pressed": { "background-color": "#4b3d82" },
            "QPushButton:disabled": { "background-color": "#333333" },
            "QPushButton:hover": { "border-color": "#4488BB" },
            "QStatusBar": { "background-color": "#18529a" },
            "Custom": {
                "middleground-color": "#106c94",
                "invalid-color": "#FF0000",
                "selected-background-color": "#087e06"
            }
        });
        let tokens = match defaults {
            Value::Object(tokens) => tokens,
            _ => Map::new(),
        };
        Self { tokens }
    }
}

impl StyleTable {
    /// Look up a token, optionally inside a section (`"Custom"`).
    pub fn get(&self, section: Option<&str>, token: &str) -> Option<&str> {
        let table = match section {
            Some(name) => self.tokens.get(name)?.as_object()?,
            None => &self.tokens,
        };
        table.get(token)?.as_str()
    }

    pub fn set(&mut self, section: Option<&str>, token: &str, value: &str) {
        let table = match section {
            Some(name) => {
                let entry = self
                    .tokens
                    .entry(name.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !entry.is_object() {
                    *entry = Value::Object(Map::new());
                }
                match entry.as_object_mut() {
                    Some(table) => table,
                    None => return,
                }
            }
            None => &mut self.tokens,
        };
        table.insert(token.to_string(), Value::String(value.to_string()));
    }

    /// Merge a style file over the current tokens. Nested sections merge
    /// key by key; anything absent from the file keeps its value.
    pub fn load(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        self.load_str(&content)
    }

    pub fn load_str(&mut self, content: &str) -> Result<(), ConfigError> {
        let loaded: Value = serde_json::from_str(content)?;
        let Value::Object(loaded) = loaded else {
            return Err(ConfigError::NotAnObject);
        };
        merge(&mut self.tokens, loaded);
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = to_pretty_json(&self.tokens)?;
        write_atomic(path, json.as_bytes())
    }
}

fn merge(into: &mut Map<String, Value>, from: Map<String, Value>) {
    for (key, value) in from {
        match value {
            Value::Object(incoming) => {
                if let Some(Value::Object(existing)) = into.get_mut(&key) {
                    merge(existing, incoming);
                } else {
                    into.insert(key, Value::Object(incoming));
                }
            }
            value => {
                into.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_sections_merge_key_by_key() {
        let mut style = StyleTable::default();
        style
            .load_str(r##"{"color": "#000000", "Custom": {"invalid-color": "#00FF00"}}"##)
            .expect("load");
        assert_eq!(style.get(None, "color"), Some("#000000"));
        assert_eq!(style.get(Some("Custom"), "invalid-color"), Some("#00FF00"));
        assert_eq!(style.get(Some("Custom"), "middleground-color"), Some("#106c94"));
        assert_eq!(style.get(None, "font-family"), Some("Titillium Web"));
    }

    #[test]
    fn save_then_load_keeps_edits() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(STYLE_FILE_NAME);
        let mut style = StyleTable::default();
        style.set(Some("QStatusBar"), "background-color", "#123456");
        style.save(&path).expect("save");

        let mut reloaded = StyleTable::default();
        reloaded.load(&path).expect("load");
        assert_eq!(reloaded, style);
    }

    #[test]
    fn failed_load_changes_nothing() {
        let mut style = StyleTable::default();
        assert!(style.load_str("not json").is_err());
        assert_eq!(style, StyleTable::default());
    }
}
