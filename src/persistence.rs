//! Configuration <-> JSON file mapping, startup file selection and
//! corrupted-file recovery.

use crate::config::{self, BuiltinAction, ClickBinding, Configuration, PointerAction};
use crate::error::ConfigError;
use crate::frontend::FilePicker;
use crate::hotkey;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const CONFIG_DIR_NAME: &str = "configs";
pub const DEFAULT_CONFIG_FILE_NAME: &str = "config.json";

/// How the startup configuration was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateStatus {
    /// No config file existed; a default one was written.
    Created,
    Loaded,
    /// The chosen file could not be loaded; defaults were written to a new file.
    Recovered { corrupted: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Located {
    pub path: PathBuf,
    pub config: Configuration,
    pub status: LocateStatus,
}

impl Located {
    /// Message surfaced once to the user after a failed load.
    pub fn status_message(&self) -> Option<String> {
        match self.status {
            LocateStatus::Recovered { .. } => Some(corrupted_message(&self.path)),
            _ => None,
        }
    }
}

pub fn corrupted_message(new_path: &Path) -> String {
    let name = new_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("Config file corrupted, use a new \"{name}\" file")
}

/// All `*.json` files directly inside `dir`, sorted by name.
pub fn list_config_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::io(dir, e))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

/// `config.json` when free, else the lowest free `config<N>.json`.
pub fn next_config_file_name(dir: &Path) -> PathBuf {
    let first = dir.join(DEFAULT_CONFIG_FILE_NAME);
    if !first.exists() {
        return first;
    }
    (1u32..)
        .map(|n| dir.join(format!("config{n}.json")))
        .find(|path| !path.exists())
        .unwrap_or(first)
}

/// Pick and load the startup configuration from `dir`.
///
/// Returns `Ok(None)` when several files exist and the picker chose none;
/// the caller is expected to exit.
pub fn locate_and_load(
    dir: &Path,
    picker: &mut dyn FilePicker,
) -> Result<Option<Located>, ConfigError> {
    std::fs::create_dir_all(dir).map_err(|e| ConfigError::io(dir, e))?;
    let files = list_config_files(dir)?;

    let chosen = match files.len() {
        0 => {
            let path = dir.join(DEFAULT_CONFIG_FILE_NAME);
            let config = Configuration::default();
            if let Err(err) = save(&config, &path) {
                tracing::error!(%err, "failed to write the default config file");
            }
            tracing::info!(path = %path.display(), "new config file created");
            return Ok(Some(Located {
                path,
                config,
                status: LocateStatus::Created,
            }));
        }
        1 => files[0].clone(),
        _ => match picker.pick_config(dir, &files) {
            Some(path) => path,
            None => {
                tracing::warn!("no config file has been selected");
                return Ok(None);
            }
        },
    };

    let mut config = Configuration::default();
    match load(&mut config, &chosen) {
        Ok(()) => Ok(Some(Located {
            path: chosen,
            config,
            status: LocateStatus::Loaded,
        })),
        Err(err) => {
            tracing::error!(path = %chosen.display(), %err, "config file loading failed");
            let path = next_config_file_name(dir);
            let config = Configuration::default();
            if let Err(err) = save(&config, &path) {
                tracing::error!(%err, "failed to write the replacement config file");
            }
            Ok(Some(Located {
                path,
                config,
                status: LocateStatus::Recovered { corrupted: chosen },
            }))
        }
    }
}

/// Load `path` into `config`. On any error `config` is left untouched.
pub fn load(config: &mut Configuration, path: &Path) -> Result<(), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    load_str(config, &content)?;
    tracing::info!(
        dir = %path.parent().unwrap_or(Path::new("")).display(),
        file = %path.file_name().unwrap_or_default().to_string_lossy(),
        "config opened"
    );
    Ok(())
}

/// Merge a JSON document into `config`.
///
/// Every required key must be present. Scalars and the `hotkeys` and
/// `shortcuts.custom` tables are replaced; `shortcuts.builtin` is merged
/// per action so that files written before an action existed keep working.
pub fn load_str(config: &mut Configuration, content: &str) -> Result<(), ConfigError> {
    let root: Value = serde_json::from_str(content)?;
    let root = root.as_object().ok_or(ConfigError::NotAnObject)?;

    let radius: i32 = field(root, "radius", "radius")?;
    let last_position: Option<(i32, i32)> = field(root, "last_position", "last_position")?;
    let last_setting_menu: Option<String> =
        field(root, "last_setting_menu", "last_setting_menu")?;
    let hotkeys = root
        .get("hotkeys")
        .ok_or(ConfigError::MissingKey("hotkeys"))?;
    let shortcuts = root
        .get("shortcuts")
        .and_then(Value::as_object)
        .ok_or(ConfigError::MissingKey("shortcuts"))?;
    let builtin: BTreeMap<String, String> = field(shortcuts, "builtin", "shortcuts.builtin")?;
    let custom: BTreeMap<String, PointerAction> = field(shortcuts, "custom", "shortcuts.custom")?;

    let mut next = config.clone();
    next.radius = config::clamp_radius(radius);
    if next.radius != radius {
        tracing::warn!(radius, clamped = next.radius, "radius out of range");
    }
    next.last_position = last_position;
    next.last_setting_menu = last_setting_menu;
    next.hotkeys = parse_hotkeys(hotkeys)?;

    for (name, shortcut) in builtin {
        match BuiltinAction::from_name(&name) {
            Some(action) => {
                next.shortcuts.builtin.insert(action, shortcut);
            }
            None => tracing::warn!(%name, "ignoring unknown builtin shortcut"),
        }
    }

    next.shortcuts.custom.clear();
    for (shortcut, action) in custom {
        let key = hotkey::normalize(&shortcut);
        if next.shortcuts.custom.insert(key.clone(), action).is_some() {
            return Err(ConfigError::Conflict(key));
        }
    }

    next.validate()?;
    trace_loaded(&next);
    *config = next;
    Ok(())
}

fn field<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    key: &str,
    label: &'static str,
) -> Result<T, ConfigError> {
    let value = obj.get(key).ok_or(ConfigError::MissingKey(label))?;
    Ok(T::deserialize(value)?)
}

fn parse_hotkeys(value: &Value) -> Result<BTreeMap<String, ClickBinding>, ConfigError> {
    let table = value.as_object().ok_or_else(|| ConfigError::InvalidBinding {
        shortcut: String::new(),
        reason: "\"hotkeys\" is not an object".into(),
    })?;
    let mut hotkeys = BTreeMap::new();
    for (shortcut, entry) in table {
        let binding =
            ClickBinding::deserialize(entry).map_err(|err| ConfigError::InvalidBinding {
                shortcut: shortcut.clone(),
                reason: err.to_string(),
            })?;
        let key = hotkey::normalize(shortcut);
        if hotkeys.insert(key.clone(), binding).is_some() {
            return Err(ConfigError::Conflict(key));
        }
    }
    Ok(hotkeys)
}

fn trace_loaded(config: &Configuration) {
    tracing::info!(radius = config.radius, "loaded radius");
    tracing::info!(last_position = ?config.last_position, "loaded last position");
    tracing::info!(last_setting_menu = ?config.last_setting_menu, "loaded last setting menu");
    for (shortcut, b) in &config.hotkeys {
        tracing::info!(
            "loaded hotkey: [\"{shortcut}\": {:?}, ({};{})] <{};{}>",
            b.kind,
            b.x,
            b.y,
            b.w,
            b.h
        );
    }
    for (action, shortcut) in &config.shortcuts.builtin {
        tracing::info!("loaded builtin shortcut: [{action}: {shortcut}]");
    }
    for (shortcut, action) in &config.shortcuts.custom {
        tracing::info!("loaded custom shortcut: [{shortcut}: {action:?}]");
    }
}

/// Serialize with the four-space indentation used by every file we write.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn save(config: &Configuration, path: &Path) -> Result<(), ConfigError> {
    let json = to_pretty_json(config)?;
    write_atomic(path, json.as_bytes())
}

/// Write to a temporary sibling file and rename it over `path`.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ConfigError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|e| ConfigError::io(&parent, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| ConfigError::io(&parent, e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| ConfigError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| ConfigError::io(path, e.error))?;
    Ok(())
}

/// Drop everything and go back to the compiled-in defaults.
pub fn reset(config: &mut Configuration) {
    *config = Configuration::default();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClickBinding;

    #[test]
    fn next_name_skips_used_indices() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert_eq!(next_config_file_name(dir.path()), dir.path().join("config.json"));

        std::fs::write(dir.path().join("config.json"), "{}").unwrap();
        std::fs::write(dir.path().join("config2.json"), "{}").unwrap();
        assert_eq!(next_config_file_name(dir.path()), dir.path().join("config1.json"));

        std::fs::write(dir.path().join("config1.json"), "{}").unwrap();
        assert_eq!(next_config_file_name(dir.path()), dir.path().join("config3.json"));
    }

    #[test]
    fn saved_file_uses_four_space_indent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        save(&Configuration::default(), &path).expect("save");
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"radius\": 60,"));
    }

    #[test]
    fn load_lowercases_keys() {
        let mut config = Configuration::default();
        config.hotkeys.insert("Q".into(), ClickBinding::new(5, 5, 10, 10));
        let json = to_pretty_json(&config).unwrap();

        let mut loaded = Configuration::default();
        load_str(&mut loaded, &json).expect("load");
        assert!(loaded.hotkeys.contains_key("q"));
    }

    #[test]
    fn load_rejects_missing_coordinates() {
        let json = r#"{
            "radius": 60, "last_position": null, "last_setting_menu": null,
            "hotkeys": {"a": {"type": "Click", "x": 1, "y": 2, "w": 3}},
            "shortcuts": {"builtin": {}, "custom": {}}
        }"#;
        let mut config = Configuration::default();
        let err = load_str(&mut config, json).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBinding { ref shortcut, .. } if shortcut == "a"));
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn load_clamps_radius() {
        let mut config = Configuration::default();
        config.radius = 0;
        let json = to_pretty_json(&config).unwrap();

        let mut loaded = Configuration::default();
        load_str(&mut loaded, &json).expect("load");
        assert_eq!(loaded.radius, config::MIN_RADIUS);
    }

    #[test]
    fn load_rejects_non_object_root() {
        let mut config = Configuration::default();
        assert!(matches!(load_str(&mut config, "[1, 2]"), Err(ConfigError::NotAnObject)));
    }
}
