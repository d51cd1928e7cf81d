use crate::error::ConfigError;
use crate::hotkey::{self, PointerButton};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Size given to freshly created markers.
pub const DEFAULT_RADIUS: i32 = 60;

/// Range the default marker size is kept in.
pub const MIN_RADIUS: i32 = 50;
pub const MAX_RADIUS: i32 = 400;

pub fn clamp_radius(radius: i32) -> i32 {
    radius.clamp(MIN_RADIUS, MAX_RADIUS)
}

/// Application commands that always carry a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuiltinAction {
    New,
    Open,
    #[serde(rename = "Save As...")]
    SaveAs,
    Settings,
    #[serde(rename = "New Hotkey")]
    NewHotkey,
    Start,
    #[serde(rename = "Disable Hotkeys")]
    DisableHotkeys,
    #[serde(rename = "Restore Application")]
    RestoreApplication,
}

impl BuiltinAction {
    pub const ALL: [BuiltinAction; 8] = [
        BuiltinAction::New,
        BuiltinAction::Open,
        BuiltinAction::SaveAs,
        BuiltinAction::Settings,
        BuiltinAction::NewHotkey,
        BuiltinAction::Start,
        BuiltinAction::DisableHotkeys,
        BuiltinAction::RestoreApplication,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinAction::New => "New",
            BuiltinAction::Open => "Open",
            BuiltinAction::SaveAs => "Save As...",
            BuiltinAction::Settings => "Settings",
            BuiltinAction::NewHotkey => "New Hotkey",
            BuiltinAction::Start => "Start",
            BuiltinAction::DisableHotkeys => "Disable Hotkeys",
            BuiltinAction::RestoreApplication => "Restore Application",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }

    pub fn default_shortcut(self) -> &'static str {
        match self {
            BuiltinAction::New => "CTRL+N",
            BuiltinAction::Open => "CTRL+O",
            BuiltinAction::SaveAs => "CTRL+S",
            BuiltinAction::Settings => "CTRL+ALT+S",
            BuiltinAction::NewHotkey => "N",
            BuiltinAction::Start => "S",
            BuiltinAction::DisableHotkeys => "*",
            BuiltinAction::RestoreApplication => "CTRL+ALT+R",
        }
    }
}

impl fmt::Display for BuiltinAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingKind {
    Click,
}

/// Marker binding: centre coordinates and pixel size of the marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickBinding {
    #[serde(rename = "type")]
    pub kind: BindingKind,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl ClickBinding {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            kind: BindingKind::Click,
            x,
            y,
            w,
            h,
        }
    }

    /// Screen point the synthetic click lands on.
    pub fn click_point(&self) -> (i32, i32) {
        (self.x - self.w / 2, self.y - self.h / 2)
    }

    pub fn has_valid_size(&self) -> bool {
        self.w > 0 && self.h > 0
    }
}

/// Pointer action a custom shortcut fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerAction {
    LeftButton,
    RightButton,
}

impl PointerAction {
    pub fn button(self) -> PointerButton {
        match self {
            PointerAction::LeftButton => PointerButton::Left,
            PointerAction::RightButton => PointerButton::Right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcuts {
    pub builtin: BTreeMap<BuiltinAction, String>,
    pub custom: BTreeMap<String, PointerAction>,
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            builtin: BuiltinAction::ALL
                .into_iter()
                .map(|action| (action, action.default_shortcut().to_string()))
                .collect(),
            custom: BTreeMap::new(),
        }
    }
}

/// The whole persisted state: markers, shortcuts and a few UI leftovers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub radius: i32,
    pub last_position: Option<(i32, i32)>,
    /// Last settings page the user opened. Only the presentation layer reads it.
    pub last_setting_menu: Option<String>,
    pub hotkeys: BTreeMap<String, ClickBinding>,
    pub shortcuts: Shortcuts,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            last_position: None,
            last_setting_menu: None,
            hotkeys: BTreeMap::new(),
            shortcuts: Shortcuts::default(),
        }
    }
}

impl Configuration {
    /// Shortcut bound to a builtin action, falling back to its default.
    pub fn builtin(&self, action: BuiltinAction) -> &str {
        self.shortcuts
            .builtin
            .get(&action)
            .map(String::as_str)
            .unwrap_or_else(|| action.default_shortcut())
    }

    /// Builtin action bound to `shortcut`, if any. The first action in
    /// declaration order wins when two share a shortcut.
    pub fn builtin_for(&self, shortcut: &str) -> Option<BuiltinAction> {
        BuiltinAction::ALL
            .into_iter()
            .find(|action| hotkey::same_shortcut(self.builtin(*action), shortcut))
    }

    pub fn click_binding(&self, shortcut: &str) -> Option<&ClickBinding> {
        self.hotkeys.get(&hotkey::normalize(shortcut))
    }

    pub fn custom_action(&self, shortcut: &str) -> Option<PointerAction> {
        self.shortcuts.custom.get(&hotkey::normalize(shortcut)).copied()
    }

    /// `true` when `shortcut` is taken by a marker or a custom shortcut.
    pub fn is_bound(&self, shortcut: &str) -> bool {
        self.click_binding(shortcut).is_some() || self.custom_action(shortcut).is_some()
    }

    /// Check the structural invariants a loaded file must satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (shortcut, binding) in &self.hotkeys {
            if !binding.has_valid_size() {
                return Err(ConfigError::InvalidBinding {
                    shortcut: shortcut.clone(),
                    reason: format!("size {}x{} is not positive", binding.w, binding.h),
                });
            }
            if self.shortcuts.custom.contains_key(shortcut) {
                return Err(ConfigError::Conflict(shortcut.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_every_builtin() {
        let config = Configuration::default();
        assert_eq!(config.radius, 60);
        for action in BuiltinAction::ALL {
            assert_eq!(config.builtin(action), action.default_shortcut());
        }
        assert!(config.hotkeys.is_empty());
        assert!(config.shortcuts.custom.is_empty());
    }

    #[test]
    fn builtin_lookup_is_case_insensitive() {
        let config = Configuration::default();
        assert_eq!(config.builtin_for("ctrl+alt+s"), Some(BuiltinAction::Settings));
        assert_eq!(config.builtin_for("*"), Some(BuiltinAction::DisableHotkeys));
        assert_eq!(config.builtin_for("ctrl+q"), None);
    }

    #[test]
    fn click_point_is_offset_by_half_the_box() {
        let binding = ClickBinding::new(200, 100, 60, 40);
        assert_eq!(binding.click_point(), (170, 80));
    }

    #[test]
    fn serializes_with_expected_layout() {
        let mut config = Configuration::default();
        config.hotkeys.insert("a".into(), ClickBinding::new(1, 2, 3, 4));
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["hotkeys"]["a"]["type"], "Click");
        assert_eq!(value["shortcuts"]["builtin"]["Save As..."], "CTRL+S");
        assert_eq!(value["last_position"], serde_json::Value::Null);
    }

    #[test]
    fn radius_is_kept_in_range() {
        assert_eq!(clamp_radius(0), MIN_RADIUS);
        assert_eq!(clamp_radius(-20), MIN_RADIUS);
        assert_eq!(clamp_radius(90), 90);
        assert_eq!(clamp_radius(1000), MAX_RADIUS);
    }

    #[test]
    fn validate_rejects_overlap_and_bad_size() {
        let mut config = Configuration::default();
        config.hotkeys.insert("k".into(), ClickBinding::new(0, 0, 0, 10));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBinding { .. })
        ));

        let mut config = Configuration::default();
        config.hotkeys.insert("k".into(), ClickBinding::new(0, 0, 10, 10));
        config
            .shortcuts
            .custom
            .insert("k".into(), PointerAction::LeftButton);
        assert!(matches!(config.validate(), Err(ConfigError::Conflict(_))));
    }
}
