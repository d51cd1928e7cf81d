//! Shortcut strings and the ambient-state hotkey resolver.
//!
//! A shortcut string is the canonical text form of a key combination:
//! optional `ctrl+`, `maj+` and `alt+` prefixes, always in that order,
//! followed by a single base key name or a pointer-button token.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix used for double-click pointer tokens (`Double.LeftButton`).
pub const DOUBLE_PREFIX: &str = "Double.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Ctrl,
    Maj,
    Alt,
}

impl Modifier {
    /// Canonical prefix order.
    pub const ALL: [Modifier; 3] = [Modifier::Ctrl, Modifier::Maj, Modifier::Alt];

    pub fn name(self) -> &'static str {
        match self {
            Modifier::Ctrl => "ctrl",
            Modifier::Maj => "maj",
            Modifier::Alt => "alt",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "ctrl" => Some(Modifier::Ctrl),
            "maj" => Some(Modifier::Maj),
            "alt" => Some(Modifier::Alt),
            _ => None,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ambient "is key X currently held" query used by [`resolve`].
pub trait HeldKeys {
    fn is_held(&self, key: &str) -> bool;
}

/// Plain modifier snapshot, handy when the caller already knows which
/// modifiers are down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    pub ctrl: bool,
    pub maj: bool,
    pub alt: bool,
}

impl ModifierState {
    pub fn is_set(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Ctrl => self.ctrl,
            Modifier::Maj => self.maj,
            Modifier::Alt => self.alt,
        }
    }
}

impl HeldKeys for ModifierState {
    fn is_held(&self, key: &str) -> bool {
        Modifier::from_key(key).is_some_and(|m| self.is_set(m))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    #[serde(rename = "LeftButton")]
    Left,
    #[serde(rename = "RightButton")]
    Right,
    #[serde(rename = "MiddleButton")]
    Middle,
}

impl PointerButton {
    pub fn token(self) -> &'static str {
        match self {
            PointerButton::Left => "LeftButton",
            PointerButton::Right => "RightButton",
            PointerButton::Middle => "MiddleButton",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "LeftButton" => Some(PointerButton::Left),
            "RightButton" => Some(PointerButton::Right),
            "MiddleButton" => Some(PointerButton::Middle),
            _ => None,
        }
    }
}

impl fmt::Display for PointerButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Build the pointer token for a click or double click.
pub fn pointer_token(button: PointerButton, double: bool) -> String {
    if double {
        format!("{DOUBLE_PREFIX}{}", button.token())
    } else {
        button.token().to_string()
    }
}

/// Parse `LeftButton` / `Double.LeftButton` style tokens.
pub fn parse_pointer_token(token: &str) -> Option<(PointerButton, bool)> {
    match token.strip_prefix(DOUBLE_PREFIX) {
        Some(rest) => PointerButton::from_token(rest).map(|b| (b, true)),
        None => PointerButton::from_token(token).map(|b| (b, false)),
    }
}

pub fn is_pointer_token(token: &str) -> bool {
    parse_pointer_token(token).is_some()
}

/// Resolve one raw key press into a shortcut string using the modifiers
/// that are held right now.
///
/// A bare modifier press contributes nothing of its own, so it resolves to
/// a prefix-only string. Unknown keys arrive as `""` and resolve the same
/// way. Callers filter those with [`is_actionable`].
pub fn resolve(raw_key: &str, held: &impl HeldKeys) -> String {
    let key = raw_key.trim().to_lowercase();
    let mut shortcut = String::new();
    for modifier in Modifier::ALL {
        if held.is_held(modifier.name()) {
            shortcut.push_str(modifier.name());
            shortcut.push('+');
        }
    }
    if Modifier::from_key(&key).is_none() {
        shortcut.push_str(&key);
    }
    shortcut
}

/// `false` for empty and prefix-only shortcuts.
pub fn is_actionable(shortcut: &str) -> bool {
    !shortcut.is_empty() && !shortcut.ends_with('+')
}

fn split_base(shortcut: &str) -> (&str, &str) {
    match shortcut.rfind('+') {
        Some(idx) if idx + 1 < shortcut.len() => (&shortcut[..=idx], &shortcut[idx + 1..]),
        _ => ("", shortcut),
    }
}

/// Lower-case a shortcut, keeping a trailing pointer token as is.
pub fn normalize(shortcut: &str) -> String {
    let trimmed = shortcut.trim();
    let (prefix, base) = split_base(trimmed);
    if is_pointer_token(base) {
        format!("{}{}", prefix.to_lowercase(), base)
    } else {
        trimmed.to_lowercase()
    }
}

/// Case-insensitive comparison. Builtin shortcuts are stored upper case
/// while resolved ones are lower case.
pub fn same_shortcut(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Upper-cased label shown on markers and shortcut pickers.
pub fn display_label(shortcut: &str) -> String {
    let (prefix, base) = split_base(shortcut);
    if is_pointer_token(base) {
        format!("{}{}", prefix.to_uppercase(), base)
    } else {
        shortcut.to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(ctrl: bool, maj: bool, alt: bool) -> ModifierState {
        ModifierState { ctrl, maj, alt }
    }

    #[test]
    fn prefixes_follow_fixed_order() {
        assert_eq!(resolve("k", &held(true, true, true)), "ctrl+maj+alt+k");
        assert_eq!(resolve("K", &held(false, true, true)), "maj+alt+k");
        assert_eq!(resolve("k", &held(true, false, true)), "ctrl+alt+k");
        assert_eq!(resolve("k", &ModifierState::default()), "k");
    }

    #[test]
    fn bare_modifier_resolves_to_prefix_only() {
        let shortcut = resolve("ctrl", &held(true, false, false));
        assert_eq!(shortcut, "ctrl+");
        assert!(!is_actionable(&shortcut));
        assert_eq!(resolve("alt", &ModifierState::default()), "");
    }

    #[test]
    fn unknown_key_yields_prefix() {
        assert_eq!(resolve("", &held(false, false, true)), "alt+");
        assert!(!is_actionable(""));
    }

    #[test]
    fn pointer_tokens_round_trip() {
        assert_eq!(pointer_token(PointerButton::Left, false), "LeftButton");
        assert_eq!(pointer_token(PointerButton::Right, true), "Double.RightButton");
        assert_eq!(
            parse_pointer_token("Double.LeftButton"),
            Some((PointerButton::Left, true))
        );
        assert_eq!(parse_pointer_token("leftbutton"), None);
    }

    #[test]
    fn normalize_keeps_pointer_tokens() {
        assert_eq!(normalize(" CTRL+K "), "ctrl+k");
        assert_eq!(normalize("CTRL+Double.LeftButton"), "ctrl+Double.LeftButton");
        assert_eq!(normalize("ctrl++"), "ctrl++");
    }

    #[test]
    fn comparison_ignores_case() {
        assert!(same_shortcut("CTRL+ALT+S", "ctrl+alt+s"));
        assert!(!same_shortcut("ctrl+s", "ctrl+alt+s"));
        assert_eq!(display_label("ctrl+LeftButton"), "CTRL+LeftButton");
    }
}
