//! The authoritative shortcut table. Every mutation is written through to
//! the current config file before the call returns.

use crate::config::{self, BuiltinAction, ClickBinding, Configuration, PointerAction};
use crate::error::{BindingConflict, ConfigError};
use crate::hotkey;
use crate::persistence;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Configuration shared between the UI thread (writer) and the hook
/// worker (reader).
pub type SharedConfig = Arc<RwLock<Configuration>>;

pub fn read_config(config: &SharedConfig) -> RwLockReadGuard<'_, Configuration> {
    config.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_config(config: &SharedConfig) -> RwLockWriteGuard<'_, Configuration> {
    config.write().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct BindingTable {
    config: SharedConfig,
    path: PathBuf,
}

impl BindingTable {
    pub fn new(config: Configuration, path: PathBuf) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            path,
        }
    }

    pub fn shared(&self) -> SharedConfig {
        Arc::clone(&self.config)
    }

    /// File every mutation is saved to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_path(&mut self, path: PathBuf) {
        self.path = path;
    }

    pub fn snapshot(&self) -> Configuration {
        read_config(&self.config).clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&Configuration) -> R) -> R {
        f(&read_config(&self.config))
    }

    fn update<R>(&self, f: impl FnOnce(&mut Configuration) -> R) -> R {
        let result = {
            let mut config = write_config(&self.config);
            f(&mut config)
        };
        self.persist();
        result
    }

    /// Like `update`, but the edit is applied to a copy and only kept, and
    /// saved, when the result still passes `Configuration::validate`.
    fn checked_update(&self, f: impl FnOnce(&mut Configuration)) -> Result<(), BindingConflict> {
        {
            let mut config = write_config(&self.config);
            let mut next = config.clone();
            f(&mut next);
            if let Err(err) = next.validate() {
                tracing::error!(%err, "edit rejected");
                return Err(match err {
                    ConfigError::Conflict(key) => {
                        BindingConflict::AlreadyAssigned(hotkey::display_label(&key))
                    }
                    other => BindingConflict::Invalid(other.to_string()),
                });
            }
            *config = next;
        }
        self.persist();
        Ok(())
    }

    /// Save to the current file, reporting failures to the caller.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config = read_config(&self.config);
        persistence::save(&config, &self.path)
    }

    /// Save, logging instead of failing. A brief disk problem must not
    /// abort the edit that triggered the save.
    pub fn persist(&self) {
        if let Err(err) = self.save() {
            tracing::warn!(path = %self.path.display(), %err, "failed to save config");
        }
    }

    /// Insert or overwrite the marker binding for `shortcut`. Refused for a
    /// non-positive size or a shortcut held by a custom shortcut.
    pub fn set_click(
        &self,
        shortcut: &str,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
    ) -> Result<(), BindingConflict> {
        let binding = ClickBinding::new(x, y, w, h);
        if !binding.has_valid_size() {
            return Err(BindingConflict::InvalidSize { w, h });
        }
        let key = hotkey::normalize(shortcut);
        self.checked_update(|config| {
            config.hotkeys.insert(key, binding);
        })
    }

    /// Remove a marker binding. Absent keys are fine.
    pub fn delete(&self, shortcut: &str) -> bool {
        let key = hotkey::normalize(shortcut);
        self.update(|config| config.hotkeys.remove(&key).is_some())
    }

    pub fn set_builtin(&self, action: BuiltinAction, shortcut: &str) {
        let shortcut = shortcut.trim().to_string();
        tracing::info!(%action, %shortcut, "builtin shortcut changed");
        self.update(|config| {
            config.shortcuts.builtin.insert(action, shortcut);
        });
    }

    /// Bind a custom shortcut. Refused while a marker owns the shortcut.
    pub fn set_custom(&self, shortcut: &str, action: PointerAction) -> Result<(), BindingConflict> {
        let key = hotkey::normalize(shortcut);
        if !hotkey::is_actionable(&key) {
            return Err(BindingConflict::Unassigned);
        }
        self.checked_update(|config| {
            config.shortcuts.custom.insert(key, action);
        })
    }

    pub fn delete_custom(&self, shortcut: &str) -> bool {
        let key = hotkey::normalize(shortcut);
        self.update(|config| config.shortcuts.custom.remove(&key).is_some())
    }

    /// Default size of new markers, kept within `MIN_RADIUS..=MAX_RADIUS`.
    pub fn set_radius(&self, radius: i32) {
        let radius = config::clamp_radius(radius);
        tracing::info!(radius, "hotkeys default radius");
        self.update(|config| config.radius = radius);
    }

    pub fn set_last_position(&self, position: Option<(i32, i32)>) {
        self.update(|config| config.last_position = position);
    }

    pub fn set_last_setting_menu(&self, menu: Option<String>) {
        self.update(|config| config.last_setting_menu = menu);
    }

    /// Replace everything with the compiled-in defaults and save.
    pub fn reset(&self) {
        self.update(persistence::reset);
    }

    /// Reset, then merge `path` over the defaults and make it the current
    /// file. On failure the table holds the defaults and the path is kept.
    pub fn reload_from(&mut self, path: &Path) -> Result<(), ConfigError> {
        let mut fresh = Configuration::default();
        persistence::load(&mut fresh, path)?;
        *write_config(&self.config) = fresh;
        self.path = path.to_path_buf();
        Ok(())
    }

    /// Reset without touching the current file.
    pub fn clear(&self) {
        persistence::reset(&mut write_config(&self.config));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_in(dir: &Path) -> BindingTable {
        BindingTable::new(Configuration::default(), dir.join("config.json"))
    }

    #[test]
    fn mutations_are_written_through() {
        let dir = tempfile::tempdir().expect("temp dir");
        let table = table_in(dir.path());
        table.set_click("A", 10, 20, 30, 40).unwrap();

        let mut on_disk = Configuration::default();
        persistence::load(&mut on_disk, table.path()).expect("load");
        assert_eq!(on_disk.hotkeys.get("a"), Some(&ClickBinding::new(10, 20, 30, 40)));

        assert!(table.delete("a"));
        assert!(!table.delete("a"));
        persistence::load(&mut on_disk, table.path()).expect("load");
        assert!(on_disk.hotkeys.is_empty());
    }

    #[test]
    fn builtin_and_custom_edits() {
        let dir = tempfile::tempdir().expect("temp dir");
        let table = table_in(dir.path());
        table.set_builtin(BuiltinAction::Start, "CTRL+MAJ+S");
        table.set_custom("F9", PointerAction::RightButton).unwrap();

        table.read(|config| {
            assert_eq!(config.builtin(BuiltinAction::Start), "CTRL+MAJ+S");
            assert_eq!(config.custom_action("f9"), Some(PointerAction::RightButton));
        });
        assert!(table.delete_custom("f9"));
        assert!(table.read(|config| config.shortcuts.custom.is_empty()));
    }

    #[test]
    fn zero_size_binding_is_refused() {
        let dir = tempfile::tempdir().expect("temp dir");
        let table = table_in(dir.path());
        assert_eq!(
            table.set_click("a", 10, 10, 0, 0),
            Err(BindingConflict::InvalidSize { w: 0, h: 0 })
        );
        assert!(table.read(|config| config.hotkeys.is_empty()));
    }

    #[test]
    fn radius_is_clamped() {
        let dir = tempfile::tempdir().expect("temp dir");
        let table = table_in(dir.path());
        table.set_radius(0);
        assert_eq!(table.read(|config| config.radius), config::MIN_RADIUS);
        table.set_radius(5000);
        assert_eq!(table.read(|config| config.radius), config::MAX_RADIUS);
    }

    #[test]
    fn hotkey_and_custom_tables_never_overlap() {
        let dir = tempfile::tempdir().expect("temp dir");
        let table = table_in(dir.path());
        table.set_click("k", 10, 10, 60, 60).unwrap();
        assert_eq!(
            table.set_custom("K", PointerAction::LeftButton),
            Err(BindingConflict::AlreadyAssigned("K".into()))
        );

        table.set_custom("f9", PointerAction::RightButton).unwrap();
        assert!(table.set_click("F9", 10, 10, 60, 60).is_err());

        let mut on_disk = Configuration::default();
        persistence::load(&mut on_disk, table.path()).expect("saved file still loads");
        assert_eq!(on_disk, table.snapshot());
        assert!(!on_disk.hotkeys.contains_key("f9"));
        assert!(!on_disk.shortcuts.custom.contains_key("k"));
    }

    #[test]
    fn reset_restores_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let table = table_in(dir.path());
        table.set_radius(90);
        table.set_last_position(Some((5, 6)));
        table.reset();
        assert_eq!(table.snapshot(), Configuration::default());
    }

    #[test]
    fn failed_save_does_not_abort_edit() {
        let dir = tempfile::tempdir().expect("temp dir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();
        let table = BindingTable::new(Configuration::default(), blocker.join("config.json"));

        table.set_radius(75);
        assert_eq!(table.read(|config| config.radius), 75);
        assert!(table.save().is_err());
    }
}
