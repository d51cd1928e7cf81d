//! UI-thread controller. Owns the binding table and the marker editor and
//! carries out every request the hook worker funnels to it.

use crate::binding_table::BindingTable;
use crate::capture::CaptureOutcome;
use crate::config::{BuiltinAction, PointerAction};
use crate::dispatch::{SharedSession, UiRequest};
use crate::error::{BindingConflict, ConfigError};
use crate::frontend::{FilePicker, StatusSink, WindowControl};
use crate::marker::{MarkerEditor, MarkerId};
use crate::persistence::{self, Located};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

pub struct App {
    table: BindingTable,
    markers: MarkerEditor,
    session: SharedSession,
    config_dir: PathBuf,
    window: Box<dyn WindowControl>,
    status: Box<dyn StatusSink>,
    picker: Box<dyn FilePicker>,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl App {
    pub fn new(
        located: Located,
        config_dir: PathBuf,
        session: SharedSession,
        window: Box<dyn WindowControl>,
        status: Box<dyn StatusSink>,
        picker: Box<dyn FilePicker>,
    ) -> Self {
        let message = located.status_message();
        let table = BindingTable::new(located.config, located.path);
        let mut markers = MarkerEditor::default();
        markers.restore_from(&table);
        let mut app = Self {
            table,
            markers,
            session,
            config_dir,
            window,
            status,
            picker,
        };
        if let Some(message) = message {
            app.status.error(&message);
        }
        app
    }

    pub fn table(&self) -> &BindingTable {
        &self.table
    }

    pub fn markers(&self) -> &MarkerEditor {
        &self.markers
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Serve requests until a `Quit` arrives or every sender is gone.
    pub fn run(&mut self, requests: Receiver<UiRequest>) {
        for request in requests {
            if !self.handle(request) {
                break;
            }
        }
        self.table.persist();
    }

    /// Returns `false` once the application should exit.
    pub fn handle(&mut self, request: UiRequest) -> bool {
        tracing::debug!(?request, "ui request");
        match request {
            UiRequest::Restore => self.restore(),
            UiRequest::Builtin(action) => self.run_builtin(action),
            UiRequest::Status(message) => self.status.info(&message),
            UiRequest::Quit => return false,
        }
        true
    }

    fn run_builtin(&mut self, action: BuiltinAction) {
        match action {
            BuiltinAction::New => self.new_config(),
            BuiltinAction::Open => self.open(),
            BuiltinAction::SaveAs => self.save_as(),
            BuiltinAction::Settings => self.settings(),
            BuiltinAction::NewHotkey => {
                self.new_hotkey();
            }
            BuiltinAction::Start => {
                self.start();
            }
            BuiltinAction::RestoreApplication => self.restore(),
            BuiltinAction::DisableHotkeys => {
                let disabled = self.session.toggle_hotkeys_disabled();
                tracing::info!(disabled, "hotkeys toggled");
            }
        }
    }

    /// Hide to the tray and arm the hotkey routine. Refused while a marker
    /// has no shortcut.
    pub fn start(&mut self) -> bool {
        if self.markers.has_unassigned() {
            self.status.error("Some hotkeys are not assigned!");
            return false;
        }
        self.table.persist();
        self.markers.clear();
        self.window.hide_to_tray();
        self.session.set_minimized(true);
        self.session.set_armed(true);
        tracing::info!("Program started");
        true
    }

    /// Back from the tray: disarm, reload the current file and rebuild the
    /// markers from it.
    pub fn restore(&mut self) {
        self.session.set_armed(false);
        self.session.set_minimized(false);
        self.window.restore();
        let path = self.table.path().to_path_buf();
        match self.table.reload_from(&path) {
            Ok(()) => {
                self.markers.restore_from(&self.table);
                self.status.info("HotClick successfully restored!");
            }
            Err(err) => self.recover(&path, err),
        }
    }

    pub fn new_config(&mut self) {
        self.table.persist();
        self.markers.clear();
        self.table.clear();
        let path = persistence::next_config_file_name(&self.config_dir);
        self.table.set_path(path.clone());
        self.table.persist();
        let message = format!("New config file \"{}\" created!", file_name(&path));
        tracing::info!("{message}");
        self.status.info(&message);
    }

    pub fn open(&mut self) {
        self.table.persist();
        let candidates = persistence::list_config_files(&self.config_dir).unwrap_or_else(|err| {
            tracing::warn!(%err, "failed to list config files");
            Vec::new()
        });
        let Some(path) = self.picker.pick_config(&self.config_dir, &candidates) else {
            self.status.error("No config file has been selected");
            return;
        };
        self.markers.clear();
        match self.table.reload_from(&path) {
            Ok(()) => {
                self.markers.restore_from(&self.table);
                let message = format!("Config file \"{}\" loaded!", file_name(&path));
                tracing::info!("{message}");
                self.status.info(&message);
            }
            Err(err) => self.recover(&path, err),
        }
    }

    pub fn save_as(&mut self) {
        self.table.persist();
        let Some(path) = self.picker.pick_save_target(&self.config_dir) else {
            self.status.error("No file has been selected");
            return;
        };
        let old = file_name(self.table.path());
        self.table.set_path(path.clone());
        match self.table.save() {
            Ok(()) => {
                let message = format!("Config file \"{old}\" saved as \"{}\"!", file_name(&path));
                tracing::info!("{message}");
                self.status.info(&message);
            }
            Err(err) => {
                tracing::error!(%err, "save as failed");
                self.status.error(&format!("Could not save \"{}\"", file_name(&path)));
            }
        }
    }

    pub fn new_hotkey(&mut self) -> MarkerId {
        self.markers.new_marker(&self.table)
    }

    /// Apply a captured shortcut to a marker, reporting a conflict to the
    /// user instead of failing.
    pub fn rebind_marker(&mut self, id: MarkerId, shortcut: &str) -> Result<(), BindingConflict> {
        let result = self.markers.rebind_marker(id, shortcut, &self.table);
        if let Err(err) = &result {
            self.status.error(&err.to_string());
        }
        result
    }

    /// Finish a marker's shortcut capture. A cancelled or empty capture
    /// leaves the marker as it was.
    pub fn rebind_from_capture(
        &mut self,
        id: MarkerId,
        outcome: &CaptureOutcome,
    ) -> Result<bool, BindingConflict> {
        match outcome {
            CaptureOutcome::Resolved(shortcut) if !shortcut.is_empty() => {
                self.rebind_marker(id, shortcut).map(|()| true)
            }
            _ => {
                tracing::debug!(id, "capture ended without a shortcut");
                Ok(false)
            }
        }
    }

    /// Bind a custom pointer shortcut, reporting a clash with a marker to
    /// the user instead of failing.
    pub fn bind_custom(&mut self, shortcut: &str, action: PointerAction) -> Result<(), BindingConflict> {
        let result = self.markers.bind_custom(shortcut, action, &self.table);
        if let Err(err) = &result {
            self.status.error(&err.to_string());
        }
        result
    }

    pub fn settings(&mut self) {
        let page = self.table.read(|config| config.last_setting_menu.clone());
        tracing::info!(?page, "settings requested");
        self.status.info("Settings are edited in the config file");
    }

    /// Fall back to defaults in a fresh file after `failed` could not be
    /// loaded.
    fn recover(&mut self, failed: &Path, err: ConfigError) {
        tracing::error!(path = %failed.display(), %err, "config file loading failed");
        let path = persistence::next_config_file_name(&self.config_dir);
        self.markers.clear();
        self.table.clear();
        self.table.set_path(path.clone());
        self.table.persist();
        self.status.error(&persistence::corrupted_message(&path));
    }
}
