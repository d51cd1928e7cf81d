//! Narrow interfaces to the presentation layer. The core never paints or
//! lays out anything itself; it only asks for these few services.

use std::path::{Path, PathBuf};

pub trait FilePicker {
    /// Choose one of several config files at startup or on "Open".
    fn pick_config(&mut self, dir: &Path, candidates: &[PathBuf]) -> Option<PathBuf>;
    /// Choose the target of "Save As...".
    fn pick_save_target(&mut self, dir: &Path) -> Option<PathBuf>;
}

/// One-line, human-readable status messages.
pub trait StatusSink {
    fn info(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// Main window visibility, driven from the UI thread only.
pub trait WindowControl {
    fn hide_to_tray(&mut self);
    fn restore(&mut self);
}

/// Whether the application's own window has keyboard focus. Read from the
/// hook worker, so it must be cheap.
pub trait WindowFocus: Send {
    fn is_focused(&self) -> bool;
}

/// The console the headless binary runs in stands in for its window.
#[derive(Debug, Default)]
pub struct ConsoleFocus;

#[cfg(target_os = "windows")]
impl WindowFocus for ConsoleFocus {
    fn is_focused(&self) -> bool {
        use windows::Win32::System::Console::GetConsoleWindow;
        use windows::Win32::UI::WindowsAndMessaging::GetForegroundWindow;
        unsafe {
            let console = GetConsoleWindow();
            !console.0.is_null() && GetForegroundWindow() == console
        }
    }
}

#[cfg(not(target_os = "windows"))]
impl WindowFocus for ConsoleFocus {
    fn is_focused(&self) -> bool {
        true
    }
}

/// Status sink that only traces, used by the headless binary.
#[derive(Debug, Default)]
pub struct LogStatus;

impl StatusSink for LogStatus {
    fn info(&mut self, message: &str) {
        tracing::info!("{message}");
    }

    fn error(&mut self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Window stand-in for the headless binary: there is nothing to show, so
/// visibility changes are only traced.
#[derive(Debug, Default)]
pub struct HeadlessWindow;

impl WindowControl for HeadlessWindow {
    fn hide_to_tray(&mut self) {
        tracing::debug!("window hidden to tray");
    }

    fn restore(&mut self) {
        tracing::debug!("window restored");
    }
}

/// Native file dialogs.
#[cfg(target_os = "windows")]
#[derive(Debug, Default)]
pub struct DialogPicker;

#[cfg(target_os = "windows")]
impl FilePicker for DialogPicker {
    fn pick_config(&mut self, dir: &Path, _candidates: &[PathBuf]) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Select the config file to open")
            .set_directory(dir)
            .add_filter("JSON Files", &["json"])
            .pick_file()
    }

    fn pick_save_target(&mut self, dir: &Path) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Save File As")
            .set_directory(dir)
            .add_filter("JSON Files", &["json"])
            .save_file()
    }
}

/// Without a dialog toolkit nothing can be chosen, which the caller treats
/// like a cancelled dialog.
#[cfg(not(target_os = "windows"))]
#[derive(Debug, Default)]
pub struct DialogPicker;

#[cfg(not(target_os = "windows"))]
impl FilePicker for DialogPicker {
    fn pick_config(&mut self, dir: &Path, candidates: &[PathBuf]) -> Option<PathBuf> {
        tracing::warn!(
            dir = %dir.display(),
            count = candidates.len(),
            "no file dialog available to choose a config file"
        );
        None
    }

    fn pick_save_target(&mut self, _dir: &Path) -> Option<PathBuf> {
        None
    }
}
