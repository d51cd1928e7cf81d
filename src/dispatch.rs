//! The hotkey routine: matches resolved shortcuts against the binding
//! table and drives the synthetic pointer while the program is started.

use crate::actuator::PointerActuator;
use crate::binding_table::{read_config, SharedConfig};
use crate::config::{BuiltinAction, PointerAction};
use crate::frontend::WindowFocus;
use crate::hotkey::{self, HeldKeys, PointerButton};
use crate::input::InputEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// Flags shared between the UI thread and the hook worker.
#[derive(Debug, Default)]
pub struct SessionFlags {
    armed: AtomicBool,
    hotkeys_disabled: AtomicBool,
    minimized: AtomicBool,
}

pub type SharedSession = Arc<SessionFlags>;

impl SessionFlags {
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    pub fn set_armed(&self, armed: bool) {
        self.armed.store(armed, Ordering::SeqCst);
    }

    pub fn hotkeys_disabled(&self) -> bool {
        self.hotkeys_disabled.load(Ordering::SeqCst)
    }

    pub fn set_hotkeys_disabled(&self, disabled: bool) {
        self.hotkeys_disabled.store(disabled, Ordering::SeqCst);
    }

    /// Flip the kill switch and return the new value.
    pub fn toggle_hotkeys_disabled(&self) -> bool {
        !self.hotkeys_disabled.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized.load(Ordering::SeqCst)
    }

    pub fn set_minimized(&self, minimized: bool) {
        self.minimized.store(minimized, Ordering::SeqCst);
    }
}

/// Work the hook thread hands to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiRequest {
    Restore,
    Builtin(BuiltinAction),
    Status(String),
    Quit,
}

/// Callback for a console close or Ctrl-C: asks the UI loop to exit.
pub fn quit_handler(ui: Sender<UiRequest>) -> impl FnMut() + Send + 'static {
    move || {
        tracing::info!("close requested");
        if ui.send(UiRequest::Quit).is_err() {
            tracing::debug!("UI loop already gone");
        }
    }
}

/// What the engine did with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Ignored,
    Restore,
    DisableToggled { disabled: bool },
    Forwarded(BuiltinAction),
    HoldStarted { shortcut: String, target: (i32, i32) },
    HoldReasserted,
    Clicked { shortcut: String, target: (i32, i32) },
    Custom { shortcut: String, button: PointerButton },
}

#[derive(Debug)]
struct ClickHold {
    base_key: String,
    shortcut: String,
    target: (i32, i32),
    origin: Option<(i32, i32)>,
}

enum Matched {
    Click((i32, i32)),
    Custom(PointerAction),
    Nothing,
}

pub struct DispatchEngine {
    config: SharedConfig,
    session: SharedSession,
    actuator: Box<dyn PointerActuator>,
    ui: Sender<UiRequest>,
    forward_builtins: bool,
    focus: Option<Box<dyn WindowFocus>>,
    hold: Option<ClickHold>,
}

impl DispatchEngine {
    pub fn new(
        config: SharedConfig,
        session: SharedSession,
        actuator: Box<dyn PointerActuator>,
        ui: Sender<UiRequest>,
    ) -> Self {
        Self {
            config,
            session,
            actuator,
            ui,
            forward_builtins: false,
            focus: None,
            hold: None,
        }
    }

    /// Forward builtin shortcuts to the UI thread while disarmed and
    /// visible, standing in for window-scoped shortcuts.
    pub fn with_builtin_forwarding(mut self, forward: bool) -> Self {
        self.forward_builtins = forward;
        self
    }

    /// Only forward while `focus` reports the window focused. Without it
    /// the window always counts as focused.
    pub fn with_window_focus(mut self, focus: Box<dyn WindowFocus>) -> Self {
        self.focus = Some(focus);
        self
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn is_holding(&self) -> bool {
        self.hold.is_some()
    }

    pub fn handle(&mut self, event: &InputEvent, held: &impl HeldKeys) -> Dispatch {
        match event {
            InputEvent::KeyPress(key) => self.on_key_press(key, held),
            InputEvent::KeyRelease(key) => self.on_key_release(key),
            _ => Dispatch::Ignored,
        }
    }

    pub fn on_key_press(&mut self, raw_key: &str, held: &impl HeldKeys) -> Dispatch {
        let raw_key = raw_key.trim().to_lowercase();

        if let Some(hold) = &self.hold {
            if hold.base_key == raw_key {
                // Key repeat while held: keep the pointer on target.
                let (x, y) = hold.target;
                self.actuator.move_to(x, y);
                return Dispatch::HoldReasserted;
            }
            return Dispatch::Ignored;
        }

        let shortcut = hotkey::resolve(&raw_key, held);
        if !hotkey::is_actionable(&shortcut) {
            return Dispatch::Ignored;
        }

        let (restore, disable, builtin, matched) = {
            let config = read_config(&self.config);
            let matched = match config.click_binding(&shortcut) {
                Some(binding) => Matched::Click(binding.click_point()),
                None => match config.custom_action(&shortcut) {
                    Some(action) => Matched::Custom(action),
                    None => Matched::Nothing,
                },
            };
            (
                hotkey::same_shortcut(config.builtin(BuiltinAction::RestoreApplication), &shortcut),
                hotkey::same_shortcut(config.builtin(BuiltinAction::DisableHotkeys), &shortcut),
                config.builtin_for(&shortcut),
                matched,
            )
        };

        if restore && self.session.is_minimized() {
            return self.request_restore();
        }

        if !self.session.is_armed() {
            return self.forward(builtin);
        }

        if disable {
            let disabled = self.session.toggle_hotkeys_disabled();
            tracing::info!(disabled, "hotkeys toggled");
            let message = if disabled { "Hotkeys disabled" } else { "Hotkeys enabled" };
            self.send(UiRequest::Status(message.to_string()));
            return Dispatch::DisableToggled { disabled };
        }

        if self.session.hotkeys_disabled() {
            return Dispatch::Ignored;
        }

        if restore {
            return self.request_restore();
        }

        match matched {
            Matched::Click(target) => {
                let origin = self.actuator.position();
                self.actuator.move_to(target.0, target.1);
                tracing::debug!(%shortcut, ?target, "click hold started");
                self.hold = Some(ClickHold {
                    base_key: raw_key,
                    shortcut: shortcut.clone(),
                    target,
                    origin,
                });
                Dispatch::HoldStarted { shortcut, target }
            }
            Matched::Custom(action) => {
                let button = action.button();
                self.actuator.click(button);
                tracing::info!("Custom hotkey \"{}\" pressed", hotkey::display_label(&shortcut));
                Dispatch::Custom { shortcut, button }
            }
            Matched::Nothing => Dispatch::Ignored,
        }
    }

    pub fn on_key_release(&mut self, raw_key: &str) -> Dispatch {
        let raw_key = raw_key.trim().to_lowercase();
        let releases_hold = self.hold.as_ref().is_some_and(|hold| hold.base_key == raw_key);
        if !releases_hold {
            return Dispatch::Ignored;
        }
        let Some(hold) = self.hold.take() else {
            return Dispatch::Ignored;
        };

        let (x, y) = hold.target;
        self.actuator.move_to(x, y);
        self.actuator.click(PointerButton::Left);
        if let Some((ox, oy)) = hold.origin {
            self.actuator.move_to(ox, oy);
        }
        tracing::info!("Hotkey \"{}\" pressed", hotkey::display_label(&hold.shortcut));
        Dispatch::Clicked {
            shortcut: hold.shortcut,
            target: hold.target,
        }
    }

    fn request_restore(&mut self) -> Dispatch {
        // Disarm here so nothing fires before the UI thread catches up.
        self.session.set_armed(false);
        self.hold = None;
        self.send(UiRequest::Restore);
        Dispatch::Restore
    }

    fn forward(&mut self, builtin: Option<BuiltinAction>) -> Dispatch {
        let Some(action) = builtin else {
            return Dispatch::Ignored;
        };
        if !self.forward_builtins
            || self.session.is_minimized()
            || action == BuiltinAction::DisableHotkeys
        {
            return Dispatch::Ignored;
        }
        // The hook is global; keys typed into other windows are not ours.
        if !self.focus.as_ref().map_or(true, |focus| focus.is_focused()) {
            tracing::debug!(%action, "window not focused, builtin not forwarded");
            return Dispatch::Ignored;
        }
        self.send(UiRequest::Builtin(action));
        Dispatch::Forwarded(action)
    }

    fn send(&self, request: UiRequest) {
        if let Err(err) = self.ui.send(request) {
            tracing::warn!(?err, "UI thread is gone, request dropped");
        }
    }
}
