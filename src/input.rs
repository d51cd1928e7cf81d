//! Global input capture contract: the raw event vocabulary, held-key
//! tracking and the OS hook backend.

use crate::hotkey::{HeldKeys, PointerButton};
use std::collections::HashSet;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

/// Two presses of the same button closer than this count as a double click.
pub const DOUBLE_CLICK_INTERVAL: Duration = Duration::from_millis(500);

/// Raw events as delivered by the hook. Key names are lower case; unknown
/// keys arrive as `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    KeyPress(String),
    KeyRelease(String),
    ButtonPress(PointerButton),
    ButtonRelease(PointerButton),
    DoubleClick(PointerButton),
    MouseMove { x: i32, y: i32 },
}

/// Keys currently down and the last pointer position seen by the hook.
#[derive(Debug, Default, Clone)]
pub struct KeyboardState {
    held: HashSet<String>,
    pointer: Option<(i32, i32)>,
}

impl KeyboardState {
    pub fn apply(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyPress(key) if !key.is_empty() => {
                self.held.insert(key.to_lowercase());
            }
            InputEvent::KeyRelease(key) => {
                self.held.remove(&key.to_lowercase());
            }
            InputEvent::MouseMove { x, y } => self.pointer = Some((*x, *y)),
            _ => {}
        }
    }

    pub fn pointer(&self) -> Option<(i32, i32)> {
        self.pointer
    }
}

impl HeldKeys for KeyboardState {
    fn is_held(&self, key: &str) -> bool {
        self.held.contains(&key.to_lowercase())
    }
}

/// Turns a stream of button presses into presses and double clicks.
#[derive(Debug, Default)]
pub struct ClickTracker {
    last: Option<(PointerButton, Instant)>,
}

impl ClickTracker {
    pub fn press(&mut self, button: PointerButton, at: Instant) -> InputEvent {
        match self.last.take() {
            Some((prev, when)) if prev == button && at.duration_since(when) <= DOUBLE_CLICK_INTERVAL => {
                InputEvent::DoubleClick(button)
            }
            _ => {
                self.last = Some((button, at));
                InputEvent::ButtonPress(button)
            }
        }
    }
}

/// OS-level global hook. Removing a hook that is already gone is routine
/// and callers only log the error.
pub trait HookBackend: Send {
    fn install(&mut self, sender: Sender<InputEvent>) -> anyhow::Result<()>;
    fn uninstall(&mut self) -> anyhow::Result<()>;
    fn is_installed(&self) -> bool;
}

#[cfg(target_os = "windows")]
pub type DefaultHookBackend = platform::RdevHook;

#[cfg(not(target_os = "windows"))]
pub type DefaultHookBackend = UnsupportedHook;

/// Stand-in where no global hook is available; installs nothing.
#[derive(Debug, Default)]
pub struct UnsupportedHook {
    installed: bool,
}

impl HookBackend for UnsupportedHook {
    fn install(&mut self, _sender: Sender<InputEvent>) -> anyhow::Result<()> {
        tracing::warn!("global input hook is not supported on this platform");
        self.installed = true;
        Ok(())
    }

    fn uninstall(&mut self) -> anyhow::Result<()> {
        if !self.installed {
            anyhow::bail!("hook already removed");
        }
        self.installed = false;
        Ok(())
    }

    fn is_installed(&self) -> bool {
        self.installed
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use super::{ClickTracker, HookBackend, InputEvent};
    use crate::hotkey::PointerButton;
    use once_cell::sync::{Lazy, OnceCell};
    use rdev::{listen, Button, EventType, Key};
    use std::sync::mpsc::Sender;
    use std::sync::{Mutex, PoisonError};
    use std::thread;
    use std::time::{Duration, Instant};

    // rdev::listen never returns while it works, so one listener thread
    // serves every install and the sink decides where events go.
    static SINK: Lazy<Mutex<Option<Sender<InputEvent>>>> = Lazy::new(|| Mutex::new(None));
    static LISTENER: OnceCell<()> = OnceCell::new();

    fn forward(event: InputEvent) {
        let sink = SINK.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = sink.as_ref() {
            let _ = tx.send(event);
        }
    }

    #[derive(Debug, Default)]
    pub struct RdevHook {
        installed: bool,
    }

    impl HookBackend for RdevHook {
        fn install(&mut self, sender: Sender<InputEvent>) -> anyhow::Result<()> {
            *SINK.lock().unwrap_or_else(PoisonError::into_inner) = Some(sender);
            LISTENER.get_or_init(|| {
                thread::spawn(listen_loop);
            });
            self.installed = true;
            tracing::debug!("global input hook installed");
            Ok(())
        }

        fn uninstall(&mut self) -> anyhow::Result<()> {
            if !self.installed {
                anyhow::bail!("hook already removed");
            }
            SINK.lock().unwrap_or_else(PoisonError::into_inner).take();
            self.installed = false;
            tracing::debug!("global input hook removed");
            Ok(())
        }

        fn is_installed(&self) -> bool {
            self.installed
        }
    }

    fn listen_loop() {
        loop {
            let mut clicks = ClickTracker::default();
            let result = listen(move |event| {
                if let Some(input) = translate(&event.event_type, &mut clicks) {
                    forward(input);
                }
            });
            match result {
                Ok(()) => tracing::warn!("input listener exited unexpectedly. Restarting shortly"),
                Err(e) => tracing::warn!("input listener failed: {:?}. Retrying shortly", e),
            }
            thread::sleep(Duration::from_millis(500));
        }
    }

    fn translate(event: &EventType, clicks: &mut ClickTracker) -> Option<InputEvent> {
        match event {
            EventType::KeyPress(k) => Some(InputEvent::KeyPress(key_name(*k).to_string())),
            EventType::KeyRelease(k) => Some(InputEvent::KeyRelease(key_name(*k).to_string())),
            EventType::ButtonPress(b) => button(*b).map(|b| clicks.press(b, Instant::now())),
            EventType::ButtonRelease(b) => button(*b).map(InputEvent::ButtonRelease),
            EventType::MouseMove { x, y } => Some(InputEvent::MouseMove {
                x: *x as i32,
                y: *y as i32,
            }),
            _ => None,
        }
    }

    fn button(b: Button) -> Option<PointerButton> {
        match b {
            Button::Left => Some(PointerButton::Left),
            Button::Right => Some(PointerButton::Right),
            Button::Middle => Some(PointerButton::Middle),
            _ => None,
        }
    }

    pub(super) fn key_name(key: Key) -> &'static str {
        match key {
            Key::ControlLeft | Key::ControlRight => "ctrl",
            Key::ShiftLeft | Key::ShiftRight => "maj",
            Key::Alt | Key::AltGr => "alt",
            Key::KeyA => "a",
            Key::KeyB => "b",
            Key::KeyC => "c",
            Key::KeyD => "d",
            Key::KeyE => "e",
            Key::KeyF => "f",
            Key::KeyG => "g",
            Key::KeyH => "h",
            Key::KeyI => "i",
            Key::KeyJ => "j",
            Key::KeyK => "k",
            Key::KeyL => "l",
            Key::KeyM => "m",
            Key::KeyN => "n",
            Key::KeyO => "o",
            Key::KeyP => "p",
            Key::KeyQ => "q",
            Key::KeyR => "r",
            Key::KeyS => "s",
            Key::KeyT => "t",
            Key::KeyU => "u",
            Key::KeyV => "v",
            Key::KeyW => "w",
            Key::KeyX => "x",
            Key::KeyY => "y",
            Key::KeyZ => "z",
            Key::Num0 | Key::Kp0 => "0",
            Key::Num1 | Key::Kp1 => "1",
            Key::Num2 | Key::Kp2 => "2",
            Key::Num3 | Key::Kp3 => "3",
            Key::Num4 | Key::Kp4 => "4",
            Key::Num5 | Key::Kp5 => "5",
            Key::Num6 | Key::Kp6 => "6",
            Key::Num7 | Key::Kp7 => "7",
            Key::Num8 | Key::Kp8 => "8",
            Key::Num9 | Key::Kp9 => "9",
            Key::F1 => "f1",
            Key::F2 => "f2",
            Key::F3 => "f3",
            Key::F4 => "f4",
            Key::F5 => "f5",
            Key::F6 => "f6",
            Key::F7 => "f7",
            Key::F8 => "f8",
            Key::F9 => "f9",
            Key::F10 => "f10",
            Key::F11 => "f11",
            Key::F12 => "f12",
            Key::Space => "space",
            Key::Return | Key::KpReturn => "enter",
            Key::Escape => "esc",
            Key::Tab => "tab",
            Key::Backspace => "backspace",
            Key::Delete | Key::KpDelete => "delete",
            Key::Insert => "insert",
            Key::Home => "home",
            Key::End => "end",
            Key::PageUp => "page up",
            Key::PageDown => "page down",
            Key::UpArrow => "up",
            Key::DownArrow => "down",
            Key::LeftArrow => "left",
            Key::RightArrow => "right",
            Key::CapsLock => "caps lock",
            Key::KpMultiply => "*",
            Key::KpPlus => "+",
            Key::KpMinus | Key::Minus => "-",
            Key::KpDivide | Key::Slash => "/",
            Key::Equal => "=",
            Key::Comma => ",",
            Key::Dot => ".",
            Key::SemiColon => ";",
            Key::Quote => "'",
            Key::BackQuote => "`",
            Key::LeftBracket => "[",
            Key::RightBracket => "]",
            Key::BackSlash | Key::IntlBackslash => "\\",
            _ => "",
        }
    }
}
