//! Interactive shortcut capture.
//!
//! Unlike [`crate::hotkey::resolve`], capture records modifiers in the order
//! they were pressed and never forgets one that has been released, so
//! `ctrl`, `alt`, release `ctrl`, `k` yields `ctrl+alt+k`. The result is
//! therefore not always in canonical prefix order.

use crate::hotkey::{self, Modifier};
use crate::input::InputEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing,
    Resolved(String),
    Cancelled(String),
}

/// How a capture session ended, as handed back to whoever started it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Resolved(String),
    Cancelled(String),
}

impl CaptureOutcome {
    pub fn shortcut(&self) -> &str {
        match self {
            CaptureOutcome::Resolved(s) | CaptureOutcome::Cancelled(s) => s,
        }
    }
}

/// What feeding one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    /// Not capturing; the event was not looked at.
    Inactive,
    /// Event consumed, still waiting for a base key.
    Pending,
    /// Pointer event swallowed because pointer capture is off.
    Absorbed,
    Resolved(String),
}

#[derive(Debug, Clone)]
pub struct ShortcutCapture {
    state: CaptureState,
    allow_mouse: bool,
    modifiers: Vec<Modifier>,
    last: String,
}

impl ShortcutCapture {
    pub fn new(allow_mouse: bool) -> Self {
        Self {
            state: CaptureState::Idle,
            allow_mouse,
            modifiers: Vec::new(),
            last: String::new(),
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == CaptureState::Capturing
    }

    pub fn allows_mouse(&self) -> bool {
        self.allow_mouse
    }

    /// Seed the shortcut a cancelled capture hands back, typically the one
    /// the control showed before the capture started.
    pub fn with_current(mut self, shortcut: &str) -> Self {
        self.last = shortcut.to_string();
        self
    }

    /// Only an idle capture can start; finished ones stay finished.
    pub fn begin(&mut self) -> bool {
        if self.state != CaptureState::Idle {
            return false;
        }
        self.state = CaptureState::Capturing;
        tracing::debug!(allow_mouse = self.allow_mouse, "shortcut capture started");
        true
    }

    /// Stop without a new shortcut. Emits whatever was last resolved,
    /// which may be empty.
    pub fn cancel(&mut self) -> String {
        if self.is_capturing() {
            self.state = CaptureState::Cancelled(self.last.clone());
            tracing::debug!("shortcut capture cancelled");
        }
        self.last.clone()
    }

    pub fn feed(&mut self, event: &InputEvent) -> Feed {
        if !self.is_capturing() {
            return Feed::Inactive;
        }
        match event {
            InputEvent::KeyPress(key) => {
                let key = key.trim().to_lowercase();
                if key.is_empty() {
                    return Feed::Pending;
                }
                match Modifier::from_key(&key) {
                    Some(modifier) => {
                        if !self.modifiers.contains(&modifier) {
                            self.modifiers.push(modifier);
                        }
                        Feed::Pending
                    }
                    None => {
                        let mut parts: Vec<&str> = self.modifiers.iter().map(|m| m.name()).collect();
                        parts.push(&key);
                        let shortcut = parts.join("+");
                        self.finish(shortcut)
                    }
                }
            }
            InputEvent::ButtonPress(button) | InputEvent::DoubleClick(button) => {
                if !self.allow_mouse {
                    return Feed::Absorbed;
                }
                let double = matches!(event, InputEvent::DoubleClick(_));
                self.finish(hotkey::pointer_token(*button, double))
            }
            InputEvent::ButtonRelease(_) if !self.allow_mouse => Feed::Absorbed,
            _ => Feed::Pending,
        }
    }

    fn finish(&mut self, shortcut: String) -> Feed {
        tracing::debug!(%shortcut, "shortcut captured");
        self.last = shortcut.clone();
        self.modifiers.clear();
        self.state = CaptureState::Resolved(shortcut.clone());
        Feed::Resolved(shortcut)
    }
}
