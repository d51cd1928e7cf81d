//! Synthetic pointer output used by dispatch.

use crate::hotkey::PointerButton;

pub trait PointerActuator: Send {
    /// Current pointer position, if the platform can tell.
    fn position(&self) -> Option<(i32, i32)>;
    fn move_to(&mut self, x: i32, y: i32);
    fn click(&mut self, button: PointerButton);
}

#[cfg(target_os = "windows")]
pub type DefaultActuator = RdevActuator;

#[cfg(not(target_os = "windows"))]
pub type DefaultActuator = LogActuator;

/// Logs what it would have done. Used where synthetic input is unavailable.
#[derive(Debug, Default)]
pub struct LogActuator;

impl PointerActuator for LogActuator {
    fn position(&self) -> Option<(i32, i32)> {
        None
    }

    fn move_to(&mut self, x: i32, y: i32) {
        tracing::debug!(x, y, "pointer move skipped: no synthetic input on this platform");
    }

    fn click(&mut self, button: PointerButton) {
        tracing::debug!(%button, "click skipped: no synthetic input on this platform");
    }
}

#[cfg(target_os = "windows")]
#[derive(Debug, Default)]
pub struct RdevActuator;

#[cfg(target_os = "windows")]
impl RdevActuator {
    fn send(event: &rdev::EventType) {
        if let Err(err) = rdev::simulate(event) {
            tracing::warn!(?err, ?event, "failed to simulate input");
        }
        // Windows drops injected events that arrive back to back.
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
}

#[cfg(target_os = "windows")]
impl PointerActuator for RdevActuator {
    fn position(&self) -> Option<(i32, i32)> {
        use windows::Win32::Foundation::POINT;
        use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

        let mut point = POINT { x: 0, y: 0 };
        if unsafe { GetCursorPos(&mut point).is_ok() } {
            Some((point.x, point.y))
        } else {
            None
        }
    }

    fn move_to(&mut self, x: i32, y: i32) {
        Self::send(&rdev::EventType::MouseMove {
            x: x as f64,
            y: y as f64,
        });
    }

    fn click(&mut self, button: PointerButton) {
        let button = match button {
            PointerButton::Left => rdev::Button::Left,
            PointerButton::Right => rdev::Button::Right,
            PointerButton::Middle => rdev::Button::Middle,
        };
        Self::send(&rdev::EventType::ButtonPress(button));
        Self::send(&rdev::EventType::ButtonRelease(button));
    }
}
