use hotclick::capture::{Feed, ShortcutCapture};
use hotclick::hotkey;
use hotclick::input::{InputEvent, KeyboardState};

fn sequence() -> Vec<InputEvent> {
    vec![
        InputEvent::KeyPress("ctrl".into()),
        InputEvent::KeyPress("alt".into()),
        InputEvent::KeyRelease("ctrl".into()),
        InputEvent::KeyPress("k".into()),
    ]
}

#[test]
fn capture_and_ambient_resolution_disagree() {
    let mut capture = ShortcutCapture::new(false);
    capture.begin();
    let mut keyboard = KeyboardState::default();
    let mut captured = None;
    let mut ambient = None;

    for event in sequence() {
        keyboard.apply(&event);
        if let Feed::Resolved(shortcut) = capture.feed(&event) {
            captured = Some(shortcut);
        }
        if let InputEvent::KeyPress(key) = &event {
            ambient = Some(hotkey::resolve(key, &keyboard));
        }
    }

    assert_eq!(captured.as_deref(), Some("ctrl+alt+k"));
    assert_eq!(ambient.as_deref(), Some("alt+k"));
}

#[test]
fn ambient_resolution_orders_prefixes() {
    let mut keyboard = KeyboardState::default();
    for key in ["alt", "maj", "ctrl"] {
        keyboard.apply(&InputEvent::KeyPress(key.into()));
    }
    assert_eq!(hotkey::resolve("x", &keyboard), "ctrl+maj+alt+x");
}
