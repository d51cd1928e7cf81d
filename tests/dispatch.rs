use hotclick::actuator::PointerActuator;
use hotclick::config::{BuiltinAction, ClickBinding, Configuration, PointerAction};
use hotclick::dispatch::{Dispatch, DispatchEngine, SessionFlags, UiRequest};
use hotclick::hotkey::{ModifierState, PointerButton};
use hotclick::input::{InputEvent, KeyboardState};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, RwLock};

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Move(i32, i32),
    Click(PointerButton),
}

/// Actuator that records every call and tracks where the pointer is.
#[derive(Clone)]
struct RecordingActuator {
    ops: Arc<Mutex<Vec<Op>>>,
    position: Arc<Mutex<(i32, i32)>>,
}

impl RecordingActuator {
    fn at(x: i32, y: i32) -> Self {
        Self {
            ops: Arc::new(Mutex::new(Vec::new())),
            position: Arc::new(Mutex::new((x, y))),
        }
    }

    fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    fn clicks(&self) -> Vec<((i32, i32), PointerButton)> {
        let mut at = (0, 0);
        let mut clicks = Vec::new();
        for op in self.ops() {
            match op {
                Op::Move(x, y) => at = (x, y),
                Op::Click(button) => clicks.push((at, button)),
            }
        }
        clicks
    }

    fn position(&self) -> (i32, i32) {
        *self.position.lock().unwrap()
    }
}

impl PointerActuator for RecordingActuator {
    fn position(&self) -> Option<(i32, i32)> {
        Some(*self.position.lock().unwrap())
    }

    fn move_to(&mut self, x: i32, y: i32) {
        *self.position.lock().unwrap() = (x, y);
        self.ops.lock().unwrap().push(Op::Move(x, y));
    }

    fn click(&mut self, button: PointerButton) {
        self.ops.lock().unwrap().push(Op::Click(button));
    }
}

struct Rig {
    engine: DispatchEngine,
    actuator: RecordingActuator,
    session: Arc<SessionFlags>,
    ui: Receiver<UiRequest>,
}

fn armed_rig(config: Configuration) -> Rig {
    let actuator = RecordingActuator::at(900, 700);
    let session = Arc::new(SessionFlags::default());
    session.set_minimized(true);
    session.set_armed(true);
    let (tx, ui) = mpsc::channel();
    let engine = DispatchEngine::new(
        Arc::new(RwLock::new(config)),
        Arc::clone(&session),
        Box::new(actuator.clone()),
        tx,
    );
    Rig {
        engine,
        actuator,
        session,
        ui,
    }
}

fn bound(shortcut: &str, binding: ClickBinding) -> Configuration {
    let mut config = Configuration::default();
    config.hotkeys.insert(shortcut.into(), binding);
    config
}

fn none() -> ModifierState {
    ModifierState::default()
}

#[test]
fn held_hotkey_clicks_once_on_release() {
    let binding = ClickBinding::new(200, 100, 60, 40);
    let mut rig = armed_rig(bound("a", binding));

    assert_eq!(
        rig.engine.on_key_press("a", &none()),
        Dispatch::HoldStarted {
            shortcut: "a".into(),
            target: (170, 80)
        }
    );
    for _ in 0..25 {
        assert_eq!(rig.engine.on_key_press("a", &none()), Dispatch::HoldReasserted);
    }
    assert!(rig.actuator.clicks().is_empty());

    assert_eq!(
        rig.engine.on_key_release("a"),
        Dispatch::Clicked {
            shortcut: "a".into(),
            target: (170, 80)
        }
    );
    assert_eq!(rig.actuator.clicks(), vec![((170, 80), PointerButton::Left)]);
    assert_eq!(rig.actuator.position(), (900, 700));
    assert!(!rig.engine.is_holding());

    // A stray second release does nothing.
    assert_eq!(rig.engine.on_key_release("a"), Dispatch::Ignored);
    assert_eq!(rig.actuator.clicks().len(), 1);
}

#[test]
fn other_keys_are_ignored_during_a_hold() {
    let mut config = bound("a", ClickBinding::new(50, 50, 10, 10));
    config.hotkeys.insert("b".into(), ClickBinding::new(300, 300, 10, 10));
    let mut rig = armed_rig(config);

    rig.engine.on_key_press("a", &none());
    assert_eq!(rig.engine.on_key_press("b", &none()), Dispatch::Ignored);
    assert_eq!(rig.engine.on_key_release("b"), Dispatch::Ignored);
    rig.engine.on_key_release("a");
    assert_eq!(rig.actuator.clicks(), vec![((45, 45), PointerButton::Left)]);
}

#[test]
fn modifiers_select_the_binding() {
    let mut rig = armed_rig(bound("ctrl+alt+k", ClickBinding::new(20, 20, 4, 4)));
    assert_eq!(rig.engine.on_key_press("k", &none()), Dispatch::Ignored);

    let mut keyboard = KeyboardState::default();
    for event in [
        InputEvent::KeyPress("alt".into()),
        InputEvent::KeyPress("ctrl".into()),
        InputEvent::KeyPress("k".into()),
    ] {
        keyboard.apply(&event);
        rig.engine.handle(&event, &keyboard);
    }
    assert!(rig.engine.is_holding());
    let release = InputEvent::KeyRelease("k".into());
    keyboard.apply(&release);
    assert!(matches!(
        rig.engine.handle(&release, &keyboard),
        Dispatch::Clicked { .. }
    ));
}

#[test]
fn disable_toggle_round_trips_and_blocks_actions() {
    let mut config = bound("a", ClickBinding::new(50, 50, 10, 10));
    config
        .shortcuts
        .custom
        .insert("f9".into(), PointerAction::LeftButton);
    let mut rig = armed_rig(config);
    let initial = rig.session.hotkeys_disabled();

    assert_eq!(
        rig.engine.on_key_press("*", &none()),
        Dispatch::DisableToggled { disabled: true }
    );
    assert_eq!(rig.engine.on_key_press("a", &none()), Dispatch::Ignored);
    assert_eq!(rig.engine.on_key_press("f9", &none()), Dispatch::Ignored);
    rig.engine.on_key_release("a");
    assert!(rig.actuator.ops().is_empty());

    assert_eq!(
        rig.engine.on_key_press("*", &none()),
        Dispatch::DisableToggled { disabled: false }
    );
    assert_eq!(rig.session.hotkeys_disabled(), initial);
    assert_eq!(rig.ui.try_recv(), Ok(UiRequest::Status("Hotkeys disabled".into())));
    assert_eq!(rig.ui.try_recv(), Ok(UiRequest::Status("Hotkeys enabled".into())));
    assert!(matches!(
        rig.engine.on_key_press("f9", &none()),
        Dispatch::Custom { .. }
    ));
}

#[test]
fn restore_still_works_while_disabled() {
    let mut rig = armed_rig(Configuration::default());
    rig.session.set_hotkeys_disabled(true);
    let held = ModifierState {
        ctrl: true,
        maj: false,
        alt: true,
    };

    assert_eq!(rig.engine.on_key_press("r", &held), Dispatch::Restore);
    assert_eq!(rig.ui.try_recv(), Ok(UiRequest::Restore));
    assert!(!rig.session.is_armed());
}

#[test]
fn restore_binding_is_user_defined() {
    let mut config = Configuration::default();
    config
        .shortcuts
        .builtin
        .insert(BuiltinAction::RestoreApplication, "F12".into());
    let mut rig = armed_rig(config);
    let held = ModifierState {
        ctrl: true,
        maj: false,
        alt: true,
    };
    assert_eq!(rig.engine.on_key_press("r", &held), Dispatch::Ignored);
    assert_eq!(rig.engine.on_key_press("f12", &none()), Dispatch::Restore);
}

#[test]
fn disable_can_be_toggled_only_while_armed() {
    let mut rig = armed_rig(Configuration::default());
    rig.session.set_armed(false);
    assert_eq!(rig.engine.on_key_press("*", &none()), Dispatch::Ignored);
    assert!(!rig.session.hotkeys_disabled());
}
