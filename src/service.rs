//! Hook worker: owns the dispatch engine and routes every raw event either
//! to an active shortcut capture or to dispatch.

use crate::capture::{CaptureOutcome, Feed, ShortcutCapture};
use crate::dispatch::DispatchEngine;
use crate::input::{HookBackend, InputEvent, KeyboardState};
use anyhow::Context;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

struct ActiveCapture {
    machine: ShortcutCapture,
    reply: Sender<CaptureOutcome>,
}

type CaptureSlot = Arc<Mutex<Option<ActiveCapture>>>;

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: Sender<()>,
    join: JoinHandle<()>,
}

pub struct HotkeyService {
    backend: Box<dyn HookBackend>,
    capture: CaptureSlot,
    worker: Option<WorkerHandle>,
}

impl HotkeyService {
    pub fn new(backend: Box<dyn HookBackend>) -> Self {
        Self {
            backend,
            capture: Arc::new(Mutex::new(None)),
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Install the hook and start the worker. Calling it again while
    /// running does nothing.
    pub fn start(&mut self, engine: DispatchEngine) -> anyhow::Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }
        let (event_tx, event_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel();
        self.backend
            .install(event_tx)
            .context("failed to install global input hook")?;

        let capture = Arc::clone(&self.capture);
        let join = thread::Builder::new()
            .name("hotkey-worker".into())
            .spawn(move || worker_loop(engine, event_rx, stop_rx, capture))
            .context("failed to spawn hotkey worker")?;
        self.worker = Some(WorkerHandle { stop_tx, join });
        tracing::debug!("hotkey service started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.worker.is_none() && !self.backend.is_installed() {
            return;
        }
        if let Err(err) = self.backend.uninstall() {
            tracing::debug!(?err, "hook uninstall failed");
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.join();
        }
        self.cancel_capture();
        tracing::debug!("hotkey service stopped");
    }

    /// Start a capture session. Any session already running is cancelled
    /// first. The returned receiver yields exactly one outcome.
    pub fn begin_capture(&self, allow_mouse: bool) -> Receiver<CaptureOutcome> {
        let (reply, outcome) = mpsc::channel();
        let mut machine = ShortcutCapture::new(allow_mouse);
        machine.begin();
        let previous = lock(&self.capture).replace(ActiveCapture { machine, reply });
        if let Some(mut previous) = previous {
            let _ = previous
                .reply
                .send(CaptureOutcome::Cancelled(previous.machine.cancel()));
        }
        outcome
    }

    /// Close the capture surface without a new shortcut.
    pub fn cancel_capture(&self) {
        if let Some(mut active) = lock(&self.capture).take() {
            let _ = active
                .reply
                .send(CaptureOutcome::Cancelled(active.machine.cancel()));
        }
    }

    pub fn is_capturing(&self) -> bool {
        lock(&self.capture).is_some()
    }
}

impl Drop for HotkeyService {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock(slot: &CaptureSlot) -> std::sync::MutexGuard<'_, Option<ActiveCapture>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn worker_loop(
    mut engine: DispatchEngine,
    event_rx: Receiver<InputEvent>,
    stop_rx: Receiver<()>,
    capture: CaptureSlot,
) {
    let mut keyboard = KeyboardState::default();
    loop {
        if stop_rx.try_recv().is_ok() {
            break;
        }
        let event = match event_rx.recv_timeout(POLL_INTERVAL) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        keyboard.apply(&event);

        if route_to_capture(&capture, &event) {
            continue;
        }
        let outcome = engine.handle(&event, &keyboard);
        tracing::trace!(?event, ?outcome, "dispatched");
    }
}

/// Feed the capture session if one is active. Returns `true` when the
/// event was consumed.
fn route_to_capture(capture: &CaptureSlot, event: &InputEvent) -> bool {
    let mut slot = lock(capture);
    let Some(active) = slot.as_mut() else {
        return false;
    };
    match active.machine.feed(event) {
        Feed::Resolved(shortcut) => {
            if let Some(active) = slot.take() {
                let _ = active.reply.send(CaptureOutcome::Resolved(shortcut));
            }
        }
        Feed::Absorbed => tracing::trace!(?event, "pointer event absorbed by capture"),
        Feed::Pending | Feed::Inactive => {}
    }
    true
}
