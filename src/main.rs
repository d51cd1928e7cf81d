use anyhow::Context;
use hotclick::actuator::DefaultActuator;
use hotclick::app::App;
use hotclick::dispatch::{self, DispatchEngine, SessionFlags};
use hotclick::frontend::{ConsoleFocus, DialogPicker, HeadlessWindow, LogStatus};
use hotclick::input::DefaultHookBackend;
use hotclick::logging;
use hotclick::paths::AppPaths;
use hotclick::persistence;
use hotclick::service::HotkeyService;
use hotclick::style::StyleTable;
use std::sync::{mpsc, Arc};

fn main() -> anyhow::Result<()> {
    let paths = AppPaths::resolve()?;
    let debug = logging::debug_requested();
    logging::init(debug, debug.then(|| paths.log_file.clone()));

    let mut picker = DialogPicker;
    let Some(located) = persistence::locate_and_load(&paths.config_dir, &mut picker)
        .context("failed to prepare the config directory")?
    else {
        return Ok(());
    };

    let mut style = StyleTable::default();
    if paths.style_file.exists() {
        if let Err(err) = style.load(&paths.style_file) {
            tracing::error!(%err, "failed to load the style file, using defaults");
        }
    } else if let Err(err) = style.save(&paths.style_file) {
        tracing::warn!(%err, "failed to write the default style file");
    }

    let session = Arc::new(SessionFlags::default());
    let (ui_tx, ui_rx) = mpsc::channel();
    let mut app = App::new(
        located,
        paths.config_dir.clone(),
        Arc::clone(&session),
        Box::new(HeadlessWindow),
        Box::new(LogStatus),
        Box::new(picker),
    );

    ctrlc::set_handler(dispatch::quit_handler(ui_tx.clone()))
        .context("failed to set the Ctrl+C handler")?;

    let engine = DispatchEngine::new(
        app.table().shared(),
        session,
        Box::new(DefaultActuator::default()),
        ui_tx,
    )
    .with_builtin_forwarding(true)
    .with_window_focus(Box::new(ConsoleFocus));
    let mut service = HotkeyService::new(Box::new(DefaultHookBackend::default()));
    service.start(engine)?;

    // There is no window to press Start in, so start right away.
    app.start();
    app.run(ui_rx);
    service.stop();
    tracing::info!("Program closed");
    logging::flush();
    Ok(())
}
