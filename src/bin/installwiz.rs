use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use installwiz::app::WizardApp;
use installwiz::config::WizardConfig;
use installwiz::error::{Result, WizardError};
use installwiz::event::{Event, EventHandler};
use installwiz::lifecycle::{
    ChannelHost, ChannelPrompter, InstallLifecycle, TomlUninstallWriter, UnpackWorker,
};
use installwiz::navigation::{Command, Controller, Navigator};
use installwiz::panel::build_registry;
use installwiz::rules::RulesEngine;
use installwiz::system;
use ratatui::prelude::*;
use std::io::stdout;
use std::panic;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "installwiz")]
#[command(author, version, about = "Panel-driven installer wizard")]
struct Args {
    /// Path to wizard config file (default: /etc/installwiz/wizard.toml)
    #[arg(long)]
    config: Option<String>,

    /// Simulate the install step and skip the reboot
    #[arg(long)]
    dryrun: bool,

    /// Log file path (logging disabled if not specified)
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The terminal belongs to the UI, so logs only ever go to a file
    if let Some(ref log_path) = args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .ok();

        if let Some(file) = file {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init();

            info!("Starting installwiz");
        }
    }

    let mut config = match args.config.as_deref() {
        Some(path) => WizardConfig::load_from(path)?,
        None => WizardConfig::load()?,
    };

    // --dryrun flag overrides config
    if args.dryrun {
        config.general.dryrun = true;
    }

    // Set up panic handler to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let dryrun = config.general.dryrun;
    let mut terminal = setup_terminal()?;
    let result = run_wizard(&mut terminal, config).await;
    restore_terminal()?;

    match result {
        Ok(Some((exit_code, reboot))) => {
            if reboot {
                if let Err(e) = system::reboot(dryrun) {
                    error!("Reboot failed: {}", e);
                }
            }
            std::process::exit(exit_code);
        }
        Ok(None) => Ok(()),
        Err(e) => {
            error!("Wizard error: {}", e);
            Err(e)
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode().map_err(|e| WizardError::Terminal(e.to_string()))?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).map_err(|e| WizardError::Terminal(e.to_string()))?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).map_err(|e| WizardError::Terminal(e.to_string()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().map_err(|e| WizardError::Terminal(e.to_string()))?;
    execute!(stdout(), LeaveAlternateScreen).map_err(|e| WizardError::Terminal(e.to_string()))?;
    Ok(())
}

/// Returns the exit code and reboot flag once the wizard shut down
async fn run_wizard(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    config: WizardConfig,
) -> Result<Option<(i32, bool)>> {
    let tick_rate = Duration::from_millis(250);
    let mut events = EventHandler::new(tick_rate);

    let (wizard_tx, wizard_rx) = mpsc::unbounded_channel();
    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    events.forward(wizard_rx, Event::Wizard);
    events.forward(progress_rx, Event::Install);

    let navigator = Navigator::new(
        build_registry(&config),
        Arc::new(RulesEngine::from_config(&config)),
        config.variable_store(),
        wizard_tx.clone(),
    )?;

    let worker = UnpackWorker::new(
        config.files.clone(),
        progress_tx,
        tokio::runtime::Handle::current(),
    )
    .dryrun(config.general.dryrun);
    let uninstall_path = config
        .install
        .uninstall_record
        .clone()
        .unwrap_or_else(TomlUninstallWriter::default_path);

    let lifecycle = InstallLifecycle::new(
        Box::new(worker),
        Box::new(TomlUninstallWriter::new(uninstall_path)),
        Box::new(ChannelHost::new(wizard_tx.clone())),
        Box::new(ChannelPrompter::new(wizard_tx.clone())),
    )
    .with_policy(config.install.policy())
    .with_messages(config.messages.clone())
    .with_reboot(config.install.reboot_required, config.install.reboot_policy);

    let (handle, controller) = Controller::new(navigator, lifecycle, wizard_tx).spawn();
    handle.send(Command::Start)?;

    let mut app = WizardApp::new(config);

    loop {
        terminal
            .draw(|frame| installwiz::ui::draw(frame, &app))
            .map_err(|e| WizardError::Terminal(e.to_string()))?;

        let Some(event) = events.next().await else {
            break;
        };

        let command = match event {
            Event::Key(key) => app.handle_key(key),
            Event::Wizard(event) => {
                app.handle_wizard_event(event);
                None
            }
            Event::Install(progress) => app.handle_install(progress),
            Event::Resize | Event::Tick => None,
        };

        if let Some(command) = command {
            if let Err(e) = handle.send(command) {
                warn!("Dropping command: {}", e);
            }
        }

        if app.should_exit {
            break;
        }
    }

    drop(handle);
    match controller.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(e),
        Err(e) => return Err(WizardError::InvariantViolation(e.to_string())),
    }

    Ok(app.shutdown)
}
