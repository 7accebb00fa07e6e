//! recomp-input front-end
//!
//! Runs the controller input layer against real hardware: lists controllers,
//! walks players through controller assignment, and drives the poll loop
//! with rumble and gyro read-out.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recomp_input::config::{default_config_path, ConfigStore, ConfigWatcher, ReloadOutcome, SharedConfig};
use recomp_input::console::{self, ConsoleUi};
use recomp_input::input::{
    AssignmentOutcome, DispatchFlow, GilrsBackend, InputSubsystem, SessionFlags,
};

/// Controller input layer for recompiled N64 games
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input settings file
    #[arg(short, long, env = "RECOMP_INPUT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List connected controllers and exit
    #[arg(long)]
    list_controllers: bool,

    /// Print the controller list as JSON
    #[arg(long, requires = "list_controllers")]
    json: bool,

    /// Run the controller assignment wizard on startup
    #[arg(long)]
    assign: bool,

    /// Poll loop rate in Hz
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u32).range(1..=1000))]
    tick_hz: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    info!("Starting recomp-input...");
    info!("Configuration file: {}", config_path.display());

    let (mut config_watcher, initial_config) = ConfigWatcher::new(config_path.clone()).await?;
    let config = SharedConfig::new(initial_config);

    if args.list_controllers {
        let json = args.json;
        let config = config.clone();
        let listing = tokio::task::spawn_blocking(move || -> Result<_> {
            let input = open_subsystem(config, Arc::new(SessionFlags::new()))?;
            input.scan_controllers();
            let options = input.refresh_controller_options();
            Ok(console::controller_listing(options, &input.assignments()))
        })
        .await??;
        console::print_controllers(&listing, json)?;
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    let input_config = config.clone();
    let loop_args = args.clone();
    let mut input_task =
        tokio::task::spawn_blocking(move || run_input_loop(input_config, loop_args, shutdown_rx));

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut save_interval = tokio::time::interval(Duration::from_secs(1));

    let loop_result = loop {
        tokio::select! {
            result = &mut input_task => {
                break result;
            }

            Some(new_config) = config_watcher.next_config() => {
                match config.apply_reload(new_config) {
                    ReloadOutcome::OwnWrite => debug!("Ignoring reload of our own save"),
                    ReloadOutcome::Merged => {
                        info!("📝 Configuration file changed, applied (kept unsaved controller assignments)");
                    },
                    ReloadOutcome::Replaced => info!("📝 Configuration file changed, applied"),
                }
            }

            _ = save_interval.tick() => {
                if let Err(e) = config.save_if_dirty(&config_path).await {
                    warn!("⚠️  Failed to save settings: {:#}", e);
                }
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping input loop");
                let _ = shutdown_tx.send(()).await;
                break input_task.await;
            }
        }
    };
    loop_result.context("Input thread panicked")??;

    config.save_if_dirty(&config_path).await?;

    info!("recomp-input shutdown complete");
    Ok(())
}

fn open_subsystem(config: SharedConfig, session: Arc<SessionFlags>) -> Result<InputSubsystem<GilrsBackend>> {
    let backend = GilrsBackend::new().context("Failed to initialize gamepad backend")?;
    Ok(InputSubsystem::new(
        backend,
        Arc::new(config),
        Arc::new(ConsoleUi::new()),
        session,
    ))
}

/// Blocking poll loop; gilrs is not `Send`, so the subsystem lives on this thread
fn run_input_loop(config: SharedConfig, args: Args, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
    let session = Arc::new(SessionFlags::new());
    let input = open_subsystem(config.clone(), session.clone())?;
    input.scan_controllers();
    info!("🎮 {} controller(s) detected", input.detected_controller_count());

    let mut assignment = if args.assign {
        Some(input.begin_controller_assignment(input.detected_controller_count())?)
    } else {
        None
    };

    let tick = Duration::from_secs_f64(1.0 / f64::from(args.tick_hz));
    let mut last_state = input.n64_controller_state(0);

    loop {
        match shutdown_rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {},
        }

        if input.handle_events() == DispatchFlow::Exit || session.is_quit_requested() {
            info!("Quit requested");
            break;
        }

        // Follow hot-reloaded settings
        input.set_single_controller_mode(config.single_controller());

        input.poll_inputs();
        input.update_rumble();

        if let Some(handle) = assignment.as_mut() {
            match handle.try_outcome() {
                AssignmentOutcome::InProgress => {},
                outcome => {
                    info!("Controller assignment finished: {:?}", outcome);
                    assignment = None;
                },
            }
        }

        let state = input.n64_controller_state(0);
        if state != last_state {
            debug!(
                "P1 buttons={:#06x} stick=({:.2}, {:.2})",
                state.buttons, state.stick_x, state.stick_y
            );
            last_state = state;
        }

        let (yaw, pitch) = input.get_gyro_deltas();
        if yaw != 0.0 || pitch != 0.0 {
            debug!("Gyro delta yaw={:.3} pitch={:.3}", yaw, pitch);
        }

        std::thread::sleep(tick);
    }

    input.shutdown();
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
