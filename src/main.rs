//! SurangNav binary: wiring, thread spawn, and teardown.

use surang_nav::config::RoverConfig;
use surang_nav::error::Result;
use surang_nav::hal::{MockDrive, MockRanging};
use surang_nav::navigation::{Navigator, OperatorCommand};
use surang_nav::odometry::OdometryTracker;
use surang_nav::orientation::OrientationEstimator;
use surang_nav::shared::ConnectionState;
use surang_nav::telemetry::{
    spawn_supervisor, ConnectionSupervisor, SqliteStore, TcpLineTransport, TelemetryBuffer,
};
use surang_nav::App;

use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

/// Parse config path from command line arguments.
///
/// Supports:
/// - `surang-nav <path>` (positional)
/// - `surang-nav --config <path>` (flag-based)
/// - `surang-nav -c <path>` (short flag)
///
/// Falls back to `surang.toml` in the working directory, then to built-in
/// defaults.
fn parse_config_path() -> Option<String> {
    let args: Vec<String> = std::env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return Some(args[1].clone());
    }

    if Path::new("surang.toml").exists() {
        return Some("surang.toml".to_string());
    }

    None
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("SurangNav v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match parse_config_path() {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            RoverConfig::load(Path::new(&path))?
        }
        None => {
            log::info!("Using default configuration");
            RoverConfig::default()
        }
    };

    log::info!(
        "Tunnel length {:.1}m, obstacle threshold {:.0}cm, pod at {}",
        config.navigation.tunnel_length,
        config.navigation.obstacle_threshold_cm,
        config.connection.address
    );
    log::info!("Controls: W/S/A/D drive, SPACE stop, P set origin, C toggle auto, Q quit");

    // Shutdown flag shared with the ctrl-c handler and the control loop
    let shutdown = Arc::new(AtomicBool::new(false));
    let ctrlc_shutdown = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        ctrlc_shutdown.store(true, Ordering::Release);
    })
    .map_err(|e| {
        surang_nav::error::SurangError::Config(format!("Error setting Ctrl-C handler: {}", e))
    })?;

    // Telemetry link: supervisor thread feeding the bounded record channel
    let conn_state = Arc::new(ConnectionState::new());
    let (record_tx, record_rx) = mpsc::sync_channel(64);
    let transport = TcpLineTransport::new(&config.connection.address);
    let supervisor = ConnectionSupervisor::new(
        transport,
        config.connection.clone(),
        Arc::clone(&conn_state),
        record_tx,
    );
    let supervisor_handle = supervisor.handle();
    let supervisor_join = spawn_supervisor(supervisor)?;

    // Operator input: reader thread feeding the command channel.
    // Line-buffered stdin stands in for the single-key cockpit here; each
    // line's first character is the command key.
    let (command_tx, command_rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("operator-input".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(_) => break,
                };
                let key = match line.trim().chars().next() {
                    Some(key) => key,
                    None => ' ', // bare newline = stop
                };
                if let Some(command) = OperatorCommand::from_key(key) {
                    if command_tx.send(command).is_err() {
                        break;
                    }
                }
            }
        })
        .map_err(|e| {
            surang_nav::error::SurangError::Config(format!(
                "Failed to spawn input thread: {}",
                e
            ))
        })?;

    // Persistence
    let store = SqliteStore::open(Path::new(&config.storage.db_path))?;
    let buffer = TelemetryBuffer::new(store, config.storage.buffer_size);

    // Navigation. The chassis drivers live out of tree behind the hal
    // traits; the recording mock stands in for bench runs.
    let odometry = OdometryTracker::new(&config.drive);
    let navigator = Navigator::new(
        MockDrive::new(),
        MockRanging::new(),
        odometry,
        config.drive.clone(),
        config.navigation.clone(),
    );
    let orientation = OrientationEstimator::new(config.filter.clone());

    let mut app = App::new(
        config,
        navigator,
        orientation,
        buffer,
        Arc::clone(&conn_state),
        record_rx,
        command_rx,
        shutdown,
    );
    app.run();

    // Link teardown comes last, after motors are stopped and the buffer is
    // flushed inside App::run
    supervisor_handle.stop();
    if supervisor_join.join().is_err() {
        log::error!("Supervisor thread panicked");
    }

    log::info!("SurangNav stopped");
    Ok(())
}
