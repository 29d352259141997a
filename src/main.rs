//! Kairos main entry point
//!
//! The foreground thread runs the shell loop. It is fed by two producers
//! through a single channel:
//! 1. the stdin reader thread (operator input)
//! 2. the audit coordinator (run started / finished notifications)

use kairos::audit::{AuditEvent, Coordinator};
use kairos::config::Config;
use kairos::shell::{spawn_input_reader, Shell, ShellEvent};
use kairos::speech::Engine;
use kairos::Result;
use log::{debug, error, info, warn};
use std::io::{self, BufReader};
use std::process;
use std::sync::mpsc;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let debug_mode = args.iter().any(|arg| arg == "--debug" || arg == "-d");

    if debug_mode {
        // Debug mode: write to kairos.log so the terminal stays clean
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("kairos.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open kairos.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "Kairos version {} starting (debug mode, logging to kairos.log)",
            kairos::VERSION
        );
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Warn)
            .parse_default_env()
            .init();
    }

    if let Err(e) = run() {
        error!("Fatal error: {}", e);
        if e.is_fatal() {
            eprintln!("Kernel Error: {}", e);
        } else {
            eprintln!("Error: {}", e);
        }
        process::exit(1);
    }
}

fn run() -> Result<()> {
    debug!("Initializing Kairos");

    // A broken config file is worth a warning, never an exit
    let config = Config::load().unwrap_or_else(|e| {
        warn!("{}, using default configuration", e);
        Config::defaults(Config::default_path())
    });
    info!("Configuration loaded from {:?}", config.path());

    // No fallback past this point: without an engine there is nothing to
    // play audits on, so initialization failure ends the process
    let engine = Engine::initialize(config.backend())?;
    let backend = engine.backend_name();

    let (tx, rx) = mpsc::channel::<ShellEvent>();

    let audit_tx = tx.clone();
    let coordinator = Coordinator::new(engine, move |event: AuditEvent| {
        let _ = audit_tx.send(ShellEvent::Audit(event));
    });

    spawn_input_reader(BufReader::new(io::stdin()), tx)?;

    let rate = config.default_rate();
    let mut shell = Shell::new(coordinator, backend, rate, io::stdout()).with_config(config);
    shell.greet()?;
    shell.run(&rx)?;

    // Audit workers are detached; exiting does not wait for playback
    info!("Kairos shutting down");
    Ok(())
}
