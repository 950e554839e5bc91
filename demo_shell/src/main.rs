//! Standalone demo binary.
//!
//! Usage:
//!   cargo run -p demo_shell -- [--config demo.json] [--route /joints]
//!       [--tick-hz 60] [--assets-dir assets] [--preset apartment] [--frames N]
//!
//! Runs the shell headlessly against the rapier backend and prints the
//! navigation strip and side panel whenever they change.
//!
//! Console commands:
//!   nav <path>        - Switch routes
//!   routes            - List routes
//!   status            - Show shell status
//!   panel             - Print the side panel
//!   click <id>        - Press a panel button
//!   set <id> <value>  - Move a panel slider
//!   drive <keys>      - Hold w/a/s/d/space
//!   help              - Everything else
//!   quit              - Exit

use std::env;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use demo_shared::{config::DemoConfig, rapier::RapierPhysics};
use demo_shell::{console_view::ConsoleView, environment::BackgroundLoad, SceneRegistry, Shell};
use tokio::sync::mpsc;
use tracing::info;

struct Args {
    config: DemoConfig,
    /// Stop after this many frames.
    frames: Option<u64>,
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = env::args().collect();

    // The config file is the base; every other flag overrides it.
    let mut cfg = match args.iter().position(|a| a == "--config") {
        Some(i) if i + 1 < args.len() => DemoConfig::load(Path::new(&args[i + 1]))?,
        _ => DemoConfig::default(),
    };
    let mut frames = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 2;
            }
            "--route" if i + 1 < args.len() => {
                cfg.initial_route = args[i + 1].clone();
                i += 2;
            }
            "--tick-hz" if i + 1 < args.len() => {
                cfg.tick_hz = args[i + 1].parse().context("parse --tick-hz")?;
                i += 2;
            }
            "--assets-dir" if i + 1 < args.len() => {
                cfg.assets_dir = args[i + 1].clone();
                i += 2;
            }
            "--preset" if i + 1 < args.len() => {
                cfg.environment_preset = args[i + 1].clone();
                i += 2;
            }
            "--frames" if i + 1 < args.len() => {
                frames = Some(args[i + 1].parse().context("parse --frames")?);
                i += 2;
            }
            _ => i += 1,
        }
    }
    Ok(Args {
        config: cfg,
        frames,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let Args { config: cfg, frames } = parse_args()?;
    info!(
        route = %cfg.initial_route,
        preset = %cfg.environment_preset,
        tick_hz = cfg.tick_hz,
        "Starting demo"
    );

    let registry = SceneRegistry::demos().context("build scene registry")?;
    let physics = Box::new(RapierPhysics::new(&cfg.physics));
    let environment = BackgroundLoad::spawn(
        &tokio::runtime::Handle::current(),
        PathBuf::from(&cfg.assets_dir),
        &cfg.environment_preset,
    );
    let dt = cfg.dt();
    let mut shell = Shell::new(cfg, registry, physics, Box::new(environment)).context("create shell")?;
    let mut view = ConsoleView::stdout();

    // Set up console input channel.
    let (console_tx, mut console_rx) = mpsc::channel::<String>(32);

    // Spawn stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!("Demo running. Type 'help' for commands, 'quit' to exit.");
    println!();

    let tick_interval = Duration::from_secs_f32(dt);

    'run: loop {
        while let Ok(line) = console_rx.try_recv() {
            if matches!(line.as_str(), "quit" | "exit") {
                break 'run;
            }
            match shell.exec_console(&line) {
                Ok(output) => {
                    for line in output {
                        println!("{}", line);
                    }
                }
                Err(e) => {
                    println!("Error: {:#}", e);
                }
            }
        }

        shell.frame(dt, &mut view);

        if frames.is_some_and(|limit| shell.frames() >= limit) {
            break;
        }

        tokio::time::sleep(tick_interval).await;
    }

    shell.dispose();
    info!(frames = shell.frames(), "Demo stopped");
    Ok(())
}
