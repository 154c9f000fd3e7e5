//! Tickscene server binary.
//!
//! Loads `config.ini` and the scene document, populates the scene and runs
//! the paced tick loop. With `--demo-client` a fake client connects, walks
//! its pawn in circles and logs the deltas it receives. `--write-config`
//! saves the effective configuration back to the INI file and exits.
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::unbounded;
use log::{error, info};

use tickscene::Scene;
use tickscene::resources::clients::{ClientId, InputFrame};
use tickscene::resources::configregistry::{ConfigRegistry, SceneDocument};
use tickscene::resources::logicregistry::LogicRegistry;
use tickscene::resources::sceneconfig::SceneConfig;
use tickscene::resources::workqueue::WorkSender;
use tickscene::systems::actors::log_population;

#[derive(Parser)]
#[command(version, about = "Authoritative tick-driven scene server")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Scene document, overriding `[scene] path` from the configuration.
    #[arg(long, value_name = "PATH")]
    scene: Option<PathBuf>,

    /// Stop after this many ticks instead of running forever.
    #[arg(long)]
    ticks: Option<u64>,

    /// Connect a demo client that walks its pawn around.
    #[arg(long)]
    demo_client: bool,

    /// Write the effective configuration back to the INI file and exit.
    #[arg(long)]
    write_config: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = SceneConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        info!("{}; using defaults", e);
    }
    if let Some(path) = cli.scene {
        config.scene_path = Some(path);
    }
    if cli.write_config {
        if let Err(e) = config.save_to_file() {
            error!("{}", e);
            std::process::exit(1);
        }
        return;
    }

    let logics = LogicRegistry::with_builtins();
    let mut scene = match &config.scene_path {
        Some(path) => {
            let document = match SceneDocument::load_from_file(path) {
                Ok(document) => document,
                Err(e) => {
                    error!("{}", e);
                    std::process::exit(1);
                }
            };
            match Scene::from_document(&config, &document, logics) {
                Ok(scene) => scene,
                Err(e) => {
                    error!("{}", e);
                    std::process::exit(1);
                }
            }
        }
        None => {
            info!("No scene document configured, starting an empty scene");
            Scene::new(&config, ConfigRegistry::new(), logics)
        }
    };

    let stop = Arc::new(AtomicBool::new(false));
    let demo = cli
        .demo_client
        .then(|| start_demo_client(scene.sender(), Arc::clone(&stop), config.tick_interval_ms));

    match cli.ticks {
        Some(ticks) => scene.run_for(ticks),
        None => scene.run_until(&stop),
    }
    stop.store(true, Ordering::Relaxed);
    if let Some(handles) = demo {
        scene.sender().body_left(ClientId(1));
        scene.tick();
        for handle in handles {
            let _ = handle.join();
        }
    }
    log_population(scene.world());
    let snapshot = scene.reader().latest();
    info!(
        "Final snapshot: tick {}, timestamp {}, {} actors",
        snapshot.tick,
        snapshot.timestamp,
        snapshot.actors.len()
    );
}

/// Spawns the demo input thread and the delta logger thread.
fn start_demo_client(
    sender: WorkSender,
    stop: Arc<AtomicBool>,
    interval_ms: u32,
) -> Vec<thread::JoinHandle<()>> {
    let client = ClientId(1);
    let (tx, rx) = unbounded();
    sender.body_entered(client, tx);

    let input_stop = Arc::clone(&stop);
    let input = thread::spawn(move || {
        let mut sequence = 0u32;
        let mut timestamp = 0i64;
        while !input_stop.load(Ordering::Relaxed) {
            sequence += 1;
            timestamp += interval_ms as i64;
            let heading = sequence as f32 * 0.05;
            let frame = InputFrame::new(timestamp, heading, heading, InputFrame::MOVE);
            if !sender.enqueue_input(client, sequence, timestamp, vec![frame]) {
                break;
            }
            thread::sleep(Duration::from_millis(interval_ms as u64));
        }
    });

    let logger = thread::spawn(move || {
        for delta in rx.iter() {
            if !delta.is_empty() {
                info!(
                    "Delta at {}: {} updated, {} removed, {} effects, ping {}ms",
                    delta.timestamp,
                    delta.updated.len(),
                    delta.removed.len(),
                    delta.effects.len(),
                    delta.ping
                );
            }
            if stop.load(Ordering::Relaxed) && rx.is_empty() {
                break;
            }
        }
    });
    vec![input, logger]
}
