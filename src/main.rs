mod airports;
mod duration;
mod feed;
mod push;
mod renderer;
mod storage;
mod tracking;
mod web;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use crate::feed::{FeedRunner, FeedSource};
use crate::push::PushChannel;
use crate::renderer::{drive, LiveMarkerRenderer, LoggingSurface, MarkerBoard};
use crate::tracking::DataSource;
use crate::web::{build_tracker, Config};

#[derive(Parser)]
#[command(name = "skytrace")]
#[command(about = "Live aircraft map fed by dump1090 or recorded snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web map, API and push feed
    Serve {
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
    },
    /// Run the feed headless, logging every marker change
    Watch {
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
    },
    /// Validate a config file
    Check {
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config).await,
        Commands::Watch { config } => watch(&config).await,
        Commands::Check { config } => check(&config),
    }
}

fn load_config(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Error loading {}: {}", path, e);
            None
        }
    }
}

async fn serve(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    match web::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn watch(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    let source = match FeedSource::from_config(&config.feed) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Feed error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let (tracker, _trails) = match build_tracker(&config, source.data_source()) {
        Ok(built) => built,
        Err(e) => {
            eprintln!("Trail storage error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let channel = PushChannel::new();
    let renderer = Arc::new(tokio::sync::Mutex::new(LiveMarkerRenderer::new(
        LoggingSurface::new(MarkerBoard::new()),
    )));
    let render_task = tokio::spawn(drive(renderer.clone(), channel.subscribe()));

    let runner = FeedRunner::new(
        Arc::new(tokio::sync::Mutex::new(source)),
        Arc::new(std::sync::Mutex::new(tracker)),
        channel,
        config.feed.clone(),
    );

    tokio::select! {
        _ = runner.run() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                eprintln!("Failed to listen for Ctrl-C: {}", e);
            }
        }
    }

    // The runner owned the only sender, so `drive` ends once the queue is empty.
    if let Err(e) = render_task.await {
        log::error!("Marker renderer task failed: {}", e);
    }

    let renderer = renderer.lock().await;
    if renderer.surface().inner().is_empty() {
        log::warn!("Feed produced no positioned aircraft");
    }
    println!(
        "Watch finished with {} markers ({} on the board)",
        renderer.marker_count(),
        renderer.surface().inner().len()
    );
    ExitCode::SUCCESS
}

fn check(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    println!("Config is valid");
    println!("  bind: {}", config.web.bind);
    println!("  source: {}", config.feed.source);

    match config.feed.source {
        DataSource::Replay => {
            let replay = &config.feed.replay;
            match feed::JsonReplay::open(&replay.dir, replay.looping) {
                Ok(files) => println!(
                    "  replay: {} files in {}, every {}",
                    files.files().len(),
                    files.dir().display(),
                    humantime::format_duration(replay.pace())
                ),
                Err(e) => {
                    eprintln!("Replay error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        DataSource::Dump1090 => {
            let dump1090 = &config.feed.dump1090;
            println!(
                "  dump1090: {} every {}",
                dump1090.url,
                humantime::format_duration(dump1090.poll_interval)
            );
        }
    }

    if config.storage.enabled {
        println!(
            "  storage: {} (retention {})",
            config.storage.path.display(),
            humantime::format_duration(config.storage.retention)
        );
    }
    println!("  api keys: {}", config.api_keys.len());

    ExitCode::SUCCESS
}
