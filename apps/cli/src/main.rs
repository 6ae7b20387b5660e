use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use console::style;
use reelsync_core::{
    FilePreferenceStore, HttpWatchApi, PlayerConfig, QualityLabel, SeekOrigin, SimulatedElement,
    VideoId, WatchApi,
    events::BusConfig,
    session::{SessionOptions, events::PlayerCommand, start_session},
};
use tokio::time::{Instant, MissedTickBehavior};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{demo::demo_backend, view::PlaybackView};

mod demo;
mod view;

/// The host drives the element clock at this rate.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

#[derive(Parser)]
#[command(name = "reelsync")]
#[command(about = "Play a video against a simulated media element and follow its transcript")]
struct Cli {
    /// Video id on the watch platform
    video_id: String,

    /// Quality to switch to once playback starts (e.g. "720p", "MAX")
    #[arg(short, long)]
    quality: Option<String>,

    /// Start position in seconds
    #[arg(short, long)]
    seek: Option<f64>,

    /// Playback rate, 0.25 to 2.0
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Length of the simulated media in seconds
    #[arg(short, long, default_value_t = 300.0)]
    duration: f64,

    /// Use a built-in demo backend instead of the REST API
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelsync=info,reelsync_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = PlayerConfig::from_env()?;
    let video_id = VideoId::new(cli.video_id.trim());
    if video_id.as_str().is_empty() {
        eprintln!("{} video id is empty", style("Error:").red().bold());
        std::process::exit(1);
    }

    println!(
        "\n{}  {}\n",
        style("reelsync").cyan().bold(),
        style(video_id.as_str()).dim()
    );

    let api: Arc<dyn WatchApi> = if cli.offline {
        println!("{} Offline demo backend", style("✓").green().bold());
        Arc::new(demo_backend(&video_id, cli.duration))
    } else {
        println!(
            "{} Backend: {}",
            style("✓").green().bold(),
            style(&config.api_url).dim()
        );
        Arc::new(HttpWatchApi::new(config.api_url.clone()))
    };
    let preferences = FilePreferenceStore::default_location();
    tracing::debug!(path = %preferences.path().display(), "Using preference store");

    let mut handle = start_session(SessionOptions {
        config: Arc::new(config),
        api,
        preferences: Arc::new(preferences),
        element: SimulatedElement::new(cli.duration),
        video_id,
        chapters: None,
        poster: None,
        bus: BusConfig::new(),
    })
    .await?;

    println!("{}", style("─".repeat(60)).dim());

    if let Some(quality) = cli.quality {
        handle.command(PlayerCommand::SetQuality(QualityLabel::new(quality)));
    }
    if (cli.speed - 1.0).abs() > f64::EPSILON {
        handle.command(PlayerCommand::SetPlaybackRate(cli.speed));
    }
    match cli.seek {
        // external seeks resume a paused player
        Some(position) => handle.seek(position, SeekOrigin::External),
        None => handle.command(PlayerCommand::Play),
    }

    let started = Instant::now();
    let mut view = PlaybackView::new();
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            at = ticker.tick() => handle.tick(at),
            event = handle.events.recv() => match event {
                Some(event) => {
                    if view.apply(&event) {
                        break;
                    }
                }
                None => break,
            },
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted, saving progress");
                break;
            }
        }
    }

    view.finish();
    handle.shutdown().await?;

    println!(
        "\n{} {}\n",
        style("Watched for:").dim(),
        style(format_duration(started.elapsed())).cyan().bold()
    );

    Ok(())
}
