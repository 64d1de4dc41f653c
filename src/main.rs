use anyhow::{Context, Result};
use capture_relay::{
    create_router, AppState, BadgeIndicator, CaptureProvider, Config, DownloadDirectory,
    SessionCoordinator, StreamSpecification, SyntheticProvider,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "capture-relay", about = "Record capture streams to downloadable files")]
struct Cli {
    /// Config file path, without extension
    #[arg(long, default_value = "config/capture-relay")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the recording API
    Serve,

    /// Record one session end to end and print the saved files
    Record {
        /// Stream to record, as <id>=<audio|video|video+audio>; repeatable
        #[arg(long = "stream", required = true)]
        streams: Vec<String>,

        /// Recording length in seconds
        #[arg(long, default_value_t = 3)]
        seconds: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Downloads folder: {}", cfg.recording.downloads_path);

    let provider: Arc<dyn CaptureProvider> =
        Arc::new(SyntheticProvider::new(cfg.synthetic.clone()));
    let sink = Arc::new(DownloadDirectory::new(&cfg.recording.downloads_path)?);
    let coordinator = Arc::new(SessionCoordinator::new(
        Arc::clone(&provider),
        sink,
        Arc::new(BadgeIndicator::new()),
        cfg.recording.clone(),
    ));

    match cli.command {
        Command::Serve => {
            let app = create_router(AppState::new(coordinator, provider));
            let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;

            info!("HTTP API listening on {}", addr);
            axum::serve(listener, app).await?;
        }

        Command::Record { streams, seconds } => {
            let specifications = streams
                .iter()
                .map(|s| StreamSpecification::from_shorthand(s))
                .collect::<capture_relay::Result<Vec<_>>>()?;

            let started = coordinator.request_start(specifications).await?;
            for stream in &started.streams {
                match &stream.error {
                    None => info!("{}: recording", stream.id),
                    Some(e) => info!("{}: not recording ({})", stream.id, e),
                }
            }
            if !started.ok {
                anyhow::bail!("No stream could be started");
            }

            tokio::time::sleep(Duration::from_secs(seconds)).await;

            let stopped = coordinator.request_stop().await?;
            for file in &stopped.files {
                println!("{} ({} bytes)", file.path.display(), file.bytes);
            }
        }
    }

    Ok(())
}
