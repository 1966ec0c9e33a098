mod server;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pprof_flame_core::{FlameConfig, parsers, render_flamegraph};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::server::FlameServer;

#[derive(Parser, Debug)]
#[command(name = "pprof-flame")]
#[command(about = "Render a sampled profile as an interactive flame graph")]
#[command(version)]
struct Args {
    /// Profile to render (pprof JSON export or collapsed stacks)
    profile: PathBuf,

    /// Series shown when a request names none
    #[arg(long, env = "PPROF_FLAME_SAMPLE_INDEX")]
    sample_index: Option<String>,

    /// Address to serve the flame graph on
    #[arg(long, default_value = "127.0.0.1:8080")]
    http: SocketAddr,

    /// Write the page to this file instead of serving it
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Page title (defaults to the profiled binary's name)
    #[arg(long)]
    title: Option<String>,

    /// Use the dark palette
    #[arg(long)]
    dark: bool,

    /// Width of the rendered graph in pixels
    #[arg(long, default_value_t = 1200.0)]
    width: f64,

    #[arg(long, env = "PPROF_FLAME_LOG", default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) -> Result<()> {
    let env_filter = format!("hyper=off,{level}");
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).context("could not parse log level")?,
        )
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;
    debug!("Logging subsystem enabled");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let data = std::fs::read(&args.profile)
        .with_context(|| format!("failed to read {}", args.profile.display()))?;
    let profile = parsers::parse_auto(&data)
        .with_context(|| format!("failed to parse {}", args.profile.display()))?;
    info!(
        samples = profile.samples.len(),
        series = profile.sample_types.len(),
        "loaded {}",
        args.profile.display()
    );

    let config = FlameConfig {
        sample_index: args
            .sample_index
            .or_else(|| profile.default_sample_type.clone()),
        title: args.title,
        width: args.width,
        dark: args.dark,
        ..FlameConfig::default()
    };

    match args.output {
        Some(path) => {
            let page = render_flamegraph(&profile, None, &config)?;
            std::fs::write(&path, page.to_html())
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("wrote {}", path.display());
            Ok(())
        }
        None => FlameServer::new(profile, config).serve(args.http).await,
    }
}
