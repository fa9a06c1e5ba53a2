//! trackmood - command-line front end
//!
//! `trackmood analyze <FILE>` analyses a local audio file.
//! `trackmood fetch <ARTIST> <TRACK>` downloads a 30-second clip and analyses it.
//!
//! Exits with status 1 when no feature record could be produced.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trackmood_analyzer::{analyze_file, Acquirer, FeatureRecord};
use trackmood_common::config::{ConfigResolver, TomlConfig, CONFIG_ENV_VAR};

/// Command-line arguments for trackmood
#[derive(Parser, Debug)]
#[command(name = "trackmood")]
#[command(about = "Tempo, energy, danceability and valence from a short audio clip")]
#[command(version)]
struct Args {
    /// Config file (overrides TRACKMOOD_CONFIG and the default location)
    #[arg(short, long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Print the record as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyse the first 30 seconds of a local audio file
    Analyze {
        /// Audio file (any format symphonia can decode)
        file: PathBuf,
    },

    /// Search for a track, download a 30-second clip and analyse it
    Fetch {
        artist: String,
        track: String,

        /// Downloader program (yt-dlp compatible)
        #[arg(long)]
        downloader: Option<String>,

        /// Give up on the download after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let resolver = ConfigResolver::new(args.config.clone());
    let config = resolve_config(&resolver, env_filter(BOOTSTRAP_LEVEL), std::io::stderr);
    let level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| BOOTSTRAP_LEVEL.to_string());

    tracing_subscriber::registry()
        .with(env_filter(&level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting trackmood v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let mut config = config.context("Failed to load configuration")?;
    if let Some(path) = resolver.config_path() {
        info!(path = %path.display(), "Configuration loaded");
    }

    let record = match args.command {
        Commands::Analyze { file } => {
            let sample_rate = config.analysis.sample_rate;
            tokio::task::spawn_blocking(move || analyze_file(&file, sample_rate))
                .await
                .context("Analysis task failed")?
        }
        Commands::Fetch {
            artist,
            track,
            downloader,
            timeout,
        } => {
            apply_fetch_overrides(&mut config, downloader, timeout)?;
            Acquirer::from_config(&config)
                .acquire_and_analyze(&artist, &track)
                .await
        }
    };

    match record {
        Some(record) => {
            print_record(&record, args.json)?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("No audio features could be extracted");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Level used until the configured one is known
const BOOTSTRAP_LEVEL: &str = "info";

/// `RUST_LOG` when set, `default_level` otherwise
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Resolve configuration under a temporary subscriber
///
/// The global subscriber needs the configured log level, so it cannot exist
/// yet; this one carries the resolver's own warnings to `writer`.
fn resolve_config<W>(
    resolver: &ConfigResolver,
    filter: EnvFilter,
    writer: W,
) -> trackmood_common::Result<TomlConfig>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .finish();
    tracing::subscriber::with_default(bootstrap, || resolver.resolve())
}

/// Command-line flags win over file and environment settings
fn apply_fetch_overrides(
    config: &mut TomlConfig,
    downloader: Option<String>,
    timeout: Option<u64>,
) -> Result<()> {
    if let Some(program) = downloader {
        config.downloader.program = program;
    }
    if timeout.is_some() {
        config.downloader.timeout_secs = timeout;
    }
    config.validate().context("Invalid command-line override")?;
    Ok(())
}

fn print_record(record: &FeatureRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", record.to_json().context("Failed to serialise record")?);
    } else {
        println!("Tempo:        {:.1} BPM", record.tempo);
        println!("Energy:       {:.0}%", record.energy * 100.0);
        println!("Danceability: {:.0}%", record.danceability * 100.0);
        println!("Valence:      {:.0}%", record.valence * 100.0);
    }
    Ok(())
}
