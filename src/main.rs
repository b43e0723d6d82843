use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epg_merge::{
    config::{Config, CONFIG_FILE_ENV, DEFAULT_CONFIG_FILE},
    EpgMergeService, MergeGroup,
};

#[derive(Parser)]
#[command(name = "epg-merge")]
#[command(version)]
#[command(about = "Merge XMLTV EPG files, deduplicating channels by display name")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = CONFIG_FILE_ENV, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Output file for a single ad-hoc merge group (replaces configured groups)
    #[arg(short, long, value_name = "PATH", requires = "inputs")]
    output: Option<PathBuf>,

    /// Input files for the ad-hoc group; the first one is the base document
    #[arg(short, long = "input", value_name = "PATH", requires = "output")]
    inputs: Vec<PathBuf>,

    /// Merge and report without writing output files
    #[arg(long)]
    dry_run: bool,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("epg_merge={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EPG merge v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from(&cli.config)?;

    if let Some(output) = cli.output {
        config.groups = vec![MergeGroup::new(output, cli.inputs)];
        config.validate()?;
    }

    let settings = config.output.merge_settings()?;
    info!(
        "Stamping output as '{}' ({}), date {} in {}",
        settings.generator_info_name,
        settings.generator_info_url,
        settings.generated_at,
        config.output.timezone
    );

    let service = EpgMergeService::new(settings).with_dry_run(cli.dry_run);
    let outcomes = service.run_all(&config.groups);

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    if failed > 0 {
        warn!(
            "{} of {} merge groups produced no output",
            failed,
            outcomes.len()
        );
    } else {
        info!("All {} merge groups completed", outcomes.len());
    }

    Ok(())
}
