use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use spedsite_builder::enrichment::{Enricher, LlmEnricher, StaticEnricher};
use spedsite_builder::loader::InputPaths;
use spedsite_builder::site::build_site;
use spedsite_common::Config;

/// Generate the NY special education district site.
#[derive(Parser, Debug)]
#[command(name = "spedsite", version)]
struct Cli {
    /// Folder holding the CSV/JSON inputs, components/ and styles/
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Output root, cleared and rebuilt on every run
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Use fallback hub content instead of calling the model
    #[arg(long)]
    skip_enrichment: bool,

    /// Pause between districts in milliseconds (overrides SPEDSITE_DELAY_MS)
    #[arg(long)]
    delay_ms: Option<u64>,

    #[arg(long)]
    nyc_districts: Option<PathBuf>,

    #[arg(long)]
    state_districts: Option<PathBuf>,

    #[arg(long)]
    cse_directory: Option<PathBuf>,

    #[arg(long)]
    state_contacts: Option<PathBuf>,
}

impl Cli {
    fn input_paths(&self) -> InputPaths {
        let mut paths = InputPaths::in_dir(&self.data_dir);
        if let Some(ref p) = self.nyc_districts {
            paths.nyc_districts = p.clone();
        }
        if let Some(ref p) = self.state_districts {
            paths.state_districts = p.clone();
        }
        if let Some(ref p) = self.cse_directory {
            paths.cse_directory = p.clone();
        }
        if let Some(ref p) = self.state_contacts {
            paths.state_contacts = p.clone();
        }
        paths
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("spedsite=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(ms) = cli.delay_ms {
        config.inter_record_delay = Duration::from_millis(ms);
    }
    config.log_redacted();

    let enricher: Arc<dyn Enricher> = if cli.skip_enrichment {
        info!("Enrichment skipped by flag, hub pages use fallback content");
        Arc::new(StaticEnricher)
    } else {
        match LlmEnricher::from_config(&config) {
            Some(enricher) => Arc::new(enricher),
            None => {
                warn!("ENRICHMENT_API_KEY not set, hub pages use fallback content");
                Arc::new(StaticEnricher)
            }
        }
    };

    let stats = build_site(
        &cli.input_paths(),
        &cli.output,
        enricher,
        config.inter_record_delay,
    )
    .await?;

    println!("{stats}");
    info!(
        output = %cli.output.display(),
        degraded_hubs = stats.enrichment_degraded(),
        "Full site ecosystem generated"
    );

    Ok(())
}
