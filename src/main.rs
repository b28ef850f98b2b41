mod batch;
mod conceptnet;
mod expand;
mod fallback;
mod graph;
mod lang;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

pub const USER_AGENT: &str = concat!("lexbridge/", env!("CARGO_PKG_VERSION"));

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Maps source-culture concepts to analogous target-language concepts by
/// traversing lexical relations in ConceptNet, with an optional generative
/// fallback for concepts the lexical source does not know.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Source language code (e.g. en)
    #[arg(long)]
    source_language: String,

    /// Target language code (e.g. zh)
    #[arg(long)]
    target_language: String,

    /// Generate candidate concepts when the lexical source has none
    #[arg(long)]
    use_fallback: bool,

    /// Input CSV with a "Concept" column
    #[arg(long)]
    input_file: PathBuf,

    /// Output CSV for (source, target, distance) rows
    #[arg(long, default_value = "output.csv")]
    output_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lexbridge=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
    let relations = conceptnet::ConceptNetClient::new(http.clone());

    // Resolve the fallback credential before touching the batch: a missing
    // key should fail at startup, not halfway through a run.
    let fallback = if cli.use_fallback {
        Some(fallback::GeminiClient::from_env(http)?)
    } else {
        None
    };

    info!(
        source = %cli.source_language,
        target = %cli.target_language,
        fallback = cli.use_fallback,
        input = %cli.input_file.display(),
        "starting batch"
    );

    batch::run(
        &relations,
        fallback.as_ref(),
        &cli.source_language,
        &cli.target_language,
        &cli.input_file,
        &cli.output_file,
    )
    .await?;

    Ok(())
}
