use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use vocalign::{
    DiarizerConfig, MatchPolicy, Normalizer, NormalizerConfig, Pipeline, PipelineOptions,
    RemoteDiarizer, RemoteTranscriber, TranscriberConfig,
};

#[derive(Parser)]
#[command(name = "vocalign")]
#[command(author, version, about = "Audio transcription with speaker-diarization alignment", long_about = None)]
struct Cli {
    /// Input audio file
    audio: PathBuf,

    /// Attach per-word timestamps to transcript segments
    #[arg(long)]
    word_timestamps: bool,

    /// Run speaker diarization and label segments
    #[arg(long)]
    diarize: bool,

    /// Credential for the diarization service (falls back to
    /// VOCALIGN_DIARIZE_TOKEN, then HF_TOKEN)
    #[arg(long)]
    diarize_token: Option<String>,

    /// Speaker-assignment policy
    #[arg(long, value_enum, default_value = "containment")]
    match_policy: PolicyArg,

    /// Write the JSON record here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for normalized audio files (defaults to the system temp
    /// directory)
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Abort the whole run after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Segment must lie entirely within a turn
    Containment,
    /// Turn with the greatest overlap wins
    MaxOverlap,
}

impl From<PolicyArg> for MatchPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Containment => MatchPolicy::Containment,
            PolicyArg::MaxOverlap => MatchPolicy::MaxOverlap,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    // Single error boundary: anything fatal ends up here, logged once,
    // mapped to a non-zero exit. Stdout stays reserved for the record.
    if let Err(err) = run(cli).await {
        error!("pipeline failed: {err:#}");
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr; stdout carries only the JSON record
fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

async fn run(cli: Cli) -> Result<()> {
    let normalizer_config = match &cli.work_dir {
        Some(dir) => NormalizerConfig::new(dir.clone()),
        None => NormalizerConfig::default(),
    };
    let normalizer = Normalizer::new(normalizer_config);
    let transcriber = RemoteTranscriber::new(TranscriberConfig::from_env());
    let diarizer = RemoteDiarizer::new(DiarizerConfig::from_env(cli.diarize_token.clone()));

    let pipeline = Pipeline::new(normalizer, transcriber, diarizer);
    let options = PipelineOptions {
        word_timestamps: cli.word_timestamps,
        diarize: cli.diarize,
        policy: cli.match_policy.into(),
        timeout: cli.timeout_secs.map(Duration::from_secs),
    };

    info!("processing {:?}", cli.audio);
    let report = pipeline.run(&cli.audio, &options).await?;

    match &cli.output {
        Some(path) => {
            report.write_json(path)?;
            info!("report written to {:?}", path);
        }
        None => println!("{}", report.to_json_string()?),
    }

    Ok(())
}
