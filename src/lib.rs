pub mod cli;
pub mod config;
pub mod knowledge;
pub mod pipeline;

use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{ClassifyArgs, Command};
use config::DiagnosisConfig;
use pipeline::analysis::{JitterSeed, LocalHeuristicAnalyzer};
use pipeline::{CancellationFlag, FallbackOrchestrator};

/// Install the global subscriber. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> ExitCode {
    init_tracing();

    let command = match cli::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n{}", cli::USAGE);
            return ExitCode::from(2);
        }
    };

    let args = match command {
        Command::Help => {
            println!("{}", cli::USAGE);
            return ExitCode::SUCCESS;
        }
        Command::Classify(args) => args,
    };

    info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "Failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(classify(args)) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            error!("{message}");
            ExitCode::FAILURE
        }
    }
}

async fn classify(args: ClassifyArgs) -> Result<String, String> {
    let config = DiagnosisConfig::from_env();
    let orchestrator =
        FallbackOrchestrator::from_config(config, LocalHeuristicAnalyzer::default(), args.offline);

    let seed_text = args.seed.unwrap_or_else(|| {
        args.image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let seed = JitterSeed::from_text(&seed_text);

    // Ctrl-C cancels the in-flight request
    let cancel = CancellationFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling classification");
            on_signal.cancel();
        }
    });

    let result = orchestrator
        .classify_file(&args.image, seed, &cancel)
        .await
        .map_err(|e| format!("Classification failed for {}: {e}", args.image.display()))?;

    serde_json::to_string_pretty(&result)
        .map_err(|e| format!("Failed to serialize result: {e}"))
}
