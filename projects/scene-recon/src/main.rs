mod cli;
mod hardware;
mod pipeline;
mod run_context;
mod tools;

use cli::Args;
use pipeline::error::exit_code_for;
use pipeline::orchestrator::run_command;
use run_context::RunConfig;
use tools::SystemTools;

fn main() {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing, `info` unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse_args();

    let config = RunConfig::from_args(&args);
    let accelerator = hardware::detect();
    let mut runner = SystemTools::new(config.tools());

    if let Err(e) = run_command(args.command, &config, accelerator, &mut runner) {
        tracing::error!("{:#}", e);
        std::process::exit(exit_code_for(&e));
    }
}
