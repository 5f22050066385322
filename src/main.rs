// src/main.rs

use std::process::ExitCode;

use cloudcompute::errors::ComputeError;
use cloudcompute::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    match run_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("cloudcompute error: {err:?}");
            exit_code(&err)
        }
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}

/// 2 when the compute file cannot be read or is invalid, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ComputeError>() {
        Some(ComputeError::Config(_) | ComputeError::Toml(_) | ComputeError::Io(_)) => {
            ExitCode::from(2)
        }
        _ => ExitCode::FAILURE,
    }
}
