use clap::Parser;
use fan_pipeline::{telemetry, CliArgs, Pipeline, PipelineConfig, StdoutReporter};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = PipelineConfig::try_from(args)?;

    telemetry::init()?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    // An integrity failure surfaces here as an error, which exits non-zero
    // after the summary has already been printed.
    let mut pipeline = Pipeline::new(config);
    pipeline.run(cancel, &StdoutReporter).await?;

    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::select! {
        res = signal::ctrl_c() => match res {
            Ok(()) => {
                tracing::info!("Received Ctrl+C, cancelling before the deadline");
                cancel.cancel();
            }
            Err(e) => tracing::warn!("Failed to install Ctrl+C handler: {e}"),
        },
        () = cancel.cancelled() => {}
    }
}
