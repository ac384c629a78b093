use hello_htmx::{AppConfig, AppError, create_app};
use hello_htmx_core::logging::WorkerGuard;
use std::process::ExitCode;
use tracing::{error, info};

fn init_logging(config: &AppConfig) -> Result<WorkerGuard, AppError> {
    Ok(config.log_config()?.init()?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("hello-htmx: {}", err);
            return ExitCode::FAILURE;
        }
    };

    // Flushes buffered log lines when dropped.
    let _guard = match init_logging(&config) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("hello-htmx: failed to initialise logging: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Startup failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.socket_addr()?;
    let app = create_app(&config)?;

    info!(address = %addr, "Starting hello-htmx");
    app.listen_with_shutdown(addr, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    info!("Server stopped");
    Ok(())
}
