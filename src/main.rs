use std::sync::Arc;

use study_buddy::config::AppConfig;
use study_buddy::error::AppError;
use study_buddy::{build_app, logger, run_server, AppState};
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();
    logger::init(&config.log_level)?;

    info!(
        model = %config.gemini.model,
        smtp_host = %config.smtp.host,
        port = config.port,
        "starting study-buddy"
    );
    if config.gemini.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; /ask will answer 500");
    }
    if config.smtp.sender.is_none() || config.smtp.password.is_none() {
        warn!("SMTP_SENDER or SMTP_PASSWORD is not set; /send-email will fail");
    }

    let state = Arc::new(AppState::from_config(&config));
    run_server(build_app(state), config.port).await?;

    info!("server stopped");
    Ok(())
}
