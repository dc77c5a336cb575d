mod cli;
mod commands;
mod infra;

use risk_triage::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
