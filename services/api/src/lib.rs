mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use ar_audit::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
