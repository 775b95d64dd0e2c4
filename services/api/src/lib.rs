mod cli;
mod cors;
mod frontend;
mod infra;
mod report;
mod routes;
mod server;

use maizebus::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
