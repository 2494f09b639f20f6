mod calculate;
mod cli;
mod infra;
mod routes;
mod server;

use hcc_raf::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
