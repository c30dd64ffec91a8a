mod cli;
mod infra;
mod offline;
mod routes;
mod server;

use loan_verify::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
