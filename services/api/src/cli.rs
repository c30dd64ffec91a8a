use crate::offline::{run_verify, VerifyArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_verify::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Document Verification",
    about = "Verify applicant-declared data against OCR-extracted pay stubs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Verify one application against one OCR extraction without starting the server
    Verify(VerifyArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Verify(args) => run_verify(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["loan-verify-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn verify_requires_both_inputs() {
        let missing = Cli::try_parse_from(["loan-verify-api", "verify", "--application", "a.json"]);
        assert!(missing.is_err());

        let cli = Cli::try_parse_from([
            "loan-verify-api",
            "verify",
            "--application",
            "a.json",
            "--extraction",
            "b.json",
            "--live",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Verify(args)) => {
                assert!(args.live);
                assert_eq!(args.extraction.to_string_lossy(), "b.json");
            }
            other => panic!("expected verify command, got {other:?}"),
        }
    }
}
