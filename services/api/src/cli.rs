use crate::report::run_check_config;
use crate::server;
use clap::{Args, Parser, Subcommand};
use maizebus::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "maizebus-api",
    about = "Serve the MaizeBus website backend and its contact/join form relay",
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
    /// Print the resolved configuration and mail dispatcher state, then exit
    CheckConfig,
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
        Command::CheckConfig => run_check_config(),
    }
}
