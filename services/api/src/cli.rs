use crate::demo::{run_assess, run_cutoff, run_demo, AssessArgs, CutoffArgs, DemoArgs};
use crate::server;
use ar_audit::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "ar-audit-api",
    about = "Run the receivables audit workbench as a service or from the command line",
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
    /// Score a ledger export and print risk bands and top risks
    Assess(AssessArgs),
    /// Evaluate a single cut-off test from invoice and delivery dates
    Cutoff(CutoffArgs),
    /// Run the sample ledger and documents through the full workflow
    Demo(DemoArgs),
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
        Command::Assess(args) => run_assess(args),
        Command::Cutoff(args) => run_cutoff(args),
        Command::Demo(args) => run_demo(args),
    }
}
