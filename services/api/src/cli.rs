use crate::demo::{run_demo, run_step_catalogue, DemoArgs, StepsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use study_abroad::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Study Abroad Portal",
    about = "Run the study-abroad application service or walk through the wizard from the command line",
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
    /// Print the application wizard steps
    Steps(StepsArgs),
    /// Walk a sample student through every step and submit the application
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
    /// Override the directory receiving uploaded documents
    #[arg(long)]
    pub(crate) upload_dir: Option<std::path::PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Steps(args) => {
            run_step_catalogue(args);
            Ok(())
        }
        Command::Demo(args) => run_demo(args),
    }
}
