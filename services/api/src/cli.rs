use crate::demo::{
    run_demo, run_status_legacy, run_status_stages, DemoArgs, LegacyArgs, StagesArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use recruit_ai::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Recruiting Interview Service",
    about = "Run the interview session service or inspect pipeline statuses from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP and WebSocket service (default command)
    Serve(ServeArgs),
    /// Convert between legacy status codes and per-stage statuses
    Status {
        #[command(subcommand)]
        command: StatusCommand,
    },
    /// Drive an in-process interview session with the simulated analyzer
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum StatusCommand {
    /// Expand a legacy status code into AI, practical and executive stage statuses
    Legacy(LegacyArgs),
    /// Collapse three stage statuses into the legacy status code
    Stages(StagesArgs),
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
        Command::Status {
            command: StatusCommand::Legacy(args),
        } => run_status_legacy(args),
        Command::Status {
            command: StatusCommand::Stages(args),
        } => run_status_stages(args),
        Command::Demo(args) => run_demo(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn stages_subcommand_defaults_to_pending() {
        let cli = Cli::try_parse_from(["recruit-ai-api", "status", "stages", "--ai", "PASSED"])
            .expect("parses");
        match cli.command {
            Some(Command::Status {
                command: StatusCommand::Stages(args),
            }) => {
                assert_eq!(args.ai, "PASSED");
                assert_eq!(args.practical, "PENDING");
                assert_eq!(args.executive, "PENDING");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["recruit-ai-api"]).expect("parses");
        assert!(cli.command.is_none());
    }
}
