use crate::calculate::{run_calculate, run_inspect, CalculateArgs, InspectArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use hcc_raf::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "hcc-raf",
    about = "Score risk adjustment factors from diagnosis codes and serve them over HTTP",
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
    /// Score a single beneficiary and print the result as JSON
    Calculate(CalculateArgs),
    /// Work with the reference CSV directory
    Reference {
        #[command(subcommand)]
        command: ReferenceCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ReferenceCommand {
    /// Load the reference tables and print row counts and hierarchy anomalies
    Inspect(InspectArgs),
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
        Command::Calculate(args) => run_calculate(args),
        Command::Reference {
            command: ReferenceCommand::Inspect(args),
        } => run_inspect(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["hcc-raf"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn calculate_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "hcc-raf",
            "calculate",
            "--model",
            "CMS-HCC Model V24",
            "--dx",
            "E11.9",
            "--dx",
            "I50.22",
            "--age",
            "72",
            "--sex",
            "F",
            "--interaction",
            "DIABETES_CHF=1",
        ])
        .expect("parses");

        let Some(Command::Calculate(args)) = cli.command else {
            panic!("expected calculate command");
        };
        assert_eq!(args.diagnoses, vec!["E11.9", "I50.22"]);
        assert_eq!(args.dual, "00");
        assert_eq!(args.interactions, vec![("DIABETES_CHF".to_string(), 1.0)]);
    }

    #[test]
    fn reference_inspect_accepts_data_dir() {
        let cli = Cli::try_parse_from(["hcc-raf", "reference", "inspect", "--data-dir", "/tmp/ref"])
            .expect("parses");
        assert!(matches!(
            cli.command,
            Some(Command::Reference {
                command: ReferenceCommand::Inspect(InspectArgs { data_dir: Some(_) })
            })
        ));
    }
}
