use crate::commands::{
    run_audit, run_build, run_populate, run_snapshot, BuildArgs, SnapshotArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use roster::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Roster",
    about = "Serve and maintain the model catalog from the command line",
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
    /// Inspect and maintain the catalog sources
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Print the reconciled catalog as JSON
    Build(BuildArgs),
    /// Regenerate the static snapshot from the relational store
    Snapshot(SnapshotArgs),
    /// Seed the relational store from the snapshot and sync galleries from the media directories
    Populate,
    /// Report media directories and records that do not line up
    Audit,
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
        Command::Catalog { command } => match command {
            CatalogCommand::Build(args) => run_build(args).await,
            CatalogCommand::Snapshot(args) => run_snapshot(args).await,
            CatalogCommand::Populate => run_populate().await,
            CatalogCommand::Audit => run_audit(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["roster-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_catalog_snapshot_flags() {
        let cli = Cli::try_parse_from([
            "roster-api",
            "catalog",
            "snapshot",
            "--output",
            "out.json",
            "--embed-featured",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Catalog {
                command: CatalogCommand::Snapshot(args),
            }) => {
                assert_eq!(args.output.as_deref(), Some(std::path::Path::new("out.json")));
                assert!(args.embed_featured);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from(["roster-api", "serve", "--port", "8080"]).expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => assert_eq!(args.port, Some(8080)),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
