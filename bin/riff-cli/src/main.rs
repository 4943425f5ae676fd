//! riff – terminal front end for the riff studio.
//!
//! Talks to a running riff-server and keeps finished takes in a local SQLite
//! library.

mod cli_args;
mod files;
mod generate;
mod library;

use clap::Parser;
use riff_library::{MemoryLibrary, SqliteLibrary};
use riff_studio::{HttpStudioApi, Studio};
use tracing::debug;

use crate::cli_args::{Cli, Commands, LibraryCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate(args) => {
            let api = HttpStudioApi::new(&cli.server)?;
            debug!(server = %cli.server, "using proxy");
            if args.no_save {
                generate::run(Studio::new(api, MemoryLibrary::new()), args).await
            } else {
                let store = SqliteLibrary::connect(&cli.library).await?;
                generate::run(Studio::new(api, store), args).await
            }
        }
        Commands::Library(command) => {
            let store = SqliteLibrary::connect(&cli.library).await?;
            match command {
                LibraryCommand::List => library::list(&store).await,
                LibraryCommand::Export { id, out } => {
                    library::export(&store, &id, &out).await.map(|_| ())
                }
            }
        }
    }
}
