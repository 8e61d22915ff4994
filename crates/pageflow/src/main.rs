#![allow(unused)]

use crate::prelude::*;
use clap::Parser;

mod browse;
mod coordinator;
mod error;
mod mock;
mod prelude;
mod serve;
mod settings;
mod transport;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Paged, sortable, filterable data views over any JSON backend"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "PAGEFLOW_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Run the mock people backend
    Serve(crate::serve::ServeOptions),

    /// Browse a paged backend interactively
    Browse(crate::browse::BrowseOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Serve(options) => crate::serve::run(options, app.global).await,
        SubCommands::Browse(options) => crate::browse::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
