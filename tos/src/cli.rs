use crate::report::ReportOptions;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tos", version, about = "Track the status of your Tesla order")]
pub struct Cli {
    /// Mirror log output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Sign in through the browser and store the tokens
    Login,
    /// Delete the stored tokens
    Logout,
    /// Fetch the orders, show them and record what changed
    Refresh {
        /// Ignore the freshness window
        #[arg(long)]
        force: bool,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Print 1 if something changed, 0 if nothing did, -1 if unknown
    Status,
    /// Show the last fetched orders without contacting the API
    Cached {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Show every recorded change
    History,
    /// Show where data is stored
    Files,
    /// Decode a comma separated list of option codes
    Decode { codes: String },
}

impl Default for Command {
    fn default() -> Self {
        Command::Refresh {
            force: false,
            view: ViewArgs::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Args)]
pub struct ViewArgs {
    /// Hide personal data like the order number and VIN
    #[arg(long, conflicts_with = "details")]
    pub share: bool,
    /// Show financing information
    #[arg(long)]
    pub details: bool,
}

impl From<ViewArgs> for ReportOptions {
    fn from(view: ViewArgs) -> Self {
        Self {
            share: view.share,
            details: view.details,
        }
    }
}
