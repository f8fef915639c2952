use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "refsync",
    about = "Inspect refspecs and manage remote definitions",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Remote configuration file
    #[arg(long, global = true, default_value = ".refsync/config.toml")]
    pub config: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a refspec and map reference names through it
    Refspec(RefspecArgs),
    /// Manage configured remotes
    Remote(RemoteArgs),
}

#[derive(Args)]
pub struct RefspecArgs {
    #[command(subcommand)]
    pub action: RefspecAction,
}

#[derive(Args)]
pub struct SpecArg {
    /// Refspec such as `+refs/heads/*:refs/remotes/origin/*`
    pub spec: String,
    /// Parse as a push refspec instead of a fetch refspec
    #[arg(long)]
    pub push: bool,
}

#[derive(Subcommand)]
pub enum RefspecAction {
    /// Show the parsed parts of a refspec
    Show(SpecArg),
    /// Map a source name to its destination
    Transform {
        #[command(flatten)]
        spec: SpecArg,
        name: String,
    },
    /// Map a destination name back to its source
    Rtransform {
        #[command(flatten)]
        spec: SpecArg,
        name: String,
    },
    /// Check a name against both sides
    Matches {
        #[command(flatten)]
        spec: SpecArg,
        name: String,
    },
}

#[derive(Args)]
pub struct RemoteArgs {
    #[command(subcommand)]
    pub action: RemoteAction,
}

#[derive(Subcommand)]
pub enum RemoteAction {
    /// Add a remote tracking all of its branches
    Add { name: String, url: String },
    /// List remote names
    List,
    /// Show a remote's URL and refspecs
    Show { name: String },
    Rename { old: String, new: String },
    SetUrl { name: String, url: String },
    /// Replace the fetch refspecs with one forced mapping
    SetFetchspec {
        name: String,
        source: String,
        destination: String,
    },
    Remove { name: String },
}
