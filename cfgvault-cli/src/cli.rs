use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "cfgvault",
    about = "Export, import and maintain a cfgvault profile",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory of the roaming databases
    #[arg(long, global = true, value_name = "DIR")]
    pub profile: Option<PathBuf>,

    /// Directory of the machine-local databases (defaults to --profile when given)
    #[arg(long, global = true, value_name = "DIR")]
    pub local_profile: Option<PathBuf>,

    /// Seed document for databases created by this run
    #[arg(long, global = true, value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// JSON file with provider options
    #[arg(long, global = true, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Open damaged databases in memory instead of renaming them
    #[arg(long, global = true)]
    pub read_only: bool,

    /// Log store activity at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write the whole profile to a document
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Load a document into the profile
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Forget every cached plugin
    ClearCache,
}
