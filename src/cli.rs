use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Kubeglance - Namespace health summaries across Kubernetes contexts
#[derive(Parser, Debug)]
#[command(name = "kubeglance")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Kubeconfig files, separated like PATH
    #[arg(long, global = true, env = "KUBECONFIG", value_name = "PATHS")]
    pub kubeconfig: Option<OsString>,

    /// Settings file (defaults to <config dir>/kubeglance/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List contexts of the merged kubeconfig
    Contexts {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Summarize the health of a namespace
    Summary(SummaryArgs),

    /// Show server version and API resources of a context
    Info {
        /// Context to connect to (defaults to the current context)
        #[arg(long)]
        context: Option<String>,
    },
}

#[derive(Args, Debug, Default)]
pub struct SummaryArgs {
    /// Namespace (defaults to the context's namespace)
    #[arg(value_name = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Context to switch to before summarizing
    #[arg(long)]
    pub context: Option<String>,

    /// Abort the summary after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum number of problematic resources to report
    #[arg(long)]
    pub problem_cap: Option<usize>,

    /// Skip the helm release inventory
    #[arg(long)]
    pub no_releases: bool,

    /// Recompute the summary every SECS seconds until interrupted
    #[arg(long, value_name = "SECS")]
    pub watch: Option<u64>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}
