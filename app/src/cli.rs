use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tunkit", version, about = "Share-link toolbox and tunnel runner")]
pub struct Cli {
    /// Path to the server store (default: ~/.config/tunkit/servers.json)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import share-links, a subscription URL, or a subscription file
    Import {
        /// Share-link URIs to import directly
        uris: Vec<String>,
        /// Fetch and import a subscription URL
        #[arg(long)]
        url: Option<String>,
        /// Import a subscription payload from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List stored servers
    List,
    /// Print the share-link for a stored server
    Export { id: String },
    /// Remove a stored server
    Remove { id: String },
    /// Print the generated engine configuration for a server
    Generate {
        id: String,
        /// Emit compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
    /// Measure latency for one server, or all when no id is given
    Probe { id: Option<String> },
    /// Connect to a server and hold the tunnel until Ctrl-C
    Connect {
        id: String,
        /// Path to the Xray-compatible engine binary
        #[arg(long, default_value = "xray")]
        engine_bin: PathBuf,
    },
}
