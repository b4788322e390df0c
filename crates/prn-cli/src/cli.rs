use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "prn-maps",
    about = "PRN Maps: versioned map layers for Planetary Response Network events",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// List events with a manifest
    Events,
    /// Print an event's manifest
    Manifest(EventArgs),
    /// List layer versions of an event
    Layers(LayersArgs),
    /// Approve a pending version
    Approve(VersionArgs),
    /// Move an approved version back to pending
    Revert(VersionArgs),
    /// Upload a metadata file and layer files as a new pending version
    Upload(UploadArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on, overriding the configuration
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct EventArgs {
    pub event: String,
}

#[derive(Args)]
pub struct LayersArgs {
    pub event: String,
    /// List pending instead of approved versions
    #[arg(long)]
    pub pending: bool,
}

#[derive(Args)]
pub struct VersionArgs {
    pub event: String,
    /// Version, as `v3` or `3`
    pub version: prn_keys::Version,
}

#[derive(Args)]
pub struct UploadArgs {
    pub event: String,
    /// Metadata JSON document
    #[arg(long)]
    pub metadata: PathBuf,
    /// Layer file; repeat for each layer
    #[arg(long = "layer", required = true)]
    pub layers: Vec<PathBuf>,
}
