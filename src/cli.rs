//! Command-line interface

use clap::Parser;
use std::ffi::OsString;

/// Pretty small HTTP server: share the given files over HTTP/HTTPS
#[derive(Debug, Parser)]
#[command(name = "pshs", version, about)]
pub struct Cli {
    /// Bind the server to IP address
    #[arg(short, long, value_name = "IP")]
    pub bind: Option<String>,

    /// Port to listen on (default: random)
    #[arg(short, long, value_name = "N")]
    pub port: Option<u16>,

    /// Require all URLs to start with the prefix PFX
    #[arg(short = 'P', long, value_name = "PFX")]
    pub prefix: Option<String>,

    /// Enable SSL/TLS socket with a self-signed certificate
    #[arg(short, long)]
    pub ssl: bool,

    /// Disable port redirection using UPnP
    #[arg(short = 'U', long)]
    pub no_upnp: bool,

    /// Redirect / to the single provided file
    #[arg(short, long)]
    pub redirect: bool,

    /// Load additional settings from a configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Files to share
    #[arg(value_name = "FILE")]
    pub files: Vec<OsString>,
}
