// Configuration module entry point
// Layers defaults, an optional config file, PSHS_* environment variables and
// command-line options into one validated Config

mod served;
mod state;
mod types;

use rand::Rng;
use std::net::{IpAddr, SocketAddr};

use crate::cli::Cli;

// Re-export public types
pub use served::ServedFiles;
pub use state::AppState;
pub use types::Config;

pub const DEFAULT_SERVER_NAME: &str = concat!("pshs/", env!("CARGO_PKG_VERSION"));

/// Random ports are drawn from this unprivileged range
const RANDOM_PORT_MIN: u16 = 1024;
const RANDOM_PORT_MAX: u16 = 32766;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid port: {0}")]
    InvalidPort(u32),
    #[error("Invalid bind address: {0}")]
    InvalidBind(String),
    #[error("No files given to share.")]
    NoFiles,
    #[error("--redirect only works with a single file")]
    RedirectNeedsSingleFile,
}

impl Config {
    /// Load configuration for the given command line
    ///
    /// Precedence, lowest first: built-in defaults, the `--config` file,
    /// `PSHS_*` environment variables, command-line options.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        if let Some(port) = cli.port {
            check_explicit_port(u32::from(port))?;
        }

        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 0)?
            .set_default("server.redirect", false)?
            .set_default("server.ssl", false)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.handshake_timeout", 10)?
            .set_default("http.server_name", DEFAULT_SERVER_NAME)?
            .set_default("http.index_content_type", "text/html; charset=utf-8")?
            .set_default("network.upnp", true)?
            .set_default("network.discovery_timeout_ms", 1000)?
            .set_default("network.prefer_ipv6", true)?
            .set_default("network.show_qr", true)?;

        if let Some(path) = &cli.config {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("PSHS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", cli.bind.clone())?
            .set_override_option("server.port", cli.port.map(i64::from))?
            .set_override_option("server.prefix", cli.prefix.clone())?
            .set_override_option("server.ssl", cli.ssl.then_some(true))?
            .set_override_option("server.redirect", cli.redirect.then_some(true))?
            .set_override_option("network.upnp", cli.no_upnp.then_some(false))?
            .build()?;

        let mut config: Self = settings.try_deserialize()?;
        config.server.prefix = normalize_prefix(config.server.prefix.as_deref());
        Ok(config)
    }

    /// Check the combination of settings and shared files
    pub fn validate(&self, files: &ServedFiles) -> Result<(), ConfigError> {
        if self.server.port == u16::MAX {
            return Err(ConfigError::InvalidPort(u32::from(self.server.port)));
        }
        self.bind_ip()?;

        if files.is_empty() {
            return Err(ConfigError::NoFiles);
        }
        if self.server.redirect && files.single().is_none() {
            return Err(ConfigError::RedirectNeedsSingleFile);
        }
        Ok(())
    }

    /// Replace port 0 with a random unprivileged port
    pub fn resolve_port(&mut self) -> u16 {
        if self.server.port == 0 {
            self.server.port = rand::thread_rng().gen_range(RANDOM_PORT_MIN..=RANDOM_PORT_MAX);
        }
        self.server.port
    }

    pub fn bind_ip(&self) -> Result<IpAddr, ConfigError> {
        let host = self.server.host.trim_start_matches('[').trim_end_matches(']');
        host.parse()
            .map_err(|_| ConfigError::InvalidBind(self.server.host.clone()))
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(SocketAddr::new(self.bind_ip()?, self.server.port))
    }
}

/// 0 and 65535 are rejected when given explicitly
fn check_explicit_port(port: u32) -> Result<(), ConfigError> {
    if port == 0 || port >= u32::from(u16::MAX) {
        return Err(ConfigError::InvalidPort(port));
    }
    Ok(())
}

/// Strip surrounding slashes; an empty prefix means no prefix
fn normalize_prefix(prefix: Option<&str>) -> Option<String> {
    prefix
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}
