// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub network: NetworkConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind address, `0.0.0.0` or `::` for every interface
    pub host: String,
    /// 0 picks a random unprivileged port
    pub port: u16,
    pub workers: Option<usize>,
    /// URL prefix every request must start with
    #[serde(default)]
    pub prefix: Option<String>,
    /// Redirect the index to the single shared file
    pub redirect: bool,
    /// Serve HTTPS with a self-signed certificate
    pub ssl: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Reuse connections for further requests
    pub keep_alive: bool,
    /// Seconds allowed for a client to send request headers
    pub read_timeout: u64,
    /// Seconds allowed for the TLS handshake
    pub handshake_timeout: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Value of the `Server` header
    pub server_name: String,
    pub index_content_type: String,
}

/// Reachable-address discovery configuration
#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    /// Try UPnP port forwarding before inspecting local interfaces
    pub upnp: bool,
    pub discovery_timeout_ms: u64,
    /// Address family preferred when locality and scope tie
    pub prefer_ipv6: bool,
    /// Print the reachable URL as a QR code
    pub show_qr: bool,
}
