// Application state module
// Everything a request handler needs, built once before the first accept

use hyper::header::HeaderValue;

use super::served::ServedFiles;
use super::types::Config;
use crate::http::mime::{MagicResolver, MimeResolver};

/// Application state
pub struct AppState {
    pub config: Config,
    pub files: ServedFiles,
    /// Normalized prefix without surrounding slashes
    pub prefix: Option<String>,
    /// `/` or `/prefix/`
    pub index_path: String,
    pub redirect: bool,

    // Cached config values for fast access
    pub server_header: HeaderValue,
    pub access_log: bool,
    pub access_log_format: String,

    pub mime: Box<dyn MimeResolver>,
}

impl AppState {
    pub fn new(config: Config, files: ServedFiles) -> Self {
        Self::with_resolver(config, files, Box::new(MagicResolver))
    }

    pub fn with_resolver(config: Config, files: ServedFiles, mime: Box<dyn MimeResolver>) -> Self {
        let prefix = config.server.prefix.clone();
        let index_path = match &prefix {
            Some(p) => format!("/{p}/"),
            None => "/".to_string(),
        };

        let server_header = HeaderValue::from_str(&config.http.server_name).unwrap_or_else(|_| {
            crate::logger::log_warning(&format!(
                "Invalid server name {:?}, using the default",
                config.http.server_name
            ));
            HeaderValue::from_static(super::DEFAULT_SERVER_NAME)
        });

        Self {
            redirect: config.server.redirect,
            access_log: config.logging.access_log,
            access_log_format: config.logging.access_log_format.clone(),
            config,
            files,
            prefix,
            index_path,
            server_header,
            mime,
        }
    }
}
