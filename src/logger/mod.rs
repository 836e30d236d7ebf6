//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Startup banner (shared files, bind address, reachable URL)
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(writer) => writer.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(writer) => writer.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Operator-facing startup summary
pub fn log_server_start(file_count: usize, bind: &SocketAddr, tls: bool) {
    write_error(&format!("Ready to share {file_count} files."));
    write_error(&format!(
        "Bound to {bind}{}.",
        if tls { " (HTTPS)" } else { "" }
    ));
}

pub fn log_reachable_at(url: &str) {
    write_error(&format!("Server reachable at: {url}"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[{peer_addr}] connection accepted"));
}

pub fn log_connection_closed(peer_addr: &SocketAddr) {
    write_info(&format!("[{peer_addr}] connection closed"));
}

pub fn log_connection_error(peer_addr: &SocketAddr, err: &impl std::fmt::Display) {
    write_error(&format!("[ERROR] [{peer_addr}] Failed to serve connection: {err}"));
}

pub fn log_info(message: &str) {
    write_info(message);
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}

/// Print pre-rendered lines (QR code) to the operator's terminal, never to a log file
pub fn print_block(lines: &[String]) {
    for line in lines {
        eprintln!("{line}");
    }
}
