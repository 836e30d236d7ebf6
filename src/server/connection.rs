// Connection handling module
// Serves one accepted TCP connection, optionally behind TLS

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection and serve it in a task on the local set.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `tls` - TLS acceptor when HTTPS is enabled
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    tls: Option<&TlsAcceptor>,
) {
    if state.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    let state = Arc::clone(state);
    let tls = tls.cloned();

    tokio::task::spawn_local(async move {
        match tls {
            Some(acceptor) => {
                let handshake_timeout =
                    Duration::from_secs(state.config.performance.handshake_timeout);
                match tokio::time::timeout(handshake_timeout, acceptor.accept(stream)).await {
                    Ok(Ok(tls_stream)) => {
                        serve_connection(tls_stream, peer_addr, Arc::clone(&state)).await;
                    }
                    Ok(Err(e)) => logger::log_connection_error(&peer_addr, &e),
                    Err(_) => logger::log_warning(&format!(
                        "[{peer_addr}] TLS handshake timeout after {} seconds",
                        handshake_timeout.as_secs()
                    )),
                }
            }
            None => serve_connection(stream, peer_addr, Arc::clone(&state)).await,
        }

        if state.access_log {
            logger::log_connection_closed(&peer_addr);
        }
    });
}

/// Serve HTTP/1.1 on an established byte stream.
///
/// Keep-alive follows `performance.keep_alive`; clients that
/// take longer than `read_timeout` to send request headers are dropped.
/// Transfers themselves are not time limited.
pub async fn serve_connection<I>(io: I, peer_addr: SocketAddr, state: Arc<AppState>)
where
    I: AsyncRead + AsyncWrite + Unpin + 'static,
{
    let io = TokioIo::new(io);
    let performance = &state.config.performance;

    let mut builder = http1::Builder::new();
    builder.keep_alive(performance.keep_alive);
    if performance.read_timeout > 0 {
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(Duration::from_secs(performance.read_timeout));
    }

    let service_state = Arc::clone(&state);
    let conn = builder.serve_connection(
        io,
        service_fn(move |req| handler::handle_request(req, peer_addr, Arc::clone(&service_state))),
    );

    if let Err(err) = conn.await {
        if !err.is_incomplete_message() {
            logger::log_connection_error(&peer_addr, &err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::config::Config;
    use clap::Parser;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn state() -> Arc<AppState> {
        state_with(|_| {})
    }

    fn state_with(adjust: impl FnOnce(&mut Config)) -> Arc<AppState> {
        let cli = Cli::try_parse_from(["pshs", "a.txt"]).unwrap();
        let mut config = Config::load(&cli).unwrap();
        config.logging.access_log = false;
        adjust(&mut config);
        Arc::new(AppState::new(config, ["a.txt"].into_iter().collect()))
    }

    #[tokio::test]
    async fn test_serve_over_duplex_stream() {
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        let local = tokio::task::LocalSet::new();

        local
            .run_until(async move {
                tokio::task::spawn_local(serve_connection(
                    server,
                    "127.0.0.1:50000".parse().unwrap(),
                    state(),
                ));

                client
                    .write_all(b"GET / HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n")
                    .await
                    .unwrap();

                let mut response = Vec::new();
                client.read_to_end(&mut response).await.unwrap();
                let response = String::from_utf8_lossy(&response);

                assert!(response.starts_with("HTTP/1.1 200 OK"));
                assert!(response.contains("server: pshs/"));
                assert!(response.contains("<a href='a.txt'>a.txt</a>"));
            })
            .await;
    }

    #[tokio::test]
    async fn test_keep_alive_disabled_closes_after_response() {
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        let local = tokio::task::LocalSet::new();

        local
            .run_until(async move {
                tokio::task::spawn_local(serve_connection(
                    server,
                    "127.0.0.1:50001".parse().unwrap(),
                    state_with(|config| config.performance.keep_alive = false),
                ));

                // No `Connection: close`, the server still ends the stream
                client
                    .write_all(b"HEAD / HTTP/1.1\r\nHost: test\r\n\r\n")
                    .await
                    .unwrap();

                let mut response = Vec::new();
                client.read_to_end(&mut response).await.unwrap();
                let response = String::from_utf8_lossy(&response);
                assert!(response.starts_with("HTTP/1.1 200 OK"));
            })
            .await;
    }
}
