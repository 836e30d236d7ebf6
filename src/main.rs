use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

mod cli;
mod config;
mod handler;
mod http;
mod logger;
mod network;
mod qr;
mod server;
mod tls;

use cli::Cli;
use qr::QrRenderer;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not errors
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = config::Config::load(cli)?;
    logger::init(&cfg)?;

    let files = config::ServedFiles::from_args(cli.files.iter().cloned());
    cfg.validate(&files)?;
    let port = cfg.resolve_port();
    let addr = cfg.get_socket_addr()?;

    // Create the Tokio runtime, sizing the worker pool from config
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;
    let _guard = runtime.enter();

    let listener = server::create_listener(addr)
        .map_err(|e| format!("Unable to bind socket to {addr}: {e}"))?;
    let listener = TcpListener::from_std(listener)?;

    let use_tls = cfg.server.ssl;
    logger::log_server_start(files.len(), &addr, use_tls);

    // Keeps the UPnP port mapping alive until the server stops
    let advertised = network::discover_address(&cfg, addr.ip());
    if advertised.has_mapping() {
        logger::log_info("UPnP port mapping established, it is removed on exit");
    }

    let acceptor = if use_tls {
        let common_name = advertised
            .address
            .map_or_else(|| "localhost".to_string(), |ip| ip.to_string());
        let cert = tls::issue_self_signed_cert(&common_name)?;

        let mut lines = vec!["Certificate fingerprint:".to_string()];
        lines.extend(tls::format_fingerprint(&cert.fingerprint()));
        logger::print_block(&lines);

        Some(cert.acceptor()?)
    } else {
        None
    };

    if let Some(url) = advertised.url(port, use_tls, cfg.server.prefix.as_deref(), files.single()) {
        logger::log_reachable_at(&url);
        if cfg.network.show_qr {
            if let Some(lines) = qr::TerminalQr.render(&url) {
                logger::print_block(&lines);
            }
        }
    }

    let state = Arc::new(config::AppState::new(cfg, files));
    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    runtime.block_on(local.run_until(server::start_server_loop(
        listener, state, acceptor, shutdown,
    )));

    drop(advertised);
    Ok(())
}
