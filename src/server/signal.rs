// Signal handling module
//
// SIGINT, SIGTERM, SIGHUP, SIGUSR1 and SIGUSR2 all terminate the server.
// SIGPIPE is already ignored by the Rust runtime, so a client hanging up
// mid-transfer only fails that connection.

use std::sync::Arc;
use tokio::sync::Notify;

/// Start the signal listener task (Unix)
///
/// The first termination signal notifies `shutdown` once. A signal that
/// cannot be registered is logged and skipped.
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    use tokio::signal::unix::{signal, Signal};

    let mut streams: Vec<(&'static str, Signal)> = Vec::new();
    for (kind, name) in termination_signals() {
        match signal(kind) {
            Ok(stream) => streams.push((name, stream)),
            Err(e) => crate::logger::log_error(&format!(
                "Unable to register handler for {name}: {e}"
            )),
        }
    }

    tokio::spawn(async move {
        if streams.is_empty() {
            return;
        }

        let received = futures_util::future::select_all(
            streams
                .iter_mut()
                .map(|(name, stream)| Box::pin(async move {
                    stream.recv().await;
                    *name
                })),
        )
        .await
        .0;

        eprintln!("{}", termination_message(received));
        shutdown.notify_one();
    });
}

/// Signals that stop the server, with the names printed on termination
#[cfg(unix)]
fn termination_signals() -> [(tokio::signal::unix::SignalKind, &'static str); 5] {
    use tokio::signal::unix::SignalKind;

    [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
        (SignalKind::hangup(), "SIGHUP"),
        (SignalKind::user_defined1(), "SIGUSR1"),
        (SignalKind::user_defined2(), "SIGUSR2"),
    ]
}

fn termination_message(signal: &str) -> String {
    format!("Terminating due to signal {signal}.")
}

/// Non-Unix fallback: only Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!("{}", termination_message("SIGINT"));
                shutdown.notify_one();
            }
            Err(e) => crate::logger::log_error(&format!("Unable to listen for Ctrl+C: {e}")),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_termination_message_names_the_signal() {
        assert_eq!(termination_message("SIGTERM"), "Terminating due to signal SIGTERM.");
    }

    #[cfg(unix)]
    #[test]
    fn test_termination_signal_names() {
        let signals = termination_signals();
        let names: Vec<_> = signals.iter().map(|(_, name)| *name).collect();
        assert_eq!(names, ["SIGINT", "SIGTERM", "SIGHUP", "SIGUSR1", "SIGUSR2"]);

        let interrupt = signals[0].0.as_raw_value();
        let terminate = signals[1].0.as_raw_value();
        assert_eq!(interrupt, 2);
        assert_eq!(terminate, 15);
    }
}
