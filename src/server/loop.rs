// Server loop module
// Accepts connections until a shutdown signal arrives, then drains

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::ShutdownSignal;
use crate::config::AppState;
use crate::logger;

/// Run the accept loop on the current `LocalSet`
///
/// On SIGTERM/SIGINT the listener is closed first, then in-flight
/// connections get `performance.shutdown_timeout` seconds to finish before
/// they are dropped.
#[allow(clippy::ignored_unit_patterns)]
pub async fn run(listener: TcpListener, state: Arc<AppState>, mut shutdown: ShutdownSignal) {
    let active_connections = Arc::new(AtomicUsize::new(0));
    let graceful = GracefulShutdown::new();

    let signal_name = loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            &graceful,
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            name = shutdown.recv() => break name,
        }
    };

    drop(listener);
    let in_flight = active_connections.load(Ordering::SeqCst);
    logger::log_info(&format!(
        "{signal_name} received, closing listener ({in_flight} connection(s) in flight)"
    ));

    let grace = Duration::from_secs(state.config.performance.shutdown_timeout);
    tokio::select! {
        _ = graceful.shutdown() => {
            logger::log_info("All connections closed");
        }
        _ = tokio::time::sleep(grace) => {
            logger::log_warning(&format!(
                "Shutdown timeout after {}s, dropping {} connection(s)",
                grace.as_secs(),
                active_connections.load(Ordering::SeqCst)
            ));
        }
    }
}
