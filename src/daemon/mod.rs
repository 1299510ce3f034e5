//! Daemon module for the task timer.
//!
//! This module contains the core daemon functionality:
//! - `timer`: Timer engine with state transitions and countdown logic
//! - `schedule`: Deadline tracking for the engine's periodic concerns
//! - `ipc`: Unix socket server and request handling
//!
//! [`run`] wires everything together: it spawns the engine, binds the
//! socket and serves CLI connections until a shutdown signal arrives.

pub mod ipc;
pub mod schedule;
pub mod timer;

pub use ipc::{default_socket_path, IpcServer, RequestHandler};
pub use timer::TimerEngine;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::UnixStream;
use tracing::{debug, error, info, warn};

use crate::notification::{LogNotificationSender, NotificationError, NotificationSender};
use crate::store::StateStore;
use crate::types::{IpcResponse, TimerConfig};

// ============================================================================
// Daemon entry point
// ============================================================================

/// Runs the daemon until Ctrl-C or SIGTERM.
///
/// The engine starts in idle mode, so nudges begin right away; tasks
/// arrive later over the socket.
pub async fn run(config: TimerConfig, socket_path: &Path) -> Result<()> {
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid timer configuration")?;

    let notifier = Arc::new(LogNotificationSender::new());
    if !notifier.is_available() {
        warn!(
            "Notification delivery is unavailable, running silent ({})",
            NotificationError::Unavailable.suggestion()
        );
    }

    let (engine, bus) = TimerEngine::new(config, notifier);
    let store = StateStore::new(bus.watch_state());
    let engine_task = tokio::spawn(engine.run());
    bus.enter_idle()?;

    let server = IpcServer::new(socket_path)?;
    info!(socket = %server.socket_path().display(), "Daemon listening");

    let handler = Arc::new(RequestHandler::new(bus, store));

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            connection = server.accept() => {
                match connection {
                    Ok(stream) => {
                        let handler = Arc::clone(&handler);
                        tokio::spawn(async move {
                            if let Err(error) = handle_connection(handler, stream).await {
                                warn!(%error, "Connection error");
                            }
                        });
                    }
                    Err(error) => {
                        error!(%error, "Failed to accept connection");
                    }
                }
            }
        }
    }

    engine_task.abort();
    info!("Daemon stopped");
    Ok(())
}

/// Resolves when SIGTERM or Ctrl-C is received.
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(error) => {
            warn!(%error, "Failed to register SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

/// Serves a single client connection: one request, one response.
///
/// Malformed requests still get a response, so a broken client sees
/// the parse error instead of a timeout.
async fn handle_connection(handler: Arc<RequestHandler>, mut stream: UnixStream) -> Result<()> {
    let response = match IpcServer::receive_request(&mut stream).await {
        Ok(request) => {
            debug!(?request, "Request received");
            handler.handle(request).await
        }
        Err(error) => IpcResponse::error(&format!("{error:#}")),
    };
    IpcServer::send_response(&mut stream, &response).await
}

// ============================================================================
// Tests
// ============================================================================
