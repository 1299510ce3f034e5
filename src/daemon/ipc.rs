//! IPC server for the task timer daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response framing (one JSON object each way per connection)
//! - Request handling that forwards commands over the bus and answers
//!   from the latest state snapshot

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;
use tokio::time::{timeout, Duration};

use crate::bus::{EventBus, TimerCommand};
use crate::store::StateStore;
use crate::types::{IpcRequest, IpcResponse, ResponseData, StartParams, TimerState};

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

/// How long a response waits for the engine to publish the snapshot
/// produced by the command it acknowledges. Commands are fire-and-forget
/// toward the engine task; past this window the latest snapshot is
/// returned as-is.
const RESPONSE_WAIT_MS: u64 = 200;

/// Returns the default socket path, `~/.whatnext/whatnext.sock`.
///
/// Falls back to the current directory when the home directory cannot
/// be determined.
pub fn default_socket_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".whatnext")
        .join("whatnext.sock")
}

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Write error
    #[error("Failed to write response: {0}")]
    WriteError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        // Remove existing socket file if present
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails, or the
    /// request hits the size cap.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE];

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            anyhow::bail!("Connection closed by client");
        }
        if n == MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer[..n])
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .map_err(|e| IpcError::WriteError(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| IpcError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by forwarding commands over the bus.
///
/// The engine applies commands on its own task; here each command is
/// forwarded and the response carries the first snapshot published
/// after it, so the acknowledgement reflects the command's effect.
pub struct RequestHandler {
    bus: EventBus,
    store: StateStore,
}

impl RequestHandler {
    /// Creates a handler over the given bus and state store.
    pub fn new(bus: EventBus, store: StateStore) -> Self {
        Self { bus, store }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Start { params } => self.handle_start(params).await,
            IpcRequest::Complete => self.handle_complete().await,
            IpcRequest::Idle => self.handle_idle().await,
            IpcRequest::Show => self.handle_show().await,
            IpcRequest::Status => self.handle_status(),
        }
    }

    /// Handles the start command.
    async fn handle_start(&self, params: StartParams) -> IpcResponse {
        let command = TimerCommand::Start {
            name: params.name.clone(),
            category: params.category,
            duration_millis: params.clamped_duration(),
        };
        match self.dispatch(command).await {
            Ok(state) => IpcResponse::success(
                "Task started",
                Some(ResponseData::from_timer_state(&state)),
            ),
            Err(error) => IpcResponse::error(&error.to_string()),
        }
    }

    /// Handles the complete command.
    async fn handle_complete(&self) -> IpcResponse {
        match self.dispatch(TimerCommand::CompleteRequested).await {
            Ok(state) => IpcResponse::success(
                "Task completed",
                Some(ResponseData::from_timer_state(&state)),
            ),
            Err(error) => IpcResponse::error(&error.to_string()),
        }
    }

    /// Handles the idle command.
    async fn handle_idle(&self) -> IpcResponse {
        match self.dispatch(TimerCommand::EnterIdle).await {
            Ok(state) => IpcResponse::success(
                "Idle mode started",
                Some(ResponseData::from_timer_state(&state)),
            ),
            Err(error) => IpcResponse::error(&error.to_string()),
        }
    }

    /// Handles the show command.
    async fn handle_show(&self) -> IpcResponse {
        match self.dispatch(TimerCommand::ShowTimerRequested).await {
            Ok(state) => IpcResponse::success(
                "Timer shown",
                Some(ResponseData::from_timer_state(&state)),
            ),
            Err(error) => IpcResponse::error(&error.to_string()),
        }
    }

    /// Handles the status command.
    fn handle_status(&self) -> IpcResponse {
        let state = self.store.current();
        let headline = self.store.ui().headline();
        IpcResponse::success(&headline, Some(ResponseData::from_timer_state(&state)))
    }

    /// Forwards a command to the engine and waits briefly for the
    /// snapshot it produces.
    async fn dispatch(&self, command: TimerCommand) -> Result<TimerState> {
        // Mark the current snapshot seen before sending, so the wait
        // below only resolves for a publish that happens afterwards.
        let mut watcher: watch::Receiver<TimerState> = self.store.watch();
        self.bus.send(command)?;
        let _ = timeout(
            Duration::from_millis(RESPONSE_WAIT_MS),
            watcher.changed(),
        )
        .await;
        Ok(self.store.current())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::daemon::timer::TimerEngine;
    use crate::notification::MockNotificationSender;
    use crate::types::{Category, TimerConfig};

    // ------------------------------------------------------------------------
    // Helper functions
    // ------------------------------------------------------------------------

    fn create_temp_socket_path() -> PathBuf {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sock");
        // Keep the directory so it's not deleted
        std::mem::forget(dir);
        path
    }

    fn spawn_engine() -> (RequestHandler, tokio::task::JoinHandle<()>) {
        let notifier = Arc::new(MockNotificationSender::new());
        let (engine, bus) = TimerEngine::new(TimerConfig::default(), notifier);
        let store = StateStore::new(bus.watch_state());
        let handle = tokio::spawn(engine.run());
        (RequestHandler::new(bus, store), handle)
    }

    fn start_request(name: &str, category: Category, duration_millis: i64) -> IpcRequest {
        IpcRequest::Start {
            params: StartParams {
                name: name.to_string(),
                category,
                duration_millis,
            },
        }
    }

    // ------------------------------------------------------------------------
    // IpcServer Tests
    // ------------------------------------------------------------------------

    mod ipc_server_tests {
        use super::*;

        #[tokio::test]
        async fn test_server_creation() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path);

            assert!(server.is_ok());
            assert!(socket_path.exists());

            // Cleanup
            drop(server);
        }

        #[tokio::test]
        async fn test_server_removes_existing_socket() {
            let socket_path = create_temp_socket_path();

            // Create a dummy file at the socket path
            std::fs::write(&socket_path, "dummy").unwrap();

            // Server should remove it and bind successfully
            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
        }

        #[tokio::test]
        async fn test_server_creates_parent_directory() {
            let dir = tempfile::tempdir().unwrap();
            let socket_path = dir.path().join("subdir").join("test.sock");

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
            assert!(socket_path.parent().unwrap().exists());
        }

        #[tokio::test]
        async fn test_accept_connection() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            // Connect from client in background
            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                UnixStream::connect(&client_path).await
            });

            // Accept connection
            let stream = server.accept().await;
            assert!(stream.is_ok());

            let client_result = client_handle.await.unwrap();
            assert!(client_result.is_ok());
        }

        #[tokio::test]
        async fn test_receive_request_status() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            // Client sends status request
            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                let request = r#"{"command":"status"}"#;
                stream.write_all(request.as_bytes()).await.unwrap();
                stream.flush().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await;

            assert!(request.is_ok());
            assert!(matches!(request.unwrap(), IpcRequest::Status));

            client_handle.await.unwrap();
        }

        #[tokio::test]
        async fn test_receive_request_start() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                let request = r#"{"command":"start","params":{"name":"Write report","category":"challenge","durationMillis":1800000}}"#;
                stream.write_all(request.as_bytes()).await.unwrap();
                stream.flush().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await;

            assert!(request.is_ok());
            if let IpcRequest::Start { params } = request.unwrap() {
                assert_eq!(params.name, "Write report");
                assert_eq!(params.category, Category::Challenge);
                assert_eq!(params.duration_millis, 1_800_000);
            } else {
                panic!("Expected Start request");
            }

            client_handle.await.unwrap();
        }

        #[tokio::test]
        async fn test_send_response() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();

                // Read response
                let mut buffer = vec![0u8; 4096];
                let n = stream.read(&mut buffer).await.unwrap();
                let response: IpcResponse = serde_json::from_slice(&buffer[..n]).unwrap();
                response
            });

            let mut stream = server.accept().await.unwrap();
            let response = IpcResponse::success("Test message", None);
            IpcServer::send_response(&mut stream, &response)
                .await
                .unwrap();

            let received = client_handle.await.unwrap();
            assert_eq!(received.status, "success");
            assert_eq!(received.message, "Test message");
        }

        #[tokio::test]
        async fn test_receive_request_invalid_json() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                let invalid_json = "not valid json";
                stream.write_all(invalid_json.as_bytes()).await.unwrap();
                stream.flush().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await;

            assert!(request.is_err());
        }

        #[tokio::test]
        async fn test_receive_request_too_large() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                let oversized = vec![b'x'; 8192];
                stream.write_all(&oversized).await.unwrap();
                stream.flush().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await;

            assert!(request.is_err());
            assert!(request.unwrap_err().to_string().contains("too large"));
        }

        #[tokio::test]
        async fn test_socket_path_getter() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            assert_eq!(server.socket_path(), socket_path);
        }

        #[tokio::test]
        async fn test_server_drop_cleanup() {
            let socket_path = create_temp_socket_path();

            {
                let _server = IpcServer::new(&socket_path).unwrap();
                assert!(socket_path.exists());
            }

            // Socket file should be removed after drop
            assert!(!socket_path.exists());
        }

        #[test]
        fn test_default_socket_path_shape() {
            let path = default_socket_path();
            assert!(path.ends_with(".whatnext/whatnext.sock"));
        }
    }

    // ------------------------------------------------------------------------
    // RequestHandler Tests
    // ------------------------------------------------------------------------

    mod request_handler_tests {
        use super::*;

        #[tokio::test]
        async fn test_handle_status_idle() {
            let (handler, _engine) = spawn_engine();

            let response = handler.handle(IpcRequest::Status).await;

            assert_eq!(response.status, "success");
            assert_eq!(response.message, "⏱️ Idle");

            let data = response.data.unwrap();
            assert_eq!(data.mode, Some("idle".to_string()));
            assert_eq!(data.remaining_millis, Some(0));
            assert!(data.task_name.is_none());
        }

        #[tokio::test]
        async fn test_handle_start() {
            let (handler, _engine) = spawn_engine();

            let response = handler
                .handle(start_request("Write report", Category::Challenge, 1_800_000))
                .await;

            assert_eq!(response.status, "success");
            assert_eq!(response.message, "Task started");

            let data = response.data.unwrap();
            assert_eq!(data.mode, Some("running".to_string()));
            assert_eq!(data.task_name, Some("Write report".to_string()));
            assert_eq!(data.category, Some("challenge".to_string()));
            assert_eq!(data.remaining_millis, Some(1_800_000));
        }

        #[tokio::test]
        async fn test_handle_start_clamps_negative_duration() {
            let (handler, _engine) = spawn_engine();

            let response = handler
                .handle(start_request("Nap", Category::Recharge, -5_000))
                .await;

            assert_eq!(response.status, "success");
            let data = response.data.unwrap();
            assert_eq!(data.mode, Some("running".to_string()));
            assert_eq!(data.remaining_millis, Some(0));
        }

        #[tokio::test]
        async fn test_handle_complete() {
            let (handler, _engine) = spawn_engine();

            handler
                .handle(start_request("Write report", Category::Challenge, 60_000))
                .await;
            let response = handler.handle(IpcRequest::Complete).await;

            assert_eq!(response.status, "success");
            assert_eq!(response.message, "Task completed");

            let data = response.data.unwrap();
            assert_eq!(data.mode, Some("idle".to_string()));
            assert!(data.task_name.is_none());
        }

        #[tokio::test]
        async fn test_handle_idle() {
            let (handler, _engine) = spawn_engine();

            let response = handler.handle(IpcRequest::Idle).await;

            assert_eq!(response.status, "success");
            assert_eq!(response.message, "Idle mode started");
            assert_eq!(response.data.unwrap().mode, Some("idle".to_string()));
        }

        #[tokio::test]
        async fn test_handle_show_keeps_state() {
            let (handler, _engine) = spawn_engine();

            handler
                .handle(start_request("Write report", Category::Challenge, 60_000))
                .await;
            let response = handler.handle(IpcRequest::Show).await;

            assert_eq!(response.status, "success");
            assert_eq!(response.message, "Timer shown");

            let data = response.data.unwrap();
            assert_eq!(data.mode, Some("running".to_string()));
            assert_eq!(data.task_name, Some("Write report".to_string()));
        }

        #[tokio::test]
        async fn test_handle_reports_error_when_engine_is_gone() {
            let (handler, engine) = spawn_engine();
            engine.abort();
            let _ = engine.await;

            let response = handler.handle(IpcRequest::Complete).await;

            assert_eq!(response.status, "error");
            assert!(response.message.contains("not running"));
        }

        #[tokio::test]
        async fn test_status_message_is_headline() {
            let (handler, _engine) = spawn_engine();

            handler
                .handle(start_request("Write report", Category::Challenge, 1_530_000))
                .await;
            let response = handler.handle(IpcRequest::Status).await;

            assert_eq!(response.message, "🔥 25:30");
        }
    }

    // ------------------------------------------------------------------------
    // Integration Tests
    // ------------------------------------------------------------------------

    mod integration_tests {
        use super::*;

        #[tokio::test]
        async fn test_full_ipc_flow() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();
            let (handler, _engine) = spawn_engine();

            // Client sends start request
            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();

                // Send start request
                let request = r#"{"command":"start","params":{"name":"Integration","category":"recharge","durationMillis":300000}}"#;
                stream.write_all(request.as_bytes()).await.unwrap();
                stream.flush().await.unwrap();

                // Read response
                let mut buffer = vec![0u8; 4096];
                let n = stream.read(&mut buffer).await.unwrap();
                let response: IpcResponse = serde_json::from_slice(&buffer[..n]).unwrap();
                response
            });

            // Server handles request
            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await.unwrap();
            let response = handler.handle(request).await;
            IpcServer::send_response(&mut stream, &response)
                .await
                .unwrap();

            // Verify client received correct response
            let client_response = client_handle.await.unwrap();
            assert_eq!(client_response.status, "success");
            assert_eq!(client_response.message, "Task started");

            let data = client_response.data.unwrap();
            assert_eq!(data.mode, Some("running".to_string()));
            assert_eq!(data.task_name, Some("Integration".to_string()));
            assert_eq!(data.category, Some("recharge".to_string()));
        }

        #[tokio::test]
        async fn test_command_sequence_over_handler() {
            let (handler, _engine) = spawn_engine();

            // start -> complete -> idle -> status, two-step return to
            // reminders included
            let commands = [
                (r#"{"command":"start","params":{"name":"Plan week","category":"challenge","durationMillis":600000}}"#, "running"),
                (r#"{"command":"complete"}"#, "idle"),
                (r#"{"command":"idle"}"#, "idle"),
                (r#"{"command":"status"}"#, "idle"),
            ];

            for (cmd_json, expected_mode) in commands {
                let request: IpcRequest = serde_json::from_str(cmd_json).unwrap();
                let response = handler.handle(request).await;

                assert_eq!(response.status, "success", "Command: {}", cmd_json);
                let data = response.data.unwrap();
                assert_eq!(
                    data.mode,
                    Some(expected_mode.to_string()),
                    "Command: {}",
                    cmd_json
                );
            }
        }
    }

    // ------------------------------------------------------------------------
    // Error Handling Tests
    // ------------------------------------------------------------------------

    mod error_tests {
        use super::*;

        #[tokio::test]
        async fn test_connection_closed() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let stream = UnixStream::connect(&client_path).await.unwrap();
                // Close immediately without sending anything
                drop(stream);
            });

            let mut stream = server.accept().await.unwrap();
            let result = IpcServer::receive_request(&mut stream).await;

            assert!(result.is_err());
        }

        #[tokio::test]
        async fn test_ipc_error_display() {
            let err = IpcError::ReadError("test error".to_string());
            assert_eq!(err.to_string(), "Failed to read request: test error");

            let err = IpcError::Timeout;
            assert_eq!(err.to_string(), "Operation timed out");

            let err = IpcError::RequestTooLarge;
            assert!(err.to_string().contains("4096"));
        }
    }
}
