//! UNIX socket server for daemon mode.
//!
//! Listens on a UNIX socket, accepts connections, and dispatches requests
//! to DaemonService. A `subscribe` request keeps its connection open and
//! receives one event line per matched message.
//!
//! CHANGELOG:
//! - 10/16/2026 - Event streams notice closed clients between events
//! - 10/16/2026 - Streaming subscribe connections; error codes from reader errors
//! - 01/10/2026 - Initial implementation (Phase 4C)

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::config::Config;
use crate::daemon::protocol::{EventLine, Request, Response};
use crate::daemon::service::{self, DaemonService};
use crate::message::Message;

pub const SUBSCRIBE_METHOD: &str = "subscribe";

/// Longest an event waits before being written, and how often a stream
/// checks for a closed client.
const STREAM_TICK: Duration = Duration::from_millis(100);

/// Daemon server listening on UNIX socket.
pub struct DaemonServer {
    service: DaemonService,
    socket_path: String,
}

impl DaemonServer {
    /// Create new daemon server.
    pub fn new(socket_path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let socket_path = socket_path.as_ref().to_string_lossy().to_string();
        let service = DaemonService::new(config)?;

        Ok(Self {
            service,
            socket_path,
        })
    }

    /// Start serving requests (blocking).
    pub fn serve(&self) -> Result<()> {
        // Clean up stale socket
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)
            .with_context(|| format!("Failed to bind {}", self.socket_path))?;

        // Set permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(
                &self.socket_path,
                std::fs::Permissions::from_mode(0o600),
            )?;
        }

        tracing::info!(socket = %self.socket_path, "daemon listening");

        // Requests are handled sequentially; only event streams get their own thread.
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(e) = self.handle_connection(stream) {
                        tracing::warn!(error = %e, "connection error");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept error");
                }
            }
        }

        self.service.shutdown();
        Ok(())
    }

    /// Handle a single client connection.
    fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        // Clone stream for writer (UNIX sockets support try_clone)
        let writer_stream = stream.try_clone()?;
        let mut reader = BufReader::new(&stream);
        let mut writer = writer_stream;

        // Read NDJSON request (one line)
        let mut line = String::new();
        reader.read_line(&mut line)?;

        if line.trim().is_empty() {
            return Ok(()); // Client disconnected
        }

        let start = Instant::now();
        let request = Request::from_ndjson_line(&line)?;
        tracing::debug!(method = %request.method, id = %request.id, "request");

        if request.method == SUBSCRIBE_METHOD {
            return self.start_stream(request.id, writer, start);
        }

        let response = match self.service.dispatch(&request.method, request.params) {
            Ok(result) => Response::success(request.id, result, elapsed_ms(start)),
            Err(e) => Response::error(
                request.id,
                service::error_code(&e),
                e.to_string(),
                elapsed_ms(start),
            ),
        };

        // Send NDJSON response
        let response_line = response.to_ndjson_line()?;
        writer.write_all(response_line.as_bytes())?;
        writer.flush()?;

        Ok(())
    }

    /// Acknowledge a subscription, then forward events until the client goes away.
    fn start_stream(&self, id: String, mut writer: UnixStream, start: Instant) -> Result<()> {
        let events = self.service.subscribe();

        let ack = Response::success(id, serde_json::json!({"subscribed": true}), elapsed_ms(start));
        writer.write_all(ack.to_ndjson_line()?.as_bytes())?;
        writer.flush()?;

        std::thread::Builder::new()
            .name("sms-event-stream".to_string())
            .spawn(move || {
                if let Err(e) = forward_events(events, writer, STREAM_TICK) {
                    tracing::debug!(error = %e, "event stream closed");
                }
            })
            .context("Failed to spawn event stream")?;

        Ok(())
    }
}

/// Write one event line per message until the client hangs up or the reader goes away.
///
/// Between drains the stream is read with a `tick` timeout so a closed peer is
/// noticed even when no events arrive.
pub fn forward_events(
    mut events: broadcast::Receiver<Message>,
    mut stream: UnixStream,
    tick: Duration,
) -> Result<()> {
    stream.set_read_timeout(Some(tick))?;
    let mut buf = [0u8; 256];

    loop {
        loop {
            let message = match events.try_recv() {
                Ok(message) => message,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event stream lagged");
                    continue;
                }
                Err(TryRecvError::Closed) => return Ok(()),
            };
            let line = EventLine::message_received(message).to_ndjson_line()?;
            stream.write_all(line.as_bytes())?;
            stream.flush()?;
        }

        match stream.read(&mut buf) {
            Ok(0) => {
                tracing::debug!("event stream client disconnected");
                return Ok(());
            }
            // Clients send nothing after subscribing; extra input is ignored.
            Ok(_) => {}
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => return Err(e.into()),
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventHub;
    use std::sync::mpsc;

    #[test]
    fn test_forward_events_writes_lines_and_ends_on_hangup() {
        let hub = EventHub::new();
        let (server_end, client_end) = UnixStream::pair().unwrap();
        let events = hub.subscribe();

        let (done_tx, done_rx) = mpsc::channel();
        std::thread::spawn(move || {
            let result = forward_events(events, server_end, Duration::from_millis(20));
            let _ = done_tx.send(result.is_ok());
        });

        hub.emit(Message::live(Some("KCB".into()), Some("credited".into()), 7));
        let mut line = String::new();
        BufReader::new(&client_end).read_line(&mut line).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["event"], serde_json::json!("messageReceived"));
        assert_eq!(value["data"]["id"], serde_json::json!("7"));

        // No further events: the hangup alone must end the stream.
        drop(client_end);
        assert!(done_rx.recv_timeout(Duration::from_secs(2)).unwrap());
    }

    #[test]
    fn test_forward_events_ends_when_reader_dropped() {
        let hub = EventHub::new();
        let (server_end, _client_end) = UnixStream::pair().unwrap();
        let events = hub.subscribe();
        drop(hub);

        assert!(forward_events(events, server_end, Duration::from_millis(20)).is_ok());
    }
}
