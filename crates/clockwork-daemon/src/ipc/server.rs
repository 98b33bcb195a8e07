use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};

use super::connection::{self, ConnectionError};
use super::protocol::{JsonRpcError, Notification, Request, Response};
use crate::api::ApiHandler;

#[derive(Debug, thiserror::Error)]
pub enum IpcServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
}

pub type Result<T> = std::result::Result<T, IpcServerError>;

pub struct IpcServer {
    socket_path: PathBuf,
    api_handler: Arc<ApiHandler>,
}

impl IpcServer {
    pub fn new(socket_path: impl Into<PathBuf>, api_handler: Arc<ApiHandler>) -> Self {
        Self {
            socket_path: socket_path.into(),
            api_handler,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Bind the socket, replacing a stale one, and serve until the task is dropped
    pub async fn start(self: Arc<Self>) -> Result<()> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("IPC server listening on {}", self.socket_path.display());

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let server = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = server.handle_connection(stream).await {
                            tracing::error!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    async fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        tracing::debug!("New client connected");

        let (mut reader, mut writer) = connection::split(stream);
        let mut notif_rx = Self::forward_events(self.api_handler.subscribe_events());

        loop {
            tokio::select! {
                line = reader.next_line() => {
                    let line = match line {
                        Ok(line) => line,
                        Err(ConnectionError::Closed) => {
                            tracing::debug!("Client disconnected");
                            break;
                        }
                        Err(e) => return Err(e.into()),
                    };

                    let response = self.handle_line(&line).await;
                    writer.send(&response).await?;
                }
                Some(notification) = notif_rx.recv() => {
                    if let Err(e) = writer.send(&notification).await {
                        tracing::warn!("Failed to send notification: {}", e);
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Turn the event stream into notifications on a per-connection channel.
    /// The forwarder ends when the connection drops its receiver.
    fn forward_events(
        mut event_rx: broadcast::Receiver<crate::events::DaemonEvent>,
    ) -> mpsc::Receiver<Notification> {
        let (notif_tx, notif_rx) = mpsc::channel::<Notification>(100);

        tokio::spawn(async move {
            loop {
                let event = match event_rx.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Client lagging, skipped {} events", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                let notification = match Notification::from_event(&event) {
                    Ok(notification) => notification,
                    Err(e) => {
                        tracing::error!("Failed to encode event: {}", e);
                        continue;
                    }
                };

                if notif_tx.send(notification).await.is_err() {
                    break;
                }
            }
            tracing::debug!("Event forwarder stopped");
        });

        notif_rx
    }

    async fn handle_line(&self, line: &str) -> Response {
        let request = match Request::parse(line) {
            Ok(request) => request,
            Err(response) => {
                tracing::warn!("Rejected malformed request");
                return response;
            }
        };

        tracing::debug!("Request: {}", request.method);
        match self
            .api_handler
            .handle(&request.method, request.params)
            .await
        {
            Ok(result) => Response::success(result, request.id),
            Err(error) => {
                tracing::debug!("{} failed: {}", request.method, error);
                Response::error(JsonRpcError::from(error), request.id)
            }
        }
    }
}
