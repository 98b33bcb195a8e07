//! Clockwork client library
//!
//! Talks to the Clockwork daemon over its Unix socket.

pub mod protocol;

pub use protocol::{Incoming, Notification, Request, RequestId, Response, RpcError};

use anyhow::Result;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, WriteHalf};
use tokio::net::UnixStream;
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};

type PendingResponses = Arc<RwLock<HashMap<i64, oneshot::Sender<Response>>>>;

/// Shared connection carrying both responses and notifications
struct PersistentConnection {
    writer: Arc<Mutex<BufWriter<WriteHalf<UnixStream>>>>,
    pending_responses: PendingResponses,
    /// Set by the reader task before it fails the pending calls
    closed: Arc<AtomicBool>,
}

pub struct ClockworkClient {
    socket_path: String,
    request_counter: AtomicI64,
    persistent_conn: Mutex<Option<PersistentConnection>>,
}

impl ClockworkClient {
    pub fn new(socket_path: impl Into<String>) -> Self {
        Self {
            socket_path: socket_path.into(),
            request_counter: AtomicI64::new(1),
            persistent_conn: Mutex::new(None),
        }
    }

    pub fn socket_path(&self) -> &str {
        &self.socket_path
    }

    /// Open a persistent connection and return the stream of daemon events.
    /// Later calls on this client go over the same connection.
    pub async fn subscribe_notifications(&self) -> Result<mpsc::Receiver<Notification>> {
        let mut conn_lock = self.persistent_conn.lock().await;
        if conn_lock.is_some() {
            anyhow::bail!("Already subscribed to notifications");
        }

        let stream = self.connect().await?;
        let (read_half, write_half) = tokio::io::split(stream);

        let (notif_tx, notif_rx) = mpsc::channel::<Notification>(100);
        let pending_responses: PendingResponses = Arc::new(RwLock::new(HashMap::new()));

        let closed = Arc::new(AtomicBool::new(false));

        let pending = pending_responses.clone();
        let reader_closed = closed.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(read_half);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => match Incoming::parse(line.trim()) {
                        Some(Incoming::Notification(notification)) => {
                            if notif_tx.send(notification).await.is_err() {
                                tracing::debug!("Notification receiver dropped");
                            }
                        }
                        Some(Incoming::Response(response)) => {
                            if let RequestId::Number(id) = response.id
                                && let Some(tx) = pending.write().await.remove(&id)
                            {
                                let _ = tx.send(response);
                            }
                        }
                        None => tracing::warn!("Unrecognised message from daemon"),
                    },
                }
            }

            // Fail whatever is still waiting
            reader_closed.store(true, Ordering::SeqCst);
            pending.write().await.clear();
        });

        *conn_lock = Some(PersistentConnection {
            writer: Arc::new(Mutex::new(BufWriter::new(write_half))),
            pending_responses,
            closed,
        });

        Ok(notif_rx)
    }

    /// Send a request and wait for its result. Uses the persistent connection
    /// when subscribed, a fresh one otherwise.
    pub async fn call(&self, method: impl Into<String>, params: Option<Value>) -> Result<Value> {
        let shared = {
            let conn_lock = self.persistent_conn.lock().await;
            conn_lock.as_ref().map(|conn| {
                (
                    conn.writer.clone(),
                    conn.pending_responses.clone(),
                    conn.closed.clone(),
                )
            })
        };

        match shared {
            Some((writer, pending, closed)) => {
                self.call_persistent(writer, pending, closed, method, params)
                    .await
            }
            None => self.call_oneshot(method, params).await,
        }
    }

    async fn call_persistent(
        &self,
        writer: Arc<Mutex<BufWriter<WriteHalf<UnixStream>>>>,
        pending: PendingResponses,
        closed: Arc<AtomicBool>,
        method: impl Into<String>,
        params: Option<Value>,
    ) -> Result<Value> {
        let id = self.next_id();
        let request = Request::new(method, params, RequestId::Number(id));
        let request_json = serde_json::to_string(&request)?;

        let (tx, rx) = oneshot::channel();
        pending.write().await.insert(id, tx);

        // The reader flags the connection before clearing the map, so an entry
        // inserted after that clear is caught here
        if closed.load(Ordering::SeqCst) {
            pending.write().await.remove(&id);
            anyhow::bail!("Connection to daemon is closed");
        }

        let written: std::io::Result<()> = async {
            let mut writer = writer.lock().await;
            writer.write_all(request_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        }
        .await;
        if let Err(e) = written {
            pending.write().await.remove(&id);
            return Err(e.into());
        }

        let response = rx
            .await
            .map_err(|_| anyhow::anyhow!("Connection closed before a response arrived"))?;
        Ok(response.into_result()?)
    }

    async fn call_oneshot(&self, method: impl Into<String>, params: Option<Value>) -> Result<Value> {
        let mut stream = self.connect().await?;
        let request = Request::new(method, params, RequestId::Number(self.next_id()));

        let request_json = serde_json::to_string(&request)?;
        stream.write_all(request_json.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        stream.flush().await?;

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                anyhow::bail!("Daemon closed the connection");
            }
            // Events may arrive before the answer on a fresh connection
            if let Some(Incoming::Response(response)) = Incoming::parse(line.trim()) {
                return Ok(response.into_result()?);
            }
        }
    }

    async fn connect(&self) -> Result<UnixStream> {
        UnixStream::connect(&self.socket_path).await.map_err(|e| {
            anyhow::anyhow!(
                "Cannot reach daemon at {}: {} (is clockworkd running?)",
                self.socket_path,
                e
            )
        })
    }

    fn next_id(&self) -> i64 {
        self.request_counter.fetch_add(1, Ordering::SeqCst)
    }

    // World clock

    pub async fn zone_directory(&self, query: Option<&str>) -> Result<Value> {
        self.call("zone.directory", Some(json!({ "query": query.unwrap_or("") })))
            .await
    }

    pub async fn zone_add(&self, zones: &[String]) -> Result<Value> {
        self.call("zone.add", Some(json!({ "zones": zones }))).await
    }

    pub async fn zone_remove(&self, zone_id: &str) -> Result<Value> {
        self.call("zone.remove", Some(json!({ "zone_id": zone_id })))
            .await
    }

    pub async fn zone_list(&self) -> Result<Value> {
        self.call("zone.list", None).await
    }

    pub async fn zone_compare(&self, from_id: &str, to_id: &str) -> Result<Value> {
        self.call(
            "zone.compare",
            Some(json!({ "from_id": from_id, "to_id": to_id })),
        )
        .await
    }

    // Alarms

    pub async fn alarm_add(
        &self,
        time: &str,
        recurrence: Option<&str>,
        time_zone: Option<&str>,
        days: &[u8],
    ) -> Result<Value> {
        let mut params = json!({ "time": time, "days": days });
        if let Some(recurrence) = recurrence {
            params["recurrence"] = json!(recurrence);
        }
        if let Some(time_zone) = time_zone {
            params["time_zone"] = json!(time_zone);
        }
        self.call("alarm.add", Some(params)).await
    }

    pub async fn alarm_list(&self) -> Result<Value> {
        self.call("alarm.list", None).await
    }

    pub async fn alarm_toggle(&self, alarm_id: &str) -> Result<Value> {
        self.call("alarm.toggle", Some(json!({ "alarm_id": alarm_id })))
            .await
    }

    pub async fn alarm_delete(&self, alarm_id: &str) -> Result<Value> {
        self.call("alarm.delete", Some(json!({ "alarm_id": alarm_id })))
            .await
    }

    pub async fn alarm_set_recurrence(
        &self,
        alarm_id: &str,
        recurrence: &str,
        days: &[u8],
    ) -> Result<Value> {
        self.call(
            "alarm.set_recurrence",
            Some(json!({
                "alarm_id": alarm_id,
                "recurrence": recurrence,
                "days": days,
            })),
        )
        .await
    }

    pub async fn alarm_toggle_day(&self, alarm_id: &str, day: u8) -> Result<Value> {
        self.call(
            "alarm.toggle_day",
            Some(json!({ "alarm_id": alarm_id, "day": day })),
        )
        .await
    }

    // Countdown

    pub async fn countdown_set(&self, hours: u32, minutes: u32, seconds: u32) -> Result<Value> {
        self.call(
            "countdown.set",
            Some(json!({
                "hours": hours,
                "minutes": minutes,
                "seconds": seconds,
            })),
        )
        .await
    }

    pub async fn countdown_start(&self) -> Result<Value> {
        self.call("countdown.start", None).await
    }

    pub async fn countdown_pause(&self) -> Result<Value> {
        self.call("countdown.pause", None).await
    }

    pub async fn countdown_lap(&self) -> Result<Value> {
        self.call("countdown.lap", None).await
    }

    pub async fn countdown_reset(&self) -> Result<Value> {
        self.call("countdown.reset", None).await
    }

    pub async fn countdown_get(&self) -> Result<Value> {
        self.call("countdown.get", None).await
    }

    // Stopwatch

    pub async fn stopwatch_start(&self) -> Result<Value> {
        self.call("stopwatch.start", None).await
    }

    pub async fn stopwatch_pause(&self) -> Result<Value> {
        self.call("stopwatch.pause", None).await
    }

    pub async fn stopwatch_lap(&self) -> Result<Value> {
        self.call("stopwatch.lap", None).await
    }

    pub async fn stopwatch_reset(&self) -> Result<Value> {
        self.call("stopwatch.reset", None).await
    }

    pub async fn stopwatch_get(&self) -> Result<Value> {
        self.call("stopwatch.get", None).await
    }

    // Display settings

    pub async fn settings_get(&self) -> Result<Value> {
        self.call("settings.get", None).await
    }

    pub async fn settings_set_hour_format(&self, hour_format: &str) -> Result<Value> {
        self.call(
            "settings.set_hour_format",
            Some(json!({ "hour_format": hour_format })),
        )
        .await
    }

    pub async fn settings_set_theme(&self, theme: &str) -> Result<Value> {
        self.call("settings.set_theme", Some(json!({ "theme": theme })))
            .await
    }

    pub async fn settings_toggle_hour_format(&self) -> Result<Value> {
        self.call("settings.toggle_hour_format", None).await
    }

    pub async fn settings_toggle_theme(&self) -> Result<Value> {
        self.call("settings.toggle_theme", None).await
    }
}
