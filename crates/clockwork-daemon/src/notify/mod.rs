//! Desktop notifications
//!
//! Permission is requested lazily, the first time something wants to
//! notify. A denied permission silently drops notifications.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use clockwork_core::models::NotificationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Default,
    Granted,
    Denied,
}

impl Permission {
    fn to_u8(self) -> u8 {
        match self {
            Permission::Default => 0,
            Permission::Granted => 1,
            Permission::Denied => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Permission::Granted,
            2 => Permission::Denied,
            _ => Permission::Default,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification backend error: {0}")]
    Backend(String),
}

pub trait Notifier: Send + Sync {
    fn permission(&self) -> Permission;

    fn request_permission(&self) -> BoxFuture<'_, Permission>;

    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Shows a notification, asking for permission first if nobody has yet.
///
/// Returns whether the notification was handed to the backend.
pub async fn deliver(notifier: &dyn Notifier, title: &str, body: &str) -> bool {
    let permission = match notifier.permission() {
        Permission::Default => notifier.request_permission().await,
        other => other,
    };

    if permission != Permission::Granted {
        tracing::debug!("Notification '{}' dropped, permission {:?}", title, permission);
        return false;
    }

    match notifier.show(title, body) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to show notification '{}': {}", title, e);
            false
        }
    }
}

/// Notifications through the desktop notification service
pub struct DesktopNotifier {
    enabled: bool,
    timeout_ms: u32,
    permission: AtomicU8,
}

impl DesktopNotifier {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            enabled: config.enabled,
            timeout_ms: config.timeout_ms,
            permission: AtomicU8::new(Permission::Default.to_u8()),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn permission(&self) -> Permission {
        Permission::from_u8(self.permission.load(Ordering::SeqCst))
    }

    fn request_permission(&self) -> BoxFuture<'_, Permission> {
        Box::pin(async move {
            let answer = if self.enabled {
                Permission::Granted
            } else {
                Permission::Denied
            };
            self.permission.store(answer.to_u8(), Ordering::SeqCst);
            tracing::info!("Notification permission: {:?}", answer);
            answer
        })
    }

    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let title = title.to_string();
        let body = body.to_string();
        let timeout = notify_rust::Timeout::Milliseconds(self.timeout_ms);

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| NotifyError::Backend(e.to_string()))?;

        // The notification service call blocks until the bus answers
        runtime.spawn_blocking(move || {
            if let Err(e) = notify_rust::Notification::new()
                .summary(&title)
                .body(&body)
                .icon("alarm-clock")
                .timeout(timeout)
                .show()
            {
                tracing::error!("Failed to show notification: {}", e);
            }
        });

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownNotification {
    pub title: String,
    pub body: String,
}

/// Records notifications instead of showing them
pub struct MemoryNotifier {
    permission: Mutex<Permission>,
    answer: Permission,
    shown: Mutex<Vec<ShownNotification>>,
    requests: AtomicU8,
}

impl MemoryNotifier {
    /// Starts undetermined and answers `answer` when asked
    pub fn new(answer: Permission) -> Self {
        Self {
            permission: Mutex::new(Permission::Default),
            answer,
            shown: Mutex::new(Vec::new()),
            requests: AtomicU8::new(0),
        }
    }

    pub fn granted() -> Self {
        Self::new(Permission::Granted)
    }

    pub fn denied() -> Self {
        Self::new(Permission::Denied)
    }

    pub fn shown(&self) -> Vec<ShownNotification> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> u8 {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Notifier for MemoryNotifier {
    fn permission(&self) -> Permission {
        *self.permission.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn request_permission(&self) -> BoxFuture<'_, Permission> {
        Box::pin(async move {
            self.requests.fetch_add(1, Ordering::SeqCst);
            *self.permission.lock().unwrap_or_else(PoisonError::into_inner) = self.answer;
            self.answer
        })
    }

    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ShownNotification {
                title: title.to_string(),
                body: body.to_string(),
            });
        Ok(())
    }
}
