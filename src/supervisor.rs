//! Connection Supervisor: owns the connection id → Upstream Connection
//! mapping, creates connections lazily, and retires them on `closed`/`error`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::auth::AuthSession;
use crate::constants::{MAX_RETRIES, RETRY_DELAY};
use crate::error::{RelayError, Result};
use crate::store::TickStore;
use crate::ws::connection::{ConnectionEvent, UpstreamConnection};

/// Informational role passed to [`ConnectionSupervisor::ensure`], used only
/// for logging — it does not change supervisor behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRole {
    Priority,
    Rotation,
}

impl std::fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Priority => write!(f, "priority"),
            Self::Rotation => write!(f, "rotation"),
        }
    }
}

/// A live, shared handle to one connection slot's Upstream Connection.
/// Multiple callers may hold this `Arc`; subscribe/unsubscribe calls
/// serialize through the inner mutex.
pub type ConnectionHandle = Arc<Mutex<UpstreamConnection>>;

/// Owns and lazily (re)creates the three Upstream Connections by stable id.
pub struct ConnectionSupervisor {
    access_token: String,
    client_id: String,
    store: Arc<TickStore>,
    handles: Arc<Mutex<HashMap<u8, ConnectionHandle>>>,
    shutting_down: Arc<AtomicBool>,
    max_retries: u32,
    retry_delay: std::time::Duration,
}

impl ConnectionSupervisor {
    /// Construct a supervisor bound to an authenticated session and the
    /// shared Tick Store it forwards inbound ticks into, using the
    /// compiled-in [`MAX_RETRIES`]/[`RETRY_DELAY`] defaults.
    pub fn new(auth: &AuthSession, store: Arc<TickStore>) -> Self {
        Self::with_retry_policy(auth, store, MAX_RETRIES, RETRY_DELAY)
    }

    /// Construct a supervisor with an explicit (possibly
    /// environment-overridden) retry policy, as supplied by
    /// [`crate::config::Config`].
    pub fn with_retry_policy(
        auth: &AuthSession,
        store: Arc<TickStore>,
        max_retries: u32,
        retry_delay: std::time::Duration,
    ) -> Self {
        Self {
            access_token: auth.access_token.clone(),
            client_id: auth.client_id.clone(),
            store,
            handles: Arc::new(Mutex::new(HashMap::new())),
            shutting_down: Arc::new(AtomicBool::new(false)),
            max_retries,
            retry_delay,
        }
    }

    /// Return a live handle for `id`, creating one if absent.
    ///
    /// Retries up to [`MAX_RETRIES`] times with a fixed [`RETRY_DELAY`]
    /// between attempts; returns [`RelayError::ConnectFailed`] after
    /// exhaustion, or [`RelayError::ShuttingDown`] if a shutdown has been
    /// signaled.
    pub async fn ensure(&self, id: u8, role: ConnectionRole) -> Result<ConnectionHandle> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(RelayError::ShuttingDown);
        }

        if let Some(handle) = self.handles.lock().await.get(&id) {
            return Ok(handle.clone());
        }

        let mut attempts = 0u32;
        loop {
            if self.shutting_down.load(Ordering::SeqCst) {
                return Err(RelayError::ShuttingDown);
            }
            attempts += 1;
            match UpstreamConnection::connect(&self.access_token, &self.client_id).await {
                Ok((conn, mut events)) => {
                    let handle: ConnectionHandle = Arc::new(Mutex::new(conn));
                    self.handles.lock().await.insert(id, handle.clone());

                    let handles = self.handles.clone();
                    let store = self.store.clone();
                    tokio::spawn(async move {
                        while let Some(event) = events.recv().await {
                            match event {
                                ConnectionEvent::Connected => {
                                    tracing::info!(connection = id, %role, "connection established");
                                }
                                ConnectionEvent::Ticks(ticks) => {
                                    store.update(&ticks);
                                }
                                ConnectionEvent::Closed => {
                                    tracing::info!(connection = id, "connection closed by peer");
                                    handles.lock().await.remove(&id);
                                    break;
                                }
                                ConnectionEvent::Error(reason) => {
                                    tracing::warn!(connection = id, %reason, "connection error");
                                    handles.lock().await.remove(&id);
                                    break;
                                }
                            }
                        }
                    });

                    return Ok(handle);
                }
                Err(e) => {
                    tracing::warn!(connection = id, %role, attempt = attempts, error = %e, "connect attempt failed");
                    if attempts >= self.max_retries {
                        return Err(RelayError::ConnectFailed {
                            id,
                            attempts,
                        });
                    }
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    /// Signal shutdown: subsequent `ensure` calls fail promptly, and every
    /// currently live handle is closed.
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        let mut handles = self.handles.lock().await;
        for (id, handle) in handles.drain() {
            if let Ok(conn) = Arc::try_unwrap(handle) {
                let conn = conn.into_inner();
                if let Err(e) = conn.close().await {
                    tracing::warn!(connection = id, error = %e, "error closing connection during shutdown");
                }
            }
        }
    }

    /// Whether a shutdown has been signaled.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TickStore;

    fn dummy_session() -> AuthSession {
        AuthSession {
            access_token: "tok".into(),
            client_id: "AB1234".into(),
        }
    }

    #[test]
    fn role_display_matches_logging_labels() {
        assert_eq!(ConnectionRole::Priority.to_string(), "priority");
        assert_eq!(ConnectionRole::Rotation.to_string(), "rotation");
    }

    /// No-leak property (testable property 5): once shutdown is signaled,
    /// `ensure` must return promptly without attempting to (re)connect —
    /// checked before the handles map is even consulted, so this holds
    /// whether or not a handle previously existed for `id`.
    #[tokio::test]
    async fn ensure_after_shutdown_fails_fast_without_connecting() {
        let supervisor = ConnectionSupervisor::with_retry_policy(
            &dummy_session(),
            Arc::new(TickStore::new()),
            1,
            std::time::Duration::from_millis(1),
        );
        supervisor.shutdown().await;
        assert!(supervisor.is_shutting_down());
        let result = supervisor.ensure(1, ConnectionRole::Rotation).await;
        assert!(matches!(result, Err(RelayError::ShuttingDown)));
    }

    #[tokio::test]
    async fn shutdown_clears_the_handle_table() {
        let supervisor = ConnectionSupervisor::with_retry_policy(
            &dummy_session(),
            Arc::new(TickStore::new()),
            1,
            std::time::Duration::from_millis(1),
        );
        supervisor.shutdown().await;
        assert!(supervisor.handles.lock().await.is_empty());
    }
}
