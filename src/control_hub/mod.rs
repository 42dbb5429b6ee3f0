//! ControlHub - control channel connection registry
//!
//! ## Responsibilities
//!
//! - Track open control connections (one outbound queue each)
//! - Deliver replies to the connection that sent the command
//! - Connection count for status reporting
//!
//! Only one operator is expected; the hub does not arbitrate between
//! connections, every connection's commands reach the gateway.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Client connection
struct ClientConnection {
    id: Uuid,
    tx: mpsc::UnboundedSender<String>,
}

/// ControlHub instance
pub struct ControlHub {
    connections: RwLock<HashMap<Uuid, ClientConnection>>,
    connection_count: AtomicU64,
}

impl ControlHub {
    /// Create new ControlHub
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            connection_count: AtomicU64::new(0),
        }
    }

    /// Register a new client
    pub async fn register(&self) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        {
            let mut connections = self.connections.write().await;
            connections.insert(id, ClientConnection { id, tx });
        }

        self.connection_count.fetch_add(1, Ordering::Relaxed);

        tracing::info!(connection_id = %id, "Control client connected");

        (id, rx)
    }

    /// Unregister a client
    pub async fn unregister(&self, id: &Uuid) {
        let mut connections = self.connections.write().await;
        if connections.remove(id).is_some() {
            self.connection_count.fetch_sub(1, Ordering::Relaxed);
            tracing::info!(connection_id = %id, "Control client disconnected");
        }
    }

    /// Queue a text frame for one connection
    pub async fn send_to(&self, id: &Uuid, message: impl Into<String>) -> bool {
        let connections = self.connections.read().await;
        let Some(conn) = connections.get(id) else {
            tracing::debug!(connection_id = %id, "Send to unknown connection");
            return false;
        };

        let message = message.into();
        tracing::debug!(connection_id = %conn.id, message = %message, "Send");
        match conn.tx.send(message) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(connection_id = %conn.id, error = %e, "Failed to send message");
                false
            }
        }
    }

    /// Get connection count
    pub fn connection_count(&self) -> u64 {
        self.connection_count.load(Ordering::Relaxed)
    }
}

impl Default for ControlHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_send_unregister() {
        let hub = ControlHub::new();
        let (id, mut rx) = hub.register().await;
        assert_eq!(hub.connection_count(), 1);

        assert!(hub.send_to(&id, "Flash-OFF").await);
        assert_eq!(rx.recv().await.as_deref(), Some("Flash-OFF"));

        hub.unregister(&id).await;
        assert_eq!(hub.connection_count(), 0);
        assert!(!hub.send_to(&id, "pong-50").await);
    }

    #[tokio::test]
    async fn test_replies_go_to_one_connection() {
        let hub = ControlHub::new();
        let (a, mut rx_a) = hub.register().await;
        let (_b, mut rx_b) = hub.register().await;

        hub.send_to(&a, "pong-42").await;
        assert_eq!(rx_a.recv().await.as_deref(), Some("pong-42"));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregister_twice_counts_once() {
        let hub = ControlHub::new();
        let (id, _rx) = hub.register().await;
        hub.unregister(&id).await;
        hub.unregister(&id).await;
        assert_eq!(hub.connection_count(), 0);
    }
}
