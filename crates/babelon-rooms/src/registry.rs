//! Live connection registry
//!
//! One [`ConnectionRegistry`] instance is constructed at startup and shared
//! by reference across all session handlers. Each live channel is
//! represented by an unbounded outbound queue: `broadcast` pushes into the
//! queues of every current member and the transport task drains its own
//! queue into the socket. A send into a queue whose receiver is gone marks
//! that member stale and removes it, which makes per-recipient delivery
//! failure an implicit leave rather than an error.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use babelon_common::{BabelonError, Result};
use babelon_core::types::GroupId;

/// Handle to one live duplex channel, owned by the transport task that
/// created it. Holds the receiving half of the outbound queue; the registry
/// keeps the sending half.
#[derive(Debug)]
pub struct Connection {
    id: Uuid,
    user_id: String,
    group: GroupId,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl Connection {
    /// Unique id of this connection.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Authenticated user behind this connection.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Group this connection is joined to.
    pub fn group(&self) -> &GroupId {
        &self.group
    }

    /// Next payload broadcast to this connection, `None` once the registry
    /// has dropped it (leave or teardown).
    pub async fn recv(&mut self) -> Option<String> {
        self.outbound.recv().await
    }
}

#[derive(Debug)]
struct Member {
    user_id: String,
    sender: mpsc::UnboundedSender<String>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    groups: HashMap<GroupId, HashMap<Uuid, Member>>,
    closed: bool,
}

/// Registry of live connections, grouped by room or private pair.
///
/// All membership changes and broadcast reads go through one RwLock, so two
/// concurrent calls always observe a consistent member set: a broadcast
/// visits every member exactly once as of its snapshot, and a removal that
/// completes before a broadcast starts is never delivered to.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: RwLock<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection under `group`.
    ///
    /// The connection is a broadcast target immediately upon return. Fails
    /// with [`BabelonError::RegistryClosed`] after [`close`](Self::close).
    pub async fn join(&self, group: GroupId, user_id: impl Into<String>) -> Result<Connection> {
        let user_id = user_id.into();
        let mut inner = self.inner.write().await;
        if inner.closed {
            return Err(BabelonError::RegistryClosed);
        }

        let id = Uuid::new_v4();
        let (sender, outbound) = mpsc::unbounded_channel();
        inner.groups.entry(group.clone()).or_default().insert(
            id,
            Member {
                user_id: user_id.clone(),
                sender,
            },
        );
        debug!("🔗 {} joined {} ({})", user_id, group, id);

        Ok(Connection {
            id,
            user_id,
            group,
            outbound,
        })
    }

    /// Remove a connection from its group. Idempotent: removing a
    /// connection that is already gone is a no-op, and calling this
    /// concurrently with `broadcast` is safe.
    pub async fn leave(&self, connection: &Connection) {
        let mut inner = self.inner.write().await;
        Self::remove_member(&mut inner, &connection.group, connection.id);
    }

    /// Deliver `payload` to every connection currently in `group`.
    ///
    /// Members whose channel is gone are treated as an implicit leave; they
    /// never abort delivery to the rest. Returns the number of successful
    /// deliveries.
    pub async fn broadcast(&self, group: &GroupId, payload: &str) -> usize {
        let (delivered, stale) = {
            let inner = self.inner.read().await;
            let Some(members) = inner.groups.get(group) else {
                return 0;
            };

            let mut delivered = 0;
            let mut stale = Vec::new();
            for (id, member) in members {
                if member.sender.send(payload.to_string()).is_ok() {
                    delivered += 1;
                } else {
                    stale.push(*id);
                }
            }
            (delivered, stale)
        };

        if !stale.is_empty() {
            warn!(
                "⚠️ Dropping {} unreachable connection(s) from {}",
                stale.len(),
                group
            );
            let mut inner = self.inner.write().await;
            for id in stale {
                Self::remove_member(&mut inner, group, id);
            }
        }

        delivered
    }

    /// Number of live connections currently joined to `group`.
    pub async fn member_count(&self, group: &GroupId) -> usize {
        let inner = self.inner.read().await;
        inner.groups.get(group).map_or(0, HashMap::len)
    }

    /// Tear the registry down. Every outbound queue is dropped, which ends
    /// each transport's forward loop; subsequent `join` calls fail with
    /// [`BabelonError::RegistryClosed`].
    pub async fn close(&self) {
        let mut inner = self.inner.write().await;
        inner.closed = true;
        inner.groups.clear();
        debug!("🛑 Connection registry closed");
    }

    fn remove_member(inner: &mut RegistryInner, group: &GroupId, id: Uuid) {
        if let Some(members) = inner.groups.get_mut(group) {
            if let Some(member) = members.remove(&id) {
                debug!("🔌 {} left {} ({})", member.user_id, group, id);
            }
            if members.is_empty() {
                inner.groups.remove(group);
            }
        }
    }
}
