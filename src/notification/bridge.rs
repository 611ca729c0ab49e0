//! src/notification/bridge.rs
//!
//! Membership of browser connections in registrant channels.
//!
//! Delivery is fire-and-forget: an event published to a channel nobody has
//! joined is dropped, and a connection that joins later does not see it. The
//! payment status in the database stays the source of truth.
use super::{Channel, ConfirmationEvent};
use crate::domain::RegistrantId;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

pub type ConnectionId = Uuid;

#[derive(Default)]
struct Rooms {
    connections: HashMap<ConnectionId, UnboundedSender<ConfirmationEvent>>,
    channels: HashMap<Channel, HashSet<ConnectionId>>,
}

/// Cheap to clone; every clone shares the same membership map.
#[derive(Clone, Default)]
pub struct NotificationBridge {
    rooms: Arc<RwLock<Rooms>>,
}

impl NotificationBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new transport connection. Dropping the returned handle
    /// removes it from every channel it joined.
    pub fn connect(&self) -> Connection {
        let (sender, receiver) = unbounded_channel();
        let id = Uuid::new_v4();
        self.rooms.write().connections.insert(id, sender);

        Connection {
            id,
            bridge: self.clone(),
            receiver,
        }
    }

    /// Joins `connection_id` to the channel of `registrant_id`.
    ///
    /// Malformed ids and unknown connections are ignored.
    #[tracing::instrument(name = "Join registrant channel", skip(self))]
    pub fn subscribe(&self, connection_id: ConnectionId, registrant_id: &str) {
        let registrant_id = match RegistrantId::parse(registrant_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!("Ignoring subscription: {}", e);
                return;
            }
        };
        let channel = Channel::for_registrant(registrant_id);

        let mut rooms = self.rooms.write();
        if !rooms.connections.contains_key(&connection_id) {
            tracing::debug!("Ignoring subscription from a closed connection");
            return;
        }
        rooms
            .channels
            .entry(channel.clone())
            .or_default()
            .insert(connection_id);
        tracing::info!(%channel, "Connection joined channel");
    }

    /// Sends `event` to every connection in the registrant's channel and
    /// returns how many were reached.
    #[tracing::instrument(name = "Publish confirmation", skip(self, event))]
    pub fn publish(&self, registrant_id: RegistrantId, event: &ConfirmationEvent) -> usize {
        let channel = Channel::for_registrant(registrant_id);
        let rooms = self.rooms.read();

        let Some(members) = rooms.channels.get(&channel) else {
            tracing::info!(%channel, "No connection is waiting on this channel");
            return 0;
        };

        let delivered = members
            .iter()
            .filter_map(|id| rooms.connections.get(id))
            .filter(|sender| sender.send(event.clone()).is_ok())
            .count();
        tracing::info!(%channel, delivered, "Confirmation sent");

        delivered
    }

    /// Forgets `connection_id` and every channel membership it held.
    pub fn disconnect(&self, connection_id: ConnectionId) {
        let mut rooms = self.rooms.write();
        rooms.connections.remove(&connection_id);
        rooms.channels.retain(|_, members| {
            members.remove(&connection_id);
            !members.is_empty()
        });
    }

    pub fn subscriber_count(&self, registrant_id: RegistrantId) -> usize {
        self.rooms
            .read()
            .channels
            .get(&Channel::for_registrant(registrant_id))
            .map_or(0, HashSet::len)
    }
}

/// One browser session's view of the bridge.
pub struct Connection {
    id: ConnectionId,
    bridge: NotificationBridge,
    receiver: UnboundedReceiver<ConfirmationEvent>,
}

impl Connection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn subscribe(&self, registrant_id: &str) {
        self.bridge.subscribe(self.id, registrant_id);
    }

    /// Waits for the next event addressed to this connection.
    pub async fn recv(&mut self) -> Option<ConfirmationEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ConfirmationEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.bridge.disconnect(self.id);
    }
}
