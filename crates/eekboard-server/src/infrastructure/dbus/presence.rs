//! Client presence over the bus.
//!
//! A client "vanishes" when its unique name loses its owner, which the bus
//! daemon announces with `NameOwnerChanged(name, old, "")`.

use eekboard_core::ClientIdentity;
use futures_util::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use zbus::fdo::DBusProxy;
use zbus::names::BusName;
use zbus::Connection;

use crate::application::PresenceWatcher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    Vanished(ClientIdentity),
    /// The watch could not be set up; the client is not being followed.
    WatchFailed(ClientIdentity),
}

/// Watches peers through the bus daemon and reports on a channel.
///
/// Each watch is a tokio task, so `watch` must be called from within the
/// runtime.
pub struct BusPresenceWatcher {
    conn: Connection,
    events: UnboundedSender<PresenceEvent>,
}

impl BusPresenceWatcher {
    pub fn new(conn: Connection, events: UnboundedSender<PresenceEvent>) -> Self {
        Self { conn, events }
    }
}

impl PresenceWatcher for BusPresenceWatcher {
    fn watch(&self, client: ClientIdentity) {
        let conn = self.conn.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            match wait_for_vanish(&conn, &client).await {
                Ok(()) => {
                    debug!(client = %client, "client left the bus");
                    let _ = events.send(PresenceEvent::Vanished(client));
                }
                Err(e) => {
                    warn!(client = %client, error = %e, "cannot watch client presence");
                    let _ = events.send(PresenceEvent::WatchFailed(client));
                }
            }
        });
    }
}

/// Resolves once `client` no longer owns its name.
async fn wait_for_vanish(conn: &Connection, client: &ClientIdentity) -> zbus::Result<()> {
    let proxy = DBusProxy::new(conn).await?;
    let mut changes = proxy
        .receive_name_owner_changed_with_args(&[(0, client.as_str())])
        .await?;

    // The client may have left between its call and the subscription.
    let name = BusName::try_from(client.as_str())?;
    if !proxy.name_has_owner(name).await? {
        return Ok(());
    }

    while let Some(signal) = changes.next().await {
        let args = signal.args()?;
        if args.new_owner().is_none() {
            return Ok(());
        }
    }
    // Stream ended: the connection is gone, so is every client.
    Ok(())
}
