//! The service loop.
//!
//! One task owns the [`Service`] and is the only place its state changes.
//! It waits on four sources:
//!
//! - method calls forwarded by the bus objects ([`Command`]);
//! - presence events from the [`BusPresenceWatcher`];
//! - user key events from the views;
//! - the earliest key-repeat deadline.
//!
//! After every step it drains the service's notifications and emits them as
//! signals, in order, before answering the call that caused them.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use eekboard_core::protocol::names::context_path;
use eekboard_core::{ClientIdentity, ContextId, ContextSignal, Notification, ServiceSignal};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};
use zbus::object_server::SignalEmitter;
use zbus::Connection;

use super::commands::{Command, Commands};
use super::context_object::ContextObject;
use super::presence::{BusPresenceWatcher, PresenceEvent};
use super::service_object::ServiceObject;
use crate::application::{ContextFactory, Service, ServiceError, ViewEvent};

/// Pending method calls the loop will buffer.
const COMMAND_QUEUE: usize = 64;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),
}

pub struct ServiceRuntime {
    conn: Connection,
    bus_name: String,
    service_path: String,
    service: Service,
    commands: mpsc::Receiver<Command>,
    command_tx: Commands,
    presence: UnboundedReceiver<PresenceEvent>,
    view_events: UnboundedReceiver<ViewEvent>,
}

impl ServiceRuntime {
    /// Serves the service object at `service_path` and claims `bus_name`.
    pub async fn start(
        conn: Connection,
        bus_name: &str,
        service_path: &str,
        factory: Arc<dyn ContextFactory>,
        view_events: UnboundedReceiver<ViewEvent>,
    ) -> Result<Self, RuntimeError> {
        let (presence_tx, presence): (UnboundedSender<PresenceEvent>, _) =
            mpsc::unbounded_channel();
        let watcher = Arc::new(BusPresenceWatcher::new(conn.clone(), presence_tx));
        let mut service = Service::new(factory, watcher);

        let (tx, commands) = mpsc::channel(COMMAND_QUEUE);
        let command_tx = Commands::new(tx);

        conn.object_server()
            .at(service_path, ServiceObject::new(command_tx.clone()))
            .await?;
        conn.request_name(bus_name).await?;
        service.mark_registered();
        info!(name = bus_name, path = service_path, "service registered on the bus");

        Ok(Self {
            conn,
            bus_name: bus_name.to_string(),
            service_path: service_path.to_string(),
            service,
            commands,
            command_tx,
            presence,
            view_events,
        })
    }

    /// A handle for issuing calls without going through the bus.
    pub fn commands(&self) -> Commands {
        self.command_tx.clone()
    }

    /// Runs until `Destroy` is called or `shutdown` resolves.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> Result<(), RuntimeError> {
        tokio::pin!(shutdown);

        loop {
            let deadline = self.service.next_deadline();
            tokio::select! {
                Some(command) = self.commands.recv() => {
                    if self.handle_command(command).await {
                        break;
                    }
                }
                Some(event) = self.presence.recv() => {
                    match event {
                        PresenceEvent::Vanished(client) => {
                            self.service.client_vanished(&client);
                            self.flush().await;
                        }
                        PresenceEvent::WatchFailed(client) => self.service.watch_failed(&client),
                    }
                }
                Some(event) = self.view_events.recv() => {
                    if let Err(e) = self.service.view_key_event(event.context, event.action, Instant::now()) {
                        debug!(context = %event.context, error = %e, "view key event dropped");
                    }
                    self.flush().await;
                }
                _ = sleep_until(deadline) => {
                    self.service.fire_timers(Instant::now());
                    self.flush().await;
                }
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    self.service.destroy();
                    self.flush().await;
                    self.release_name().await;
                    break;
                }
            }
        }
        info!("service loop stopped");
        Ok(())
    }

    /// Returns `true` when the loop should stop.
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::CreateContext {
                sender,
                client_name,
                reply,
            } => {
                let result = match self.service.create_context(&sender, &client_name) {
                    Ok(id) => self.export_context(id).await.map(|()| id).map_err(|e| {
                        error!(context = %id, error = %e, "cannot export context object");
                        // The caller never learns the id.
                        roll_back(&mut self.service, &sender, id);
                        ServiceError::ContextCreationFailed(e.to_string())
                    }),
                    Err(e) => Err(e),
                };
                self.flush().await;
                let _ = reply.send(result);
            }
            Command::PushContext { id, reply } => {
                let result = self.service.push_context(id);
                self.flush().await;
                let _ = reply.send(result);
            }
            Command::PopContext { sender, reply } => {
                let result = self.service.pop_context(&sender);
                self.flush().await;
                let _ = reply.send(result);
            }
            Command::DestroyContext { sender, id, reply } => {
                let result = self.service.destroy_context(&sender, id);
                self.flush().await;
                let _ = reply.send(result);
            }
            Command::ShowKeyboard { reply } => {
                let result = self.service.show_keyboard();
                self.flush().await;
                let _ = reply.send(result);
            }
            Command::HideKeyboard { reply } => {
                let result = self.service.hide_keyboard();
                self.flush().await;
                let _ = reply.send(result);
            }
            Command::ContextCall { id, call, reply } => {
                let result = self.service.context_call(id, call);
                self.flush().await;
                let _ = reply.send(result);
            }
            Command::Destroy { reply } => {
                self.service.destroy();
                self.flush().await;
                self.release_name().await;
                let _ = reply.send(());
                return true;
            }
        }
        false
    }

    async fn export_context(&self, id: ContextId) -> zbus::Result<()> {
        let path = context_path(id);
        self.conn
            .object_server()
            .at(path.as_str(), ContextObject::new(id, self.command_tx.clone()))
            .await?;
        debug!(context = %id, path, "context object exported");
        Ok(())
    }

    /// Emits every queued notification.
    async fn flush(&mut self) {
        for notification in self.service.drain_notifications() {
            if let Err(e) = self.emit(&notification).await {
                warn!(?notification, error = %e, "failed to emit signal");
            }
            if let Notification::Context {
                id,
                signal: ContextSignal::Destroyed,
            } = notification
            {
                self.unexport_context(id).await;
            }
        }
    }

    async fn emit(&self, notification: &Notification) -> zbus::Result<()> {
        match notification {
            Notification::Service(ServiceSignal::Destroyed) => {
                let emitter = SignalEmitter::new(&self.conn, self.service_path.as_str())?;
                ServiceObject::destroyed(&emitter).await
            }
            Notification::Context { id, signal } => {
                let path = context_path(*id);
                let emitter = SignalEmitter::new(&self.conn, path.as_str())?;
                match signal {
                    ContextSignal::Enabled => ContextObject::enabled(&emitter).await,
                    ContextSignal::Disabled => ContextObject::disabled(&emitter).await,
                    ContextSignal::Destroyed => ContextObject::destroyed(&emitter).await,
                    ContextSignal::KeyPressed {
                        keyname,
                        symbol,
                        modifiers,
                    } => {
                        ContextObject::key_pressed(&emitter, keyname, symbol.to_wire(), *modifiers)
                            .await
                    }
                    ContextSignal::VisibilityChanged(visible) => {
                        ContextObject::visibility_changed(&emitter, *visible).await
                    }
                    ContextSignal::KeyboardChanged(kb) => {
                        ContextObject::keyboard_changed(&emitter, kb.0).await
                    }
                    ContextSignal::GroupChanged(group) => {
                        ContextObject::group_changed(&emitter, *group).await
                    }
                }
            }
        }
    }

    async fn unexport_context(&self, id: ContextId) {
        let path = context_path(id);
        match self
            .conn
            .object_server()
            .remove::<ContextObject, _>(path.as_str())
            .await
        {
            Ok(_) => debug!(context = %id, "context object removed"),
            Err(e) => warn!(context = %id, error = %e, "failed to remove context object"),
        }
    }

    async fn release_name(&self) {
        if let Err(e) = self.conn.release_name(self.bus_name.as_str()).await {
            warn!(name = %self.bus_name, error = %e, "failed to release bus name");
        }
    }
}

/// Destroys a context whose object could not be exported. Returns `false`
/// if the context could not be destroyed.
fn roll_back(service: &mut Service, sender: &ClientIdentity, id: ContextId) -> bool {
    match service.destroy_context(sender, id) {
        Ok(()) => true,
        Err(e) => {
            warn!(context = %id, error = %e, "rollback of unexported context failed");
            false
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(tokio::time::Instant::from_std(d)).await,
        None => std::future::pending().await,
    }
}
