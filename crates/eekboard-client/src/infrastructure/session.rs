//! High-level handles over the proxies.
//!
//! [`EekboardClient`] talks to the service object. Each context it creates
//! is returned as a [`KeyboardContext`], which subscribes to the context's
//! signals before handing it out and keeps a [`ContextState`] current from
//! them on a background task.

use std::sync::{Arc, Mutex, PoisonError};

use eekboard_core::protocol::names::{parse_context_path, CONTEXT_INTERFACE, SERVICE_NAME};
use eekboard_core::{ContextId, ContextSignal, KeyboardId, Symbol, WireSymbol};
use futures_util::{Stream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use zbus::message::Type as MessageType;
use zbus::{Connection, MatchRule, Message, MessageStream};

use super::proxy::{ContextProxy, EekboardProxy};
use crate::application::ContextState;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),

    #[error("service returned an invalid context path: {0}")]
    InvalidPath(String),
}

/// Connection to the keyboard service object.
pub struct EekboardClient {
    conn: Connection,
    destination: String,
    proxy: EekboardProxy<'static>,
}

impl EekboardClient {
    pub async fn connect(conn: &Connection) -> Result<Self, ClientError> {
        Self::connect_to(conn, SERVICE_NAME).await
    }

    /// Connects to a service that claimed `destination` instead of the
    /// default name.
    pub async fn connect_to(conn: &Connection, destination: &str) -> Result<Self, ClientError> {
        let proxy = EekboardProxy::builder(conn)
            .destination(destination.to_string())?
            .build()
            .await?;
        Ok(Self {
            conn: conn.clone(),
            destination: destination.to_string(),
            proxy,
        })
    }

    pub fn proxy(&self) -> &EekboardProxy<'static> {
        &self.proxy
    }

    /// Creates a context named after the calling application.
    pub async fn create_context(&self, client_name: &str) -> Result<KeyboardContext, ClientError> {
        let path = self.proxy.create_context(client_name).await?;
        let id = parse_context_path(&path).ok_or_else(|| ClientError::InvalidPath(path.clone()))?;
        debug!(context = %id, path, "context created");
        KeyboardContext::attach(&self.conn, &self.destination, id, path).await
    }

    pub async fn push_context(&self, context: &KeyboardContext) -> Result<(), ClientError> {
        Ok(self.proxy.push_context(context.path()).await?)
    }

    pub async fn pop_context(&self) -> Result<(), ClientError> {
        Ok(self.proxy.pop_context().await?)
    }

    pub async fn destroy_context(&self, context: &KeyboardContext) -> Result<(), ClientError> {
        Ok(self.proxy.destroy_context(context.path()).await?)
    }

    pub async fn show_keyboard(&self) -> Result<(), ClientError> {
        Ok(self.proxy.show_keyboard().await?)
    }

    pub async fn hide_keyboard(&self) -> Result<(), ClientError> {
        Ok(self.proxy.hide_keyboard().await?)
    }

    /// Shuts the service down for every client.
    pub async fn destroy(&self) -> Result<(), ClientError> {
        Ok(self.proxy.destroy().await?)
    }
}

/// A context object plus the state mirrored from its signals.
///
/// Requests that would change nothing (per [`ContextState`]) are skipped
/// without a round trip.
pub struct KeyboardContext {
    id: ContextId,
    path: String,
    proxy: ContextProxy<'static>,
    state: Arc<Mutex<ContextState>>,
    events: Option<UnboundedReceiver<ContextSignal>>,
    tracker: JoinHandle<()>,
}

impl KeyboardContext {
    async fn attach(
        conn: &Connection,
        destination: &str,
        id: ContextId,
        path: String,
    ) -> Result<Self, ClientError> {
        let proxy = ContextProxy::builder(conn)
            .destination(destination.to_string())?
            .path(path.clone())?
            .build()
            .await?;
        let state = Arc::new(Mutex::new(ContextState::new()));
        let (tx, rx) = mpsc::unbounded_channel();
        let tracker = spawn_tracker(conn, &path, id, Arc::clone(&state), tx).await?;

        Ok(Self {
            id,
            path,
            proxy,
            state,
            events: Some(rx),
            tracker,
        })
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn proxy(&self) -> &ContextProxy<'static> {
        &self.proxy
    }

    /// Snapshot of the mirrored state.
    pub fn state(&self) -> ContextState {
        self.lock_state().clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.lock_state().is_enabled()
    }

    pub fn is_visible(&self) -> bool {
        self.lock_state().is_visible()
    }

    /// Every signal the context emits, in order. Can be taken once.
    pub fn take_events(&mut self) -> Option<UnboundedReceiver<ContextSignal>> {
        self.events.take()
    }

    pub async fn add_keyboard(&self, keyboard: &str) -> Result<KeyboardId, ClientError> {
        Ok(KeyboardId(self.proxy.add_keyboard(keyboard).await?))
    }

    pub async fn remove_keyboard(&self, id: KeyboardId) -> Result<(), ClientError> {
        Ok(self.proxy.remove_keyboard(id.0).await?)
    }

    pub async fn set_keyboard(&self, id: KeyboardId) -> Result<(), ClientError> {
        Ok(self.proxy.set_keyboard(id.0).await?)
    }

    pub async fn set_fullscreen(&self, fullscreen: bool) -> Result<(), ClientError> {
        if !self.lock_state().should_send_set_fullscreen(fullscreen) {
            return Ok(());
        }
        self.proxy.set_fullscreen(fullscreen).await?;
        self.lock_state().note_fullscreen(fullscreen);
        Ok(())
    }

    pub async fn set_group(&self, group: i32) -> Result<(), ClientError> {
        if !self.lock_state().should_send_set_group(group) {
            return Ok(());
        }
        Ok(self.proxy.set_group(group).await?)
    }

    pub async fn show_keyboard(&self) -> Result<(), ClientError> {
        if !self.lock_state().should_send_to_enabled() {
            debug!(context = %self.id, "show skipped: context not enabled");
            return Ok(());
        }
        Ok(self.proxy.show_keyboard().await?)
    }

    pub async fn hide_keyboard(&self) -> Result<(), ClientError> {
        if !self.lock_state().should_send_to_enabled() {
            debug!(context = %self.id, "hide skipped: context not enabled");
            return Ok(());
        }
        Ok(self.proxy.hide_keyboard().await?)
    }

    pub async fn press_keycode(&self, keycode: u32) -> Result<(), ClientError> {
        if !self.lock_state().should_send_to_enabled() {
            return Ok(());
        }
        Ok(self.proxy.press_keycode(keycode).await?)
    }

    pub async fn release_keycode(&self, keycode: u32) -> Result<(), ClientError> {
        if !self.lock_state().should_send_to_enabled() {
            return Ok(());
        }
        Ok(self.proxy.release_keycode(keycode).await?)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ContextState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for KeyboardContext {
    fn drop(&mut self) {
        self.tracker.abort();
    }
}

/// Applies `signal` to the mirror and forwards it to the event channel.
fn record(state: &Mutex<ContextState>, events: &UnboundedSender<ContextSignal>, signal: ContextSignal) {
    state
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .apply(&signal);
    // Nobody listening is fine; the mirror is still updated.
    let _ = events.send(signal);
}

/// Subscribes to the context's signals, then follows them on a task until
/// the context is destroyed or the connection closes.
///
/// One match rule covers the whole interface so the signals arrive on a
/// single stream in the order the service sent them.
async fn spawn_tracker(
    conn: &Connection,
    path: &str,
    id: ContextId,
    state: Arc<Mutex<ContextState>>,
    events: UnboundedSender<ContextSignal>,
) -> Result<JoinHandle<()>, ClientError> {
    let rule = MatchRule::builder()
        .msg_type(MessageType::Signal)
        .path(path.to_string())?
        .interface(CONTEXT_INTERFACE)?
        .build();
    let stream = MessageStream::for_match_rule(rule, conn, None).await?;
    Ok(tokio::spawn(follow(stream, id, state, events)))
}

async fn follow<S>(
    mut stream: S,
    id: ContextId,
    state: Arc<Mutex<ContextState>>,
    events: UnboundedSender<ContextSignal>,
) where
    S: Stream<Item = zbus::Result<Message>> + Unpin,
{
    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                warn!(context = %id, error = %e, "signal stream error");
                continue;
            }
        };
        match decode_signal(&message) {
            Ok(Some(signal)) => {
                let destroyed = matches!(signal, ContextSignal::Destroyed);
                record(&state, &events, signal);
                if destroyed {
                    debug!(context = %id, "context destroyed");
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => warn!(context = %id, error = %e, "malformed context signal"),
        }
    }
}

/// Maps a context signal message by member name. Unknown members are `None`.
fn decode_signal(message: &Message) -> zbus::Result<Option<ContextSignal>> {
    let header = message.header();
    if header.message_type() != MessageType::Signal {
        return Ok(None);
    }
    let Some(member) = header.member() else {
        return Ok(None);
    };

    let body = message.body();
    let signal = match member.as_str() {
        "Enabled" => ContextSignal::Enabled,
        "Disabled" => ContextSignal::Disabled,
        "Destroyed" => ContextSignal::Destroyed,
        "KeyPressed" => {
            let (keyname, symbol, modifiers): (String, WireSymbol, u32) = body.deserialize()?;
            ContextSignal::KeyPressed {
                keyname,
                symbol: Symbol::from_wire(symbol),
                modifiers,
            }
        }
        "VisibilityChanged" => ContextSignal::VisibilityChanged(body.deserialize::<bool>()?),
        "KeyboardChanged" => ContextSignal::KeyboardChanged(KeyboardId(body.deserialize::<u32>()?)),
        "GroupChanged" => ContextSignal::GroupChanged(body.deserialize::<i32>()?),
        _ => return Ok(None),
    };
    Ok(Some(signal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_updates_state_and_forwards_in_order() {
        // Arrange
        let state = Mutex::new(ContextState::new());
        let (tx, mut rx) = mpsc::unbounded_channel();

        // Act
        record(&state, &tx, ContextSignal::Enabled);
        record(&state, &tx, ContextSignal::VisibilityChanged(true));

        // Assert
        assert!(state.lock().unwrap().is_visible());
        assert_eq!(rx.try_recv().unwrap(), ContextSignal::Enabled);
        assert_eq!(rx.try_recv().unwrap(), ContextSignal::VisibilityChanged(true));
    }

    #[test]
    fn test_record_without_listener_still_updates_state() {
        let state = Mutex::new(ContextState::new());
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        record(&state, &tx, ContextSignal::GroupChanged(1));

        assert_eq!(state.lock().unwrap().group(), 1);
    }

    #[test]
    fn test_events_are_received_by_a_listener() {
        let state = Mutex::new(ContextState::new());
        let (tx, mut rx) = mpsc::unbounded_channel();

        record(&state, &tx, ContextSignal::Destroyed);
        drop(tx);

        tokio_test::block_on(async {
            assert_eq!(rx.recv().await, Some(ContextSignal::Destroyed));
            assert_eq!(rx.recv().await, None);
        });
        assert!(state.lock().unwrap().is_destroyed());
    }

    // ── Signal stream ────────────────────────────────────────────────────────

    const PATH: &str = "/org/fedorahosted/Eekboard/Context_1";

    fn signal(member: &'static str) -> zbus::message::Builder<'static> {
        Message::signal(PATH, CONTEXT_INTERFACE, member).unwrap()
    }

    fn follow_all(messages: Vec<zbus::Result<Message>>) -> (ContextState, Vec<ContextSignal>) {
        let state = Arc::new(Mutex::new(ContextState::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio_test::block_on(follow(
            futures_util::stream::iter(messages),
            ContextId(1),
            Arc::clone(&state),
            tx,
        ));
        let mut seen = Vec::new();
        while let Ok(signal) = rx.try_recv() {
            seen.push(signal);
        }
        let state = state.lock().unwrap().clone();
        (state, seen)
    }

    #[test]
    fn test_signals_of_different_kinds_are_applied_in_arrival_order() {
        // Arrange: covered by another context, then uncovered again.
        let messages = vec![
            signal("Enabled").build(&()),
            signal("Disabled").build(&()),
            signal("Enabled").build(&()),
        ];

        // Act
        let (state, seen) = follow_all(messages);

        // Assert
        assert!(state.is_enabled());
        assert_eq!(
            seen,
            vec![ContextSignal::Enabled, ContextSignal::Disabled, ContextSignal::Enabled]
        );
    }

    #[test]
    fn test_signal_arguments_are_decoded() {
        let messages = vec![
            signal("Enabled").build(&()),
            signal("KeyboardChanged").build(&(3u32,)),
            signal("GroupChanged").build(&(1i32,)),
            signal("VisibilityChanged").build(&(true,)),
            signal("KeyPressed").build(&("a", ("a", "a", 0u32, 0u32), 0u32)),
        ];

        let (state, seen) = follow_all(messages);

        assert!(state.is_visible());
        assert_eq!(state.keyboard(), Some(KeyboardId(3)));
        assert_eq!(state.group(), 1);
        assert!(matches!(
            seen.last(),
            Some(ContextSignal::KeyPressed { keyname, modifiers: 0, .. }) if keyname == "a"
        ));
    }

    #[test]
    fn test_following_stops_at_destroyed() {
        let messages = vec![
            signal("Enabled").build(&()),
            signal("Destroyed").build(&()),
            signal("Enabled").build(&()),
        ];

        let (state, seen) = follow_all(messages);

        assert!(state.is_destroyed());
        assert_eq!(seen, vec![ContextSignal::Enabled, ContextSignal::Destroyed]);
    }

    #[test]
    fn test_unknown_and_malformed_signals_are_skipped() {
        let messages = vec![
            signal("SomethingElse").build(&()),
            signal("GroupChanged").build(&("not a group",)),
            signal("GroupChanged").build(&(2i32,)),
        ];

        let (state, seen) = follow_all(messages);

        assert_eq!(seen, vec![ContextSignal::GroupChanged(2)]);
        assert_eq!(state.group(), 2);
    }

    #[test]
    fn test_client_error_display_names_the_path() {
        let err = ClientError::InvalidPath("/nope".into());
        assert!(err.to_string().contains("/nope"));
    }
}
