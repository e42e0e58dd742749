//! Requests from bus objects to the service loop.
//!
//! Interface objects never touch the [`Service`](crate::application::Service)
//! directly. Each method call becomes a [`Command`] carrying a `oneshot`
//! reply channel, so every mutation is serialised through one task.

use eekboard_core::{ClientIdentity, ContextId};
use tokio::sync::{mpsc, oneshot};

use super::errors::EekboardError;
use crate::application::{CallReply, ContextCall, ServiceError};

type Reply<T> = oneshot::Sender<Result<T, ServiceError>>;

#[derive(Debug)]
pub enum Command {
    CreateContext {
        sender: ClientIdentity,
        client_name: String,
        reply: Reply<ContextId>,
    },
    PushContext {
        id: ContextId,
        reply: Reply<()>,
    },
    PopContext {
        sender: ClientIdentity,
        reply: Reply<Option<ContextId>>,
    },
    DestroyContext {
        sender: ClientIdentity,
        id: ContextId,
        reply: Reply<()>,
    },
    ShowKeyboard {
        reply: Reply<()>,
    },
    HideKeyboard {
        reply: Reply<()>,
    },
    Destroy {
        reply: oneshot::Sender<()>,
    },
    ContextCall {
        id: ContextId,
        call: ContextCall,
        reply: Reply<CallReply>,
    },
}

/// Cloneable handle used by bus objects to reach the service loop.
#[derive(Debug, Clone)]
pub struct Commands {
    tx: mpsc::Sender<Command>,
}

impl Commands {
    pub fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }

    pub async fn create_context(
        &self,
        sender: ClientIdentity,
        client_name: String,
    ) -> Result<ContextId, EekboardError> {
        self.request(|reply| Command::CreateContext {
            sender,
            client_name,
            reply,
        })
        .await
    }

    pub async fn push_context(&self, id: ContextId) -> Result<(), EekboardError> {
        self.request(|reply| Command::PushContext { id, reply }).await
    }

    pub async fn pop_context(
        &self,
        sender: ClientIdentity,
    ) -> Result<Option<ContextId>, EekboardError> {
        self.request(|reply| Command::PopContext { sender, reply })
            .await
    }

    pub async fn destroy_context(
        &self,
        sender: ClientIdentity,
        id: ContextId,
    ) -> Result<(), EekboardError> {
        self.request(|reply| Command::DestroyContext { sender, id, reply })
            .await
    }

    pub async fn show_keyboard(&self) -> Result<(), EekboardError> {
        self.request(|reply| Command::ShowKeyboard { reply }).await
    }

    pub async fn hide_keyboard(&self) -> Result<(), EekboardError> {
        self.request(|reply| Command::HideKeyboard { reply }).await
    }

    pub async fn destroy(&self) -> Result<(), EekboardError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Destroy { reply }).await?;
        rx.await.map_err(|_| unavailable())
    }

    pub async fn context_call(
        &self,
        id: ContextId,
        call: ContextCall,
    ) -> Result<CallReply, EekboardError> {
        self.request(|reply| Command::ContextCall { id, call, reply })
            .await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, EekboardError> {
        let (reply, rx) = oneshot::channel();
        self.send(build(reply)).await?;
        let result = rx.await.map_err(|_| unavailable())?;
        result.map_err(EekboardError::from)
    }

    async fn send(&self, command: Command) -> Result<(), EekboardError> {
        self.tx.send(command).await.map_err(|_| unavailable())
    }
}

fn unavailable() -> EekboardError {
    EekboardError::Unavailable("the keyboard service is shutting down".into())
}
