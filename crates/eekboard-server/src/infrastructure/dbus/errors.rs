//! Wire-level error replies.

use zbus::DBusError;

use crate::application::ServiceError;

/// Errors sent back to bus callers, named `org.fedorahosted.Eekboard.Error.*`.
#[derive(Debug, DBusError)]
#[zbus(prefix = "org.fedorahosted.Eekboard.Error")]
pub enum EekboardError {
    #[zbus(error)]
    ZBus(zbus::Error),
    NotFound(String),
    NotOwner(String),
    KeyboardNotSet(String),
    KeyNotFound(String),
    InvalidDescription(String),
    ContextCreationFailed(String),
    AlreadyOnStack(String),
    ServiceDestroyed(String),
    /// The service loop stopped before answering.
    Unavailable(String),
}

impl From<ServiceError> for EekboardError {
    fn from(e: ServiceError) -> Self {
        let message = e.to_string();
        match e {
            ServiceError::NotFound(_) | ServiceError::KeyboardNotFound(_) => {
                EekboardError::NotFound(message)
            }
            ServiceError::NotOwner => EekboardError::NotOwner(message),
            ServiceError::KeyboardNotSet => EekboardError::KeyboardNotSet(message),
            ServiceError::KeyNotFound(_) => EekboardError::KeyNotFound(message),
            ServiceError::InvalidDescription(_) => EekboardError::InvalidDescription(message),
            ServiceError::ContextCreationFailed(_) => EekboardError::ContextCreationFailed(message),
            ServiceError::AlreadyOnStack(_) => EekboardError::AlreadyOnStack(message),
            ServiceError::Destroyed => EekboardError::ServiceDestroyed(message),
        }
    }
}
