//! Bus names, object paths and interface names of the eekboard service.

use crate::domain::ids::ContextId;

/// Well-known bus name the service claims.
pub const SERVICE_NAME: &str = "org.fedorahosted.Eekboard";

/// Object path of the top-level service object.
pub const SERVICE_PATH: &str = "/org/fedorahosted/Eekboard";

/// Interface implemented by the service object.
pub const SERVICE_INTERFACE: &str = "org.fedorahosted.Eekboard";

/// Interface implemented by every context object.
pub const CONTEXT_INTERFACE: &str = "org.fedorahosted.Eekboard.Context";

/// Prefix of every wire-level error name.
pub const ERROR_PREFIX: &str = "org.fedorahosted.Eekboard.Error";

const CONTEXT_PATH_PREFIX: &str = "/org/fedorahosted/Eekboard/Context_";

/// Object path of the context with the given id.
pub fn context_path(id: ContextId) -> String {
    format!("{CONTEXT_PATH_PREFIX}{id}")
}

/// Extracts the context id from an object path.
///
/// Returns `None` when the path was not produced by [`context_path`].
pub fn parse_context_path(path: &str) -> Option<ContextId> {
    let digits = path.strip_prefix(CONTEXT_PATH_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(ContextId)
}
