//! Unified error type for the session layer.

use partylink_rpc::RpcError;
use partylink_status::StatusError;

/// Boxed error produced by a periodic callback.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for party sessions.
///
/// Wraps the sub-crate errors so callers deal with one type; `#[from]`
/// lets `?` convert them automatically.
#[derive(Debug, thiserror::Error)]
pub enum PartyError {
    /// The operation requires a live connection and the session doesn't
    /// have one. Only waits fail this way — plain mutations and updates
    /// on a disconnected session are silent no-ops instead.
    #[error("session is not connected")]
    NotConnected,

    /// A client-level error (pipe, protocol violation, client task gone).
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// A status-level error (value shape rejected by the field table).
    #[error(transparent)]
    Status(#[from] StatusError),

    /// The periodic callback failed (or panicked) during a wait and the
    /// session's policy propagates callback errors.
    #[error("periodic callback failed: {0}")]
    Callback(#[source] CallbackError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rpc_error() {
        let err: PartyError = RpcError::PipeUnavailable.into();
        assert!(matches!(err, PartyError::Rpc(RpcError::PipeUnavailable)));
        assert_eq!(err.to_string(), "no compatible peer pipe found");
    }

    #[test]
    fn test_callback_error_carries_message() {
        let err = PartyError::Callback("window update failed".into());
        assert!(err.to_string().contains("window update failed"));
    }
}
