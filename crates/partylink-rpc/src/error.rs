//! Error types for the protocol-client contract.

/// Errors that can occur when driving the remote-procedure client.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// No compatible peer process was found behind the pipe. The session
    /// may absorb this by policy ("the desktop app may or may not be
    /// running") instead of surfacing it.
    #[error("no compatible peer pipe found")]
    PipeUnavailable,

    /// The pipe connection was closed by either side.
    #[error("connection closed")]
    Closed,

    /// The session's client task is gone, so commands can't be delivered.
    #[error("client task unavailable")]
    Unavailable,

    /// An event payload arrived without a required field. Distinguished
    /// protocol violation — never an uncontrolled missing-key crash.
    #[error("malformed event payload: missing `{0}` field")]
    MissingField(&'static str),

    /// An I/O failure on the pipe.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}
