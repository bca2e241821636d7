//! Session configuration and failure policies.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// What to do when connecting finds no compatible peer pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Mark the session as failed and make every later operation a silent
    /// no-op. Default — callers shouldn't have to care whether the
    /// desktop app is running.
    #[default]
    Absorb,
    /// Surface the connect error to the caller.
    Propagate,
}

/// What to do when the periodic callback fails during a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallbackPolicy {
    /// Cancel the wait, tear down the background work, and surface the
    /// callback error to the waiter. Default.
    #[default]
    Propagate,
    /// Log the failure and keep ticking.
    Absorb,
}

// ---------------------------------------------------------------------------
// PartyConfig
// ---------------------------------------------------------------------------

/// Configuration for a party session.
///
/// Everything here is explicit per session — the session never mutates
/// process-wide state, and the async runtime is whichever one the caller
/// drives these futures on.
#[derive(Debug, Clone)]
pub struct PartyConfig {
    /// Policy for a failed pipe connection.
    pub on_connect_failure: FailurePolicy,

    /// Policy for periodic-callback failures during waits.
    pub on_callback_error: CallbackPolicy,

    /// Command-channel depth for the client task. Senders wait when it
    /// fills (bounded channel backpressure).
    pub command_buffer: usize,

    /// Random delay (0 up to this much) before the update loop's first
    /// push, to desynchronize many clients started at the same instant.
    /// Zero disables jitter.
    pub update_jitter: Duration,
}

impl Default for PartyConfig {
    fn default() -> Self {
        Self {
            on_connect_failure: FailurePolicy::default(),
            on_callback_error: CallbackPolicy::default(),
            command_buffer: 32,
            update_jitter: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PartyConfig::default();
        assert_eq!(config.on_connect_failure, FailurePolicy::Absorb);
        assert_eq!(config.on_callback_error, CallbackPolicy::Propagate);
        assert_eq!(config.command_buffer, 32);
        assert_eq!(config.update_jitter, Duration::ZERO);
    }
}
