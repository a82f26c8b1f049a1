//! Error types surfaced by the command channel.

use std::io;

use thiserror::Error;

/// Errors returned by [`crate::EmacsBridge`] operations.
///
/// Every variant leaves the channel torn down to a clean disconnected
/// state; the next facade call triggers exactly one fresh connection
/// attempt. Unknown inbound commands and empty chunks are not errors and
/// never surface here.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// No free port was found in the configured scan range.
    #[error("no free port between {base} and {last}")]
    PortExhausted {
        /// First candidate port.
        base: u16,
        /// Upper bound of the scan range (exclusive).
        last: u16,
    },

    /// Spawning the editor process failed.
    #[error("failed to launch editor process: {0}")]
    ProcessLaunchFailed(#[source] io::Error),

    /// Accepting the editor's connection failed.
    #[error("accept on port {port} failed: {source}")]
    AcceptFailed {
        /// Port the channel was listening on.
        port: u16,
        #[source]
        source: io::Error,
    },

    /// The editor did not connect back within the configured window.
    #[error("editor did not connect back on port {port} within {timeout_ms} ms")]
    AcceptTimedOut {
        /// Port the channel was listening on.
        port: u16,
        /// Configured accept window.
        timeout_ms: u64,
    },

    /// Read or write failure on an established connection.
    #[error("channel stream error: {0}")]
    StreamIo(#[source] io::Error),
}
