// Library exports for embridge
// This allows the test suite and host applications to import modules

pub mod channel;
pub mod config;
pub mod error;

pub use channel::{Action, ActionRegistry, BufferStore, ChannelState, EmacsBridge};
pub use config::ChannelConfig;
pub use error::ChannelError;
