// Command channel between a host application and a remote Emacs process.
// The supervisor owns the sockets, spawned process and reader task; the
// bridge facade composes it with the action registry and buffering store.

pub mod actions;
pub mod bridge;
pub mod buffering;
pub mod protocol;
pub mod supervisor;
pub mod tokenizer;

pub use actions::{Action, ActionRegistry};
pub use bridge::EmacsBridge;
pub use buffering::BufferStore;
pub use supervisor::{ChannelState, Supervisor};
pub use tokenizer::tokenize;
