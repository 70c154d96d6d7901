pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod state;

// Re-export main types for convenience
pub use config::{Config, Endpoints};
pub use conversation::{Conversation, Phase, FAILURE_MESSAGE};
pub use dispatch::{Dispatch, DispatchError, PicoClient, Route};
pub use state::{Message, MessageId, Role};
