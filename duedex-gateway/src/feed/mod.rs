//! Streaming feed: subscriptions, authentication, routing and events.

mod auth;
mod channel;
mod events;
mod message;
mod router;
mod session;

pub use auth::{FeedAuthenticator, compute_answer};
pub use channel::{Channel, ChannelRegistry};
pub use events::{EventEmitter, FeedEvent};
pub use message::{InboundMessage, MessageType, OutboundMessage, SubscribeChannel};
pub use router::{MessageRouter, SessionAction};
pub use session::{FeedHandle, FeedSession};
