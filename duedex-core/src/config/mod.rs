//! Configuration management.
//!
//! [`ClientConfig`] can be built in code or loaded from YAML, TOML or JSON via
//! [`ConfigLoader`], with `<PREFIX>_*` environment variables applied on top.

mod client;
mod loader;
mod secret;
mod traits;

pub use client::{ApiCredentials, ClientConfig, ClientConfigBuilder, Network, ReconnectConfig};
pub use loader::{ConfigFormat, ConfigLoader};
pub use secret::ApiSecret;
pub use traits::{Configurable, Validatable};
