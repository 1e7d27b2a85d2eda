//! Feed wire messages.

use chrono::{DateTime, Utc};
use duedex_core::error::DataError;
use duedex_core::models::ChannelKind;
use serde::{Deserialize, Serialize};

use super::channel::Channel;

/// A message sent to the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// Asks the server for an authentication nonce.
    Challenge,
    /// Proves possession of the API secret.
    Auth {
        /// API key.
        key: String,
        /// Hex HMAC of the nonce.
        answer: String,
    },
    /// Subscribes to one or more channels.
    Subscribe {
        /// Requested channels.
        channels: Vec<SubscribeChannel>,
    },
}

/// One entry in a subscribe request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeChannel {
    /// Channel kind.
    pub name: ChannelKind,
    /// Instrument scope; absent for unscoped channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruments: Option<Vec<String>>,
}

impl OutboundMessage {
    /// Builds a single subscribe request covering `channels`.
    ///
    /// Scoped channels of the same kind share one entry listing their
    /// instruments. An unscoped channel gets its own entry.
    #[must_use]
    pub fn subscribe(channels: &[Channel]) -> Self {
        let mut entries: Vec<SubscribeChannel> = Vec::new();
        for channel in channels {
            match &channel.instrument {
                None => entries.push(SubscribeChannel {
                    name: channel.kind,
                    instruments: None,
                }),
                Some(instrument) => {
                    let existing = entries
                        .iter_mut()
                        .find(|e| e.name == channel.kind && e.instruments.is_some());
                    match existing.and_then(|e| e.instruments.as_mut()) {
                        Some(instruments) => instruments.push(instrument.clone()),
                        None => entries.push(SubscribeChannel {
                            name: channel.kind,
                            instruments: Some(vec![instrument.clone()]),
                        }),
                    }
                }
            }
        }
        Self::Subscribe { channels: entries }
    }
}

/// Envelope `type` values the client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Server nonce for the auth handshake.
    Challenge,
    /// Handshake acknowledgment.
    Auth,
    /// Full state for a channel.
    Snapshot,
    /// Incremental change for a channel.
    Update,
}

impl MessageType {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "challenge" => Some(Self::Challenge),
            "auth" => Some(Self::Auth),
            "snapshot" => Some(Self::Snapshot),
            "update" => Some(Self::Update),
            _ => None,
        }
    }
}

/// A decoded inbound envelope; the payload is left undecoded until the
/// channel is known.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    /// Raw `type` field.
    #[serde(rename = "type")]
    pub message_type: String,
    /// Channel name for snapshot and update messages.
    #[serde(default)]
    pub channel: Option<String>,
    /// Instrument scope, if the channel has one.
    #[serde(default)]
    pub instrument: Option<String>,
    /// Channel payload.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Server time of the change.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Auth nonce on challenge messages.
    #[serde(default)]
    pub challenge: Option<String>,
}

impl InboundMessage {
    /// Parses one complete feed message.
    pub fn parse(text: &str) -> Result<Self, DataError> {
        serde_json::from_str(text).map_err(|e| DataError::InvalidMessage {
            reason: e.to_string(),
        })
    }

    /// Returns the envelope type.
    pub fn kind(&self) -> Result<MessageType, DataError> {
        MessageType::parse(&self.message_type).ok_or_else(|| DataError::UnknownType {
            message_type: self.message_type.clone(),
        })
    }

    /// Returns the channel of a snapshot or update message.
    pub fn channel_kind(&self) -> Result<ChannelKind, DataError> {
        let name = self.channel.as_deref().unwrap_or_default();
        name.parse().map_err(|_| DataError::UnknownChannel {
            channel: name.to_string(),
        })
    }

    /// Returns the auth nonce, read from `challenge` or a string `data`.
    #[must_use]
    pub fn nonce(&self) -> Option<&str> {
        self.challenge
            .as_deref()
            .or_else(|| self.data.as_str())
    }
}
