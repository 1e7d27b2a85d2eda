//! Challenge/response authentication for the feed.

use duedex_core::config::ApiCredentials;
use duedex_core::error::ExchangeError;

use super::message::OutboundMessage;
use crate::rest::signer::RequestSigner;

/// Computes the handshake answer: lowercase-hex HMAC-SHA256 of the challenge,
/// keyed by the base64-decoded secret the signer was built from.
#[must_use]
pub fn compute_answer(signer: &RequestSigner, challenge: &str) -> String {
    signer.sign_hex(challenge)
}

/// Answers server challenges on behalf of one API key.
#[derive(Debug, Clone)]
pub struct FeedAuthenticator {
    key: String,
    signer: RequestSigner,
}

impl FeedAuthenticator {
    /// Prepares the signer; fails if the secret is not valid base64.
    pub fn from_credentials(credentials: &ApiCredentials) -> Result<Self, ExchangeError> {
        Ok(Self {
            key: credentials.key.clone(),
            signer: RequestSigner::from_secret(&credentials.secret)?,
        })
    }

    /// Returns the API key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Builds the `auth` reply for a server challenge.
    #[must_use]
    pub fn reply(&self, challenge: &str) -> OutboundMessage {
        OutboundMessage::Auth {
            key: self.key.clone(),
            answer: compute_answer(&self.signer, challenge),
        }
    }
}
