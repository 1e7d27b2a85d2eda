//! Span constructors for the feed session and REST calls.

use tracing::{Span, info_span};

/// Span covering the lifetime of one feed session loop.
///
/// ```
/// use duedex_telemetry::spans::session_span;
///
/// let span = session_span("wss://feed.duedex.com/v1/feed", true);
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn session_span(endpoint: &str, authenticated: bool) -> Span {
    info_span!("feed.session", endpoint = %endpoint, authenticated)
}

/// Span covering one physical connection attempt and its read loop.
#[must_use]
pub fn connection_span(attempt: u32) -> Span {
    info_span!("feed.connection", attempt)
}

/// Span covering one signed REST round trip.
#[must_use]
pub fn rest_request_span(method: &str, path: &str) -> Span {
    info_span!("rest.request", method = %method, path = %path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_construct_without_subscriber() {
        let _ = session_span("ws://localhost", false);
        let _ = connection_span(3);
        let _ = rest_request_span("POST", "/v1/order");
    }
}
