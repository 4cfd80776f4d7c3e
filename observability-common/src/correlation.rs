//! Correlation identifier minting and W3C `traceparent` parsing.
//!
//! Pure functions only; the axum middleware that wires these into a request
//! lives in `logs-service::middleware::context`.

use rand::RngCore;

/// A parsed `traceparent` header, per the W3C Trace Context spec
/// (`version-traceid-spanid-flags`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceParent {
    pub trace_id: String,
    pub span_id: String,
}

/// Mints a new correlation id: 16 random bytes, lowercase hex.
#[must_use]
pub fn mint_correlation_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Parses a `traceparent` header value. Returns `None` for anything that
/// isn't a well-formed version-00 header; malformed values are never
/// treated as an error by the caller, only as "absent".
#[must_use]
pub fn parse_traceparent(value: &str) -> Option<TraceParent> {
    let mut parts = value.trim().split('-');
    let version = parts.next()?;
    let trace_id = parts.next()?;
    let span_id = parts.next()?;
    let flags = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    if version != "00" {
        return None;
    }
    if trace_id.len() != 32 || !trace_id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    if span_id.len() != 16 || !span_id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    if flags.len() != 2 || !flags.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    if trace_id == "0".repeat(32) || span_id == "0".repeat(16) {
        return None;
    }
    Some(TraceParent {
        trace_id: trace_id.to_ascii_lowercase(),
        span_id: span_id.to_ascii_lowercase(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mints_32_char_lowercase_hex() {
        let id = mint_correlation_id();
        assert_eq!(id.len(), 32);
        assert!(id.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    }

    #[test]
    fn successive_mints_differ() {
        assert_ne!(mint_correlation_id(), mint_correlation_id());
    }

    #[test]
    fn parses_example_traceparent() {
        let parsed =
            parse_traceparent("00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01").unwrap();
        assert_eq!(parsed.trace_id, "0af7651916cd43dd8448eb211c80319c");
        assert_eq!(parsed.span_id, "b7ad6b7169203331");
    }

    #[test]
    fn rejects_malformed_traceparent() {
        assert!(parse_traceparent("not-a-traceparent").is_none());
        assert!(parse_traceparent("01-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01")
            .is_none());
        assert!(parse_traceparent("00-tooshort-b7ad6b7169203331-01").is_none());
    }

    #[test]
    fn rejects_all_zero_ids() {
        assert!(parse_traceparent("00-00000000000000000000000000000000-b7ad6b7169203331-01")
            .is_none());
    }
}
