//! Trace/span id generation.

use rand::RngCore;

/// A fresh 32-character lower-case hex trace id, generated from 16
/// cryptographically-random bytes. One is minted per interaction and
/// threaded through every span and [`crate::TelemetryEvent`] it produces.
#[must_use]
pub fn generate_trace_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A fresh 16-character lower-case hex span id, generated from 8
/// cryptographically-random bytes.
#[must_use]
pub fn generate_span_id() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_id_is_32_lowercase_hex_chars() {
        let id = generate_trace_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn span_id_is_16_lowercase_hex_chars() {
        let id = generate_span_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn ids_are_not_constant() {
        assert_ne!(generate_trace_id(), generate_trace_id());
        assert_ne!(generate_span_id(), generate_span_id());
    }
}
