//! Client identifier auto-generation, used by `Client::connect` whenever
//! `ConnectOptions::client_id` is `None`.

use uuid::Uuid;

/// Servers are only required to accept client identifiers up to 23 bytes
/// (MQTT-3.1.3-5). A UUID v4 with its dashes stripped is 32 hex characters,
/// so it's truncated to fit.
const MAX_GENERATED_LEN: usize = 23;

/// Generates a client identifier from a random UUID v4, hyphens removed and
/// truncated to 23 characters for maximum broker compatibility.
pub fn generate_client_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(MAX_GENERATED_LEN);
    id
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn generated_id_fits_the_legacy_23_byte_limit() {
        let id = generate_client_id();
        assert!(id.len() <= MAX_GENERATED_LEN);
        assert!(!id.is_empty());
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(generate_client_id(), generate_client_id());
    }
}
