//! crates/valentine_core/src/links.rs
//!
//! Share-link construction. Recipient links carry the public letter id,
//! status links carry the private sender token; construction and extraction
//! must round-trip.

use uuid::Uuid;

pub const RECIPIENT_PATH_PREFIX: &str = "/v/";
pub const STATUS_PATH_PREFIX: &str = "/check/";

/// Link a recipient follows to open the letter.
pub fn recipient_url(origin: &str, letter_id: Uuid) -> String {
    format!(
        "{}{}{}",
        origin.trim_end_matches('/'),
        RECIPIENT_PATH_PREFIX,
        letter_id
    )
}

/// Link the sender keeps to check whether the letter was answered.
pub fn status_url(origin: &str, sender_token: Uuid) -> String {
    format!(
        "{}{}{}",
        origin.trim_end_matches('/'),
        STATUS_PATH_PREFIX,
        sender_token
    )
}

/// Extracts the letter id from a recipient link or path.
pub fn letter_id_from_url(url: &str) -> Option<Uuid> {
    extract_after(url, RECIPIENT_PATH_PREFIX)
}

/// Extracts the sender token from a status link or path.
pub fn sender_token_from_url(url: &str) -> Option<Uuid> {
    extract_after(url, STATUS_PATH_PREFIX)
}

fn extract_after(url: &str, prefix: &str) -> Option<Uuid> {
    let (_, rest) = url.split_once(prefix)?;
    let candidate = rest.split(['/', '?', '#']).next()?;
    Uuid::parse_str(candidate).ok()
}
