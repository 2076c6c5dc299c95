//! Battery identity and QR binding codec.
//!
//! Every battery gets a human-readable id minted at intake and a printed QR
//! payload binding that id to the owning customer. The payload is four
//! `|`-separated fields:
//!
//! ```text
//! {battery_id}|{customer_id}|{timestamp_millis}|{checksum}
//! ```
//!
//! The checksum is [`shared::crypto::sha256_short_hex_upper`] over the first
//! three fields joined exactly as printed, so it is sensitive to field order
//! and to every character. Decoding distinguishes payloads that are not in
//! the four-field shape at all ([`BindingError::MalformedPayload`]) from
//! well-formed payloads whose checksum does not match (`is_valid == false`),
//! because a shop worker handles a damaged label differently from a forged
//! or mislabeled one.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared::crypto::sha256_short_hex_upper;
use shared::validation::QR_DELIMITER;

/// Prefix of every minted battery id.
pub const BATTERY_ID_PREFIX: &str = "BAT";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("malformed QR payload: {0}")]
    MalformedPayload(&'static str),
}

/// A decoded QR payload.
///
/// `is_valid` records whether the checksum matched the other three fields.
/// An invalid binding is still structurally complete, so callers can show
/// the scanned fields while refusing to act on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrBinding {
    pub battery_id: String,
    pub customer_id: String,
    pub timestamp: i64,
    pub checksum: String,
    pub is_valid: bool,
}

/// Mints a battery id: `BAT`, the supplied wall-clock milliseconds, and a
/// uniform random four-digit suffix (1000 to 9999).
///
/// The clock and the random source are parameters so id generation is
/// reproducible under test. Uniqueness is enforced by the database, not
/// here; collisions need the same millisecond and the same suffix.
pub fn new_battery_id(now_millis: i64, rng: &mut impl Rng) -> String {
    let suffix: u16 = rng.gen_range(1000..=9999);
    format!("{}{}{}", BATTERY_ID_PREFIX, now_millis, suffix)
}

/// [`new_battery_id`] with the system clock and thread-local randomness.
pub fn new_battery_id_now() -> String {
    new_battery_id(Utc::now().timestamp_millis(), &mut rand::thread_rng())
}

/// Encodes the printed QR payload for a battery/customer binding.
///
/// Callers must not pass fields containing `|`; API inputs that end up in
/// a payload are screened with `shared::validation::validate_qr_field`.
pub fn encode_binding(battery_id: &str, customer_id: &str, timestamp_millis: i64) -> String {
    let base = format!(
        "{}{sep}{}{sep}{}",
        battery_id,
        customer_id,
        timestamp_millis,
        sep = QR_DELIMITER
    );
    let checksum = sha256_short_hex_upper(&base);
    format!("{}{}{}", base, QR_DELIMITER, checksum)
}

/// Decodes a scanned payload.
///
/// Returns `MalformedPayload` when the payload does not have exactly four
/// fields or the timestamp field is not an integer. Any other payload
/// decodes successfully; checksum mismatch is reported via `is_valid`.
pub fn decode_binding(payload: &str) -> Result<QrBinding, BindingError> {
    let parts: Vec<&str> = payload.split(QR_DELIMITER).collect();
    if parts.len() != 4 {
        return Err(BindingError::MalformedPayload(
            "expected 4 '|'-separated fields",
        ));
    }

    let timestamp: i64 = parts[2]
        .parse()
        .map_err(|_| BindingError::MalformedPayload("timestamp is not an integer"))?;

    let base = format!(
        "{}{sep}{}{sep}{}",
        parts[0],
        parts[1],
        parts[2],
        sep = QR_DELIMITER
    );
    let is_valid = parts[3] == sha256_short_hex_upper(&base);

    Ok(QrBinding {
        battery_id: parts[0].to_string(),
        customer_id: parts[1].to_string(),
        timestamp,
        checksum: parts[3].to_string(),
        is_valid,
    })
}

/// True when `payload` decodes structurally and its checksum matches.
pub fn is_valid_binding(payload: &str) -> bool {
    decode_binding(payload).map(|b| b.is_valid).unwrap_or(false)
}
