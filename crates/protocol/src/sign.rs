//! Message integrity hashes for outbound commands.
//!
//! Every command frame carries an MD5 hex digest keyed by the shared salt
//! and the frame timestamp. Timestamps use the game's own epoch: milliseconds
//! since year 1, not the unix epoch.

use md5::{Digest, Md5};

/// Milliseconds between 0001-01-01 and the unix epoch.
pub const AD_EPOCH_OFFSET_MS: i64 = 62_135_596_800_000;

/// The current frame timestamp in the game's epoch.
pub fn now_since_ad() -> i64 {
    chrono::Utc::now().timestamp_millis() + AD_EPOCH_OFFSET_MS
}

fn md5_hex(message: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(message.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digest for a game command frame.
pub fn sign_command(wallet: &str, message_id: u32, tag: &str, timestamp: i64, salt: &str) -> String {
    md5_hex(&format!("{wallet}|{message_id}|{tag}|{timestamp}|{salt}"))
}

/// Digest for the login frame, which predates a message id.
pub fn sign_login(wallet: &str, timestamp: i64, salt: &str) -> String {
    md5_hex(&format!("{wallet}|LOGIN|{timestamp}|{salt}"))
}
