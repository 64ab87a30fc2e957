use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

pub const MAGIC_LINK_TTL_MINUTES: i64 = 15;

/// 32 random bytes, url-safe base64 without padding.
pub fn generate_random_token() -> String {
    let mut buf = [0u8; 32];
    rand::rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}
