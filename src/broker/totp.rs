/// Time-based one-time code generation for the two-factor step
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{KiteError, Result};

type HmacSha1 = Hmac<Sha1>;

const STEP_SECS: u64 = 30;

/// Generate the current 6-digit code from a base32 shared secret.
pub fn generate(secret: &str) -> Result<String> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| KiteError::AuthenticationFailed(format!("Clock error: {}", e)))?
        .as_secs();
    code_at(secret, timestamp)
}

/// 6-digit code for an explicit unix timestamp (RFC 6238, HMAC-SHA1).
pub fn code_at(secret: &str, timestamp: u64) -> Result<String> {
    // Decode base32 secret
    let secret = base32::decode(base32::Alphabet::RFC4648 { padding: false }, secret)
        .ok_or_else(|| KiteError::AuthenticationFailed("Invalid TOTP secret".to_string()))?;

    let time_step = timestamp / STEP_SECS;

    // Generate HMAC-SHA1
    let mut mac = HmacSha1::new_from_slice(&secret)
        .map_err(|e| KiteError::AuthenticationFailed(format!("HMAC error: {}", e)))?;
    mac.update(&time_step.to_be_bytes());
    let hash = mac.finalize().into_bytes();

    // Dynamic truncation
    let offset = (hash[hash.len() - 1] & 0x0f) as usize;
    let code = u32::from_be_bytes([
        hash[offset] & 0x7f,
        hash[offset + 1],
        hash[offset + 2],
        hash[offset + 3],
    ]);

    Ok(format!("{:06}", code % 1_000_000))
}
