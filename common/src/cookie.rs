// common/src/cookie.rs
//! Tamper-evident session cookie codec.
//!
//! Wire format is `base64url(json ‖ hmac_sha256(key, json))`. The MAC is the
//! last 32 bytes of the decoded buffer and must verify before the JSON is
//! looked at.
use hmac::{Hmac, Mac};
use sha2::Sha256;
use chrono::Utc;
use thiserror::Error;

use crate::models::session::SessionData;

type HmacSha256 = Hmac<Sha256>;

/// Size of an HMAC-SHA256 tag in bytes
pub const SIGNATURE_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("cookie is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("cookie too short to contain a signature")]
    TooShort,
    #[error("cookie signature mismatch")]
    BadSignature,
    #[error("cookie payload is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cookie expired")]
    Expired,
    #[error("invalid signing key")]
    InvalidKey,
}

/// Signs and verifies session payloads with the process-wide server key
#[derive(Clone)]
pub struct SignedCookieCodec {
    key: Vec<u8>,
}

impl std::fmt::Debug for SignedCookieCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedCookieCodec").finish_non_exhaustive()
    }
}

impl SignedCookieCodec {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    fn mac(&self) -> Result<HmacSha256, CodecError> {
        HmacSha256::new_from_slice(&self.key).map_err(|_| CodecError::InvalidKey)
    }

    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut mac = self.mac()?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    pub fn encode(&self, data: &SessionData) -> Result<String, CodecError> {
        let mut payload = serde_json::to_vec(data)?;
        let signature = self.sign(&payload)?;
        payload.extend_from_slice(&signature);
        Ok(base64::encode_config(payload, base64::URL_SAFE))
    }

    pub fn decode(&self, encoded: &str) -> Result<SessionData, CodecError> {
        self.decode_at(encoded, Utc::now().timestamp())
    }

    /// Decode against an explicit clock, `now` in seconds since the epoch
    pub fn decode_at(&self, encoded: &str, now: i64) -> Result<SessionData, CodecError> {
        let decoded = base64::decode_config(encoded, base64::URL_SAFE)?;
        if decoded.len() < SIGNATURE_LEN {
            return Err(CodecError::TooShort);
        }

        let (json, received) = decoded.split_at(decoded.len() - SIGNATURE_LEN);
        let mut mac = self.mac()?;
        mac.update(json);
        // verify_slice compares in constant time
        mac.verify_slice(received)
            .map_err(|_| CodecError::BadSignature)?;

        let data: SessionData = serde_json::from_slice(json)?;
        if data.is_expired_at(now) {
            return Err(CodecError::Expired);
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionData {
        SessionData {
            user_id: "u1".to_string(),
            csrf_token: "csrf-abc".to_string(),
            expires_at: 0,
        }
    }

    #[test]
    fn test_round_trip() {
        let codec = SignedCookieCodec::new("key-one");
        let encoded = codec.encode(&sample()).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), sample());
    }

    #[test]
    fn test_other_key_rejects() {
        let encoded = SignedCookieCodec::new("key-one").encode(&sample()).unwrap();
        let err = SignedCookieCodec::new("key-two").decode(&encoded).unwrap_err();
        assert!(matches!(err, CodecError::BadSignature));
    }

    #[test]
    fn test_expired_payload_rejects() {
        let codec = SignedCookieCodec::new("key-one");
        let mut data = sample();
        data.expires_at = 1_000;
        let encoded = codec.encode(&data).unwrap();
        assert!(codec.decode_at(&encoded, 999).is_ok());
        assert!(matches!(codec.decode_at(&encoded, 1_001), Err(CodecError::Expired)));
    }

    #[test]
    fn test_flipped_json_byte_rejects() {
        let codec = SignedCookieCodec::new("key-one");
        let encoded = codec.encode(&sample()).unwrap();
        let mut raw = base64::decode_config(&encoded, base64::URL_SAFE).unwrap();
        raw[2] ^= 0x01;
        let tampered = base64::encode_config(raw, base64::URL_SAFE);
        assert!(matches!(codec.decode(&tampered), Err(CodecError::BadSignature)));
    }

    #[test]
    fn test_short_and_malformed_input() {
        let codec = SignedCookieCodec::new("key-one");
        let short = base64::encode_config([0u8; 16], base64::URL_SAFE);
        assert!(matches!(codec.decode(&short), Err(CodecError::TooShort)));
        assert!(matches!(codec.decode("!!not base64!!"), Err(CodecError::Base64(_))));
    }

    #[test]
    fn test_signed_garbage_is_a_json_error() {
        let codec = SignedCookieCodec::new("key-one");
        let mut payload = b"not json".to_vec();
        payload.extend(codec.sign(&payload).unwrap());
        let encoded = base64::encode_config(payload, base64::URL_SAFE);
        assert!(matches!(codec.decode(&encoded), Err(CodecError::Json(_))));
    }
}
