// web-server/src/utils/token.rs
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::{thread_rng, Rng, RngCore};
use rand::distributions::Alphanumeric;
use subtle::ConstantTimeEq;

/// Length of server-minted record ids
pub const RECORD_ID_LEN: usize = 15;
/// Random bytes behind a CSRF token
pub const CSRF_TOKEN_BYTES: usize = 32;

/// Generate a cryptographically secure random token of specified length
pub fn generate_secure_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Generate a lowercase alphanumeric record id
pub fn generate_record_id() -> String {
    generate_secure_token(RECORD_ID_LEN).to_ascii_lowercase()
}

/// 32 random bytes, base64url-encoded
pub fn generate_csrf_token() -> String {
    let mut bytes = [0u8; CSRF_TOKEN_BYTES];
    thread_rng().fill_bytes(&mut bytes);
    base64::encode_config(bytes, base64::URL_SAFE)
}

/// Hash a password into an argon2id PHC string with an embedded salt
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Check a password against a stored PHC string; unparseable hashes never match
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Compare two secrets without leaking where they differ
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
