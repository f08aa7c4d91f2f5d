//! PBKDF2-HMAC-SHA256 password hashes, encoded as
//! `pbkdf2-sha256$<iterations>$<salt>$<hash>` with unpadded base64 fields.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::StoreError;

const SCHEME: &str = "pbkdf2-sha256";
pub const DEFAULT_ITERATIONS: u32 = 600_000;
const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;

fn derive(password: &str, salt: &[u8], iterations: u32, out: &mut [u8]) {
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, out);
}

/// Hash `password` with a fresh random salt.
#[must_use]
pub fn hash_password(password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut hash = [0u8; HASH_LENGTH];
    derive(password, &salt, iterations, &mut hash);
    format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

/// Check `password` against an encoded hash in constant time.
///
/// # Errors
///
/// Returns [`StoreError::Password`] if `encoded` is not a hash produced by
/// [`hash_password`].
pub fn verify_password(password: &str, encoded: &str) -> Result<bool, StoreError> {
    let malformed = || StoreError::Password("malformed password hash".into());

    let mut parts = encoded.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(malformed());
    };
    if scheme != SCHEME {
        return Err(malformed());
    }
    let iterations: u32 = iterations.parse().map_err(|_| malformed())?;
    let salt = STANDARD_NO_PAD.decode(salt).map_err(|_| malformed())?;
    let expected = STANDARD_NO_PAD.decode(hash).map_err(|_| malformed())?;
    if iterations == 0 || expected.is_empty() {
        return Err(malformed());
    }

    let mut actual = vec![0u8; expected.len()];
    derive(password, &salt, iterations, &mut actual);
    Ok(actual.ct_eq(&expected).into())
}
