#![forbid(unsafe_code)]

//! Argon2id password hashes stored as PHC strings
//! (`$argon2id$v=19$m=...,t=...,p=...$<salt>$<hash>`).

use crate::StoreError;
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::OnceLock;
use subtle::ConstantTimeEq;

const SALT_LEN: usize = 16;

pub fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt: [u8; SALT_LEN] = rand::random();
    hash_with_salt(password, &salt)
}

/// Returns `false` for malformed hashes instead of an error; callers only
/// learn match / no match.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(encoded) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Well-formed hash no real password maps to, so unknown usernames cost the
/// same work as known ones.
pub(crate) fn decoy_hash() -> &'static str {
    static DECOY: OnceLock<String> = OnceLock::new();
    DECOY.get_or_init(|| {
        hash_with_salt("interntrack-decoy", &[0u8; SALT_LEN]).unwrap_or_default()
    })
}

pub fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    left.ct_eq(right).into()
}

fn hash_with_salt(password: &str, salt: &[u8]) -> Result<String, StoreError> {
    let salt = SaltString::encode_b64(salt).map_err(|err| StoreError::PasswordHash(err.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| StoreError::PasswordHash(err.to_string()))?;
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_round_trips_and_rejects_wrong_password() {
        let encoded = hash_password("s3cret").expect("hash");
        assert!(encoded.starts_with("$argon2id$"));
        assert!(verify_password("s3cret", &encoded));
        assert!(!verify_password("s3cret ", &encoded));
        assert!(!verify_password("", &encoded));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        assert_ne!(
            hash_password("pw").expect("hash"),
            hash_password("pw").expect("hash")
        );
    }

    #[test]
    fn malformed_hashes_never_match() {
        assert!(!verify_password("pw", "pw"));
        assert!(!verify_password("pw", "sha256$20000$00$00"));
        assert!(!verify_password("pw", "$argon2id$v=19$garbage"));
    }

    #[test]
    fn decoy_hash_is_well_formed_but_matches_nothing_common() {
        let decoy = decoy_hash();
        assert!(PasswordHash::new(decoy).is_ok());
        assert!(!verify_password("", decoy));
        assert!(!verify_password("password", decoy));
        assert!(std::ptr::eq(decoy, decoy_hash()));
    }

    #[test]
    fn constant_time_eq_compares_contents() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
