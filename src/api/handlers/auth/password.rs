//! Argon2id credential hashing and the tagged stored-secret format.
//!
//! Hashes use the PHC string format, so algorithm, parameters, and salt are
//! embedded in the stored value and the format is self-describing. That same
//! property drives legacy detection: a stored secret that parses as a PHC
//! hash is a hashed credential, anything else is a legacy plaintext value
//! awaiting upgrade on the next successful login.

use anyhow::{Result, anyhow};
use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};

/// Stored representation of an account's password column.
#[derive(Clone, PartialEq, Eq)]
pub(super) enum StoredSecret {
    /// PHC-format Argon2id hash.
    Hashed(String),
    /// Plaintext secret carried over from the legacy deployment.
    Legacy(String),
}

impl StoredSecret {
    /// Classify a stored value by whether it parses as a PHC hash.
    pub(super) fn parse(raw: &str) -> Self {
        if PasswordHash::new(raw).is_ok() {
            Self::Hashed(raw.to_string())
        } else {
            Self::Legacy(raw.to_string())
        }
    }
}

// Secrets must never end up in logs, even at TRACE.
impl std::fmt::Debug for StoredSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hashed(_) => f.write_str("StoredSecret::Hashed(***)"),
            Self::Legacy(_) => f.write_str("StoredSecret::Legacy(***)"),
        }
    }
}

/// Hash a plaintext password with Argon2id and a fresh random salt.
///
/// # Errors
/// Returns an error if hashing fails (e.g. parameter or RNG failure).
pub(super) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

/// Verify a candidate password against a stored PHC hash.
///
/// A malformed stored hash is treated as a verification failure, not an
/// error: a corrupt row must never let a login through or take the service
/// down.
pub(super) fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hash = hash_password("Passw0rd").expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Passw0rd", &hash));
    }

    #[test]
    fn wrong_password_fails() {
        let hash = hash_password("Passw0rd").expect("hashing should succeed");
        assert!(!verify_password("Passw0rd2", &hash));
    }

    #[test]
    fn same_password_hashes_differently() {
        let first = hash_password("Passw0rd").expect("hashing should succeed");
        let second = hash_password("Passw0rd").expect("hashing should succeed");
        assert_ne!(first, second);
        assert!(verify_password("Passw0rd", &first));
        assert!(verify_password("Passw0rd", &second));
    }

    #[test]
    fn malformed_hash_is_verification_failure() {
        assert!(!verify_password("Passw0rd", "not-a-phc-string"));
        assert!(!verify_password("Passw0rd", ""));
        assert!(!verify_password("Passw0rd", "$argon2id$garbage"));
    }

    #[test]
    fn stored_secret_tags_phc_hashes() {
        let hash = hash_password("Passw0rd").expect("hashing should succeed");
        assert_eq!(StoredSecret::parse(&hash), StoredSecret::Hashed(hash));
    }

    #[test]
    fn stored_secret_tags_legacy_plaintext() {
        assert_eq!(
            StoredSecret::parse("hunter2hunter2"),
            StoredSecret::Legacy("hunter2hunter2".to_string())
        );
    }

    #[test]
    fn stored_secret_debug_redacts() {
        let secret = StoredSecret::Legacy("hunter2hunter2".to_string());
        assert_eq!(format!("{secret:?}"), "StoredSecret::Legacy(***)");
    }
}
