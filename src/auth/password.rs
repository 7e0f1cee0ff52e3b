//! Password hashing primitive — one-way salted argon2id.

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

use crate::{Error, Result};

/// Hash a plaintext password into a PHC string with a fresh random salt.
pub fn hash(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| Error::Internal(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| Error::Internal(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Internal(e.to_string()))?
        .to_string();
    Ok(phc)
}

/// Verify a plaintext password against a stored PHC hash.
///
/// An unparseable hash verifies as `false`, not as an error — a corrupt row
/// must read as "wrong password", never as a pass.
#[must_use]
pub fn verify(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let phc = hash("Asd123@").unwrap();
        assert!(phc.starts_with("$argon2"));
        assert!(verify(&phc, "Asd123@"));
        assert!(!verify(&phc, "wrong-password"));
    }

    #[test]
    fn two_hashes_of_same_password_differ() {
        // Fresh salt per hash
        let a = hash("Asd123@").unwrap();
        let b = hash("Asd123@").unwrap();
        assert_ne!(a, b);
        assert!(verify(&a, "Asd123@"));
        assert!(verify(&b, "Asd123@"));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify("not-a-phc-string", "anything"));
        assert!(!verify("", "anything"));
    }
}
