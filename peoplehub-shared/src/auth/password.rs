/// Employee password hashing with Argon2id
///
/// Hashes are stored in PHC string form, so the parameters travel with each
/// hash and verification needs nothing else.
///
/// - **Memory**: 64 MB
/// - **Iterations**: 3
/// - **Parallelism**: 4 lanes
///
/// Hashing is CPU and memory heavy; async callers should run it on a
/// blocking thread.
///
/// # Example
///
/// ```
/// use peoplehub_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct horse battery staple")?;
/// assert!(verify_password("correct horse battery staple", &hash)?);
/// assert!(!verify_password("Tr0ub4dor&3", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(65536, 3, 4, Some(32))
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {e}")))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored PHC hash in constant time
///
/// Returns `Ok(false)` for a wrong password and an error only when the
/// stored hash cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::InvalidHash(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_argon2id_phc() {
        let hash = hash_password("s3cret-passphrase").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=65536,t=3,p=4$"));
    }

    #[test]
    fn test_verify_roundtrip() {
        let hash = hash_password("s3cret-passphrase").unwrap();
        assert!(verify_password("s3cret-passphrase", &hash).unwrap());
        assert!(!verify_password("S3cret-passphrase", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let first = hash_password("same password").unwrap();
        let second = hash_password("same password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash() {
        let result = verify_password("anything", "plaintext");
        assert!(matches!(result, Err(PasswordError::InvalidHash(_))));
    }
}
