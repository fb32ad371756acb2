use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid login or secret")]
    InvalidCredentials,

    #[error("unknown login '{0}'")]
    UnknownLogin(String),

    #[error("internal authentication error: {0}")]
    Internal(String),
}

/// The parts of a stored credential needed to verify a login attempt.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub principal_id: String,
    pub secret_hash: String,
}

pub fn hash_secret(secret: &str) -> Result<String, AuthError> {
    let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_secret(secret: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| AuthError::Internal(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Resolves `login` to its principal id. An unknown login and a wrong secret fail the same way.
pub fn authenticate(
    login: &str,
    secret: &str,
    lookup: impl FnOnce(&str) -> Option<CredentialRecord>,
) -> Result<String, AuthError> {
    if login.trim().is_empty() || secret.is_empty() {
        return Err(AuthError::InvalidCredentials);
    }

    let record = lookup(login).ok_or(AuthError::InvalidCredentials)?;

    if !verify_secret(secret, &record.secret_hash)? {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(record.principal_id)
}
