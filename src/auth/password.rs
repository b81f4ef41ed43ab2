use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

lazy_static! {
    /// Verified against when the user does not exist, so that a miss costs the
    /// same as a wrong password.
    static ref DUMMY_HASH: String =
        hash_password("dummy-password-for-timing").unwrap_or_default();
}

/// Argon2id with a fresh random salt; returns the PHC string.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Constant-time check of `plain` against a stored PHC string.
///
/// A stored hash that cannot be parsed never verifies.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "argon2 parse hash error");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

/// Burns one verification against a fixed hash.
pub fn verify_dummy(plain: &str) {
    let _ = verify_password(plain, &DUMMY_HASH);
}

/// Hashing is CPU-bound; keep it off the async workers.
pub async fn hash_password_blocking(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain)).await?
}

pub async fn verify_password_blocking(plain: String, hash: String) -> anyhow::Result<bool> {
    Ok(tokio::task::spawn_blocking(move || verify_password(&plain, &hash)).await?)
}
