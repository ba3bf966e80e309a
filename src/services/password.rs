use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{debug, error, instrument};

use crate::models::{ServiceError, ServiceResult};

/// Hash a plain-text password with Argon2 and a random salt
#[instrument(skip(password), err(Display))]
pub fn hash_password(password: &str) -> ServiceResult<String> {
    if password.is_empty() {
        return Err(ServiceError::ValidationError {
            message: "Password cannot be empty".to_string(),
        });
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "Password hashing failed");
            ServiceError::Internal {
                message: format!("Password hashing failed: {}", e),
            }
        })
}

/// Check a password against a stored Argon2 hash.
///
/// `Ok(false)` means the password does not match; an unparsable stored hash
/// is an internal error.
#[instrument(skip(stored_hash, password), err(Display))]
pub fn verify_password(stored_hash: &str, password: &str) -> ServiceResult<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!(error = %e, "Stored password hash is malformed");
        ServiceError::Internal {
            message: format!("Invalid stored password hash: {}", e),
        }
    })?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => {
            debug!("Password mismatch");
            Ok(false)
        }
        Err(e) => Err(ServiceError::Internal {
            message: format!("Password verification failed: {}", e),
        }),
    }
}
