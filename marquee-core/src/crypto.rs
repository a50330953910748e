use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
};
use password_hash::Error as PasswordHashError;
use rand::{TryRngCore, rngs::OsRng};
use thiserror::Error;
use zeroize::Zeroizing;

/// Password hashing helper shared by registration, login and password reset.
///
/// Passwords are hashed with Argon2id and a server-side pepper appended to
/// the secret before hashing. The stored value is a PHC string, so the salt
/// and parameters travel with the hash.
#[derive(Debug)]
pub struct AuthCrypto {
    argon2: Argon2<'static>,
    password_pepper: Zeroizing<Vec<u8>>,
}

#[derive(Debug, Error)]
pub enum AuthCryptoError {
    #[error("password pepper must not be empty")]
    EmptyPasswordPepper,
    #[error("invalid Argon2 parameters: {0}")]
    InvalidArgon2Params(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

impl From<PasswordHashError> for AuthCryptoError {
    fn from(err: PasswordHashError) -> Self {
        AuthCryptoError::PasswordHash(err.to_string())
    }
}

impl AuthCrypto {
    /// ~64 MiB memory and 3 iterations.
    const DEFAULT_MEMORY_KIB: u32 = 64 * 1024;
    const DEFAULT_ITERATIONS: u32 = 3;
    const DEFAULT_PARALLELISM: u32 = 1;
    const SALT_LENGTH: usize = password_hash::Salt::RECOMMENDED_LENGTH;

    /// Build a helper with default Argon2id parameters.
    pub fn new(
        password_pepper: impl AsRef<[u8]>,
    ) -> Result<Self, AuthCryptoError> {
        Self::with_params(
            password_pepper,
            ParamsBuilder::new()
                .m_cost(Self::DEFAULT_MEMORY_KIB)
                .t_cost(Self::DEFAULT_ITERATIONS)
                .p_cost(Self::DEFAULT_PARALLELISM)
                .output_len(32)
                .build()
                .map_err(|err| {
                    AuthCryptoError::InvalidArgon2Params(err.to_string())
                })?,
        )
    }

    /// Build a helper with caller-specified Argon2 parameters (tests and
    /// constrained environments).
    pub fn with_params(
        password_pepper: impl AsRef<[u8]>,
        params: Params,
    ) -> Result<Self, AuthCryptoError> {
        let pepper = password_pepper.as_ref();
        if pepper.is_empty() {
            return Err(AuthCryptoError::EmptyPasswordPepper);
        }

        let argon2 =
            Argon2::new(Algorithm::Argon2id, Version::default(), params);

        Ok(Self {
            argon2,
            password_pepper: Zeroizing::new(pepper.to_vec()),
        })
    }

    /// Cheap parameters for test suites; never use for stored credentials.
    pub fn insecure_for_tests(
        password_pepper: impl AsRef<[u8]>,
    ) -> Result<Self, AuthCryptoError> {
        let params = Params::new(8, 1, 1, None).map_err(|err| {
            AuthCryptoError::InvalidArgon2Params(err.to_string())
        })?;
        Self::with_params(password_pepper, params)
    }

    /// Hash a password with a random salt and the shared pepper.
    pub fn hash_password(
        &self,
        password: &str,
    ) -> Result<String, AuthCryptoError> {
        let material = self.peppered(password);

        let mut salt_bytes = [0u8; Self::SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|err| AuthCryptoError::PasswordHash(err.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(AuthCryptoError::from)?;
        let hash = self.argon2.hash_password(&material, &salt)?.to_string();
        Ok(hash)
    }

    /// Verify a password against a stored PHC hash.
    pub fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthCryptoError> {
        let parsed = PasswordHash::new(password_hash)?;
        let material = self.peppered(password);
        Ok(self.argon2.verify_password(&material, &parsed).is_ok())
    }

    fn peppered(&self, password: &str) -> Zeroizing<Vec<u8>> {
        let mut material = Zeroizing::new(Vec::with_capacity(
            password.len() + self.password_pepper.len(),
        ));
        material.extend_from_slice(password.as_bytes());
        material.extend_from_slice(&self.password_pepper);
        material
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crypto() -> AuthCrypto {
        AuthCrypto::insecure_for_tests("pepper").unwrap()
    }

    #[test]
    fn hash_round_trip() {
        let crypto = crypto();
        let hash = crypto.hash_password("test@123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("test@123"));
        assert!(crypto.verify_password("test@123", &hash).unwrap());
        assert!(!crypto.verify_password("test@124", &hash).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        let crypto = crypto();
        let a = crypto.hash_password("same").unwrap();
        let b = crypto.hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn pepper_is_part_of_the_secret() {
        let hash = crypto().hash_password("secret").unwrap();
        let other = AuthCrypto::insecure_for_tests("other-pepper").unwrap();
        assert!(!other.verify_password("secret", &hash).unwrap());
    }

    #[test]
    fn empty_pepper_rejected() {
        assert!(matches!(
            AuthCrypto::insecure_for_tests(""),
            Err(AuthCryptoError::EmptyPasswordPepper)
        ));
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(crypto().verify_password("x", "not-a-phc-string").is_err());
    }
}
