//! Password hashing and verification.
//!
//! New digests are Argon2id PHC strings. Verification also accepts the
//! werkzeug-style `method$salt$hex` digests already present in the user
//! table, so existing accounts keep working until they are rehashed.
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::Argon2;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256, Sha512};

use crate::error::AppError;

/// werkzeug's default when a pbkdf2 digest omits the iteration count.
const DEFAULT_PBKDF2_ITERATIONS: u32 = 260_000;
/// werkzeug's scrypt defaults: n = 2^15, r = 8, p = 1, 64-byte key.
const DEFAULT_SCRYPT_N: u32 = 1 << 15;
const DEFAULT_SCRYPT_R: u32 = 8;
const DEFAULT_SCRYPT_P: u32 = 1;
const SCRYPT_KEY_LEN: usize = 64;

/// One-way password digest primitive.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, AppError>;

    /// Malformed or unknown digests verify as `false`.
    fn verify(&self, plaintext: &str, digest: &str) -> bool;

    /// Whether `digest` should be replaced by a fresh [`hash`](Self::hash).
    fn needs_rehash(&self, digest: &str) -> bool;
}

#[derive(Default, Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AppError::InternalError(format!("password hashing failed: {}", e)))?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        if digest.starts_with('$') {
            return match PasswordHash::new(digest) {
                Ok(parsed) => self.argon2.verify_password(plaintext.as_bytes(), &parsed).is_ok(),
                Err(_) => false,
            };
        }
        LegacyDigest::parse(digest)
            .map(|legacy| legacy.verify(plaintext))
            .unwrap_or(false)
    }

    fn needs_rehash(&self, digest: &str) -> bool {
        !digest.starts_with("$argon2id$")
    }
}

/// A werkzeug `method$salt$hex` digest.
#[derive(Debug, PartialEq, Eq)]
enum LegacyDigest<'a> {
    Pbkdf2 { algorithm: ShaAlgorithm, iterations: u32, salt: &'a str, expected: Vec<u8> },
    Scrypt { log_n: u8, r: u32, p: u32, salt: &'a str, expected: Vec<u8> },
    /// Pre-2.3 werkzeug: HMAC keyed by the salt, or a bare digest when the salt is empty.
    Sha { algorithm: ShaAlgorithm, salt: &'a str, expected: Vec<u8> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShaAlgorithm {
    Sha256,
    Sha512,
}

impl ShaAlgorithm {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

impl<'a> LegacyDigest<'a> {
    fn parse(digest: &'a str) -> Option<Self> {
        let mut parts = digest.splitn(3, '$');
        let method = parts.next()?;
        let salt = parts.next()?;
        let expected = hex::decode(parts.next()?).ok()?;
        if expected.is_empty() {
            return None;
        }

        let mut args = method.split(':');
        match args.next()? {
            "pbkdf2" => {
                let algorithm = match args.next() {
                    Some(name) => ShaAlgorithm::parse(name)?,
                    None => ShaAlgorithm::Sha256,
                };
                let iterations = match args.next() {
                    Some(n) => n.parse().ok().filter(|n| *n > 0)?,
                    None => DEFAULT_PBKDF2_ITERATIONS,
                };
                Some(Self::Pbkdf2 { algorithm, iterations, salt, expected })
            }
            "scrypt" => {
                let n = match args.next() {
                    Some(n) => n.parse().ok()?,
                    None => DEFAULT_SCRYPT_N,
                };
                let r = match args.next() {
                    Some(r) => r.parse().ok()?,
                    None => DEFAULT_SCRYPT_R,
                };
                let p = match args.next() {
                    Some(p) => p.parse().ok()?,
                    None => DEFAULT_SCRYPT_P,
                };
                if n < 2 || !n.is_power_of_two() {
                    return None;
                }
                Some(Self::Scrypt { log_n: n.trailing_zeros() as u8, r, p, salt, expected })
            }
            name => {
                let algorithm = ShaAlgorithm::parse(name)?;
                Some(Self::Sha { algorithm, salt, expected })
            }
        }
    }

    fn verify(&self, plaintext: &str) -> bool {
        let password = plaintext.as_bytes();
        match self {
            Self::Pbkdf2 { algorithm, iterations, salt, expected } => {
                let mut derived = vec![0u8; expected.len()];
                match algorithm {
                    ShaAlgorithm::Sha256 => {
                        pbkdf2::pbkdf2_hmac::<Sha256>(password, salt.as_bytes(), *iterations, &mut derived)
                    }
                    ShaAlgorithm::Sha512 => {
                        pbkdf2::pbkdf2_hmac::<Sha512>(password, salt.as_bytes(), *iterations, &mut derived)
                    }
                }
                constant_time_eq(&derived, expected)
            }
            Self::Scrypt { log_n, r, p, salt, expected } => {
                let params = match scrypt::Params::new(*log_n, *r, *p, SCRYPT_KEY_LEN) {
                    Ok(params) => params,
                    Err(_) => return false,
                };
                let mut derived = vec![0u8; expected.len()];
                if scrypt::scrypt(password, salt.as_bytes(), &params, &mut derived).is_err() {
                    return false;
                }
                constant_time_eq(&derived, expected)
            }
            Self::Sha { algorithm, salt, expected } => {
                let derived = match (algorithm, salt.is_empty()) {
                    (ShaAlgorithm::Sha256, true) => Sha256::digest(password).to_vec(),
                    (ShaAlgorithm::Sha512, true) => Sha512::digest(password).to_vec(),
                    (ShaAlgorithm::Sha256, false) => match Hmac::<Sha256>::new_from_slice(salt.as_bytes()) {
                        Ok(mut mac) => {
                            mac.update(password);
                            mac.finalize().into_bytes().to_vec()
                        }
                        Err(_) => return false,
                    },
                    (ShaAlgorithm::Sha512, false) => match Hmac::<Sha512>::new_from_slice(salt.as_bytes()) {
                        Ok(mut mac) => {
                            mac.update(password);
                            mac.finalize().into_bytes().to_vec()
                        }
                        Err(_) => return false,
                    },
                };
                constant_time_eq(&derived, expected)
            }
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
