use crate::user::PasswordHash;
use argon2::{
    password_hash::{self, rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use core::fmt::{self, Debug, Formatter};
use std::sync::{Arc, OnceLock};

/// What the stand-in hash for missing accounts is a hash of.
static DUMMY_PASSWORD: &str = "not anyone's password";

/// Turns plaintext passwords into argon2id hashes and checks them later.
#[derive(Clone, Default)]
pub struct Hasher {
    /// Configured hashing algorithm.
    argon2: Argon2<'static>,

    /// A hash made with the same parameters, verified against when there's
    /// no real account so both paths cost the same. Made on first use.
    dummy: Arc<OnceLock<PasswordHash>>,
}

impl Hasher {
    /// A hasher with non-default cost parameters.
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
            dummy: Arc::default(),
        }
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// ## Errors
    ///
    /// Only if argon2 itself fails, which means something is misconfigured.
    pub fn hash(&self, plaintext: &str) -> Result<PasswordHash, password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self.argon2.hash_password(plaintext.as_bytes(), &salt)?;

        Ok(PasswordHash::new(hash.to_string()))
    }

    /// Check a plaintext password against a stored hash. `Ok(false)` means
    /// the password is wrong.
    ///
    /// ## Errors
    ///
    /// If the stored hash can't be parsed or verification fails for a reason
    /// other than a wrong password.
    pub fn verify(&self, plaintext: &str, hash: &PasswordHash) -> Result<bool, password_hash::Error> {
        let parsed = password_hash::PasswordHash::new(hash.as_str())?;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Do the same work as [`Hasher::verify`] without a stored hash. Use this
    /// when the account doesn't exist so a failed login takes as long either
    /// way. Always `Ok(false)`.
    ///
    /// ## Errors
    ///
    /// Only if argon2 itself fails.
    pub fn verify_dummy(&self, plaintext: &str) -> Result<bool, password_hash::Error> {
        let dummy = match self.dummy.get() {
            Some(dummy) => dummy,
            None => {
                let fresh = self.hash(DUMMY_PASSWORD)?;
                self.dummy.get_or_init(|| fresh)
            }
        };

        self.verify(plaintext, dummy)?;

        Ok(false)
    }

    /// Has the stand-in hash been made yet?
    #[cfg(test)]
    pub fn dummy_ready(&self) -> bool {
        self.dummy.get().is_some()
    }
}

impl Debug for Hasher {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Hasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
impl Hasher {
    /// The cheapest parameters argon2 allows, so tests don't crawl.
    pub fn fast() -> Self {
        Self::with_params(
            Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
                .expect("minimum params are valid"),
        )
    }
}
