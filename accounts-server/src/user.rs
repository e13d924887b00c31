use core::fmt::{self, Debug, Formatter};

/// The role that unlocks the user administration API.
pub static ADMIN_ROLE: &str = "admin";

/// An argon2 hash in PHC string format. Never printed, never serialized.
#[derive(Clone, PartialEq, Eq, sqlx::Type)]
#[sqlx(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an already-computed PHC string.
    pub fn new(phc: String) -> Self {
        Self(phc)
    }

    /// The PHC string, for verification and storage.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for PasswordHash {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("PasswordHash([redacted])")
    }
}

/// A persisted account.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// Storage-assigned primary key.
    #[sqlx(rename = "id")]
    pub pk: i64,

    /// Unique across all users.
    pub email: String,

    /// One-way hash of the user's password.
    #[sqlx(rename = "password")]
    pub password_hash: PasswordHash,

    /// Given name. May be empty.
    pub first_name: String,

    /// Family name. May be empty.
    pub last_name: String,

    /// Sorted, deduplicated role identifiers.
    pub roles: Vec<String>,

    /// Whether the account may log in.
    pub is_active: bool,
}

impl User {
    /// Does this user hold the given role?
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|held| held == role)
    }

    /// Active administrators can manage other users.
    pub fn is_admin(&self) -> bool {
        self.is_active && self.has_role(ADMIN_ROLE)
    }
}

/// Normalize a list of roles into set form: sorted, no duplicates.
pub fn normalize_roles(roles: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut roles: Vec<String> = roles.into_iter().collect();
    roles.sort();
    roles.dedup();
    roles
}
