//! Where users live. Everything above this module talks to [`UserStore`];
//! the storage behind it is chosen once at startup.

use crate::user::{PasswordHash, User};
use core::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// Users in process memory, for development and tests.
pub mod memory;
pub use memory::MemoryStore;

/// Users in Postgres.
pub mod postgres;
pub use postgres::PgStore;

/// A store shared by every request.
pub type Users = Arc<dyn UserStore>;

/// Things that can go wrong talking to storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage layer's uniqueness constraint on email refused the write.
    /// This is the final word on duplicate emails, even when an earlier
    /// existence check passed.
    #[error("a user with this email already exists")]
    Conflict,

    /// Anything else the database complained about.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Everything needed to insert a user. The store assigns the primary key.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Must not belong to another user.
    pub email: String,

    /// Already hashed.
    pub password_hash: PasswordHash,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Sorted, deduplicated role identifiers.
    pub roles: Vec<String>,

    /// Whether the account may log in.
    pub is_active: bool,
}

/// A partial update. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New email. Must not belong to another user.
    pub email: Option<String>,

    /// New, already hashed, password.
    pub password_hash: Option<PasswordHash>,

    /// New given name
    pub first_name: Option<String>,

    /// New family name
    pub last_name: Option<String>,

    /// New roles, sorted and deduplicated.
    pub roles: Option<Vec<String>>,

    /// New activation state
    pub is_active: Option<bool>,
}

impl UserUpdate {
    /// Would applying this change anything?
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password_hash.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.roles.is_none()
            && self.is_active.is_none()
    }

    /// Apply the update to an in-memory user.
    pub fn apply(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(password_hash) = self.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(roles) = self.roles {
            user.roles = roles;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
    }
}

/// Persistence for users, keyed by a unique email.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync + Debug {
    /// Is some user already registered with this email?
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    /// Insert a new user.
    ///
    /// ## Errors
    ///
    /// `StoreError::Conflict` if the email is taken by the time we write.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Look a user up by primary key.
    async fn find(&self, pk: i64) -> Result<Option<User>, StoreError>;

    /// Look a user up by exact email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Every user, ordered by primary key.
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// Change a user. `Ok(None)` if there is no such user.
    ///
    /// ## Errors
    ///
    /// `StoreError::Conflict` if the new email belongs to someone else.
    async fn update(&self, pk: i64, update: UserUpdate) -> Result<Option<User>, StoreError>;
}
