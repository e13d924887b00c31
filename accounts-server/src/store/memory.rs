use super::{NewUser, StoreError, UserStore, UserUpdate};
use crate::user::User;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Users kept in a map. Uniqueness is checked while holding the write lock,
/// which makes it as authoritative as a database constraint.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Users by primary key, plus the last key handed out.
    inner: RwLock<Inner>,
}

/// The state behind the lock.
#[derive(Debug, Default)]
struct Inner {
    /// Every user, by primary key.
    users: BTreeMap<i64, User>,

    /// The most recently assigned primary key.
    last_pk: i64,
}

impl Inner {
    /// Is `email` used by anyone other than `except`?
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(user.pk) != except)
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.email_taken(email, None))
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.email_taken(&new.email, None) {
            return Err(StoreError::Conflict);
        }

        inner.last_pk += 1;
        let user = User {
            pk: inner.last_pk,
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            roles: new.roles,
            is_active: new.is_active,
        };
        inner.users.insert(user.pk, user.clone());

        Ok(user)
    }

    async fn find(&self, pk: i64) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&pk).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.inner.read().await.users.values().cloned().collect())
    }

    async fn update(&self, pk: i64, update: UserUpdate) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().await;

        if let Some(email) = &update.email {
            if inner.email_taken(email, Some(pk)) {
                return Err(StoreError::Conflict);
            }
        }

        let Some(user) = inner.users.get_mut(&pk) else {
            return Ok(None);
        };

        update.apply(user);

        Ok(Some(user.clone()))
    }
}
