use super::{NewUser, StoreError, UserStore, UserUpdate};
use crate::user::User;
use sqlx::{PgPool, Postgres, QueryBuilder};

/// Columns to select whenever we read a full user.
static COLUMNS: &str = "id, email, password, first_name, last_name, roles, is_active";

/// Postgres reports unique constraint violations with this SQLSTATE.
static UNIQUE_VIOLATION: &str = "23505";

/// Users in the `users` table. The `UNIQUE` constraint on `email` settles
/// races between concurrent registrations.
#[derive(Debug, Clone)]
pub struct PgStore {
    /// Database connection pool.
    pool: PgPool,
}

impl PgStore {
    /// Wrap a pool whose database has been migrated.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Is this the database refusing a duplicate email?
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| code.as_ref() == UNIQUE_VIOLATION),
        _ => false,
    }
}

/// Turn unique violations into `Conflict` and pass anything else through.
fn conflict_or(err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Conflict
    } else {
        StoreError::Database(err)
    }
}

#[async_trait::async_trait]
impl UserStore for PgStore {
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE email = $1 LIMIT 1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        Ok(existing.is_some())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password, first_name, last_name, roles, is_active) \
            VALUES ($1, $2, $3, $4, $5, $6) \
            RETURNING {COLUMNS}"
        ))
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.roles)
        .bind(user.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_or)
    }

    async fn find(&self, pk: i64) -> Result<Option<User>, StoreError> {
        Ok(
            sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
                .bind(pk)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(
            sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(
            sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users ORDER BY id"))
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn update(&self, pk: i64, update: UserUpdate) -> Result<Option<User>, StoreError> {
        if update.is_empty() {
            return self.find(pk).await;
        }

        let mut query = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        let mut set = query.separated(", ");

        if let Some(email) = update.email {
            set.push("email = ").push_bind_unseparated(email);
        }
        if let Some(password_hash) = update.password_hash {
            set.push("password = ").push_bind_unseparated(password_hash);
        }
        if let Some(first_name) = update.first_name {
            set.push("first_name = ").push_bind_unseparated(first_name);
        }
        if let Some(last_name) = update.last_name {
            set.push("last_name = ").push_bind_unseparated(last_name);
        }
        if let Some(roles) = update.roles {
            set.push("roles = ").push_bind_unseparated(roles);
        }
        if let Some(is_active) = update.is_active {
            set.push("is_active = ").push_bind_unseparated(is_active);
        }

        query.push(" WHERE id = ").push_bind(pk);
        query.push(format!(" RETURNING {COLUMNS}"));

        query
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await
            .map_err(conflict_or)
    }
}
