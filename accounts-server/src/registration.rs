//! Turning a registration request into a new, inactive user.
//!
//! Field checks run together so a caller sees every problem at once. The
//! password confirmation is only compared once the fields themselves are
//! fine, and the password is only hashed once everything has passed.

use crate::error::Error;
use crate::password::Hasher;
use crate::policy::{Attributes, PasswordPolicy};
use crate::store::{NewUser, UserStore};
use crate::user::User;
use crate::validation::{self, FieldErrors, EMAIL_TAKEN, PASSWORD_MISMATCH, REQUIRED};
use accounts_core::api::register;

/// Validate a registration request and, if it passes, store the new user.
///
/// ## Errors
///
/// - `Error::Validation` with every failing field, or with a `password`
///   error if the confirmation doesn't match. A duplicate email reported by
///   the store at insert time comes back the same way, on `email`.
/// - `Error::Internal` if storage or hashing fails.
pub async fn register(
    users: &dyn UserStore,
    policy: &dyn PasswordPolicy,
    hasher: &Hasher,
    req: register::Req,
) -> Result<User, Error> {
    let email = req.email.trim();
    let mut errors = FieldErrors::default();

    validation::check_email(email, &mut errors);
    if errors.get("email").is_none() && users.email_exists(email).await? {
        errors.add("email", EMAIL_TAKEN);
    }

    if req.password.is_empty() {
        errors.add("password", REQUIRED);
    } else {
        let attributes = Attributes {
            email,
            first_name: &req.first_name,
            last_name: &req.last_name,
        };

        if let Err(err) = policy.validate(&req.password, &attributes) {
            errors.extend(err.on("password"));
        }
    }

    if req.password_confirm.is_empty() {
        errors.add("password_confirm", REQUIRED);
    }

    validation::check_name("first_name", &req.first_name, &mut errors);
    validation::check_name("last_name", &req.last_name, &mut errors);

    errors.into_result()?;

    if req.password != req.password_confirm {
        return Err(FieldErrors::single("password", PASSWORD_MISMATCH).into());
    }

    let user = users
        .create(NewUser {
            email: email.to_string(),
            password_hash: hasher.hash(&req.password)?,
            first_name: req.first_name,
            last_name: req.last_name,
            roles: Vec::new(),
            is_active: false,
        })
        .await?;

    tracing::info!(pk = user.pk, "registered new user");

    Ok(user)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::policy::Validators;
    use crate::store::{MemoryStore, StoreError, UserUpdate};
    use proptest::prelude::*;

    fn req(email: &str, password: &str, password_confirm: &str) -> register::Req {
        register::Req {
            email: email.to_string(),
            password: password.to_string(),
            password_confirm: password_confirm.to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
        }
    }

    async fn run(users: &dyn UserStore, req: register::Req) -> Result<User, Error> {
        register(users, &Validators::standard(8), &Hasher::fast(), req).await
    }

    #[test_log::test(tokio::test)]
    async fn test_success() {
        let users = MemoryStore::default();

        let user = run(
            &users,
            req("a@example.com", "Str0ng!Pass", "Str0ng!Pass"),
        )
        .await
        .unwrap();

        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.first_name, "A");
        assert_eq!(user.last_name, "B");
        assert!(!user.is_active);
        assert!(user.roles.is_empty());
        assert_ne!(user.password_hash.as_str(), "Str0ng!Pass");
        assert!(Hasher::fast()
            .verify("Str0ng!Pass", &user.password_hash)
            .unwrap());
        assert_eq!(users.list().await.unwrap(), vec![user]);
    }

    #[test_log::test(tokio::test)]
    async fn test_email_is_trimmed() {
        let users = MemoryStore::default();

        let user = run(
            &users,
            req("  a@example.com ", "Str0ng!Pass", "Str0ng!Pass"),
        )
        .await
        .unwrap();

        assert_eq!(user.email, "a@example.com");
    }

    #[test_log::test(tokio::test)]
    async fn test_password_mismatch() {
        let users = MemoryStore::default();

        let errors = run(
            &users,
            req("a@example.com", "Str0ng!Pass", "Str0ng!Pasz"),
        )
        .await
        .unwrap_err()
        .unwrap_validation();

        assert_eq!(errors, FieldErrors::single("password", PASSWORD_MISMATCH));
        assert!(users.list().await.unwrap().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_weak_mismatched_password_reports_policy_first() {
        let users = MemoryStore::default();

        let errors = run(&users, req("a@example.com", "x", "y"))
            .await
            .unwrap_err()
            .unwrap_validation();

        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["password"]);
        assert_ne!(
            errors.get("password"),
            Some(&[PASSWORD_MISMATCH.to_string()][..])
        );
        assert!(users.list().await.unwrap().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_duplicate_email() {
        let users = MemoryStore::default();
        run(&users, req("a@example.com", "Str0ng!Pass", "Str0ng!Pass"))
            .await
            .unwrap();

        let errors = run(&users, req("a@example.com", "An0ther!Pass", "An0ther!Pass"))
            .await
            .unwrap_err()
            .unwrap_validation();

        assert_eq!(errors, FieldErrors::single("email", EMAIL_TAKEN));
        assert_eq!(users.list().await.unwrap().len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_collects_independent_field_errors() {
        let users = MemoryStore::default();

        let errors = run(
            &users,
            register::Req {
                email: "nope".to_string(),
                password: "123".to_string(),
                password_confirm: String::new(),
                first_name: "x".repeat(151),
                last_name: String::new(),
            },
        )
        .await
        .unwrap_err()
        .unwrap_validation();

        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["email", "first_name", "password", "password_confirm"]
        );
        assert_eq!(
            errors.get("password_confirm"),
            Some(&[REQUIRED.to_string()][..])
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_missing_fields_are_required() {
        let users = MemoryStore::default();

        let errors = run(&users, register::Req::default())
            .await
            .unwrap_err()
            .unwrap_validation();

        for field in ["email", "password", "password_confirm"] {
            assert_eq!(errors.get(field), Some(&[REQUIRED.to_string()][..]), "{field}");
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_password_similar_to_email() {
        let users = MemoryStore::default();

        let errors = run(
            &users,
            req(
                "ada.lovelace@example.com",
                "lovelace@example",
                "lovelace@example",
            ),
        )
        .await
        .unwrap_err()
        .unwrap_validation();

        assert_eq!(
            errors,
            FieldErrors::single(
                "password",
                "The password is too similar to the email address."
            )
        );
    }

    /// Says every email is free, like a check that lost a race with another
    /// registration.
    #[derive(Debug, Default)]
    struct StaleCheck(MemoryStore);

    #[async_trait::async_trait]
    impl UserStore for StaleCheck {
        async fn email_exists(&self, _: &str) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn create(&self, user: NewUser) -> Result<User, StoreError> {
            self.0.create(user).await
        }

        async fn find(&self, pk: i64) -> Result<Option<User>, StoreError> {
            self.0.find(pk).await
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            self.0.find_by_email(email).await
        }

        async fn list(&self) -> Result<Vec<User>, StoreError> {
            self.0.list().await
        }

        async fn update(&self, pk: i64, update: UserUpdate) -> Result<Option<User>, StoreError> {
            self.0.update(pk, update).await
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_insert_conflict_is_an_email_error() {
        let users = StaleCheck::default();
        run(&users, req("a@example.com", "Str0ng!Pass", "Str0ng!Pass"))
            .await
            .unwrap();

        let errors = run(&users, req("a@example.com", "Str0ng!Pass", "Str0ng!Pass"))
            .await
            .unwrap_err()
            .unwrap_validation();

        assert_eq!(errors, FieldErrors::single("email", EMAIL_TAKEN));
        assert_eq!(users.list().await.unwrap().len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_concurrent_registrations_create_one_user() {
        let users = std::sync::Arc::new(StaleCheck::default());

        let attempts = (0..8).map(|_| {
            let users = users.clone();
            tokio::spawn(async move {
                run(
                    users.as_ref(),
                    req("a@example.com", "Str0ng!Pass", "Str0ng!Pass"),
                )
                .await
            })
        });

        let mut successes = 0;
        for attempt in attempts.collect::<Vec<_>>() {
            match attempt.await.unwrap() {
                Ok(_) => successes += 1,
                Err(err) => assert_eq!(
                    err.unwrap_validation(),
                    FieldErrors::single("email", EMAIL_TAKEN)
                ),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(users.list().await.unwrap().len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn mismatched_confirmations_never_create_users(
            password in "[a-zA-Z0-9!]{0,16}",
            confirm in "[a-zA-Z0-9!]{0,16}",
        ) {
            prop_assume!(password != confirm);

            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();

            runtime.block_on(async {
                let users = MemoryStore::default();

                let errors = run(&users, req("a@example.com", &password, &confirm))
                    .await
                    .unwrap_err()
                    .unwrap_validation();

                assert!(errors.get("password").is_some() || errors.get("password_confirm").is_some());
                assert!(users.list().await.unwrap().is_empty());
            });
        }
    }
}
