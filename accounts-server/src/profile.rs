use crate::error::Error;
use crate::password::Hasher;
use crate::policy::{Attributes, PasswordPolicy};
use crate::projection::ProfileChanges;
use crate::store::{UserStore, UserUpdate};
use crate::user::User;
use crate::validation::{FieldErrors, EMAIL_TAKEN};

/// Apply parsed profile changes to a stored user. New passwords go through
/// the password policy and are hashed; new emails must be unused. Returns
/// `Ok(None)` if there's no such user.
///
/// ## Errors
///
/// - `Error::Validation` if the new email is taken or the new password is
///   rejected.
/// - `Error::Internal` if storage or hashing fails.
pub async fn update(
    users: &dyn UserStore,
    policy: &dyn PasswordPolicy,
    hasher: &Hasher,
    pk: i64,
    changes: ProfileChanges,
) -> Result<Option<User>, Error> {
    let Some(current) = users.find(pk).await? else {
        return Ok(None);
    };

    let mut errors = FieldErrors::default();

    if let Some(email) = &changes.email {
        if *email != current.email && users.email_exists(email).await? {
            errors.add("email", EMAIL_TAKEN);
        }
    }

    if let Some(password) = &changes.password {
        let attributes = Attributes {
            email: changes.email.as_deref().unwrap_or(&current.email),
            first_name: changes.first_name.as_deref().unwrap_or(&current.first_name),
            last_name: changes.last_name.as_deref().unwrap_or(&current.last_name),
        };

        if let Err(err) = policy.validate(password, &attributes) {
            errors.extend(err.on("password"));
        }
    }

    errors.into_result()?;

    let password_hash = match &changes.password {
        Some(password) => Some(hasher.hash(password)?),
        None => None,
    };

    let updated = users
        .update(
            pk,
            UserUpdate {
                email: changes.email,
                password_hash,
                first_name: changes.first_name,
                last_name: changes.last_name,
                roles: changes.roles,
                is_active: changes.is_active,
            },
        )
        .await?;

    if updated.is_some() {
        tracing::info!(pk, "updated user");
    }

    Ok(updated)
}
