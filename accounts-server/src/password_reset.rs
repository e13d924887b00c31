//! Forgotten passwords.
//!
//! Asking for a reset hands a signed token to a [`ResetSender`] and tells the
//! caller the same thing whether or not the account exists. Trading the
//! token in runs the new password through the usual policy. The token is
//! bound to the password hash it was issued against, so it only works once.

use crate::error::Error;
use crate::jwt::TokenIssuer;
use crate::password::Hasher;
use crate::policy::{Attributes, PasswordPolicy};
use crate::store::{UserStore, UserUpdate};
use crate::user::User;
use crate::validation::{self, FieldErrors, PASSWORD_MISMATCH, REQUIRED};
use accounts_core::api::reset_password;
use core::fmt::Debug;

/// The answer to every forgotten-password request.
pub static FORGOT_MESSAGE: &str =
    "If an active account uses this email, a password reset token has been sent to it.";

/// The answer to a successful reset.
pub static RESET_MESSAGE: &str = "Password has been reset.";

/// Bad signature, expired, already used, or for someone who can't log in.
pub static INVALID_RESET_TOKEN: &str = "Invalid or expired reset token.";

/// Gets reset tokens to the people who asked for them.
#[async_trait::async_trait]
pub trait ResetSender: Send + Sync + Debug {
    /// Deliver a reset token to `user`. Failures are the sender's to report;
    /// the caller gets the same answer either way.
    async fn send(&self, user: &User, token: &str);
}

/// Writes reset tokens to the log. Good enough for development; put a mailer
/// here for anything else.
#[derive(Debug, Default)]
pub struct LogSender;

#[async_trait::async_trait]
impl ResetSender for LogSender {
    async fn send(&self, user: &User, token: &str) {
        tracing::info!(pk = user.pk, email = %user.email, %token, "password reset token");
    }
}

/// Send a reset token if `email` belongs to an active user.
///
/// ## Errors
///
/// - `Error::Validation` if the email is missing or malformed.
/// - `Error::Internal` if storage or signing fails.
pub async fn forgot(
    users: &dyn UserStore,
    tokens: &TokenIssuer,
    sender: &dyn ResetSender,
    email: &str,
) -> Result<(), Error> {
    let email = email.trim();

    let mut errors = FieldErrors::default();
    validation::check_email(email, &mut errors);
    errors.into_result()?;

    match users.find_by_email(email).await? {
        Some(user) if user.is_active => {
            let token = tokens.password_reset_token(&user)?;
            sender.send(&user, &token).await;
            tracing::info!(pk = user.pk, "issued password reset token");
        }
        _ => tracing::debug!("no active account for password reset"),
    }

    Ok(())
}

/// Set a new password for the user a reset token was issued to.
///
/// ## Errors
///
/// - `Error::Validation` on `token` if the token doesn't check out, on
///   `password` if the policy rejects it or the confirmation doesn't match,
///   and on any missing field.
/// - `Error::Internal` if storage or hashing fails.
pub async fn reset(
    users: &dyn UserStore,
    policy: &dyn PasswordPolicy,
    hasher: &Hasher,
    tokens: &TokenIssuer,
    req: reset_password::Req,
) -> Result<User, Error> {
    let mut errors = FieldErrors::default();
    for (field, value) in [
        ("token", &req.token),
        ("password", &req.password),
        ("password_confirm", &req.password_confirm),
    ] {
        if value.is_empty() {
            errors.add(field, REQUIRED);
        }
    }
    errors.into_result()?;

    let user = token_owner(users, tokens, &req.token).await?;

    let attributes = Attributes {
        email: &user.email,
        first_name: &user.first_name,
        last_name: &user.last_name,
    };
    if let Err(err) = policy.validate(&req.password, &attributes) {
        return Err(err.on("password").into());
    }

    if req.password != req.password_confirm {
        return Err(FieldErrors::single("password", PASSWORD_MISMATCH).into());
    }

    let update = UserUpdate {
        password_hash: Some(hasher.hash(&req.password)?),
        ..UserUpdate::default()
    };
    let Some(user) = users.update(user.pk, update).await? else {
        return Err(invalid_token());
    };

    tracing::info!(pk = user.pk, "reset password");

    Ok(user)
}

/// The active user a reset token was issued to, if it's still good.
async fn token_owner(
    users: &dyn UserStore,
    tokens: &TokenIssuer,
    token: &str,
) -> Result<User, Error> {
    let pk = match tokens.reset_subject(token) {
        Ok(pk) => pk,
        Err(err) => {
            tracing::debug!(?err, "rejected reset token");
            return Err(invalid_token());
        }
    };

    let Some(user) = users.find(pk).await? else {
        return Err(invalid_token());
    };

    if !user.is_active {
        return Err(invalid_token());
    }

    if let Err(err) = tokens.decode_reset(token, &user) {
        tracing::debug!(?err, pk, "rejected reset token");
        return Err(invalid_token());
    }

    Ok(user)
}

/// The one error every bad token gets.
fn invalid_token() -> Error {
    FieldErrors::single("token", INVALID_RESET_TOKEN).into()
}

/// Keeps every token it's asked to send.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSender(std::sync::Mutex<Vec<(i64, String)>>);

#[cfg(test)]
impl RecordingSender {
    /// The most recent token and who it was for.
    pub fn last(&self) -> Option<(i64, String)> {
        self.0.lock().unwrap().last().cloned()
    }

    /// How many tokens have been sent.
    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl ResetSender for RecordingSender {
    async fn send(&self, user: &User, token: &str) {
        self.0.lock().unwrap().push((user.pk, token.to_string()));
    }
}
