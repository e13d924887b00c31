use crate::error::Error;
use crate::extract::Json;
use crate::jwt::TokenIssuer;
use crate::password::Hasher;
use crate::store::Users;
use crate::validation::{FieldErrors, REQUIRED};
use crate::{bail, bail_if};
use accounts_core::api::token::{Req, Resp};
use axum::extract::State;
use axum::http::StatusCode;

/// This should be the same for missing accounts, incorrect passwords, and
/// inactive accounts so as not to give additional information about what
/// accounts exist to someone guessing emails.
pub static BAD_LOGIN_MESSAGE: &str = "No active account found with the given credentials";

#[tracing::instrument(skip_all)]
pub async fn handler(
    State(users): State<Users>,
    State(hasher): State<Hasher>,
    State(tokens): State<TokenIssuer>,
    Json(req): Json<Req>,
) -> Result<Json<Resp>, Error> {
    let email = req.email.trim();

    let mut errors = FieldErrors::default();
    if email.is_empty() {
        errors.add("email", REQUIRED);
    }
    if req.password.is_empty() {
        errors.add("password", REQUIRED);
    }
    errors.into_result()?;

    let Some(user) = users.find_by_email(email).await? else {
        hasher.verify_dummy(&req.password)?;
        bail!(BAD_LOGIN_MESSAGE, StatusCode::UNAUTHORIZED)
    };

    bail_if!(
        !hasher.verify(&req.password, &user.password_hash)?,
        BAD_LOGIN_MESSAGE,
        StatusCode::UNAUTHORIZED
    );
    bail_if!(
        !user.is_active,
        BAD_LOGIN_MESSAGE,
        StatusCode::UNAUTHORIZED
    );

    tracing::debug!(pk = user.pk, "issuing token pair");

    Ok(Json(tokens.issue_pair(&user)?))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::handlers::test::TestApp;
    use crate::jwt::TokenType;

    async fn call(app: &TestApp, email: &str, password: &str) -> Result<Json<Resp>, Error> {
        handler(
            State(app.users()),
            State(app.hasher.clone()),
            State(app.tokens.clone()),
            Json(Req {
                email: email.to_string(),
                password: password.to_string(),
            }),
        )
        .await
    }

    #[test_log::test(tokio::test)]
    async fn test_success() {
        let app = TestApp::new();
        app.user("a@example.com", "Str0ng!Pass", true, &[]).await;

        let Json(pair) = call(&app, "a@example.com", "Str0ng!Pass").await.unwrap();

        let access = app.tokens.decode(&pair.access, TokenType::Access).unwrap();
        assert_eq!(access.email(), Some("a@example.com"));

        let refresh = app.tokens.decode(&pair.refresh, TokenType::Refresh).unwrap();
        assert_eq!(refresh.email(), Some("a@example.com"));
    }

    #[test_log::test(tokio::test)]
    async fn test_wrong_password() {
        let app = TestApp::new();
        app.user("a@example.com", "Str0ng!Pass", true, &[]).await;

        let err = call(&app, "a@example.com", "Wr0ng!Pass").await.unwrap_err();

        assert_eq!(
            err.unwrap_custom(),
            (StatusCode::UNAUTHORIZED, BAD_LOGIN_MESSAGE.to_string())
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_unknown_email() {
        let app = TestApp::new();

        let err = call(&app, "nobody@example.com", "Str0ng!Pass")
            .await
            .unwrap_err();

        assert_eq!(
            err.unwrap_custom(),
            (StatusCode::UNAUTHORIZED, BAD_LOGIN_MESSAGE.to_string())
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_unknown_email_still_hashes() {
        let app = TestApp::new();
        assert!(!app.hasher.dummy_ready());

        call(&app, "nobody@example.com", "Str0ng!Pass")
            .await
            .unwrap_err();

        assert!(app.hasher.dummy_ready());
    }

    #[test_log::test(tokio::test)]
    async fn test_inactive_user() {
        let app = TestApp::new();
        app.user("a@example.com", "Str0ng!Pass", false, &[]).await;

        let err = call(&app, "a@example.com", "Str0ng!Pass").await.unwrap_err();

        assert_eq!(
            err.unwrap_custom(),
            (StatusCode::UNAUTHORIZED, BAD_LOGIN_MESSAGE.to_string())
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_blank_fields() {
        let app = TestApp::new();

        let errors = call(&app, " ", "").await.unwrap_err().unwrap_validation();

        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["email", "password"]
        );
    }
}
