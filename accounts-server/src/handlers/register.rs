use crate::error::Error;
use crate::extract::Json;
use crate::password::Hasher;
use crate::projection::Projection;
use crate::registration;
use crate::state::Policy;
use crate::store::Users;
use accounts_core::api::register::Req;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Map, Value};

#[tracing::instrument(skip_all)]
pub async fn handler(
    State(users): State<Users>,
    State(policy): State<Policy>,
    State(hasher): State<Hasher>,
    Json(req): Json<Req>,
) -> Result<(StatusCode, Json<Map<String, Value>>), Error> {
    let user = registration::register(users.as_ref(), policy.as_ref(), &hasher, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(Projection::profile().represent(&user)),
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::handlers::test::TestApp;
    use crate::validation::{EMAIL_TAKEN, PASSWORD_MISMATCH};
    use accounts_core::api::Profile;

    fn req(email: &str, password: &str, password_confirm: &str) -> Req {
        Req {
            email: email.to_string(),
            password: password.to_string(),
            password_confirm: password_confirm.to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
        }
    }

    async fn call(app: &TestApp, req: Req) -> Result<(StatusCode, Json<Map<String, Value>>), Error> {
        handler(
            State(app.users()),
            State(app.policy()),
            State(app.hasher.clone()),
            Json(req),
        )
        .await
    }

    #[test_log::test(tokio::test)]
    async fn test_success() {
        let app = TestApp::new();

        let (status, Json(body)) = call(&app, req("a@example.com", "Str0ng!Pass", "Str0ng!Pass"))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert!(!body.contains_key("password"));

        let profile: Profile = serde_json::from_value(Value::Object(body)).unwrap();
        assert_eq!(profile.email, "a@example.com");
        assert!(!profile.is_active);
    }

    #[test_log::test(tokio::test)]
    async fn test_password_mismatch() {
        let app = TestApp::new();

        let err = call(&app, req("a@example.com", "Str0ng!Pass", "Str0ng!Pasz"))
            .await
            .unwrap_err();

        assert_eq!(
            err.unwrap_validation().get("password"),
            Some(&[PASSWORD_MISMATCH.to_string()][..])
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_weak_mismatched_password_reports_policy_errors() {
        let app = TestApp::new();

        let errors = call(&app, req("a@example.com", "x", "y"))
            .await
            .unwrap_err()
            .unwrap_validation();

        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["password"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_duplicate_email() {
        let app = TestApp::new();
        call(&app, req("a@example.com", "Str0ng!Pass", "Str0ng!Pass"))
            .await
            .unwrap();

        let err = call(&app, req("a@example.com", "Str0ng!Pass", "Str0ng!Pass"))
            .await
            .unwrap_err();

        assert_eq!(
            err.unwrap_validation().get("email"),
            Some(&[EMAIL_TAKEN.to_string()][..])
        );
        assert_eq!(app.users().list().await.unwrap().len(), 1);
    }
}
