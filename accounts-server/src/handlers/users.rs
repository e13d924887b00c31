use crate::error::Error;
use crate::extract::Json;
use crate::jwt::Claims;
use crate::password::Hasher;
use crate::profile;
use crate::projection::Projection;
use crate::state::Policy;
use crate::store::Users;
use crate::user::User;
use crate::{bail, bail_if};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::{Map, Value};

pub static FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action.";

pub static NOT_FOUND_MESSAGE: &str = "Not found.";

/// Look up the token's user and make sure they're an active administrator.
async fn require_admin(users: &Users, claims: &Claims) -> Result<User, Error> {
    let Some(user) = users.find(claims.user_id).await? else {
        bail!(FORBIDDEN_MESSAGE, StatusCode::FORBIDDEN)
    };

    bail_if!(!user.is_admin(), FORBIDDEN_MESSAGE, StatusCode::FORBIDDEN);

    Ok(user)
}

#[tracing::instrument(skip_all, fields(user_id = claims.user_id))]
pub async fn list(
    State(users): State<Users>,
    claims: Claims,
) -> Result<Json<Vec<Map<String, Value>>>, Error> {
    require_admin(&users, &claims).await?;

    let projection = Projection::profile();

    Ok(Json(
        users
            .list()
            .await?
            .iter()
            .map(|user| projection.represent(user))
            .collect(),
    ))
}

#[tracing::instrument(skip_all, fields(user_id = claims.user_id))]
pub async fn get(
    State(users): State<Users>,
    claims: Claims,
    Path(pk): Path<i64>,
) -> Result<Json<Map<String, Value>>, Error> {
    require_admin(&users, &claims).await?;

    let Some(user) = users.find(pk).await? else {
        bail!(NOT_FOUND_MESSAGE, StatusCode::NOT_FOUND)
    };

    Ok(Json(Projection::profile().represent(&user)))
}

#[tracing::instrument(skip_all, fields(user_id = claims.user_id))]
pub async fn patch(
    State(users): State<Users>,
    State(policy): State<Policy>,
    State(hasher): State<Hasher>,
    claims: Claims,
    Path(pk): Path<i64>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Map<String, Value>>, Error> {
    require_admin(&users, &claims).await?;

    let projection = Projection::profile();
    let changes = projection.parse(&body)?;

    let Some(user) = profile::update(users.as_ref(), policy.as_ref(), &hasher, pk, changes).await?
    else {
        bail!(NOT_FOUND_MESSAGE, StatusCode::NOT_FOUND)
    };

    Ok(Json(projection.represent(&user)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::handlers::test::TestApp;
    use crate::user::ADMIN_ROLE;
    use serde_json::json;

    fn claims_for(app: &TestApp, user: &User) -> Claims {
        app.tokens.access_from(&app.tokens.claims_token(user))
    }

    #[test_log::test(tokio::test)]
    async fn test_list_as_admin() {
        let app = TestApp::new();
        let admin = app.user("admin@example.com", "Str0ng!Pass", true, &[ADMIN_ROLE]).await;
        app.user("b@example.com", "Str0ng!Pass", false, &[]).await;

        let Json(body) = list(State(app.users()), claims_for(&app, &admin))
            .await
            .unwrap();

        assert_eq!(
            body.iter().map(|user| user["email"].clone()).collect::<Vec<_>>(),
            vec![json!("admin@example.com"), json!("b@example.com")]
        );
        assert!(body.iter().all(|user| !user.contains_key("password")));
    }

    #[test_log::test(tokio::test)]
    async fn test_list_as_regular_user() {
        let app = TestApp::new();
        let user = app.user("a@example.com", "Str0ng!Pass", true, &[]).await;

        let err = list(State(app.users()), claims_for(&app, &user))
            .await
            .unwrap_err();

        assert_eq!(
            err.unwrap_custom(),
            (StatusCode::FORBIDDEN, FORBIDDEN_MESSAGE.to_string())
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_inactive_admin_is_forbidden() {
        let app = TestApp::new();
        let admin = app.user("admin@example.com", "Str0ng!Pass", false, &[ADMIN_ROLE]).await;

        let err = list(State(app.users()), claims_for(&app, &admin))
            .await
            .unwrap_err();

        assert_eq!(err.unwrap_custom().0, StatusCode::FORBIDDEN);
    }

    #[test_log::test(tokio::test)]
    async fn test_get_missing() {
        let app = TestApp::new();
        let admin = app.user("admin@example.com", "Str0ng!Pass", true, &[ADMIN_ROLE]).await;

        let err = get(State(app.users()), claims_for(&app, &admin), Path(admin.pk + 100))
            .await
            .unwrap_err();

        assert_eq!(
            err.unwrap_custom(),
            (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE.to_string())
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_patch_activates_and_grants_roles() {
        let app = TestApp::new();
        let admin = app.user("admin@example.com", "Str0ng!Pass", true, &[ADMIN_ROLE]).await;
        let user = app.user("b@example.com", "Str0ng!Pass", false, &[]).await;

        let body = json!({"is_active": true, "roles": ["staff", "admin", "staff"], "pk": 999});
        let Value::Object(body) = body else {
            unreachable!()
        };

        let Json(updated) = patch(
            State(app.users()),
            State(app.policy()),
            State(app.hasher.clone()),
            claims_for(&app, &admin),
            Path(user.pk),
            Json(body),
        )
        .await
        .unwrap();

        assert_eq!(updated["pk"], json!(user.pk));
        assert_eq!(updated["is_active"], json!(true));
        assert_eq!(updated["roles"], json!(["admin", "staff"]));
    }

    #[test_log::test(tokio::test)]
    async fn test_patch_to_taken_email() {
        let app = TestApp::new();
        let admin = app.user("admin@example.com", "Str0ng!Pass", true, &[ADMIN_ROLE]).await;
        let user = app.user("b@example.com", "Str0ng!Pass", true, &[]).await;

        let Value::Object(body) = json!({"email": "admin@example.com"}) else {
            unreachable!()
        };

        let err = patch(
            State(app.users()),
            State(app.policy()),
            State(app.hasher.clone()),
            claims_for(&app, &admin),
            Path(user.pk),
            Json(body),
        )
        .await
        .unwrap_err();

        assert!(err.unwrap_validation().get("email").is_some());
    }
}
