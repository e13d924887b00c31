use crate::bail;
use crate::error::Error;
use crate::extract::Json;
use crate::jwt::Claims;
use crate::password::Hasher;
use crate::profile;
use crate::projection::Projection;
use crate::state::Policy;
use crate::store::Users;
use crate::user::User;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Map, Value};

/// The token was fine, but the user it names is gone or deactivated.
pub static USER_GONE_MESSAGE: &str = "User not found";

/// The token's user, as long as they may still log in.
async fn active_user(users: &Users, claims: &Claims) -> Result<User, Error> {
    match users.find(claims.user_id).await? {
        Some(user) if user.is_active => Ok(user),
        _ => bail!(USER_GONE_MESSAGE, StatusCode::UNAUTHORIZED),
    }
}

#[tracing::instrument(skip_all, fields(user_id = claims.user_id))]
pub async fn get(
    State(users): State<Users>,
    claims: Claims,
) -> Result<Json<Map<String, Value>>, Error> {
    let user = active_user(&users, &claims).await?;

    Ok(Json(Projection::own_profile().represent(&user)))
}

#[tracing::instrument(skip_all, fields(user_id = claims.user_id))]
pub async fn patch(
    State(users): State<Users>,
    State(policy): State<Policy>,
    State(hasher): State<Hasher>,
    claims: Claims,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Map<String, Value>>, Error> {
    let current = active_user(&users, &claims).await?;

    let projection = Projection::own_profile();
    let changes = projection.parse(&body)?;

    let Some(user) = profile::update(
        users.as_ref(),
        policy.as_ref(),
        &hasher,
        current.pk,
        changes,
    )
    .await?
    else {
        bail!(USER_GONE_MESSAGE, StatusCode::UNAUTHORIZED)
    };

    Ok(Json(projection.represent(&user)))
}
