use crate::bail;
use crate::error::Error;
use crate::extract::Json;
use crate::jwt::Claims;
use accounts_core::api::whoami::Resp;
use axum::http::StatusCode;

#[tracing::instrument(skip_all, fields(user_id = claims.user_id))]
pub async fn handler(claims: Claims) -> Result<Json<Resp>, Error> {
    let Some(email) = claims.email() else {
        bail!("Invalid token", StatusCode::UNAUTHORIZED)
    };

    Ok(Json(Resp {
        user_id: claims.user_id,
        email: email.to_string(),
    }))
}
