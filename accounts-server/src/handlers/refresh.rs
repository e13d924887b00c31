use crate::bail;
use crate::error::Error;
use crate::extract::Json;
use crate::jwt::{TokenIssuer, TokenType};
use crate::store::Users;
use accounts_core::api::refresh::{Req, Resp};
use axum::extract::State;
use axum::http::StatusCode;

pub static INVALID_REFRESH_MESSAGE: &str = "Token is invalid or expired";

#[tracing::instrument(skip_all)]
pub async fn handler(
    State(users): State<Users>,
    State(tokens): State<TokenIssuer>,
    Json(req): Json<Req>,
) -> Result<Json<Resp>, Error> {
    let claims = match tokens.decode(&req.refresh, TokenType::Refresh) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!(?err, "rejected refresh token");
            bail!(INVALID_REFRESH_MESSAGE, StatusCode::UNAUTHORIZED)
        }
    };

    // deactivating or deleting a user cuts off their refresh tokens too
    match users.find(claims.user_id).await? {
        Some(user) if user.is_active => {}
        _ => bail!(INVALID_REFRESH_MESSAGE, StatusCode::UNAUTHORIZED),
    }

    Ok(Json(Resp {
        access: tokens.refresh(&claims)?,
    }))
}
