use crate::error::Error;
use crate::extract::Json;
use crate::jwt::TokenIssuer;
use crate::password::Hasher;
use crate::password_reset::{self, FORGOT_MESSAGE, RESET_MESSAGE};
use crate::state::{Policy, Resets};
use crate::store::Users;
use accounts_core::api::{forgot_password, reset_password};
use axum::extract::State;

#[tracing::instrument(skip_all)]
pub async fn forgot(
    State(users): State<Users>,
    State(tokens): State<TokenIssuer>,
    State(resets): State<Resets>,
    Json(req): Json<forgot_password::Req>,
) -> Result<Json<forgot_password::Resp>, Error> {
    password_reset::forgot(users.as_ref(), &tokens, resets.as_ref(), &req.email).await?;

    Ok(Json(forgot_password::Resp {
        detail: FORGOT_MESSAGE.to_string(),
    }))
}

#[tracing::instrument(skip_all)]
pub async fn reset(
    State(users): State<Users>,
    State(policy): State<Policy>,
    State(hasher): State<Hasher>,
    State(tokens): State<TokenIssuer>,
    Json(req): Json<reset_password::Req>,
) -> Result<Json<reset_password::Resp>, Error> {
    password_reset::reset(users.as_ref(), policy.as_ref(), &hasher, &tokens, req).await?;

    Ok(Json(reset_password::Resp {
        detail: RESET_MESSAGE.to_string(),
    }))
}
