use crate::handlers;
use crate::state::AppState;
use accounts_core::api::{
    forgot_password, me, refresh, register, reset_password, token, users, whoami,
};
use axum::routing::{get, post};
use axum::Router;

/// Every endpoint the server answers, without middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::handler))
        .route(register::PATH, post(handlers::register::handler))
        .route(token::PATH, post(handlers::token::handler))
        .route(refresh::PATH, post(handlers::refresh::handler))
        .route(whoami::PATH, get(handlers::whoami::handler))
        .route(
            me::PATH,
            get(handlers::me::get).patch(handlers::me::patch),
        )
        .route(forgot_password::PATH, post(handlers::password::forgot))
        .route(reset_password::PATH, post(handlers::password::reset))
        .route(users::PATH, get(handlers::users::list))
        .route(
            users::ITEM_PATH,
            get(handlers::users::get).patch(handlers::users::patch),
        )
        .with_state(state)
}
