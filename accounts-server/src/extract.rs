//! Request extractors whose rejections use our error envelope.

use crate::error::Error;
use axum::extract::FromRequest;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// `axum::Json`, except that malformed bodies are rejected with [`Error`]
/// instead of plain text. Works as a response too.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}
