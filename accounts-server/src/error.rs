use crate::store::StoreError;
use crate::validation::{FieldErrors, EMAIL_TAKEN};
use accounts_core::api::error::{ErrorResp, FieldMessages};
use argon2::password_hash;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use std::sync::LazyLock;

/// How axum describes a body that parsed as JSON but didn't fit the type:
/// a fixed prefix, then the path to the bad value (if there is one), then
/// serde's message with its position.
static DATA_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[^:]*: (?P<field>[A-Za-z_][A-Za-z0-9_]*)(?:[.\[][^:]*)?: (?P<message>.*?)(?: at line \d+ column \d+)?$",
    )
    .expect("data error regex is valid")
});

/// An error from the API
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Something went wrong which we should log but not expose to clients.
    Internal,

    /// Some handler-specific error
    Custom(StatusCode, String),

    /// The request failed validation on one or more named fields.
    Validation(FieldErrors),
}

/// Return an error from a handler-specific error type.
#[macro_export]
macro_rules! bail {
    ($message:expr) => {
        return Err($crate::error::Error::custom($message))
    };
    ($message:expr, $status:expr) => {
        return Err($crate::error::Error::custom_with_status($message, $status))
    };
}

/// `bail!` conditionally.
#[macro_export]
macro_rules! bail_if {
    ($cond:expr, $message:expr) => {
        if $cond {
            $crate::bail!($message);
        }
    };
    ($cond:expr, $message:expr, $status:expr) => {
        if $cond {
            $crate::bail!($message, $status);
        }
    };
}

impl Error {
    /// Construct a custom error
    pub fn custom(message: &str) -> Self {
        Self::custom_with_status(message, StatusCode::BAD_REQUEST)
    }

    /// Construct a custom error with a specific status code
    pub fn custom_with_status(message: &str, status: StatusCode) -> Self {
        Self::Custom(status, message.to_string())
    }

    /// Unwrap a handler-specific error
    #[cfg(test)]
    pub fn unwrap_custom(self) -> (StatusCode, String) {
        match self {
            Self::Custom(status_code, message) => (status_code, message),
            other => panic!("called `Error::unwrap_custom` on {other:?}"),
        }
    }

    /// Unwrap a validation error
    #[cfg(test)]
    pub fn unwrap_validation(self) -> FieldErrors {
        match self {
            Self::Validation(errors) => errors,
            other => panic!("called `Error::unwrap_validation` on {other:?}"),
        }
    }
}

impl From<FieldErrors> for Error {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            // the only unique column is email, so this is always about email
            StoreError::Conflict => Self::Validation(FieldErrors::single("email", EMAIL_TAKEN)),
            StoreError::Database(err) => {
                tracing::error!(?err, "sqlx error");
                Self::Internal
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        let text = rejection.body_text();
        tracing::debug!(%text, "rejected request body");

        match rejection {
            JsonRejection::JsonDataError(_) => match DATA_ERROR.captures(&text) {
                Some(captures) => {
                    Self::Validation(FieldErrors::single(&captures["field"], &captures["message"]))
                }
                None => Self::Custom(StatusCode::BAD_REQUEST, text),
            },
            JsonRejection::JsonSyntaxError(_) => Self::Custom(StatusCode::BAD_REQUEST, text),
            other => Self::Custom(other.status(), text),
        }
    }
}

impl From<password_hash::Error> for Error {
    fn from(err: password_hash::Error) -> Self {
        tracing::error!(?err, "password hashing error");
        Self::Internal
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::error!(?err, "JWT error");
        Self::Internal
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResp {
                    error: "Internal server error".to_string(),
                    fields: FieldMessages::new(),
                },
            ),
            Self::Custom(status_code, message) => (
                status_code,
                ErrorResp {
                    error: message,
                    fields: FieldMessages::new(),
                },
            ),
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorResp {
                    error: "Invalid input".to_string(),
                    fields: errors.into_inner(),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}
