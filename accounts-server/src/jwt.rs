//! Signed tokens.
//!
//! Tokens are built in two steps: [`TokenIssuer::mint_base_token`] fills in
//! the standard claims for a user, then [`with_email`] adds the user's email
//! so consumers don't have to look it up. [`TokenIssuer::issue_pair`] signs a
//! refresh token built that way and derives the access token from it.
//!
//! Password reset tokens are signed with the server secret plus the user's
//! current password hash, so they stop working as soon as the password
//! changes.

use crate::user::User;
use accounts_core::api::{error::ErrorResp, error::FieldMessages, token};
use axum::extract::FromRef;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, RequestPartsExt};
use axum::{async_trait, extract::FromRequestParts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::{Duration, Utc};
use core::fmt::{self, Debug, Formatter};
use jsonwebtoken::{decode, encode, errors, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// The claim we add on top of the standard ones.
pub static EMAIL_CLAIM: &str = "email";

/// What a token may be used for.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Authenticates requests. Short-lived.
    Access,

    /// Can only be traded for new access tokens. Longer-lived.
    Refresh,

    /// Can only be traded for a new password, once.
    PasswordReset,
}

/// What a token says.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// What the token may be used for
    pub token_type: TokenType,

    /// Issued at, in seconds since the epoch
    pub iat: i64,

    /// Expires at, in seconds since the epoch
    pub exp: i64,

    /// Unique ID
    pub jti: String,

    /// Primary key of the user the token was issued to
    pub user_id: i64,

    /// Anything beyond the standard claims, e.g. `email`. Carried over when
    /// an access token is derived from a refresh token.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// The subject's email, if the token was augmented with one.
    pub fn email(&self) -> Option<&str> {
        self.extra.get(EMAIL_CLAIM).and_then(Value::as_str)
    }
}

/// Add the `email` claim. Nothing else changes.
pub fn with_email(mut claims: Claims, email: &str) -> Claims {
    claims
        .extra
        .insert(EMAIL_CLAIM.to_string(), Value::String(email.to_string()));
    claims
}

/// Why a presented token was turned down.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, expired, malformed...
    #[error("invalid token: {0}")]
    Invalid(#[from] errors::Error),

    /// A reset token for an account whose email has changed since.
    #[error("token was issued for a different email")]
    Stale,

    /// A perfectly good token, used for the wrong thing.
    #[error("expected a {expected:?} token but got a {found:?} token")]
    WrongType {
        /// What the caller needed
        expected: TokenType,

        /// What the token says it is
        found: TokenType,
    },
}

/// Mints, signs, and verifies tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    /// The raw secret, for deriving per-user reset keys.
    secret: Arc<[u8]>,

    /// Key for encoding new JWTs.
    encoding_key: EncodingKey,

    /// Key for verifying existing JWTs.
    decoding_key: DecodingKey,

    /// How long access tokens last.
    access_lifetime: Duration,

    /// How long refresh tokens last.
    refresh_lifetime: Duration,

    /// How long password reset tokens last.
    reset_lifetime: Duration,
}

impl TokenIssuer {
    /// Create an issuer signing with HS256 and the given secret.
    pub fn new(secret: &[u8], access_lifetime: Duration, refresh_lifetime: Duration) -> Self {
        Self {
            secret: Arc::from(secret),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_lifetime,
            refresh_lifetime,
            reset_lifetime: Duration::hours(1),
        }
    }

    /// Change how long password reset tokens last. The default is an hour.
    #[must_use]
    pub fn with_reset_lifetime(mut self, reset_lifetime: Duration) -> Self {
        self.reset_lifetime = reset_lifetime;
        self
    }

    /// The standard claims for a fresh token of the given type.
    pub fn mint_base_token(&self, user: &User, token_type: TokenType) -> Claims {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime,
            TokenType::Refresh => self.refresh_lifetime,
            TokenType::PasswordReset => self.reset_lifetime,
        };

        Claims {
            token_type,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
            user_id: user.pk,
            extra: Map::new(),
        }
    }

    /// The claims both tokens in a pair are based on: a refresh token
    /// carrying the user's email.
    pub fn claims_token(&self, user: &User) -> Claims {
        with_email(self.mint_base_token(user, TokenType::Refresh), &user.email)
    }

    /// An access token for the same subject as `refresh`. Extra claims are
    /// copied; the type, times, and ID are fresh.
    pub fn access_from(&self, refresh: &Claims) -> Claims {
        let now = Utc::now();

        Claims {
            token_type: TokenType::Access,
            iat: now.timestamp(),
            exp: (now + self.access_lifetime).timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
            user_id: refresh.user_id,
            extra: refresh.extra.clone(),
        }
    }

    /// Sign a new token pair for a user who has already authenticated.
    ///
    /// ## Errors
    ///
    /// Only if signing fails.
    pub fn issue_pair(&self, user: &User) -> Result<token::Resp, errors::Error> {
        let refresh = self.claims_token(user);
        let access = self.access_from(&refresh);

        Ok(token::Resp {
            access: self.sign(&access)?,
            refresh: self.sign(&refresh)?,
        })
    }

    /// Sign a new access token derived from already-verified refresh claims.
    ///
    /// ## Errors
    ///
    /// Only if signing fails.
    pub fn refresh(&self, refresh: &Claims) -> Result<String, errors::Error> {
        self.sign(&self.access_from(refresh))
    }

    /// Sign a set of claims.
    ///
    /// ## Errors
    ///
    /// Only if signing fails.
    pub fn sign(&self, claims: &Claims) -> Result<String, errors::Error> {
        encode(&Header::default(), claims, &self.encoding_key)
    }

    /// Verify a token's signature, expiry, and type.
    ///
    /// ## Errors
    ///
    /// `TokenError` if any of those checks fail.
    pub fn decode(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        Self::decode_with(token, &self.decoding_key, &Validation::default(), expected)
    }

    /// Sign a password reset token for a user. It carries their email and is
    /// only valid while their password hash stays the same.
    ///
    /// ## Errors
    ///
    /// Only if signing fails.
    pub fn password_reset_token(&self, user: &User) -> Result<String, errors::Error> {
        let claims = with_email(
            self.mint_base_token(user, TokenType::PasswordReset),
            &user.email,
        );

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.reset_key(user)),
        )
    }

    /// Who an unexpired reset token claims to be for. The signature is not
    /// checked here; it can't be until we have the user's password hash, so
    /// follow this with [`TokenIssuer::decode_reset`].
    ///
    /// ## Errors
    ///
    /// `TokenError` if the token is malformed, expired, or not a reset token.
    pub fn reset_subject(&self, token: &str) -> Result<i64, TokenError> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();

        let claims = Self::decode_with(
            token,
            &DecodingKey::from_secret(&[]),
            &validation,
            TokenType::PasswordReset,
        )?;

        Ok(claims.user_id)
    }

    /// Fully verify a reset token against the user it claims to be for.
    ///
    /// ## Errors
    ///
    /// `TokenError` if the signature doesn't match (including because the
    /// password has changed since), the token has expired, it isn't a reset
    /// token, or the user's email has changed.
    pub fn decode_reset(&self, token: &str, user: &User) -> Result<Claims, TokenError> {
        let claims = Self::decode_with(
            token,
            &DecodingKey::from_secret(&self.reset_key(user)),
            &Validation::default(),
            TokenType::PasswordReset,
        )?;

        if claims.user_id != user.pk || claims.email() != Some(user.email.as_str()) {
            return Err(TokenError::Stale);
        }

        Ok(claims)
    }

    /// The key reset tokens for this user are signed with.
    fn reset_key(&self, user: &User) -> Vec<u8> {
        let mut key = self.secret.to_vec();
        key.extend_from_slice(user.password_hash.as_str().as_bytes());
        key
    }

    /// Decode and check the type.
    fn decode_with(
        token: &str,
        key: &DecodingKey,
        validation: &Validation,
        expected: TokenType,
    ) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, key, validation)?.claims;

        if claims.token_type != expected {
            return Err(TokenError::WrongType {
                expected,
                found: claims.token_type,
            });
        }

        Ok(claims)
    }
}

impl Debug for TokenIssuer {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .field("reset_lifetime", &self.reset_lifetime)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Claims
where
    TokenIssuer: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;

        TokenIssuer::from_ref(state)
            .decode(bearer.token(), TokenType::Access)
            .map_err(|err| {
                tracing::trace!(?err, "error decoding token");
                AuthError::InvalidToken
            })
    }
}

/// Why a request couldn't be authenticated.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// Missing, malformed, expired, or not an access token.
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
        };
        let body = Json(ErrorResp {
            error: error_message.to_string(),
            fields: FieldMessages::new(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
impl TokenIssuer {
    /// An issuer with a fixed secret and the default lifetimes.
    pub fn test() -> Self {
        Self::new(b"test secret", Duration::minutes(5), Duration::days(1))
    }
}
