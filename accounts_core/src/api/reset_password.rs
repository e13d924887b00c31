use serde::{Deserialize, Serialize};

/// Set a new password using a reset token.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Req {
    /// The token from the reset message.
    pub token: String,

    /// The new password.
    pub password: String,

    /// The new password again.
    pub password_confirm: String,
}

/// The password was changed. Log in again with the new one.
pub type Resp = super::forgot_password::Resp;

/// Where to reset a password.
pub const PATH: &str = "/api/v1/password/reset";
