use serde::{Deserialize, Serialize};

/// Ask for a password reset token to be sent to the account's owner.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Req {
    /// The email the account was registered with.
    pub email: String,
}

/// The same no matter whether the account exists, so this can't be used to
/// find out who has one.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Resp {
    /// Something to show the user.
    pub detail: String,
}

/// Where to ask for a reset.
pub const PATH: &str = "/api/v1/password/forgot";
