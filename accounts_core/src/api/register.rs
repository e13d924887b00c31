use serde::{Deserialize, Serialize};

/// The request to register a new account. Absent fields are read as empty
/// strings so the server can report every missing field at once.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Req {
    /// Email to use for contact and login.
    pub email: String,

    /// Plaintext password to use for login.
    pub password: String,

    /// Must match `password` exactly.
    pub password_confirm: String,

    /// Given name. Optional.
    pub first_name: String,

    /// Family name. Optional.
    pub last_name: String,
}

/// Result of registering a new account: the new, inactive profile.
pub type Resp = super::Profile;

/// Where the register endpoint lives.
pub const PATH: &str = "/api/v1/register";
