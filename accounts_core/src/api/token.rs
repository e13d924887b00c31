use serde::{Deserialize, Serialize};

/// The request to obtain a token pair.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Req {
    /// Email the account was registered with.
    pub email: String,

    /// Plaintext password.
    pub password: String,
}

/// A freshly minted pair of tokens.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Resp {
    /// Short-lived JWT to use for authenticated requests.
    pub access: String,

    /// Longer-lived JWT to trade for new access tokens.
    pub refresh: String,
}

/// Where the token endpoint lives.
pub const PATH: &str = "/api/v1/token";
