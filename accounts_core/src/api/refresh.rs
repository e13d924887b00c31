use serde::{Deserialize, Serialize};

/// The request to get a new access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Req {
    /// A refresh token from a previous token pair.
    pub refresh: String,
}

/// A new access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Resp {
    /// Short-lived JWT to use for authenticated requests.
    pub access: String,
}

/// Where the refresh endpoint lives.
pub const PATH: &str = "/api/v1/token/refresh";
