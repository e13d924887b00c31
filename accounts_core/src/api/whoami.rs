use serde::{Deserialize, Serialize};

/// Result of calling whoami. Everything here comes from the token's claims.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resp {
    /// The primary key of the currently logged-in user.
    pub user_id: i64,

    /// The email address of the currently logged-in user.
    pub email: String,
}

/// Where the whoami endpoint lives.
pub const PATH: &str = "/api/v1/whoami";
