use serde::{Deserialize, Serialize};

/// How the server represents a user. There is deliberately no password
/// field: passwords can be written but are never read back.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Profile {
    /// The user's primary key
    pub pk: i64,

    /// Email to use for contact and login.
    pub email: String,

    /// Given name. May be empty.
    pub first_name: String,

    /// Family name. May be empty.
    pub last_name: String,

    /// Role identifiers, sorted and without duplicates.
    pub roles: Vec<String>,

    /// New accounts start inactive and can't log in until activated.
    pub is_active: bool,
}

/// A partial update to a profile. Fields left as `None` are not sent.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq, Clone)]
pub struct Changes {
    /// New email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// New plaintext password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// New given name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    /// New family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// New set of roles. Only administrators may change this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,

    /// Activate or deactivate. Only administrators may change this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}
