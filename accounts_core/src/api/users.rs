/// Every user, ordered by primary key.
pub type ListResp = Vec<super::Profile>;

/// A single user.
pub type Resp = super::Profile;

/// A partial update to any user's profile.
pub type Req = super::profile::Changes;

/// Where the user list lives.
pub const PATH: &str = "/api/v1/users";

/// Where a single user lives, with the primary key in the last segment.
pub const ITEM_PATH: &str = "/api/v1/users/:pk";

/// Make a path with the primary key in the correct segment
pub fn item_path(pk: i64) -> String {
    ITEM_PATH.replace(":pk", &pk.to_string())
}
