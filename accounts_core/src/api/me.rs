/// Your own profile.
pub type Resp = super::Profile;

/// A partial update to your own profile. The server ignores `roles` and
/// `is_active` here.
pub type Req = super::profile::Changes;

/// Where the endpoint for your own profile lives.
pub const PATH: &str = "/api/v1/me";
