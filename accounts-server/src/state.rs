use crate::jwt::TokenIssuer;
use crate::password::Hasher;
use crate::password_reset::ResetSender;
use crate::policy::PasswordPolicy;
use crate::store::Users;
use axum::extract::FromRef;
use std::sync::Arc;

/// The password rules shared by every request.
pub type Policy = Arc<dyn PasswordPolicy>;

/// Where password reset tokens go.
pub type Resets = Arc<dyn ResetSender>;

/// Shared state needed by requests.
#[derive(Clone, Debug, FromRef)]
pub struct AppState {
    /// Where users are stored.
    users: Users,

    /// Rules new passwords must follow.
    policy: Policy,

    /// Hashes and verifies passwords.
    hasher: Hasher,

    /// Signs and verifies tokens.
    tokens: TokenIssuer,

    /// Delivers password reset tokens.
    resets: Resets,
}

impl AppState {
    /// Create a new state.
    pub fn new(
        users: Users,
        policy: Policy,
        hasher: Hasher,
        tokens: TokenIssuer,
        resets: Resets,
    ) -> Self {
        Self {
            users,
            policy,
            hasher,
            tokens,
            resets,
        }
    }
}
