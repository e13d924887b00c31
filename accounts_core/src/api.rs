/// Things that can go wrong in the API
pub mod error;
pub use error::Error;

/// A client for the whole API
pub mod client;
pub use client::Client;

/// The public representation of a user
pub mod profile;
pub use profile::Profile;

/// Register a new (inactive) account
pub mod register;

/// Obtain a pair of tokens by email and password
pub mod token;

/// Trade a refresh token for a new access token
pub mod refresh;

/// Check what the server thinks of your access token
pub mod whoami;

/// Read and update your own profile
pub mod me;

/// Administer every user's profile
pub mod users;

/// Ask for a password reset token
pub mod forgot_password;

/// Trade a reset token for a new password
pub mod reset_password;
