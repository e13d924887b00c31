use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Registration, login, and profiles for the accounts API.
#[derive(Debug, Parser)]
#[clap(version, about)]
pub struct Cli {
    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Things the binary can do.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeConfig),

    /// Write a new random token signing key to a file
    GenerateSecret(SecretConfig),
}

#[derive(Debug, Args)]
pub struct ServeConfig {
    #[clap(long, env, default_value = "127.0.0.1:3000")]
    pub address: String,

    /// Request body size limit, in bytes
    #[clap(long, env, default_value = "5242880")]
    pub body_limit: usize,

    /// Request timeout, in seconds
    #[clap(long, env, default_value = "5", value_parser = duration_parser)]
    pub request_timeout: Duration,

    /// Postgres connection string. Without one, users only live as long as
    /// the process.
    #[clap(long, env, hide_env_values = true)]
    pub database_url: Option<String>,

    /// Most connections to hold open to Postgres
    #[clap(long, env, default_value = "5")]
    pub max_connections: u32,

    /// Token signing key
    #[clap(
        long,
        env,
        hide_env_values = true,
        required_unless_present = "jwt_secret_file",
        conflicts_with = "jwt_secret_file"
    )]
    pub jwt_secret: Option<String>,

    /// File holding the token signing key, e.g. from `generate-secret`
    #[clap(long, env)]
    pub jwt_secret_file: Option<PathBuf>,

    /// How long access tokens last, in seconds
    #[clap(long, env, default_value = "300", value_parser = lifetime_parser)]
    pub access_token_lifetime: Duration,

    /// How long refresh tokens last, in seconds
    #[clap(long, env, default_value = "86400", value_parser = lifetime_parser)]
    pub refresh_token_lifetime: Duration,

    /// How long password reset tokens last, in seconds
    #[clap(long, env, default_value = "3600", value_parser = lifetime_parser)]
    pub password_reset_lifetime: Duration,

    /// Shortest password anyone may set
    #[clap(long, env, default_value = "8")]
    pub min_password_length: usize,
}

impl ServeConfig {
    /// The signing key, read from the file if that's how it was configured.
    /// Trailing whitespace in the file is ignored.
    ///
    /// ## Errors
    ///
    /// If the file can't be read.
    pub async fn jwt_secret(&self) -> std::io::Result<Vec<u8>> {
        match (&self.jwt_secret, &self.jwt_secret_file) {
            (Some(secret), _) => Ok(secret.as_bytes().to_vec()),
            (None, Some(path)) => {
                let contents = tokio::fs::read_to_string(path).await?;
                Ok(contents.trim_end().as_bytes().to_vec())
            }
            (None, None) => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no JWT secret configured",
            )),
        }
    }
}

#[derive(Debug, Args)]
pub struct SecretConfig {
    /// Where to write the key
    #[clap(long)]
    pub path: PathBuf,

    /// How many characters to generate
    #[clap(long, default_value = "50", value_parser = clap::value_parser!(u16).range(16..128))]
    pub length: u16,

    /// Overwrite an existing key file
    #[clap(long)]
    pub force: bool,
}

fn duration_parser(s: &str) -> Result<Duration, std::num::ParseIntError> {
    s.parse().map(Duration::from_secs)
}

/// Longest a token may live: ten years.
const MAX_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Token lifetimes, in seconds. Bounded so expiry times can't overflow.
fn lifetime_parser(s: &str) -> Result<Duration, String> {
    let secs: u64 = s.parse().map_err(|err: std::num::ParseIntError| err.to_string())?;

    if !(1..=MAX_LIFETIME_SECS).contains(&secs) {
        return Err(format!("must be between 1 and {MAX_LIFETIME_SECS} seconds"));
    }

    Ok(Duration::from_secs(secs))
}
