use crate::config::SecretConfig;
use rand::{rngs::OsRng, Rng};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// ASCII letters, digits, and punctuation.
static CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz\
    ABCDEFGHIJKLMNOPQRSTUVWXYZ\
    0123456789\
    !\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Things that stop us writing a key.
#[derive(Debug, Error)]
pub enum SecretError {
    /// We won't clobber an existing key unless asked to.
    #[error("{0} already exists, use --force to overwrite it")]
    Exists(PathBuf),

    /// The filesystem said no.
    #[error("unable to write {path}: {source}")]
    Io {
        /// The file we tried to write
        path: PathBuf,

        /// What went wrong
        source: io::Error,
    },
}

/// A random key of `length` characters drawn from the OS RNG.
pub fn generate(length: usize) -> String {
    (0..length)
        .map(|_| char::from(CHARSET[OsRng.gen_range(0..CHARSET.len())]))
        .collect()
}

/// Generate a key and write it where the config says.
///
/// ## Errors
///
/// If the file exists and `force` is off, or if writing fails.
pub async fn write(config: &SecretConfig) -> Result<(), SecretError> {
    let io_error = |source| SecretError::Io {
        path: config.path.clone(),
        source,
    };

    if !config.force && tokio::fs::try_exists(&config.path).await.map_err(io_error)? {
        return Err(SecretError::Exists(config.path.clone()));
    }

    tokio::fs::write(&config.path, generate(config.length.into()))
        .await
        .map_err(io_error)?;

    tracing::info!(path = ?config.path, "wrote new secret key");

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn config(path: PathBuf, force: bool) -> SecretConfig {
        SecretConfig {
            path,
            length: 50,
            force,
        }
    }

    #[test]
    fn generate_uses_only_the_charset() {
        let key = generate(128);

        assert_eq!(key.len(), 128);
        assert!(key.bytes().all(|byte| CHARSET.contains(&byte)));
    }

    #[test]
    fn charset_has_no_whitespace() {
        assert!(!CHARSET.iter().any(u8::is_ascii_whitespace));
        assert_eq!(CHARSET.len(), 26 + 26 + 10 + 32);
    }

    #[test]
    fn keys_differ() {
        assert_ne!(generate(50), generate(50));
    }

    #[test_log::test(tokio::test)]
    async fn writes_a_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");

        write(&config(path.clone(), false)).await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap().len(), 50);
    }

    #[test_log::test(tokio::test)]
    async fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        tokio::fs::write(&path, "keep me").await.unwrap();

        let err = write(&config(path.clone(), false)).await.unwrap_err();

        assert!(matches!(err, SecretError::Exists(_)));
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "keep me");
    }

    #[test_log::test(tokio::test)]
    async fn overwrites_with_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        tokio::fs::write(&path, "replace me").await.unwrap();

        write(&config(path.clone(), true)).await.unwrap();

        assert_ne!(
            tokio::fs::read_to_string(&path).await.unwrap(),
            "replace me"
        );
    }
}
