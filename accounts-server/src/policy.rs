//! Password strength rules.
//!
//! The registration and profile flows only ever see [`PasswordPolicy`], so
//! deployments can swap in their own rules. [`Validators::standard`] is what
//! the server runs by default: a minimum length, a list of common passwords,
//! an all-digits check, and a check that the password doesn't look too much
//! like the user's own name or email.

use crate::validation::FieldErrors;
use core::fmt::Debug;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use thiserror::Error;

/// The user details a password must not resemble.
#[derive(Debug, Clone, Copy, Default)]
pub struct Attributes<'a> {
    /// Candidate email address
    pub email: &'a str,

    /// Candidate given name
    pub first_name: &'a str,

    /// Candidate family name
    pub last_name: &'a str,
}

/// Every reason a password was turned down.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("password rejected: {}", .0.join(" "))]
pub struct PolicyError(pub Vec<String>);

impl PolicyError {
    /// Report every message against one request field.
    pub fn on(self, field: &str) -> FieldErrors {
        let mut errors = FieldErrors::default();
        for message in self.0 {
            errors.add(field, message);
        }
        errors
    }
}

/// Decides whether a password is strong enough to store.
pub trait PasswordPolicy: Send + Sync + Debug {
    /// Accept the password or explain every reason it was rejected.
    ///
    /// ## Errors
    ///
    /// `PolicyError` with one message per failed rule.
    fn validate(&self, password: &str, attributes: &Attributes<'_>) -> Result<(), PolicyError>;
}

/// A single password rule.
pub trait Validator: Send + Sync + Debug {
    /// `Some(message)` if the password breaks this rule.
    fn check(&self, password: &str, attributes: &Attributes<'_>) -> Option<String>;
}

/// A policy made of independent rules. Every rule runs, and all of their
/// messages are reported together.
#[derive(Debug)]
pub struct Validators(Vec<Box<dyn Validator>>);

impl Validators {
    /// Build a policy from any set of rules.
    pub fn new(validators: Vec<Box<dyn Validator>>) -> Self {
        Self(validators)
    }

    /// The default rule set.
    pub fn standard(min_length: usize) -> Self {
        Self::new(vec![
            Box::new(UserAttributeSimilarity::default()),
            Box::new(MinimumLength(min_length)),
            Box::new(CommonPassword),
            Box::new(Numeric),
        ])
    }
}

impl PasswordPolicy for Validators {
    fn validate(&self, password: &str, attributes: &Attributes<'_>) -> Result<(), PolicyError> {
        let messages: Vec<String> = self
            .0
            .iter()
            .filter_map(|validator| validator.check(password, attributes))
            .collect();

        if messages.is_empty() {
            Ok(())
        } else {
            Err(PolicyError(messages))
        }
    }
}

/// Passwords must have at least this many characters.
#[derive(Debug, Clone, Copy)]
pub struct MinimumLength(pub usize);

impl Validator for MinimumLength {
    fn check(&self, password: &str, _: &Attributes<'_>) -> Option<String> {
        (password.chars().count() < self.0).then(|| {
            format!(
                "This password is too short. It must contain at least {} characters.",
                self.0
            )
        })
    }
}

/// Lower-cased passwords that show up at the top of every breach list.
static COMMON_PASSWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    include_str!("common_passwords.txt")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
});

/// Passwords must not be on the common passwords list.
#[derive(Debug, Clone, Copy)]
pub struct CommonPassword;

impl Validator for CommonPassword {
    fn check(&self, password: &str, _: &Attributes<'_>) -> Option<String> {
        COMMON_PASSWORDS
            .contains(password.trim().to_lowercase().as_str())
            .then(|| "This password is too common.".to_string())
    }
}

/// Passwords must not be made only of digits.
#[derive(Debug, Clone, Copy)]
pub struct Numeric;

impl Validator for Numeric {
    fn check(&self, password: &str, _: &Attributes<'_>) -> Option<String> {
        (!password.is_empty() && password.chars().all(char::is_numeric))
            .then(|| "This password is entirely numeric.".to_string())
    }
}

/// Splits attribute values into words (`a.b@example.com` into `a`, `b`,
/// `example`, `com`.)
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W+").expect("non-word regex is valid"));

/// Passwords must not be too similar to the user's own details.
#[derive(Debug, Clone, Copy)]
pub struct UserAttributeSimilarity {
    /// Ratios at or above this count as too similar.
    pub max_similarity: f64,
}

impl Default for UserAttributeSimilarity {
    fn default() -> Self {
        Self {
            max_similarity: 0.7,
        }
    }
}

impl Validator for UserAttributeSimilarity {
    fn check(&self, password: &str, attributes: &Attributes<'_>) -> Option<String> {
        let password = password.to_lowercase();

        let named = [
            ("first name", attributes.first_name),
            ("last name", attributes.last_name),
            ("email address", attributes.email),
        ];

        for (name, value) in named {
            if value.is_empty() {
                continue;
            }

            let value = value.to_lowercase();
            let parts = NON_WORD
                .split(&value)
                .chain(std::iter::once(value.as_str()));

            for part in parts {
                if self.much_shorter(&password, part) {
                    continue;
                }

                if quick_ratio(&password, part) >= self.max_similarity {
                    return Some(format!("The password is too similar to the {name}."));
                }
            }
        }

        None
    }
}

impl UserAttributeSimilarity {
    /// Short values can't meaningfully resemble long passwords, and comparing
    /// them anyway lets a one-letter name reject perfectly good passwords.
    #[expect(clippy::cast_precision_loss)]
    fn much_shorter(&self, password: &str, value: &str) -> bool {
        let password_len = password.chars().count();
        let value_len = value.chars().count();

        password_len >= 10 * value_len
            && (value_len as f64) < self.max_similarity / 2.0 * password_len as f64
    }
}

/// An upper bound on how similar two strings are: twice the number of
/// characters they share (counting repeats) over their combined length.
#[expect(clippy::cast_precision_loss)]
fn quick_ratio(a: &str, b: &str) -> f64 {
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 1.0;
    }

    let mut available: HashMap<char, usize> = HashMap::new();
    for c in b.chars() {
        *available.entry(c).or_default() += 1;
    }

    let mut matches = 0usize;
    for c in a.chars() {
        if let Some(count) = available.get_mut(&c) {
            if *count > 0 {
                *count -= 1;
                matches += 1;
            }
        }
    }

    2.0 * matches as f64 / total as f64
}
