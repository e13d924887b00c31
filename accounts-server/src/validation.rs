use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Reported when a required field is missing or blank.
pub static REQUIRED: &str = "This field is required.";

/// Reported when an email is already taken, whether we notice it during
/// validation or only when the database refuses the insert.
pub static EMAIL_TAKEN: &str = "User with this email already exists";

/// Reported when an email doesn't look like an email.
pub static INVALID_EMAIL: &str = "Enter a valid email address.";

/// Reported when the password and its confirmation differ.
pub static PASSWORD_MISMATCH: &str = "Password fields don't match";

/// Longest email we accept.
pub const EMAIL_MAX_LENGTH: usize = 254;

/// Longest first or last name we accept.
pub const NAME_MAX_LENGTH: usize = 150;

/// A rough syntactic check. Deliverability is somebody else's problem.
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid"));

/// Validation failures, keyed by the name of the field they belong to.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// A single message on a single field.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    /// Attach a message to a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Merge another set of errors into this one.
    pub fn extend(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// The messages for one field, if it has any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Did anything fail?
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The names of every field with an error.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` if nothing failed, otherwise the errors.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Give up the inner map, e.g. to put it on the wire.
    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

/// Check the shape of an (already trimmed) email and report any problems on
/// the `email` field. Uniqueness is checked separately since it needs storage.
pub fn check_email(email: &str, errors: &mut FieldErrors) {
    if email.is_empty() {
        errors.add("email", REQUIRED);
    } else if email.chars().count() > EMAIL_MAX_LENGTH {
        errors.add("email", too_long(EMAIL_MAX_LENGTH));
    } else if !EMAIL.is_match(email) {
        errors.add("email", INVALID_EMAIL);
    }
}

/// Check that a name fits.
pub fn check_name(field: &str, name: &str, errors: &mut FieldErrors) {
    if name.chars().count() > NAME_MAX_LENGTH {
        errors.add(field, too_long(NAME_MAX_LENGTH));
    }
}

/// The message for a value over `max` characters.
fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}
