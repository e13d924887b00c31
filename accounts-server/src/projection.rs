//! Which user fields go over the wire, in which direction.
//!
//! A [`Projection`] is configured with a plain [`ProjectionConfig`]: the
//! fields it knows about plus per-field options. Reads emit every known field
//! that isn't write-only; writes accept every known field that isn't
//! read-only. The password never has a readable value, so no configuration can
//! leak it.

use crate::user::{normalize_roles, User};
use crate::validation::{self, FieldErrors};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Reported when a written field is present but empty and must not be.
pub static BLANK: &str = "This field may not be blank.";

/// Reported when a written field should be a string.
static NOT_A_STRING: &str = "Not a valid string.";

/// Reported when a written field should be a boolean.
static NOT_A_BOOLEAN: &str = "Must be a valid boolean.";

/// Reported when a written field should be a list.
static NOT_A_LIST: &str = "Expected a list of items.";

/// A user field that can appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Storage key. Never writable.
    Pk,
    /// Login email, unique across users.
    Email,
    /// Plaintext on write; never read back.
    Password,
    /// Given name.
    FirstName,
    /// Family name.
    LastName,
    /// Role names, compared case-insensitively.
    Roles,
    /// Whether the user may log in.
    IsActive,
}

impl Field {
    /// The field's name in JSON.
    pub fn name(self) -> &'static str {
        match self {
            Self::Pk => "pk",
            Self::Email => "email",
            Self::Password => "password",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Roles => "roles",
            Self::IsActive => "is_active",
        }
    }

    /// The field's value for a user, if it has a readable one.
    fn read(self, user: &User) -> Option<Value> {
        match self {
            Self::Pk => Some(user.pk.into()),
            Self::Email => Some(user.email.clone().into()),
            Self::Password => None,
            Self::FirstName => Some(user.first_name.clone().into()),
            Self::LastName => Some(user.last_name.clone().into()),
            Self::Roles => Some(user.roles.clone().into()),
            Self::IsActive => Some(user.is_active.into()),
        }
    }
}

/// Per-field options. Fields without options are readable and writable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldOptions {
    /// Emitted on read, ignored on write.
    pub read_only: bool,

    /// Accepted on write, never emitted on read.
    pub write_only: bool,
}

impl FieldOptions {
    /// Emitted on read, ignored on write.
    pub const READ_ONLY: Self = Self {
        read_only: true,
        write_only: false,
    };

    /// Accepted on write, never emitted on read.
    pub const WRITE_ONLY: Self = Self {
        read_only: false,
        write_only: true,
    };
}

/// The allow-list and options a projection is built from.
#[derive(Debug, Clone, Default)]
pub struct ProjectionConfig {
    /// Fields the projection knows about, in output order.
    pub fields: Vec<Field>,

    /// Options for individual fields.
    pub extra: HashMap<Field, FieldOptions>,
}

/// Profile changes parsed from a write. The password is still plaintext.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    /// New email, trimmed and syntactically valid.
    pub email: Option<String>,

    /// New plaintext password. Not yet checked against the password policy.
    pub password: Option<String>,

    /// New given name
    pub first_name: Option<String>,

    /// New family name
    pub last_name: Option<String>,

    /// New roles, sorted and deduplicated.
    pub roles: Option<Vec<String>>,

    /// New activation state
    pub is_active: Option<bool>,
}

/// A two-way mapping between users and JSON objects.
#[derive(Debug, Clone)]
pub struct Projection {
    /// What to expose and how.
    config: ProjectionConfig,
}

/// Every field a profile shows.
const PROFILE_FIELDS: [Field; 7] = [
    Field::Pk,
    Field::Email,
    Field::Password,
    Field::FirstName,
    Field::LastName,
    Field::Roles,
    Field::IsActive,
];

impl Projection {
    /// Build a projection from a configuration.
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    /// The full profile, as administrators see and edit it.
    pub fn profile() -> Self {
        Self::new(ProjectionConfig {
            fields: PROFILE_FIELDS.to_vec(),
            extra: HashMap::from([
                (Field::Pk, FieldOptions::READ_ONLY),
                (Field::Password, FieldOptions::WRITE_ONLY),
            ]),
        })
    }

    /// The profile as its owner sees it: the same fields, but roles and
    /// activation can only be read.
    pub fn own_profile() -> Self {
        Self::new(ProjectionConfig {
            fields: PROFILE_FIELDS.to_vec(),
            extra: HashMap::from([
                (Field::Pk, FieldOptions::READ_ONLY),
                (Field::Password, FieldOptions::WRITE_ONLY),
                (Field::Roles, FieldOptions::READ_ONLY),
                (Field::IsActive, FieldOptions::READ_ONLY),
            ]),
        })
    }

    /// The options configured for a field.
    fn options(&self, field: Field) -> FieldOptions {
        self.config.extra.get(&field).copied().unwrap_or_default()
    }

    /// Fields emitted on read.
    pub fn readable(&self) -> impl Iterator<Item = Field> + '_ {
        self.config
            .fields
            .iter()
            .copied()
            .filter(|field| !self.options(*field).write_only)
    }

    /// Fields accepted on write.
    pub fn writable(&self) -> impl Iterator<Item = Field> + '_ {
        self.config
            .fields
            .iter()
            .copied()
            .filter(|field| !self.options(*field).read_only)
    }

    /// Represent a user as a JSON object.
    pub fn represent(&self, user: &User) -> Map<String, Value> {
        self.readable()
            .filter_map(|field| field.read(user).map(|value| (field.name().to_string(), value)))
            .collect()
    }

    /// Read changes out of a JSON object. Unknown and read-only keys are
    /// ignored.
    ///
    /// ## Errors
    ///
    /// Every writable field with a value of the wrong type or shape.
    pub fn parse(&self, input: &Map<String, Value>) -> Result<ProfileChanges, FieldErrors> {
        let mut changes = ProfileChanges::default();
        let mut errors = FieldErrors::default();

        for field in self.writable() {
            let Some(value) = input.get(field.name()) else {
                continue;
            };

            match field {
                Field::Pk => {}
                Field::Email => {
                    if let Some(email) = string(field, value, &mut errors) {
                        let email = email.trim();
                        validation::check_email(email, &mut errors);
                        changes.email = Some(email.to_string());
                    }
                }
                Field::Password => {
                    if let Some(password) = string(field, value, &mut errors) {
                        if password.is_empty() {
                            errors.add(field.name(), BLANK);
                        }
                        changes.password = Some(password.to_string());
                    }
                }
                Field::FirstName => {
                    if let Some(name) = string(field, value, &mut errors) {
                        validation::check_name(field.name(), name, &mut errors);
                        changes.first_name = Some(name.to_string());
                    }
                }
                Field::LastName => {
                    if let Some(name) = string(field, value, &mut errors) {
                        validation::check_name(field.name(), name, &mut errors);
                        changes.last_name = Some(name.to_string());
                    }
                }
                Field::Roles => changes.roles = roles(field, value, &mut errors),
                Field::IsActive => match value {
                    Value::Bool(is_active) => changes.is_active = Some(*is_active),
                    _ => errors.add(field.name(), NOT_A_BOOLEAN),
                },
            }
        }

        errors.into_result()?;

        Ok(changes)
    }
}

/// A string value, or an error on the field.
fn string<'a>(field: Field, value: &'a Value, errors: &mut FieldErrors) -> Option<&'a str> {
    let string = value.as_str();
    if string.is_none() {
        errors.add(field.name(), NOT_A_STRING);
    }
    string
}

/// A list of role identifiers, or an error on the field.
fn roles(field: Field, value: &Value, errors: &mut FieldErrors) -> Option<Vec<String>> {
    let Value::Array(items) = value else {
        errors.add(field.name(), NOT_A_LIST);
        return None;
    };

    let mut roles = Vec::with_capacity(items.len());
    for item in items {
        match item.as_str() {
            Some(role) if !role.trim().is_empty() => roles.push(role.trim().to_string()),
            Some(_) => {
                errors.add(field.name(), BLANK);
                return None;
            }
            None => {
                errors.add(field.name(), NOT_A_STRING);
                return None;
            }
        }
    }

    Some(normalize_roles(roles))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::user::PasswordHash;
    use proptest::prelude::*;
    use serde_json::json;

    fn user() -> User {
        User {
            pk: 3,
            email: "a@example.com".to_string(),
            password_hash: PasswordHash::new("$argon2id$hash".to_string()),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            roles: vec!["admin".to_string()],
            is_active: false,
        }
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn profile_reads_every_field_but_password() {
        assert_eq!(
            Value::Object(Projection::profile().represent(&user())),
            json!({
                "pk": 3,
                "email": "a@example.com",
                "first_name": "A",
                "last_name": "B",
                "roles": ["admin"],
                "is_active": false,
            })
        );
    }

    #[test]
    fn password_is_unreadable_even_without_write_only() {
        let projection = Projection::new(ProjectionConfig {
            fields: vec![Field::Email, Field::Password],
            extra: HashMap::new(),
        });

        let represented = projection.represent(&user());

        assert_eq!(Value::Object(represented), json!({"email": "a@example.com"}));
    }

    #[test]
    fn fields_outside_the_allow_list_are_ignored() {
        let projection = Projection::new(ProjectionConfig {
            fields: vec![Field::FirstName],
            extra: HashMap::new(),
        });

        assert_eq!(
            Value::Object(projection.represent(&user())),
            json!({"first_name": "A"})
        );
        assert_eq!(
            projection
                .parse(&object(json!({"first_name": "C", "last_name": "D"})))
                .unwrap(),
            ProfileChanges {
                first_name: Some("C".to_string()),
                ..ProfileChanges::default()
            }
        );
    }

    #[test]
    fn profile_accepts_every_writable_field() {
        let changes = Projection::profile()
            .parse(&object(json!({
                "pk": 99,
                "email": " b@example.com ",
                "password": "Str0ng!Pass",
                "first_name": "C",
                "last_name": "D",
                "roles": ["viewer", "admin", "viewer"],
                "is_active": true,
                "date_joined": "ignored",
            })))
            .unwrap();

        assert_eq!(
            changes,
            ProfileChanges {
                email: Some("b@example.com".to_string()),
                password: Some("Str0ng!Pass".to_string()),
                first_name: Some("C".to_string()),
                last_name: Some("D".to_string()),
                roles: Some(vec!["admin".to_string(), "viewer".to_string()]),
                is_active: Some(true),
            }
        );
    }

    #[test]
    fn own_profile_ignores_roles_and_activation() {
        let changes = Projection::own_profile()
            .parse(&object(json!({
                "first_name": "C",
                "roles": ["admin"],
                "is_active": true,
            })))
            .unwrap();

        assert_eq!(
            changes,
            ProfileChanges {
                first_name: Some("C".to_string()),
                ..ProfileChanges::default()
            }
        );
    }

    #[test]
    fn parse_reports_every_bad_field() {
        let errors = Projection::profile()
            .parse(&object(json!({
                "email": "nope",
                "password": "",
                "first_name": 1,
                "roles": "admin",
                "is_active": "yes",
            })))
            .unwrap_err();

        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["email", "first_name", "is_active", "password", "roles"]
        );
        assert_eq!(errors.get("first_name"), Some(&[NOT_A_STRING.to_string()][..]));
        assert_eq!(errors.get("is_active"), Some(&[NOT_A_BOOLEAN.to_string()][..]));
        assert_eq!(errors.get("roles"), Some(&[NOT_A_LIST.to_string()][..]));
        assert_eq!(errors.get("password"), Some(&[BLANK.to_string()][..]));
    }

    #[test]
    fn roles_must_be_strings() {
        let errors = Projection::profile()
            .parse(&object(json!({"roles": ["admin", 1]})))
            .unwrap_err();

        assert_eq!(errors.get("roles"), Some(&[NOT_A_STRING.to_string()][..]));
    }

    proptest! {
        #[test]
        fn reads_never_include_the_password(
            pk: i64,
            email in "[a-z]{1,8}@[a-z]{1,8}\\.com",
            hash in "\\$argon2id\\$[a-zA-Z0-9+/]{8,32}",
            first_name in "\\PC{0,16}",
            is_active: bool,
        ) {
            let user = User {
                pk,
                email,
                password_hash: PasswordHash::new(hash.clone()),
                first_name,
                last_name: String::new(),
                roles: Vec::new(),
                is_active,
            };

            for projection in [Projection::profile(), Projection::own_profile()] {
                let represented = projection.represent(&user);

                prop_assert!(!represented.contains_key("password"));
                prop_assert!(!serde_json::to_string(&represented).unwrap().contains(&hash));
            }
        }
    }
}
