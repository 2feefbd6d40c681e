//! The user record and its field validation.

use serde::{Deserialize, Serialize};

/// A user record.
///
/// `id` is the only server-assigned field — the store overwrites whatever
/// the client sends. Struct-level `#[serde(default)]` means an absent field
/// deserializes to an empty value and is reported by [`validate`] with its
/// field name, rather than rejected by the parser.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
}

/// A single failed validation check.
#[derive(Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

const fn required(field: &'static str, message: &'static str) -> FieldError {
    FieldError { field, message }
}

/// Checks the client-supplied fields of a record.
///
/// Checks run in a fixed order and the first failure wins: firstName,
/// lastName, email (present and contains `@`), department. Pure — no
/// side effects, same input always yields the same result.
pub fn validate(user: &User) -> Result<(), FieldError> {
    if user.first_name.trim().is_empty() {
        return Err(required("firstName", "firstName must not be empty."));
    }
    if user.last_name.trim().is_empty() {
        return Err(required("lastName", "lastName must not be empty."));
    }
    if user.email.trim().is_empty() {
        return Err(required("email", "email must not be empty."));
    }
    if !user.email.contains('@') {
        return Err(required("email", "email must contain an '@' character."));
    }
    if user.department.trim().is_empty() {
        return Err(required("department", "department must not be empty."));
    }
    Ok(())
}
