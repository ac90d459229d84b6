//! Field normalization and constraint checks for user writes.
//!
//! Checks never stop at the first problem: every input is inspected and the
//! full list of [`FieldViolation`]s is returned so callers can report all of
//! them at once.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::contract::error::{FieldViolation, ViolationKind};
use crate::contract::model::{NewUser, UserPatch};

pub const NAME_MIN_CHARS: usize = 2;
pub const AGE_MIN: i64 = 0;
pub const AGE_MAX: i64 = 150;

// ASCII word characters only, two or three letter final label.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*@[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*(\.[A-Za-z0-9_]{2,3})+$",
    )
    .expect("email pattern compiles")
});

const NAME_REQUIRED: FieldViolation =
    FieldViolation::new("name", ViolationKind::Required, "Please provide a name");
const NAME_TOO_SHORT: FieldViolation = FieldViolation::new(
    "name",
    ViolationKind::TooShort,
    "Name must be at least 2 characters",
);
const EMAIL_REQUIRED: FieldViolation =
    FieldViolation::new("email", ViolationKind::Required, "Please provide an email");
const EMAIL_INVALID: FieldViolation = FieldViolation::new(
    "email",
    ViolationKind::InvalidFormat,
    "Please provide a valid email",
);
const AGE_NEGATIVE: FieldViolation =
    FieldViolation::new("age", ViolationKind::OutOfRange, "Age cannot be negative");
const AGE_TOO_HIGH: FieldViolation =
    FieldViolation::new("age", ViolationKind::OutOfRange, "Age cannot exceed 150");

/// A create request that passed every check, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidUser {
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub phone: Option<String>,
    pub city: Option<String>,
}

/// A patch that passed every check. `None` leaves the field untouched;
/// `Some(None)` on an optional field clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<Option<i32>>,
    pub phone: Option<Option<String>>,
    pub city: Option<Option<String>>,
}

pub fn normalize_email(raw: &str) -> String {
    raw.to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn has_missing_required(violations: &[FieldViolation]) -> bool {
    violations.iter().any(|v| v.kind == ViolationKind::Required)
}

pub fn validate_new_user(input: NewUser) -> Result<ValidUser, Vec<FieldViolation>> {
    let mut out = Vec::new();

    let name = check_name(input.name, &mut out);
    let email = check_email(input.email, &mut out);
    let age = input.age.and_then(|a| check_age(a, &mut out));

    match (name, email, out.is_empty()) {
        (Some(name), Some(email), true) => Ok(ValidUser {
            name,
            email,
            age,
            phone: input.phone.map(|s| trim_owned(&s)),
            city: input.city.map(|s| trim_owned(&s)),
        }),
        _ => Err(out),
    }
}

pub fn validate_patch(patch: UserPatch) -> Result<ValidPatch, Vec<FieldViolation>> {
    let mut out = Vec::new();

    // An explicit null on a required field is the same as sending it empty.
    let name = patch.name.map(|n| check_name(n, &mut out));
    let email = patch.email.map(|e| check_email(e, &mut out));
    let age = patch
        .age
        .map(|a| a.and_then(|v| check_age(v, &mut out)));

    if !out.is_empty() {
        return Err(out);
    }

    Ok(ValidPatch {
        name: name.flatten(),
        email: email.flatten(),
        age,
        phone: patch.phone.map(|p| p.map(|s| trim_owned(&s))),
        city: patch.city.map(|c| c.map(|s| trim_owned(&s))),
    })
}

fn trim_owned(s: &str) -> String {
    s.trim().to_owned()
}

fn check_name(raw: Option<String>, out: &mut Vec<FieldViolation>) -> Option<String> {
    let name = raw.map(|s| trim_owned(&s)).filter(|s| !s.is_empty());
    match name {
        None => {
            out.push(NAME_REQUIRED);
            None
        }
        Some(n) if n.chars().count() < NAME_MIN_CHARS => {
            out.push(NAME_TOO_SHORT);
            None
        }
        Some(n) => Some(n),
    }
}

fn check_email(raw: Option<String>, out: &mut Vec<FieldViolation>) -> Option<String> {
    let email = raw.map(|s| normalize_email(&s)).filter(|s| !s.is_empty());
    match email {
        None => {
            out.push(EMAIL_REQUIRED);
            None
        }
        Some(e) if !is_valid_email(&e) => {
            out.push(EMAIL_INVALID);
            None
        }
        Some(e) => Some(e),
    }
}

fn check_age(age: i64, out: &mut Vec<FieldViolation>) -> Option<i32> {
    if age < AGE_MIN {
        out.push(AGE_NEGATIVE);
        return None;
    }
    if age > AGE_MAX {
        out.push(AGE_TOO_HIGH);
        return None;
    }
    i32::try_from(age).ok()
}
