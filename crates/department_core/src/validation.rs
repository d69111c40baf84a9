//! Payload validation for department create, update and filter requests.
//!
//! # Responsibility
//! - Normalize loosely typed payloads (trim strings, narrow numbers).
//! - Report every violated field rule of a payload in one error.
//!
//! # Invariants
//! - Validation is pure: no store access, no logging.
//! - A payload field is checked only against the rules for its tri-state:
//!   absent, explicit null, or value.
//! - Accepted UUID version comes from `CoreConfig`, never from globals.

use crate::config::CoreConfig;
use crate::model::department::{DepartmentChanges, DepartmentId, NewDepartment};
use crate::model::field::Field;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::{Uuid, Variant};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$"#,
    )
    .expect("valid email regex")
});

const MAX_EMAIL_CHARS: usize = 254;
const MAX_EMAIL_LOCAL_CHARS: usize = 64;
const HYPHENATED_UUID_LEN: usize = 36;

/// Machine-readable reason a payload field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationCode {
    InvalidName,
    EmptyName,
    InvalidFloor,
    MinimumFloor,
    InvalidEmail,
    EmptyPhoneNumber,
    InvalidPhoneNumber,
    InvalidId,
}

impl ValidationCode {
    /// Stable code string for transport mapping.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidName => "INVALID_NAME",
            Self::EmptyName => "EMPTY_NAME",
            Self::InvalidFloor => "INVALID_FLOOR",
            Self::MinimumFloor => "MINIMUM_FLOOR",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::EmptyPhoneNumber => "EMPTY_PHONE_NUMBER",
            Self::InvalidPhoneNumber => "INVALID_PHONE_NUMBER",
            Self::InvalidId => "INVALID_ID",
        }
    }

    /// Human-readable message shown to API callers.
    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidName => "Name is invalid string!",
            Self::EmptyName => "Name cannot be empty!",
            Self::InvalidFloor => "Floor must be a number!",
            Self::MinimumFloor => "Floor must be greater than 0!",
            Self::InvalidEmail => "Email is invalid!",
            Self::EmptyPhoneNumber => "Phone number cannot be empty!",
            Self::InvalidPhoneNumber => "Phone number is invalid string!",
            Self::InvalidId => "ID is invalid (UUID expected)",
        }
    }
}

/// One rejected payload field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Payload key as sent by the caller (`phoneNumber`, not `phone_number`).
    pub field: &'static str,
    pub code: ValidationCode,
}

/// Every issue found in one payload. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    fn single(field: &'static str, code: ValidationCode) -> Self {
        Self {
            issues: vec![ValidationIssue { field, code }],
        }
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn has(&self, code: ValidationCode) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }

    pub fn messages(&self) -> Vec<&'static str> {
        self.issues.iter().map(|issue| issue.code.message()).collect()
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, issue) in self.issues.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", issue.field, issue.code.message())?;
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

/// Raw create payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateDepartmentPayload {
    pub name: Field<Value>,
    pub floor: Field<Value>,
    pub email: Field<Value>,
    pub phone_number: Field<Value>,
}

/// Raw update payload. Absent keys leave the stored column untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateDepartmentPayload {
    pub id: Field<Value>,
    pub name: Field<Value>,
    pub floor: Field<Value>,
    pub email: Field<Value>,
    pub phone_number: Field<Value>,
}

/// Raw filter payload. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DepartmentFilterPayload {
    pub name: Field<Value>,
    pub email: Field<Value>,
    pub phone_number: Field<Value>,
    pub floor: Field<Value>,
}

/// Validated create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDepartmentInput {
    pub name: String,
    pub floor: i32,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl CreateDepartmentInput {
    pub fn to_new_department(&self) -> NewDepartment {
        NewDepartment {
            name: self.name.clone(),
            floor: self.floor,
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
        }
    }
}

/// Validated partial update.
///
/// `name` and `floor` cannot be cleared, so they are plain options.
/// Contact fields keep the tri-state: `Null` clears the column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDepartmentInput {
    pub id: DepartmentId,
    pub name: Option<String>,
    pub floor: Option<i32>,
    pub email: Field<String>,
    pub phone_number: Field<String>,
}

impl UpdateDepartmentInput {
    pub fn to_changes(&self) -> DepartmentChanges {
        DepartmentChanges {
            name: self.name.clone(),
            floor: self.floor,
            email: self.email.clone().into_patch(),
            phone_number: self.phone_number.clone().into_patch(),
        }
    }
}

/// Validated filter.
///
/// Text fields are trimmed but otherwise free-form; an explicit empty or
/// null contact field means "column is null".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentFilter {
    pub name: Field<String>,
    pub email: Field<String>,
    pub phone_number: Field<String>,
    pub floor: Option<i32>,
}

/// Validates request payloads against the department field rules.
#[derive(Debug, Clone)]
pub struct DepartmentValidator {
    uuid_version: usize,
}

impl DepartmentValidator {
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            uuid_version: config.uuid_version,
        }
    }

    /// Validates a create payload.
    ///
    /// # Errors
    /// Returns all field violations: missing or blank `name`, missing or
    /// non-positive `floor`, malformed `email`, blank `phoneNumber`.
    pub fn validate_create(
        &self,
        payload: &CreateDepartmentPayload,
    ) -> Result<CreateDepartmentInput, ValidationErrors> {
        let mut issues = Issues::default();
        let name = issues.check("name", required_name(&payload.name));
        let floor = issues.check("floor", required_floor(&payload.floor));
        let email = issues.check("email", contact_email(&payload.email));
        let phone_number = issues.check("phoneNumber", contact_phone(&payload.phone_number));

        let input = match (name, floor, email, phone_number) {
            (Some(name), Some(floor), Some(email), Some(phone_number)) => {
                Some(CreateDepartmentInput {
                    name,
                    floor,
                    email: email.value(),
                    phone_number: phone_number.value(),
                })
            }
            _ => None,
        };
        issues.finish(input)
    }

    /// Validates an update payload.
    ///
    /// Present keys follow the create rules, except that a null contact
    /// field is accepted as "clear this column".
    pub fn validate_update(
        &self,
        payload: &UpdateDepartmentPayload,
    ) -> Result<UpdateDepartmentInput, ValidationErrors> {
        let mut issues = Issues::default();
        let id = issues.check("id", self.id_field(&payload.id));
        let name = issues.check("name", optional_name(&payload.name));
        let floor = issues.check("floor", optional_floor(&payload.floor));
        let email = issues.check("email", contact_email(&payload.email));
        let phone_number = issues.check("phoneNumber", contact_phone(&payload.phone_number));

        let input = match (id, name, floor, email, phone_number) {
            (Some(id), Some(name), Some(floor), Some(email), Some(phone_number)) => {
                Some(UpdateDepartmentInput {
                    id,
                    name,
                    floor,
                    email,
                    phone_number,
                })
            }
            _ => None,
        };
        issues.finish(input)
    }

    /// Validates a filter payload. Only `floor` has rules beyond type checks.
    pub fn validate_filter(
        &self,
        payload: &DepartmentFilterPayload,
    ) -> Result<DepartmentFilter, ValidationErrors> {
        let mut issues = Issues::default();
        let name = issues.check(
            "name",
            filter_text(&payload.name, ValidationCode::InvalidName),
        );
        let email = issues.check(
            "email",
            filter_text(&payload.email, ValidationCode::InvalidEmail),
        );
        let phone_number = issues.check(
            "phoneNumber",
            filter_text(&payload.phone_number, ValidationCode::InvalidPhoneNumber),
        );
        let floor = issues.check("floor", optional_filter_floor(&payload.floor));

        let filter = match (name, email, phone_number, floor) {
            (Some(name), Some(email), Some(phone_number), Some(floor)) => Some(DepartmentFilter {
                name,
                email,
                phone_number,
                floor,
            }),
            _ => None,
        };
        issues.finish(filter)
    }

    /// Parses an id argument for get/delete calls.
    ///
    /// # Errors
    /// Returns `INVALID_ID` unless `raw` is a hyphenated RFC 4122 UUID of the
    /// configured version.
    pub fn validate_id(&self, raw: &str) -> Result<DepartmentId, ValidationErrors> {
        self.parse_id(raw)
            .map_err(|code| ValidationErrors::single("id", code))
    }

    fn id_field(&self, raw: &Field<Value>) -> Result<DepartmentId, ValidationCode> {
        match raw {
            Field::Value(Value::String(text)) => self.parse_id(text),
            _ => Err(ValidationCode::InvalidId),
        }
    }

    fn parse_id(&self, raw: &str) -> Result<DepartmentId, ValidationCode> {
        if raw.len() != HYPHENATED_UUID_LEN {
            return Err(ValidationCode::InvalidId);
        }
        let id = Uuid::parse_str(raw).map_err(|_| ValidationCode::InvalidId)?;
        if id.get_version_num() != self.uuid_version || id.get_variant() != Variant::RFC4122 {
            return Err(ValidationCode::InvalidId);
        }
        Ok(id)
    }
}

/// Collects per-field failures without stopping at the first one.
#[derive(Default)]
struct Issues {
    issues: Vec<ValidationIssue>,
}

impl Issues {
    fn check<T>(
        &mut self,
        field: &'static str,
        result: Result<T, ValidationCode>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(code) => {
                self.issues.push(ValidationIssue { field, code });
                None
            }
        }
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        match value {
            Some(value) if self.issues.is_empty() => Ok(value),
            _ => Err(ValidationErrors {
                issues: self.issues,
            }),
        }
    }
}

fn required_name(raw: &Field<Value>) -> Result<String, ValidationCode> {
    match raw {
        Field::Value(value) => name_value(value),
        Field::Absent | Field::Null => Err(ValidationCode::EmptyName),
    }
}

fn optional_name(raw: &Field<Value>) -> Result<Option<String>, ValidationCode> {
    match raw {
        Field::Absent => Ok(None),
        Field::Null => Err(ValidationCode::EmptyName),
        Field::Value(value) => name_value(value).map(Some),
    }
}

fn name_value(value: &Value) -> Result<String, ValidationCode> {
    let Value::String(text) = value else {
        return Err(ValidationCode::InvalidName);
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationCode::EmptyName);
    }
    Ok(trimmed.to_string())
}

fn required_floor(raw: &Field<Value>) -> Result<i32, ValidationCode> {
    match raw {
        Field::Value(value) => floor_value(value),
        Field::Absent | Field::Null => Err(ValidationCode::InvalidFloor),
    }
}

fn optional_floor(raw: &Field<Value>) -> Result<Option<i32>, ValidationCode> {
    match raw {
        Field::Absent => Ok(None),
        Field::Null => Err(ValidationCode::InvalidFloor),
        Field::Value(value) => floor_value(value).map(Some),
    }
}

fn optional_filter_floor(raw: &Field<Value>) -> Result<Option<i32>, ValidationCode> {
    match raw {
        Field::Absent | Field::Null => Ok(None),
        Field::Value(value) => floor_value(value).map(Some),
    }
}

/// Any JSON number below 1 is `MINIMUM_FLOOR`. Integral floats such as `2.0`
/// are accepted; fractional or out-of-range values are `INVALID_FLOOR`.
fn floor_value(value: &Value) -> Result<i32, ValidationCode> {
    let number = value.as_f64().ok_or(ValidationCode::InvalidFloor)?;
    if number < 1.0 {
        return Err(ValidationCode::MinimumFloor);
    }
    if let Some(floor) = value.as_i64() {
        return i32::try_from(floor).map_err(|_| ValidationCode::InvalidFloor);
    }
    if number.fract() != 0.0 || number > f64::from(i32::MAX) {
        return Err(ValidationCode::InvalidFloor);
    }
    Ok(number as i32)
}

fn contact_email(raw: &Field<Value>) -> Result<Field<String>, ValidationCode> {
    contact_text(raw, ValidationCode::InvalidEmail, |email| {
        is_valid_email(email).then_some(()).ok_or(ValidationCode::InvalidEmail)
    })
}

fn contact_phone(raw: &Field<Value>) -> Result<Field<String>, ValidationCode> {
    contact_text(raw, ValidationCode::InvalidPhoneNumber, |phone| {
        if phone.is_empty() {
            Err(ValidationCode::EmptyPhoneNumber)
        } else {
            Ok(())
        }
    })
}

/// Null and absent pass through; strings are trimmed and then checked.
fn contact_text(
    raw: &Field<Value>,
    not_a_string: ValidationCode,
    check: impl FnOnce(&str) -> Result<(), ValidationCode>,
) -> Result<Field<String>, ValidationCode> {
    match raw {
        Field::Absent => Ok(Field::Absent),
        Field::Null => Ok(Field::Null),
        Field::Value(Value::String(text)) => {
            let trimmed = text.trim();
            check(trimmed)?;
            Ok(Field::Value(trimmed.to_string()))
        }
        Field::Value(_) => Err(not_a_string),
    }
}

fn filter_text(
    raw: &Field<Value>,
    not_a_string: ValidationCode,
) -> Result<Field<String>, ValidationCode> {
    contact_text(raw, not_a_string, |_| Ok(()))
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, _domain)) = email.rsplit_once('@') else {
        return false;
    };
    email.chars().count() <= MAX_EMAIL_CHARS
        && local.chars().count() <= MAX_EMAIL_LOCAL_CHARS
        && EMAIL_RE.is_match(email)
}
