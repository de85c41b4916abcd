//! Payload validation for diagnostic test create/update requests.
//!
//! Presence, JSON type and date checks are explicit; length rules are declared
//! on [`TestPayload`] with the `validator` derive. Every failure becomes a
//! [`Violation`] and all violations of one payload are reported together,
//! ordered by field.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use validator::Validate;

use crate::{
    models::{timestamp::parse_test_date, DiagnosticTestPatch, NewDiagnosticTest},
    Error, Result,
};

pub const PATIENT_NAME: &str = "patientName";
pub const TEST_TYPE: &str = "testType";
pub const RESULT: &str = "result";
pub const TEST_DATE: &str = "testDate";
pub const NOTES: &str = "notes";

/// Field declaration order, used to order violations.
const FIELDS: [&str; 5] = [PATIENT_NAME, TEST_TYPE, RESULT, TEST_DATE, NOTES];
const REQUIRED_ON_CREATE: [&str; 4] = [PATIENT_NAME, TEST_TYPE, RESULT, TEST_DATE];

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// All required fields must be present.
    Create,
    /// Every field is optional; present fields must still be valid.
    Update,
}

#[derive(Debug, Default, Validate)]
struct TestPayload {
    #[validate(length(min = 2, message = "Patient name must be at least 2 characters."))]
    patient_name: Option<String>,
    #[validate(length(min = 3, message = "Test type must be at least 3 characters."))]
    test_type: Option<String>,
    #[validate(length(min = 2, message = "Result must be at least 2 characters."))]
    result: Option<String>,
    test_date: Option<String>,
    notes: Option<Option<String>>,
}

/// Validate a payload for creation.
pub fn validate_create(payload: &JsonValue) -> Result<NewDiagnosticTest> {
    let patch = validate_payload(as_object(payload)?, ValidationMode::Create)
        .map_err(Error::Validation)?;

    match patch {
        DiagnosticTestPatch {
            patient_name: Some(patient_name),
            test_type: Some(test_type),
            result: Some(result),
            test_date: Some(test_date),
            notes,
        } => Ok(NewDiagnosticTest {
            patient_name,
            test_type,
            result,
            test_date,
            notes: notes.flatten(),
        }),
        _ => Err(Error::Internal(
            "create validation passed without all required fields".to_string(),
        )),
    }
}

/// Validate a payload for a partial update.
pub fn validate_update(payload: &JsonValue) -> Result<DiagnosticTestPatch> {
    validate_payload(as_object(payload)?, ValidationMode::Update).map_err(Error::Validation)
}

/// Core rule set: a validated patch or the full list of violations.
///
/// `testDate` comes back normalized to the canonical timestamp.
pub fn validate_payload(
    object: &Map<String, JsonValue>,
    mode: ValidationMode,
) -> std::result::Result<DiagnosticTestPatch, Vec<Violation>> {
    let mut violations = Vec::new();

    if mode == ValidationMode::Create {
        for field in REQUIRED_ON_CREATE {
            if !object.contains_key(field) {
                violations.push(Violation::new(field, "Required"));
            }
        }
    }

    let payload = TestPayload {
        patient_name: string_field(object, PATIENT_NAME, &mut violations),
        test_type: string_field(object, TEST_TYPE, &mut violations),
        result: string_field(object, RESULT, &mut violations),
        test_date: string_field(object, TEST_DATE, &mut violations),
        notes: notes_field(object, &mut violations),
    };

    if let Err(errors) = payload.validate() {
        for (field, field_errors) in errors.field_errors() {
            let field = match &*field {
                "patient_name" => PATIENT_NAME,
                "test_type" => TEST_TYPE,
                "result" => RESULT,
                other => {
                    tracing::warn!(field = other, "Unmapped validation field");
                    continue;
                }
            };
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", error.code));
                violations.push(Violation::new(field, message));
            }
        }
    }

    let test_date = match payload.test_date.as_deref() {
        Some(raw) => match parse_test_date(raw) {
            Some(date) => Some(date),
            None => {
                violations.push(Violation::new(TEST_DATE, "Invalid date format."));
                None
            }
        },
        None => None,
    };

    if !violations.is_empty() {
        violations.sort_by_key(|v| field_rank(&v.field));
        return Err(violations);
    }

    Ok(DiagnosticTestPatch {
        patient_name: payload.patient_name,
        test_type: payload.test_type,
        result: payload.result,
        test_date,
        notes: payload.notes,
    })
}

fn as_object(payload: &JsonValue) -> Result<&Map<String, JsonValue>> {
    payload.as_object().ok_or_else(|| {
        Error::InvalidRequest(format!(
            "Request body must be a JSON object, received {}",
            json_type_name(payload)
        ))
    })
}

/// A present string field. Absent keys yield `None` without a violation.
fn string_field(
    object: &Map<String, JsonValue>,
    field: &str,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    match object.get(field)? {
        JsonValue::String(value) => Some(value.clone()),
        other => {
            violations.push(type_violation(field, other));
            None
        }
    }
}

/// `notes` additionally accepts `null`, meaning "no notes".
fn notes_field(
    object: &Map<String, JsonValue>,
    violations: &mut Vec<Violation>,
) -> Option<Option<String>> {
    match object.get(NOTES)? {
        JsonValue::Null => Some(None),
        JsonValue::String(value) => Some(Some(value.clone())),
        other => {
            violations.push(type_violation(NOTES, other));
            None
        }
    }
}

fn type_violation(field: &str, value: &JsonValue) -> Violation {
    Violation::new(
        field,
        format!("Expected string, received {}", json_type_name(value)),
    )
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn field_rank(field: &str) -> usize {
    FIELDS
        .iter()
        .position(|f| *f == field)
        .unwrap_or(FIELDS.len())
}
