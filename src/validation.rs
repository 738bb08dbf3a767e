//! Request-boundary validation.
//!
//! Bodies are read as untyped JSON and checked field by field. Every failure is
//! collected into [`ValidationErrors`] so a single 422 response reports all of
//! them, in the `{"detail": [{"type", "loc", "msg"}]}` shape existing clients
//! already parse.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use utoipa::ToSchema;

use crate::errors::AppError;

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    /// Machine-readable error kind, e.g. `missing` or `literal_error`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Path to the offending value, e.g. `["body", "email"]`.
    pub loc: Vec<String>,
    pub msg: String,
}

impl FieldError {
    pub fn new(kind: &str, loc: &[&str], msg: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            loc: loc.iter().map(|s| s.to_string()).collect(),
            msg: msg.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn single(error: FieldError) -> Self {
        Self(vec![error])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }
}

/// Types that can be built from an untyped JSON request body.
pub trait Validate: Sized {
    fn validate(body: &Value) -> Result<Self, ValidationErrors>;
}

/// Closed set of accepted string values for a field.
pub trait Literal: Sized + Copy {
    const VARIANTS: &'static [&'static str];

    fn parse(value: &str) -> Option<Self>;
}

/// JSON body extractor that runs [`Validate`] and rejects with a 422.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| {
                AppError::Validation(ValidationErrors::single(FieldError::new(
                    "json_invalid",
                    &["body"],
                    rejection.body_text(),
                )))
            })?;

        T::validate(&body).map(ValidatedJson).map_err(AppError::Validation)
    }
}

/// Reads typed fields out of a JSON object, accumulating errors.
///
/// Accessors return a placeholder when a check fails; callers must consult
/// [`FieldReader::finish`] before using the values.
pub struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> FieldReader<'a> {
    pub fn new(body: &'a Value) -> Result<Self, ValidationErrors> {
        match body {
            Value::Object(object) => Ok(Self {
                object,
                errors: Vec::new(),
            }),
            _ => Err(ValidationErrors::single(FieldError::new(
                "model_attributes_type",
                &["body"],
                "Input should be a valid dictionary or object to extract fields from",
            ))),
        }
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }

    fn fail(&mut self, kind: &str, field: &str, msg: impl Into<String>) {
        self.errors.push(FieldError::new(kind, &["body", field], msg));
    }

    fn string_value(&mut self, field: &str, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.fail("string_type", field, "Input should be a valid string");
                None
            }
        }
    }

    pub fn required_str(&mut self, field: &str) -> String {
        let object = self.object;
        match object.get(field) {
            None => {
                self.fail("missing", field, "Field required");
                String::new()
            }
            Some(value) => self.string_value(field, value).unwrap_or_default(),
        }
    }

    /// Missing and `null` both read as `None`.
    pub fn optional_str(&mut self, field: &str) -> Option<String> {
        let object = self.object;
        match object.get(field) {
            None | Some(Value::Null) => None,
            Some(value) => self.string_value(field, value),
        }
    }

    /// A missing field takes `default`; an explicit `null` stays `None`.
    pub fn optional_str_or(&mut self, field: &str, default: &str) -> Option<String> {
        let object = self.object;
        match object.get(field) {
            None => Some(default.to_string()),
            Some(Value::Null) => None,
            Some(value) => self.string_value(field, value),
        }
    }

    pub fn optional_email(&mut self, field: &str) -> Option<String> {
        let email = self.optional_str(field)?;
        if is_valid_email(&email) {
            Some(email)
        } else {
            self.fail(
                "value_error",
                field,
                "value is not a valid email address: The email address is not valid.",
            );
            None
        }
    }

    pub fn literal_or<L: Literal>(&mut self, field: &str, default: L) -> L {
        let object = self.object;
        let Some(value) = object.get(field) else {
            return default;
        };

        match value.as_str().and_then(L::parse) {
            Some(parsed) => parsed,
            None => {
                self.fail("literal_error", field, literal_message(L::VARIANTS));
                default
            }
        }
    }

    pub fn bool_or(&mut self, field: &str, default: bool) -> bool {
        let object = self.object;
        let Some(value) = object.get(field) else {
            return default;
        };

        match parse_bool(value) {
            Some(parsed) => parsed,
            None => {
                self.fail("bool_type", field, "Input should be a valid boolean");
                default
            }
        }
    }

    pub fn optional_datetime(&mut self, field: &str) -> Option<DateTime<Utc>> {
        let object = self.object;
        match object.get(field) {
            None | Some(Value::Null) => None,
            Some(value) => match parse_datetime(value) {
                Some(at) => Some(at),
                None => {
                    self.fail("datetime_parsing", field, "Input should be a valid datetime");
                    None
                }
            },
        }
    }
}

fn literal_message(variants: &[&str]) -> String {
    let quoted: Vec<String> = variants.iter().map(|v| format!("'{}'", v)).collect();
    match quoted.split_last() {
        Some((last, [])) => format!("Input should be {}", last),
        Some((last, rest)) => format!("Input should be {} or {}", rest.join(", "), last),
        None => "Input should be a valid literal".to_string(),
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    // local@domain.tld, at least one dot in the domain
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
        )
        .expect("email regex is valid")
    })
}

/// Syntactic email check: one `@`, dotted domain, no leading/trailing or
/// doubled dots in the local part.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 {
        return false;
    }

    let Some((local, _)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty()
        || local.len() > 64
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
    {
        return false;
    }

    email_regex().is_match(email)
}

fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "t" | "y" | "1" => Some(true),
            "false" | "no" | "off" | "f" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

const MILLIS_THRESHOLD: f64 = 2e10;

/// Accepts RFC 3339, naive ISO 8601 date-times or dates (taken as UTC), and
/// Unix timestamps in seconds, or in milliseconds above 2e10.
pub fn parse_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_datetime_str(s.trim()),
        Value::Number(n) => {
            let raw = n.as_f64()?;
            if !raw.is_finite() {
                return None;
            }
            // Beyond this magnitude the number is already in milliseconds
            let millis = if raw.abs() > MILLIS_THRESHOLD {
                raw.round()
            } else {
                (raw * 1000.0).round()
            };
            if millis.abs() > i64::MAX as f64 {
                return None;
            }
            Utc.timestamp_millis_opt(millis as i64).single()
        }
        _ => None,
    }
}

fn parse_datetime_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Some(at.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parses an optional `limit` query value. Absent or blank means `default`.
pub fn parse_limit(raw: Option<&str>, default: i64) -> Result<i64, ValidationErrors> {
    match raw.map(str::trim) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            ValidationErrors::single(FieldError::new(
                "int_parsing",
                &["query", "limit"],
                "Input should be a valid integer, unable to parse string as an integer",
            ))
        }),
    }
}

/// Maps a requested limit onto store semantics: `0` is unlimited and a
/// negative value counts by its magnitude.
pub fn effective_limit(limit: i64) -> Option<u64> {
    match limit.unsigned_abs() {
        0 => None,
        n => Some(n),
    }
}
