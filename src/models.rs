use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, Document};
use serde::Serialize;
use utoipa::ToSchema;

use crate::validation::{FieldReader, Literal, Validate, ValidationErrors};

// ============ Leads ============

/// Sales status of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Lost,
    Customer,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Lost => "lost",
            LeadStatus::Customer => "customer",
        }
    }
}

impl Literal for LeadStatus {
    const VARIANTS: &'static [&'static str] = &["new", "contacted", "qualified", "lost", "customer"];

    fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(LeadStatus::New),
            "contacted" => Some(LeadStatus::Contacted),
            "qualified" => Some(LeadStatus::Qualified),
            "lost" => Some(LeadStatus::Lost),
            "customer" => Some(LeadStatus::Customer),
            _ => None,
        }
    }
}

/// A sales prospect. Stored in the `lead` collection.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Lead {
    pub first_name: String,
    pub last_name: String,
    /// Primary email, syntactically validated.
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    /// Where the lead came from. Defaults to `Manual` when omitted.
    pub source: Option<String>,
    pub status: LeadStatus,
    /// Owner user id or name.
    pub owner: Option<String>,
    pub notes: Option<String>,
}

impl Lead {
    pub const DEFAULT_SOURCE: &'static str = "Manual";

    /// Every field is written, absent values as `null`, so an update through
    /// this document is a full replacement.
    pub fn to_document(&self) -> Document {
        doc! {
            "first_name": self.first_name.as_str(),
            "last_name": self.last_name.as_str(),
            "email": self.email.as_deref(),
            "phone": self.phone.as_deref(),
            "company": self.company.as_deref(),
            "source": self.source.as_deref(),
            "status": self.status.as_str(),
            "owner": self.owner.as_deref(),
            "notes": self.notes.as_deref(),
        }
    }
}

impl Validate for Lead {
    fn validate(body: &serde_json::Value) -> Result<Self, ValidationErrors> {
        let mut fields = FieldReader::new(body)?;

        let lead = Lead {
            first_name: fields.required_str("first_name"),
            last_name: fields.required_str("last_name"),
            email: fields.optional_email("email"),
            phone: fields.optional_str("phone"),
            company: fields.optional_str("company"),
            source: fields.optional_str_or("source", Self::DEFAULT_SOURCE),
            status: fields.literal_or("status", LeadStatus::default()),
            owner: fields.optional_str("owner"),
            notes: fields.optional_str("notes"),
        };

        fields.finish()?;
        Ok(lead)
    }
}

// ============ Activities ============

/// Kind of interaction recorded by an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
    #[default]
    Note,
    Task,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Call => "call",
            ActivityType::Email => "email",
            ActivityType::Meeting => "meeting",
            ActivityType::Note => "note",
            ActivityType::Task => "task",
        }
    }
}

impl Literal for ActivityType {
    const VARIANTS: &'static [&'static str] = &["call", "email", "meeting", "note", "task"];

    fn parse(value: &str) -> Option<Self> {
        match value {
            "call" => Some(ActivityType::Call),
            "email" => Some(ActivityType::Email),
            "meeting" => Some(ActivityType::Meeting),
            "note" => Some(ActivityType::Note),
            "task" => Some(ActivityType::Task),
            _ => None,
        }
    }
}

/// An interaction tied to a lead. Stored in the `activity` collection.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Activity {
    /// Related lead `id` as a string.
    pub lead_id: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    /// Activity content or summary.
    pub content: String,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub done: bool,
    pub owner: Option<String>,
}

impl Activity {
    pub fn to_document(&self) -> Document {
        doc! {
            "lead_id": self.lead_id.as_str(),
            "type": self.kind.as_str(),
            "content": self.content.as_str(),
            "scheduled_for": self
                .scheduled_for
                .map(|at| bson::DateTime::from_millis(at.timestamp_millis())),
            "done": self.done,
            "owner": self.owner.as_deref(),
        }
    }
}

impl Validate for Activity {
    fn validate(body: &serde_json::Value) -> Result<Self, ValidationErrors> {
        let mut fields = FieldReader::new(body)?;

        let activity = Activity {
            lead_id: fields.required_str("lead_id"),
            kind: fields.literal_or("type", ActivityType::default()),
            content: fields.required_str("content"),
            scheduled_for: fields.optional_datetime("scheduled_for"),
            done: fields.bool_or("done", false),
            owner: fields.optional_str("owner"),
        };

        fields.finish()?;
        Ok(activity)
    }
}

// ============ Responses ============

/// Returned by create endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedResponse {
    pub id: String,
}

/// Returned by delete endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RootMessage {
    pub message: String,
}

/// Output of the `/test` diagnostic endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DiagnosticReport {
    pub backend: String,
    pub database: String,
    pub database_url: String,
    pub database_name: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::Bson;
    use serde_json::json;

    fn kinds(err: &ValidationErrors) -> Vec<(&str, &str)> {
        err.errors()
            .iter()
            .map(|e| (e.kind.as_str(), e.loc[1].as_str()))
            .collect()
    }

    #[test]
    fn test_lead_defaults_applied() {
        let lead = Lead::validate(&json!({ "first_name": "Ann", "last_name": "Lee" })).unwrap();

        assert_eq!(lead.source.as_deref(), Some("Manual"));
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.email, None);
    }

    #[test]
    fn test_lead_rejects_bad_fields_together() {
        let err = Lead::validate(&json!({
            "last_name": 7,
            "email": "not-an-email",
            "status": "won",
        }))
        .unwrap_err();

        assert_eq!(
            kinds(&err),
            vec![
                ("missing", "first_name"),
                ("string_type", "last_name"),
                ("value_error", "email"),
                ("literal_error", "status"),
            ]
        );
    }

    #[test]
    fn test_lead_ignores_unknown_fields() {
        let lead = Lead::validate(&json!({
            "first_name": "Ann",
            "last_name": "Lee",
            "id": "abc",
            "tier": "gold",
        }))
        .unwrap();
        assert_eq!(lead.first_name, "Ann");
    }

    #[test]
    fn test_lead_document_has_every_field() {
        let lead = Lead::validate(&json!({
            "first_name": "Ann",
            "last_name": "Lee",
            "status": "qualified",
            "source": null,
        }))
        .unwrap();
        let doc = lead.to_document();

        assert_eq!(doc.len(), 9);
        assert_eq!(doc.get_str("status").unwrap(), "qualified");
        assert_eq!(doc.get("source"), Some(&Bson::Null));
        assert_eq!(doc.get("email"), Some(&Bson::Null));
    }

    #[test]
    fn test_activity_defaults_and_document() {
        let activity = Activity::validate(&json!({
            "lead_id": "65f0c0ffee0000000000abcd",
            "content": "Intro call",
            "scheduled_for": "2024-05-01T09:30:00Z",
        }))
        .unwrap();

        assert_eq!(activity.kind, ActivityType::Note);
        assert!(!activity.done);

        let doc = activity.to_document();
        assert_eq!(doc.get_str("type").unwrap(), "note");
        assert_eq!(
            doc.get_datetime("scheduled_for").unwrap().timestamp_millis(),
            1_714_555_800_000
        );
        assert_eq!(doc.get("owner"), Some(&Bson::Null));
    }

    #[test]
    fn test_activity_rejects_bad_type_and_done() {
        let err = Activity::validate(&json!({
            "lead_id": "x",
            "content": "y",
            "type": "lunch",
            "done": null,
        }))
        .unwrap_err();

        assert_eq!(
            kinds(&err),
            vec![("literal_error", "type"), ("bool_type", "done")]
        );
    }

    #[test]
    fn test_literal_variants_match_serde_names() {
        for status in LeadStatus::VARIANTS {
            let parsed = LeadStatus::parse(status).unwrap();
            assert_eq!(parsed.as_str(), *status);
            assert_eq!(serde_json::to_value(parsed).unwrap(), json!(status));
        }
        for kind in ActivityType::VARIANTS {
            let parsed = ActivityType::parse(kind).unwrap();
            assert_eq!(parsed.as_str(), *kind);
            assert_eq!(serde_json::to_value(parsed).unwrap(), json!(kind));
        }
    }
}
