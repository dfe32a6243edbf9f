use chrono::{DateTime, SecondsFormat, Utc};
use mongodb::bson::{oid::ObjectId, Bson};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use service_core::error::AppError;
use validator::Validate;

/// Required fields, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 2] = ["full_name", "personal_email"];

/// A normalized submission that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewRegistration {
    #[validate(length(min = 1, message = "full_name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "personal_email is required"))]
    pub personal_email: String,
    pub company_name: String,
    pub company_email: String,
    pub accepted_terms: bool,
    pub newsletter_opt_in: bool,
}

impl NewRegistration {
    /// Reports the first missing required field, in `REQUIRED_FIELDS` order.
    pub fn check_required(&self) -> Result<(), AppError> {
        self.validate().map_err(|errors| {
            REQUIRED_FIELDS
                .iter()
                .find(|field| errors.errors().contains_key(**field))
                .map(|field| AppError::MissingField(*field))
                .unwrap_or_else(|| AppError::BadRequest(anyhow::anyhow!(errors.to_string())))
        })
    }

    /// Stamps the creation time, producing the document to insert.
    pub fn into_document(self, created_at: DateTime<Utc>) -> RegistrationDocument {
        RegistrationDocument {
            id: None,
            full_name: self.full_name,
            personal_email: self.personal_email,
            company_name: self.company_name,
            company_email: self.company_email,
            accepted_terms: self.accepted_terms,
            newsletter_opt_in: self.newsletter_opt_in,
            created_at: format_timestamp(created_at),
        }
    }
}

/// Stored shape of a registration in the collection. Other writers share the
/// collection, so decoding coerces instead of rejecting: loose flags, BSON
/// dates and non-string text all map onto the canonical types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrationDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub full_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub personal_email: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub company_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub company_email: String,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub accepted_terms: bool,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub newsletter_opt_in: bool,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: String,
}

/// A stored registration as returned to clients, with the identifier as a hex string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Registration {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    pub personal_email: String,
    pub company_name: String,
    pub company_email: String,
    pub accepted_terms: bool,
    pub newsletter_opt_in: bool,
    pub created_at: String,
}

impl RegistrationDocument {
    /// Converts a document whose identifier is known.
    pub fn into_registration(self, id: ObjectId) -> Registration {
        Registration {
            id: id.to_hex(),
            full_name: self.full_name,
            personal_email: self.personal_email,
            company_name: self.company_name,
            company_email: self.company_email,
            accepted_terms: self.accepted_terms,
            newsletter_opt_in: self.newsletter_opt_in,
            created_at: self.created_at,
        }
    }
}

impl From<RegistrationDocument> for Registration {
    fn from(doc: RegistrationDocument) -> Self {
        let id = doc.id.map(|id| id.to_hex()).unwrap_or_default();
        Registration {
            id,
            full_name: doc.full_name,
            personal_email: doc.personal_email,
            company_name: doc.company_name,
            company_email: doc.company_email,
            accepted_terms: doc.accepted_terms,
            newsletter_opt_in: doc.newsletter_opt_in,
            created_at: doc.created_at,
        }
    }
}

/// `null`, `false`, zero and the empty string are false; everything else,
/// including `"false"`, arrays and objects, is true.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Same rules as [`truthy`], over stored BSON values.
fn bson_truthy(value: &Bson) -> bool {
    match value {
        Bson::Null | Bson::Undefined => false,
        Bson::Boolean(b) => *b,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(f) => *f != 0.0 && !f.is_nan(),
        Bson::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(bson_truthy(&Bson::deserialize(deserializer)?))
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Bson::deserialize(deserializer)? {
        Bson::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Bson::deserialize(deserializer)? {
        Bson::String(s) => s,
        Bson::DateTime(at) => DateTime::<Utc>::from_timestamp_millis(at.timestamp_millis())
            .map(format_timestamp)
            .unwrap_or_default(),
        _ => String::new(),
    })
}

/// ISO-8601 UTC with millisecond precision and a `Z` suffix. Fixed width, so
/// string order matches time order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
