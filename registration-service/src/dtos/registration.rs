use axum::http::{header, HeaderMap};
use serde::Serialize;
use serde_json::{Map, Value};
use service_core::error::AppError;

use crate::models::{truthy, NewRegistration, Registration};

/// Raw form submission. Fields stay untyped so that any JSON value can be
/// trimmed or coerced instead of rejected; unknown fields are ignored.
#[derive(Debug, Default)]
pub struct RegistrationRequest {
    pub full_name: Value,
    pub personal_email: Value,
    pub company_name: Value,
    pub company_email: Value,
    pub accepted_terms: Value,
    pub newsletter_opt_in: Value,
}

impl RegistrationRequest {
    /// Reads a submission from a request body. An empty body or one that is
    /// not declared as JSON counts as `{}`, as does any JSON value that is
    /// not an object. Only JSON that fails to parse is an error.
    pub fn from_body(headers: &HeaderMap, body: &[u8]) -> Result<Self, AppError> {
        if !is_json_content(headers) || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_slice(body).map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Failed to parse the request body as JSON: {}", e))
        })?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        let mut fields = match value {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        let mut take = |key: &str| fields.remove(key).unwrap_or(Value::Null);

        Self {
            full_name: take("full_name"),
            personal_email: take("personal_email"),
            company_name: take("company_name"),
            company_email: take("company_email"),
            accepted_terms: take("accepted_terms"),
            newsletter_opt_in: take("newsletter_opt_in"),
        }
    }

    /// Trims every string field and coerces the flags. Non-string values for
    /// text fields become empty, which the required-field check then rejects.
    pub fn normalize(&self) -> NewRegistration {
        NewRegistration {
            full_name: trimmed(&self.full_name),
            personal_email: trimmed(&self.personal_email),
            company_name: trimmed(&self.company_name),
            company_email: trimmed(&self.company_email),
            accepted_terms: truthy(&self.accepted_terms),
            newsletter_opt_in: truthy(&self.newsletter_opt_in),
        }
    }
}

/// `application/json` or any `+json` media type, parameters ignored.
fn is_json_content(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

fn trimmed(value: &Value) -> String {
    value.as_str().map(str::trim).unwrap_or_default().to_string()
}

#[derive(Debug, Serialize)]
pub struct CreateRegistrationResponse {
    pub success: bool,
    pub data: Vec<Registration>,
    pub message: String,
}

impl CreateRegistrationResponse {
    pub fn new(registration: Registration) -> Self {
        Self {
            success: true,
            data: vec![registration],
            message: "Registration successful".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListRegistrationsResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Registration>,
}

impl From<Vec<Registration>> for ListRegistrationsResponse {
    fn from(data: Vec<Registration>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> RegistrationRequest {
        RegistrationRequest::from_value(body)
    }

    fn json_headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, content_type.parse().unwrap());
        headers
    }

    #[test]
    fn normalize_trims_and_defaults() {
        let registration = request(json!({
            "full_name": "  Ada Lovelace ",
            "personal_email": "ada@example.com\n",
            "unexpected": 42
        }))
        .normalize();

        assert_eq!(registration.full_name, "Ada Lovelace");
        assert_eq!(registration.personal_email, "ada@example.com");
        assert_eq!(registration.company_name, "");
        assert_eq!(registration.company_email, "");
        assert!(!registration.accepted_terms);
        assert!(!registration.newsletter_opt_in);
    }

    #[test]
    fn non_string_text_fields_become_empty() {
        let registration = request(json!({
            "full_name": 12,
            "personal_email": null,
            "company_name": {"name": "Acme"}
        }))
        .normalize();

        assert_eq!(registration.full_name, "");
        assert_eq!(registration.personal_email, "");
        assert_eq!(registration.company_name, "");
    }

    #[test]
    fn non_object_json_counts_as_empty_submission() {
        let registration = request(json!(["Ada", "ada@example.com", "Acme", "", true, true]))
            .normalize();

        assert_eq!(registration.full_name, "");
        assert_eq!(registration.personal_email, "");
        assert!(!registration.accepted_terms);
    }

    #[test]
    fn body_without_json_content_type_is_ignored() {
        let form = json_headers("application/x-www-form-urlencoded");
        let registration = RegistrationRequest::from_body(&form, b"full_name=Ada")
            .unwrap()
            .normalize();
        assert_eq!(registration.full_name, "");

        let registration = RegistrationRequest::from_body(&HeaderMap::new(), br#"{"full_name":"Ada"}"#)
            .unwrap()
            .normalize();
        assert_eq!(registration.full_name, "");
    }

    #[test]
    fn json_body_is_read_with_charset_parameter() {
        let headers = json_headers("Application/JSON; charset=utf-8");
        let registration = RegistrationRequest::from_body(&headers, br#"{"full_name":" Ada "}"#)
            .unwrap()
            .normalize();

        assert_eq!(registration.full_name, "Ada");
    }

    #[test]
    fn empty_json_body_is_empty_submission() {
        let headers = json_headers("application/json");
        assert!(RegistrationRequest::from_body(&headers, b"").is_ok());
        assert!(RegistrationRequest::from_body(&headers, b"  \n").is_ok());
    }

    #[test]
    fn broken_json_reports_parser_message() {
        let headers = json_headers("application/json");
        let err = RegistrationRequest::from_body(&headers, b"{\"full_name\": ").unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(err.to_string().starts_with("Failed to parse the request body as JSON"));
    }

    #[test]
    fn truthiness_follows_loose_boolean_rules() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!truthy(&falsy), "{falsy} should be false");
        }
        for truthy_value in [
            json!(true),
            json!(1),
            json!(-2.5),
            json!("false"),
            json!("on"),
            json!([]),
            json!({}),
        ] {
            assert!(truthy(&truthy_value), "{truthy_value} should be true");
        }
    }

    #[test]
    fn list_response_counts_records() {
        let response = ListRegistrationsResponse::from(Vec::new());
        assert!(response.success);
        assert_eq!(response.count, 0);
    }
}
