//! REST wire types for the student portal API.
//!
//! Shared by the session core and the CLI so both sides agree on the JSON
//! shapes the backend speaks. The backend remains the authority on
//! validation; these types only describe payloads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
pub const OTP_LENGTH: usize = 6;

/// Profile fields the backend returns for a student.
///
/// Every field defaults so partial payloads (older backend versions, restored
/// snapshots) still deserialize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub roll_no: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mobile_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub father_mobile_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_of_birth: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub field_of_study: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub branch: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub taluka: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub district: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pincode: String,
    #[serde(default)]
    pub is_data_verified: bool,
    #[serde(default)]
    pub is_mobile_verified: bool,
}

impl StudentProfile {
    /// Merges every field present in `patch` into this profile.
    pub fn apply(&mut self, patch: &ProfilePatch) {
        fn merge(target: &mut String, value: &Option<String>) {
            if let Some(value) = value {
                target.clone_from(value);
            }
        }

        merge(&mut self.id, &patch.id);
        merge(&mut self.roll_no, &patch.roll_no);
        merge(&mut self.name, &patch.name);
        merge(&mut self.email, &patch.email);
        merge(&mut self.mobile_number, &patch.mobile_number);
        merge(&mut self.father_mobile_number, &patch.father_mobile_number);
        merge(&mut self.date_of_birth, &patch.date_of_birth);
        merge(&mut self.address, &patch.address);
        merge(&mut self.field_of_study, &patch.field_of_study);
        merge(&mut self.branch, &patch.branch);
        merge(&mut self.taluka, &patch.taluka);
        merge(&mut self.city, &patch.city);
        merge(&mut self.district, &patch.district);
        merge(&mut self.pincode, &patch.pincode);
        if let Some(flag) = patch.is_data_verified {
            self.is_data_verified = flag;
        }
        if let Some(flag) = patch.is_mobile_verified {
            self.is_mobile_verified = flag;
        }
    }
}

/// Partial profile update. Absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taluka: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_data_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mobile_verified: Option<bool>,
}

impl ProfilePatch {
    /// Patch that sets every field of `profile`.
    pub fn from_profile(profile: &StudentProfile) -> Self {
        Self {
            id: Some(profile.id.clone()),
            roll_no: Some(profile.roll_no.clone()),
            name: Some(profile.name.clone()),
            email: Some(profile.email.clone()),
            mobile_number: Some(profile.mobile_number.clone()),
            father_mobile_number: Some(profile.father_mobile_number.clone()),
            date_of_birth: Some(profile.date_of_birth.clone()),
            address: Some(profile.address.clone()),
            field_of_study: Some(profile.field_of_study.clone()),
            branch: Some(profile.branch.clone()),
            taluka: Some(profile.taluka.clone()),
            city: Some(profile.city.clone()),
            district: Some(profile.district.clone()),
            pincode: Some(profile.pincode.clone()),
            is_data_verified: Some(profile.is_data_verified),
            is_mobile_verified: Some(profile.is_mobile_verified),
        }
    }

    /// Names of the fields this patch sets, in wire order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let fields = [
            ("id", self.id.is_some()),
            ("roll_no", self.roll_no.is_some()),
            ("name", self.name.is_some()),
            ("email", self.email.is_some()),
            ("mobile_number", self.mobile_number.is_some()),
            ("father_mobile_number", self.father_mobile_number.is_some()),
            ("date_of_birth", self.date_of_birth.is_some()),
            ("address", self.address.is_some()),
            ("field_of_study", self.field_of_study.is_some()),
            ("branch", self.branch.is_some()),
            ("taluka", self.taluka.is_some()),
            ("city", self.city.is_some()),
            ("district", self.district.is_some()),
            ("pincode", self.pincode.is_some()),
            ("is_data_verified", self.is_data_verified.is_some()),
            ("is_mobile_verified", self.is_mobile_verified.is_some()),
        ];
        fields
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }
}

/// Login request body. `Debug` never prints the password.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub roll_no: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("roll_no", &self.roll_no)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpRequest {
    pub mobile_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfirm {
    pub otp: String,
}

/// `{ "status": "..." }` acknowledgement returned by action endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// One row of the profile update log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateHistory {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub student_id: String,
    pub update_date: String,
    pub field_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub old_value: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub new_value: String,
}

impl UpdateHistory {
    /// Parsed `update_date`, or `None` when the backend sent a non-RFC 3339 value.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.update_date)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Accepts a JSON string, number, or null. The backend sends numeric ids
/// and nulls for blank text columns.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(String::new()),
        Some(serde_json::Value::String(text)) => Ok(text),
        Some(serde_json::Value::Number(number)) => Ok(number.to_string()),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Error body shape used by the backend (`{"error": "..."}`, or DRF's `detail`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ApiErrorBody {
    /// Extracts a user-facing message from a raw response body.
    pub fn message_from(body: &str) -> Option<String> {
        let parsed: ApiErrorBody = serde_json::from_str(body).ok()?;
        parsed
            .error
            .or(parsed.detail)
            .filter(|message| !message.trim().is_empty())
    }
}

/// Endpoint paths relative to the API base URL.
pub mod endpoints {
    pub fn login() -> String {
        "/login/".to_string()
    }

    pub fn student(roll_no: &str) -> String {
        format!("/students/{}/", roll_no)
    }

    pub fn verify(roll_no: &str) -> String {
        format!("/students/{}/verify/", roll_no)
    }

    pub fn request_otp(roll_no: &str) -> String {
        format!("/students/{}/request-otp/", roll_no)
    }

    pub fn verify_mobile(roll_no: &str) -> String {
        format!("/students/{}/verify-mobile/", roll_no)
    }

    pub fn history(roll_no: &str) -> String {
        format!("/students/{}/history/", roll_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_profile_payload_uses_defaults() {
        let profile: StudentProfile =
            serde_json::from_str(r#"{"roll_no":"42","name":"Asha Rao","is_mobile_verified":true}"#)
                .expect("parse profile");

        assert_eq!(profile.roll_no, "42");
        assert!(profile.email.is_empty());
        assert!(profile.is_mobile_verified);
        assert!(!profile.is_data_verified);
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut profile = StudentProfile {
            roll_no: "42".to_string(),
            name: "Asha Rao".to_string(),
            email: "asha@example.edu".to_string(),
            is_mobile_verified: true,
            ..Default::default()
        };
        let patch = ProfilePatch {
            email: Some("asha.rao@example.edu".to_string()),
            is_mobile_verified: Some(false),
            ..Default::default()
        };

        profile.apply(&patch);

        assert_eq!(profile.name, "Asha Rao");
        assert_eq!(profile.email, "asha.rao@example.edu");
        assert!(!profile.is_mobile_verified);
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = ProfilePatch {
            city: Some("Pune".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&patch).expect("serialize patch");
        assert_eq!(json, r#"{"city":"Pune"}"#);
        assert_eq!(patch.changed_fields(), vec!["city"]);
        assert!(ProfilePatch::default().is_empty());
    }

    #[test]
    fn login_request_debug_redacts_password() {
        let request = LoginRequest {
            roll_no: "42".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{:?}", request);
        assert!(rendered.contains("42"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn error_message_prefers_error_field() {
        assert_eq!(
            ApiErrorBody::message_from(r#"{"error":"Invalid credentials"}"#),
            Some("Invalid credentials".to_string())
        );
        assert_eq!(
            ApiErrorBody::message_from(r#"{"detail":"Not found."}"#),
            Some("Not found.".to_string())
        );
        assert_eq!(ApiErrorBody::message_from("<html>502</html>"), None);
        assert_eq!(ApiErrorBody::message_from(r#"{"error":"  "}"#), None);
    }

    #[test]
    fn history_date_parses_rfc3339() {
        let entry = UpdateHistory {
            id: "1".to_string(),
            student_id: "7".to_string(),
            update_date: "2026-01-31T10:15:00Z".to_string(),
            field_name: "email".to_string(),
            old_value: "a@x".to_string(),
            new_value: "b@x".to_string(),
        };
        let parsed = entry.updated_at().expect("parse date");
        assert_eq!(parsed.to_rfc3339(), "2026-01-31T10:15:00+00:00");
    }

    #[test]
    fn numeric_ids_and_null_text_are_accepted() {
        let entry: UpdateHistory = serde_json::from_str(
            r#"{"id":3,"student_id":7,"update_date":"2026-01-31T10:15:00Z","field_name":"address","old_value":null,"new_value":"Kothrud"}"#,
        )
        .expect("parse history");
        assert_eq!(entry.id, "3");
        assert_eq!(entry.student_id, "7");
        assert_eq!(entry.old_value, "");

        let profile: StudentProfile =
            serde_json::from_str(r#"{"id":7,"roll_no":"42","taluka":null}"#).expect("parse profile");
        assert_eq!(profile.id, "7");
        assert!(profile.taluka.is_empty());

        assert!(serde_json::from_str::<StudentProfile>(r#"{"name":["a"]}"#).is_err());
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(endpoints::student("42"), "/students/42/");
        assert_eq!(endpoints::request_otp("42"), "/students/42/request-otp/");
        assert_eq!(endpoints::history("42"), "/students/42/history/");
    }
}
