use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{Record, RecordId, User};

// -- Auth --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// -- Messages --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    #[serde(rename = "username")]
    pub submitter_name: String,
    #[serde(rename = "lovername")]
    pub target_name: String,
}

/// One page of the submission list. Pagination metadata comes from the
/// server and is authoritative over whatever page the client asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub messages: Vec<Record>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_messages: u64,
}

impl MessagePage {
    /// First record id that appears more than once on this page, if any.
    pub fn duplicate_id(&self) -> Option<&RecordId> {
        let mut seen = HashSet::with_capacity(self.messages.len());
        self.messages.iter().map(|r| &r.id).find(|id| !seen.insert(*id))
    }
}

// -- Errors --

/// Structured error body some endpoints return alongside a failure status.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// The human-readable reason, preferring `error` over `message`.
    pub fn reason(&self) -> Option<&str> {
        [self.error.as_deref(), self.message.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_reads_server_payload() {
        let page: MessagePage = serde_json::from_str(
            r#"{
                "messages": [
                    {"_id":"a","username":"Alex","lovername":"Sam","createdAt":"2025-02-14T09:30:00Z"},
                    {"_id":"b","username":"Kim","lovername":"Lee","createdAt":null}
                ],
                "currentPage": 2,
                "totalPages": 3,
                "totalMessages": 12
            }"#,
        )
        .unwrap();
        assert_eq!(page.messages.len(), 2);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_messages, 12);
        assert_eq!(page.duplicate_id(), None);
    }

    #[test]
    fn duplicate_ids_are_detected() {
        let page: MessagePage = serde_json::from_str(
            r#"{
                "messages": [
                    {"_id":"a","username":"Alex","lovername":"Sam"},
                    {"_id":"b","username":"Kim","lovername":"Lee"},
                    {"_id":"a","username":"Alex","lovername":"Sam"}
                ],
                "currentPage": 1, "totalPages": 1, "totalMessages": 3
            }"#,
        )
        .unwrap();
        assert_eq!(page.duplicate_id(), Some(&RecordId("a".into())));
    }

    #[test]
    fn create_request_uses_wire_names() {
        let req = CreateMessageRequest {
            submitter_name: "Alex".into(),
            target_name: "Sam".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"username": "Alex", "lovername": "Sam"}));
    }

    #[test]
    fn error_body_reason() {
        let body = ErrorBody::parse(r#"{"error":"db down"}"#).unwrap();
        assert_eq!(body.reason(), Some("db down"));

        let body = ErrorBody::parse(r#"{"message":"Invalid credentials"}"#).unwrap();
        assert_eq!(body.reason(), Some("Invalid credentials"));

        let body = ErrorBody::parse(r#"{"error":"  ","message":"fallback"}"#).unwrap();
        assert_eq!(body.reason(), Some("fallback"));

        assert!(ErrorBody::parse("<html>502</html>").is_none());
    }
}
