//! Structured audit logging for authentication and catalog writes.
//!
//! Events go to the `audit` tracing target so they can be routed separately.
//!
//! ```ignore
//! use axum_helpers::audit::{AuditEvent, AuditOutcome};
//!
//! AuditEvent::new("product.delete", AuditOutcome::Success)
//!     .actor(Some(user.id))
//!     .resource(format!("product:{}", id))
//!     .with_request_headers(&headers)
//!     .log();
//! ```

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    /// Rejected input or a system error
    Failure,
    /// Rejected for lack of credentials or permission
    Denied,
}

#[derive(Debug, Serialize)]
pub struct AuditEvent {
    pub user_id: Option<Uuid>,
    /// Dotted action name, e.g. `auth.login`, `product.create`
    pub action: String,
    /// `kind:id`, e.g. `product:0191…`
    pub resource: Option<String>,
    pub outcome: AuditOutcome,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>, outcome: AuditOutcome) -> Self {
        Self {
            user_id: None,
            action: action.into(),
            resource: None,
            outcome,
            ip_address: None,
            user_agent: None,
            timestamp: Utc::now(),
            details: None,
        }
    }

    pub fn actor(mut self, user_id: Option<Uuid>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Fills client IP and user agent from proxy-aware request headers.
    pub fn with_request_headers(mut self, headers: &HeaderMap) -> Self {
        self.ip_address = extract_ip_from_headers(headers);
        self.user_agent = extract_user_agent(headers);
        self
    }

    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    pub fn log(self) {
        tracing::info!(
            target: "audit",
            user_id = self.user_id.map(|id| id.to_string()),
            action = %self.action,
            resource = self.resource,
            outcome = ?self.outcome,
            ip = self.ip_address,
            user_agent = self.user_agent,
            details = ?self.details,
            "{}",
            serde_json::to_string(&self).unwrap_or_else(|_| self.action.clone())
        );
    }
}

/// First address of `X-Forwarded-For`, falling back to `X-Real-IP`.
pub fn extract_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(extract_ip_from_headers(&headers).as_deref(), Some("10.0.0.1"));

        headers.remove("x-forwarded-for");
        assert_eq!(extract_ip_from_headers(&headers).as_deref(), Some("10.0.0.9"));
    }

    #[test]
    fn test_event_builder_collects_request_metadata() {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("curl/8.0"));
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.4"));

        let user = Uuid::new_v4();
        let event = AuditEvent::new("product.create", AuditOutcome::Success)
            .actor(Some(user))
            .resource("product:1")
            .with_request_headers(&headers)
            .with_details(serde_json::json!({"images": 3}));

        assert_eq!(event.user_id, Some(user));
        assert_eq!(event.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(event.ip_address.as_deref(), Some("192.168.1.4"));
        assert_eq!(event.details.as_ref().unwrap()["images"], 3);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["outcome"], "success");
        event.log();
    }
}
