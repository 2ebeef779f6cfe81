//! Route gate table: which requests take a per-user lock.
//!
//! The table is data. Adding a gated route is a configuration change and
//! never touches the lock manager.

use serde::{Deserialize, Serialize};

use crate::domain::LockName;
use crate::services::identity::CredentialKind;

/// Path of the speech synthesis endpoint.
pub const TTS_PATH: &str = "/v1/tts/";

/// Path of the streaming conversation endpoint.
pub const NEW_CONVERSATION_PATH: &str = "/v1/user/new-conversation";

/// One gated route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatedRoute {
    /// HTTP method to match (case-insensitive); `None` matches any method.
    #[serde(default)]
    pub method: Option<String>,
    /// Exact request path.
    pub path: String,
    /// Lock taken for the duration of the request.
    pub lock_name: LockName,
    /// Where the credential is carried.
    pub credential: CredentialKind,
}

impl GatedRoute {
    fn matches(&self, method: &str, path: &str) -> bool {
        self.path == path
            && self
                .method
                .as_deref()
                .is_none_or(|m| m.eq_ignore_ascii_case(method))
    }
}

/// Ordered gate table; the first matching route wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatePolicy {
    routes: Vec<GatedRoute>,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::new(vec![
            GatedRoute {
                method: Some("POST".to_string()),
                path: TTS_PATH.to_string(),
                lock_name: LockName::tts(),
                credential: CredentialKind::AuthorizationHeader,
            },
            GatedRoute {
                method: None,
                path: NEW_CONVERSATION_PATH.to_string(),
                lock_name: LockName::stt(),
                credential: CredentialKind::Subprotocol,
            },
        ])
    }
}

impl GatePolicy {
    pub const fn new(routes: Vec<GatedRoute>) -> Self {
        Self { routes }
    }

    /// Policy that gates nothing.
    pub const fn empty() -> Self {
        Self { routes: Vec::new() }
    }

    pub fn routes(&self) -> &[GatedRoute] {
        &self.routes
    }

    /// The route that gates `method path`, if any.
    pub fn match_request(&self, method: &str, path: &str) -> Option<&GatedRoute> {
        self.routes.iter().find(|r| r.matches(method, path))
    }

    /// Append routes after the existing ones.
    #[must_use]
    pub fn with_routes(mut self, routes: impl IntoIterator<Item = GatedRoute>) -> Self {
        self.routes.extend(routes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_gates_tts_post_only() {
        let policy = GatePolicy::default();

        let route = policy.match_request("POST", "/v1/tts/").unwrap();
        assert_eq!(route.lock_name, LockName::tts());
        assert_eq!(route.credential, CredentialKind::AuthorizationHeader);

        assert!(policy.match_request("GET", "/v1/tts/").is_none());
        assert!(policy.match_request("GET", "/v1/tts/sample_rate").is_none());
        assert!(policy.match_request("POST", "/v1/tts").is_none());
    }

    #[test]
    fn test_default_table_gates_conversation_any_method() {
        let policy = GatePolicy::default();

        let route = policy
            .match_request("GET", "/v1/user/new-conversation")
            .unwrap();
        assert_eq!(route.lock_name, LockName::stt());
        assert_eq!(route.credential, CredentialKind::Subprotocol);
    }

    #[test]
    fn test_method_match_is_case_insensitive() {
        let policy = GatePolicy::default();
        assert!(policy.match_request("post", "/v1/tts/").is_some());
    }

    #[test]
    fn test_unmatched_paths_pass_through() {
        let policy = GatePolicy::default();
        assert!(policy.match_request("GET", "/v1/health").is_none());
        assert!(GatePolicy::empty().match_request("POST", "/v1/tts/").is_none());
    }

    #[test]
    fn test_table_from_json() {
        let json = r#"[
            {"method": "POST", "path": "/v1/clone-voice", "lockName": "voice-clone", "credential": "authorization_header"}
        ]"#;
        let extra: Vec<GatedRoute> = serde_json::from_str(json).unwrap();
        let policy = GatePolicy::default().with_routes(extra);

        assert_eq!(policy.routes().len(), 3);
        let route = policy.match_request("POST", "/v1/clone-voice").unwrap();
        assert_eq!(route.lock_name.as_str(), "voice-clone");
    }

    #[test]
    fn test_invalid_lock_name_in_json_rejected() {
        let json = r#"[{"path": "/x", "lockName": "Not Valid", "credential": "subprotocol"}]"#;
        assert!(serde_json::from_str::<GatePolicy>(json).is_err());
    }
}
