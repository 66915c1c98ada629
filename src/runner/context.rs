use serde_json::Value;

/// Session carried across scenario steps: where to send requests and the
/// identifiers earlier steps produced.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Server root, e.g. `https://chat.example.test`
    pub base_url: String,

    /// API root derived from the base URL, e.g. `https://chat.example.test/api`
    pub api_url: String,

    /// Bearer token sent with every request while present
    pub token: Option<String>,

    /// Authenticated user id
    pub user_id: Option<String>,

    /// Username registered by this run
    pub username: Option<String>,

    /// Room created by this run
    pub room_id: Option<String>,
}

impl Session {
    pub fn new(base_url: &str, api_prefix: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let prefix = api_prefix.trim_matches('/');
        let api_url = if prefix.is_empty() {
            base_url.clone()
        } else {
            format!("{}/{}", base_url, prefix)
        };

        Self {
            base_url,
            api_url,
            ..Self::default()
        }
    }

    /// Full URL for an endpoint relative to the API root
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_url, endpoint)
    }

    /// Value of the Authorization header, if a token is held
    pub fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }
}

/// Render an identifier field as text. Ids may arrive as strings or numbers.
pub fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
