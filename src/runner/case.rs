use crate::driver::traits::HttpMethod;
use serde_json::Value;

/// One request/expected-status assertion
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub method: HttpMethod,
    /// Path relative to the API root, without a leading slash
    pub endpoint: String,
    pub expected_status: u16,
    pub body: Option<Value>,
    /// Header overrides applied after the defaults
    pub headers: Vec<(String, String)>,
}

impl TestCase {
    pub fn new(name: &str, method: HttpMethod, endpoint: &str, expected_status: u16) -> Self {
        Self {
            name: name.to_string(),
            method,
            endpoint: endpoint.to_string(),
            expected_status,
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(name: &str, endpoint: &str, expected_status: u16) -> Self {
        Self::new(name, HttpMethod::Get, endpoint, expected_status)
    }

    pub fn post(name: &str, endpoint: &str, expected_status: u16, body: Value) -> Self {
        Self::new(name, HttpMethod::Post, endpoint, expected_status).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}
